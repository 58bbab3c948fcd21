//! The fixed document set every benchmark draws from.
//!
//! Loaded once from a JSON-lines file (one object per line) and only ever
//! read afterwards.

use std::fs;
use std::path::Path;
use std::slice::Iter;

use log::info;
use serde_json::{Map, Value};

use crate::core::BenchError;

pub type Document = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    documents: Vec<Document>,
}

impl Dataset {
    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn load(path: &Path) -> Result<Self, BenchError> {
        let load_error = |reason: String| BenchError::DatasetLoadError {
            path: path.display().to_string(),
            reason,
        };

        let content = fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        let dataset = Self::parse(&content).map_err(load_error)?;

        info!(
            "loaded {} documents from {}",
            dataset.len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Parse JSON-lines content; blank lines are skipped.
    pub fn parse(content: &str) -> Result<Self, String> {
        let mut documents = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(line) {
                Ok(Value::Object(doc)) => documents.push(doc),
                Ok(other) => {
                    return Err(format!(
                        "line {}: expected a JSON object, got {}",
                        idx + 1,
                        json_kind(&other)
                    ));
                }
                Err(e) => return Err(format!("line {}: {}", idx + 1, e)),
            }
        }
        Ok(Self { documents })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, Document> {
        self.documents.iter()
    }

    /// The first `n` documents, or all of them when `n` exceeds the length.
    pub fn take(&self, n: usize) -> &[Document] {
        &self.documents[..n.min(self.documents.len())]
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Document;
    type IntoIter = Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
