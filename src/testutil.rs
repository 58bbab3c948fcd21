//! Test and benchmark utilities.
//!
//! This module is only available when the `testutil` feature is enabled.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use crate::backends::{DeleteCursor, DeleteTarget, DocRef, DocumentStore};
use crate::conf::{FindConfig, UpdateConfig};
use crate::core::{BackendKind, BenchError};
use crate::dataset::{Dataset, Document};

#[derive(Debug, Default)]
struct MemoryState {
    docs: Vec<(String, Document)>,
    next_id: u64,
    writes: usize,
    resets: usize,
}

/// In-process [`DocumentStore`] standing in for either backend.
///
/// Deletes follow the semantics of the backend it impersonates: predicate
/// deletes for MongoDB, snapshot listing for CouchDB. Clones share state, so
/// a test can keep a handle after attaching the store to a harness.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    kind: BackendKind,
    state: Arc<Mutex<MemoryState>>,
    fail_after_writes: Option<usize>,
}

impl MemoryStore {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            state: Arc::new(Mutex::new(MemoryState::default())),
            fail_after_writes: None,
        }
    }

    /// Every write after the first `writes` successful ones fails.
    pub fn failing_after(kind: BackendKind, writes: usize) -> Self {
        Self {
            fail_after_writes: Some(writes),
            ..Self::new(kind)
        }
    }

    pub async fn documents(&self) -> Vec<Document> {
        let state = self.state.lock().await;
        state.docs.iter().map(|(_, doc)| doc.clone()).collect()
    }

    pub async fn resets(&self) -> usize {
        self.state.lock().await.resets
    }

    /// Remove a document behind the harness's back.
    pub async fn remove_external(&self, position: usize) {
        let mut state = self.state.lock().await;
        if position < state.docs.len() {
            state.docs.remove(position);
        }
    }

    fn check_write(&self, state: &mut MemoryState) -> Result<(), BenchError> {
        if let Some(limit) = self.fail_after_writes {
            if state.writes >= limit {
                return Err(BenchError::BackendError(format!(
                    "{}: injected failure after {} writes",
                    self.kind, limit
                )));
            }
        }
        state.writes += 1;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn reset(&mut self) -> Result<(), BenchError> {
        let mut state = self.state.lock().await;
        state.docs.clear();
        state.resets += 1;
        Ok(())
    }

    async fn insert_one(&mut self, doc: &Document) -> Result<(), BenchError> {
        let mut state = self.state.lock().await;
        self.check_write(&mut state)?;
        state.next_id += 1;
        let id = format!("{:08}", state.next_id);
        state.docs.push((id, doc.clone()));
        Ok(())
    }

    async fn find(&mut self, query: &FindConfig) -> Result<usize, BenchError> {
        let state = self.state.lock().await;
        Ok(state
            .docs
            .iter()
            .filter(|(_, doc)| query.matches(doc))
            .take(query.limit)
            .count())
    }

    async fn update(&mut self, count: usize, patch: &UpdateConfig) -> Result<usize, BenchError> {
        let mut state = self.state.lock().await;
        let n = count.min(state.docs.len());
        for i in 0..n {
            self.check_write(&mut state)?;
            patch.apply(&mut state.docs[i].1);
        }
        Ok(n)
    }

    async fn prepare_delete(&mut self, count: usize) -> Result<DeleteCursor, BenchError> {
        match self.kind {
            BackendKind::Mongodb => Ok(DeleteCursor::predicate(count)),
            BackendKind::Couchdb => {
                let state = self.state.lock().await;
                let listing = state
                    .docs
                    .iter()
                    .map(|(id, _)| DocRef {
                        id: id.clone(),
                        rev: None,
                    })
                    .collect();
                DeleteCursor::snapshot(count, listing)
            }
        }
    }

    async fn delete_one(&mut self, target: &DeleteTarget) -> Result<bool, BenchError> {
        let mut state = self.state.lock().await;
        let position = match target {
            DeleteTarget::AnyDocument => {
                if state.docs.is_empty() {
                    return Ok(false);
                }
                0
            }
            DeleteTarget::Document(doc_ref) => state
                .docs
                .iter()
                .position(|(id, _)| *id == doc_ref.id)
                .ok_or_else(|| {
                    BenchError::BackendError(format!("{}: document {} not found", self.kind, doc_ref.id))
                })?,
        };
        self.check_write(&mut state)?;
        state.docs.remove(position);
        Ok(true)
    }

    async fn count(&mut self) -> Result<usize, BenchError> {
        Ok(self.state.lock().await.docs.len())
    }
}

const COURSES: &[&str] = &[
    "DIREITO",
    "MEDICINA",
    "ENGENHARIA CIVIL",
    "CIÊNCIA DA COMPUTAÇÃO",
    "PEDAGOGIA",
];

const LEVELS: &[&str] = &["GRADUAÇÃO", "MESTRADO", "DOUTORADO", "ESPECIALIZAÇÃO"];

/// A diploma record that matches none of the default find terms except,
/// when `livro` is `"S"`, the book flag.
pub fn diploma(idx: usize, livro: &str) -> Document {
    json!({
        "matricula": format!("2019{:06}", idx),
        "nome_discente": format!("Discente {idx}"),
        "curso": COURSES[idx % COURSES.len()],
        "nivel_ensino": "MESTRADO",
        "nome_reitor": "Ângela Maria Paiva Cruz",
        "livro": livro,
        "folha": idx as u64,
    })
    .as_object()
    .cloned()
    .unwrap_or_default()
}

/// `total` diplomas, the first `with_book` of them with `livro = "S"`.
pub fn diploma_dataset(total: usize, with_book: usize) -> Dataset {
    let documents = (0..total)
        .map(|i| diploma(i, if i < with_book { "S" } else { "N" }))
        .collect();
    Dataset::from_documents(documents)
}

/// Deterministic pseudo-random diplomas; some match the default find query.
pub fn random_dataset(total: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let documents = (0..total)
        .map(|i| {
            let mut doc = diploma(i, if rng.gen_bool(0.3) { "S" } else { "N" });
            if let Some(level) = LEVELS.choose(&mut rng) {
                doc.insert("nivel_ensino".to_string(), Value::from(*level));
            }
            doc
        })
        .collect();
    Dataset::from_documents(documents)
}

/// Write documents as JSON lines to a temporary file.
pub fn write_jsonl(docs: &[Document]) -> std::io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    for doc in docs {
        serde_json::to_writer(&mut file, doc)?;
        file.write_all(b"\n")?;
    }
    file.flush()?;
    Ok(file)
}
