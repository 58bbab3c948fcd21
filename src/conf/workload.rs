//! Workload descriptor: which collection the benchmark touches, what the
//! find query matches and what the update writes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::BenchError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WorkloadConfig {
    #[serde(default = "WorkloadConfig::default_collection")]
    pub collection: String,
    #[serde(default)]
    pub find: FindConfig,
    #[serde(default)]
    pub update: UpdateConfig,
}

impl WorkloadConfig {
    fn default_collection() -> String {
        String::from("diplomas")
    }

    /// Both stores reject an empty `$or` and an empty `$set`, and a zero
    /// limit means "unlimited" to MongoDB but "nothing" to CouchDB.
    pub fn validate(&self) -> Result<(), BenchError> {
        let invalid = |msg: &str| Err(BenchError::ConfigParsingError(msg.to_string()));
        if self.collection.is_empty() {
            return invalid("workload.collection must not be empty");
        }
        if self.find.any_of.is_empty() {
            return invalid("workload.find.any_of needs at least one term");
        }
        if self.find.limit == 0 {
            return invalid("workload.find.limit must be positive");
        }
        if self.update.set.is_empty() {
            return invalid("workload.update.set needs at least one field");
        }
        Ok(())
    }
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            collection: Self::default_collection(),
            find: FindConfig::default(),
            update: UpdateConfig::default(),
        }
    }
}

/// A single `field == value` term.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FieldMatch {
    pub field: String,
    pub value: Value,
}

impl FieldMatch {
    pub fn new(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

/// Documents matching any of the terms, capped at `limit` per execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FindConfig {
    #[serde(default = "FindConfig::default_any_of")]
    pub any_of: Vec<FieldMatch>,
    #[serde(default = "FindConfig::default_limit")]
    pub limit: usize,
}

impl FindConfig {
    fn default_any_of() -> Vec<FieldMatch> {
        vec![
            FieldMatch::new("nivel_ensino", "GRADUAÇÃO"),
            FieldMatch::new("nome_reitor", "José Daniel Diniz Melo"),
            FieldMatch::new("livro", "S"),
        ]
    }

    fn default_limit() -> usize {
        5000
    }

    /// True when `doc` satisfies at least one term.
    pub fn matches(&self, doc: &Map<String, Value>) -> bool {
        self.any_of
            .iter()
            .any(|term| doc.get(&term.field) == Some(&term.value))
    }
}

impl Default for FindConfig {
    fn default() -> Self {
        Self {
            any_of: Self::default_any_of(),
            limit: Self::default_limit(),
        }
    }
}

/// Field assignments applied to every selected document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct UpdateConfig {
    #[serde(default = "UpdateConfig::default_set")]
    pub set: Map<String, Value>,
}

impl UpdateConfig {
    fn default_set() -> Map<String, Value> {
        let mut set = Map::new();
        set.insert("curso".to_string(), Value::from("MECATRÔNICA"));
        set.insert("livro".to_string(), Value::from("P"));
        set
    }

    pub fn apply(&self, doc: &mut Map<String, Value>) {
        for (field, value) in &self.set {
            doc.insert(field.clone(), value.clone());
        }
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            set: Self::default_set(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_default_find_matches_any_term() {
        let find = FindConfig::default();
        assert_eq!(find.limit, 5000);
        assert!(find.matches(&doc(json!({"livro": "S", "curso": "X"}))));
        assert!(find.matches(&doc(json!({"nivel_ensino": "GRADUAÇÃO"}))));
        assert!(!find.matches(&doc(json!({"livro": "P", "nivel_ensino": "MESTRADO"}))));
        assert!(!find.matches(&doc(json!({}))));
    }

    #[test]
    fn test_validate_rejects_degenerate_workloads() {
        assert!(WorkloadConfig::default().validate().is_ok());

        let mut workload = WorkloadConfig::default();
        workload.find.any_of.clear();
        assert!(workload.validate().is_err());

        let mut workload = WorkloadConfig::default();
        workload.find.limit = 0;
        assert!(workload.validate().is_err());

        let mut workload = WorkloadConfig::default();
        workload.update.set.clear();
        assert!(workload.validate().is_err());
    }

    #[test]
    fn test_default_update_overwrites_only_patched_fields() {
        let update = UpdateConfig::default();
        let mut d = doc(json!({"curso": "DIREITO", "livro": "S", "nome": "Ana"}));
        update.apply(&mut d);
        assert_eq!(d["curso"], "MECATRÔNICA");
        assert_eq!(d["livro"], "P");
        assert_eq!(d["nome"], "Ana");
    }
}
