use std::fmt;

use clap::ValueEnum;
use log::kv::{ToValue, Value};
use serde::{Deserialize, Serialize};

/// The two document stores under comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Mongodb,
    Couchdb,
}

impl BackendKind {
    /// Fixed order used when an operation runs against every backend.
    pub const ALL: [BackendKind; 2] = [BackendKind::Mongodb, BackendKind::Couchdb];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Mongodb => "mongodb",
            BackendKind::Couchdb => "couchdb",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToValue for BackendKind {
    fn to_value(&self) -> Value<'_> {
        Value::from(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Insert,
    Find,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "insert",
            Operation::Find => "find",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToValue for Operation {
    fn to_value(&self) -> Value<'_> {
        Value::from(self.as_str())
    }
}
