use std::process::ExitCode;

use thiserror::Error;

use crate::core::BackendKind;

#[derive(Debug, Error, PartialEq)]
pub enum BenchError {
    #[error("Cannot parse config: {0}")]
    ConfigParsingError(String),
    #[error("Cannot load dataset {path}: {reason}")]
    DatasetLoadError { path: String, reason: String },
    #[error("Cannot connect to {backend}: {reason}")]
    ConnectionError { backend: BackendKind, reason: String },
    #[error("Backend error: {0}")]
    BackendError(String),
    #[error("Requested {requested} documents but only {available} are stored")]
    OutOfRangeError { requested: usize, available: usize },
    #[error("No connection open for {0}")]
    NotConnected(BackendKind),
}

impl BenchError {
    pub fn exit_code(&self) -> ExitCode {
        let code = match self {
            BenchError::ConfigParsingError(_) => 2,
            BenchError::DatasetLoadError { .. } => 3,
            BenchError::ConnectionError { .. } | BenchError::NotConnected(_) => 4,
            BenchError::BackendError(_) => 5,
            BenchError::OutOfRangeError { .. } => 6,
        };
        ExitCode::from(code)
    }
}

impl From<mongodb::error::Error> for BenchError {
    fn from(err: mongodb::error::Error) -> Self {
        BenchError::BackendError(format!("mongodb: {err}"))
    }
}

impl From<bson::ser::Error> for BenchError {
    fn from(err: bson::ser::Error) -> Self {
        BenchError::BackendError(format!("bson: {err}"))
    }
}

impl From<reqwest::Error> for BenchError {
    fn from(err: reqwest::Error) -> Self {
        BenchError::BackendError(format!("couchdb: {err}"))
    }
}
