use std::fmt::Write;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{BackendKind, Operation};

const RULE: &str = "========================================================================";

/// Outcome of one timed operation against one backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchReport {
    pub operation: Operation,
    pub backend: BackendKind,
    /// Documents to insert/update/delete, or find iterations.
    pub requested_count: usize,
    /// Documents actually inserted/updated/deleted, or queries executed.
    pub affected: usize,
    /// Documents returned by the last find execution; only set for find.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_cardinality: Option<usize>,
    pub elapsed_seconds: f64,
    pub started_at: DateTime<Utc>,
}

impl BenchReport {
    pub fn new(
        operation: Operation,
        backend: BackendKind,
        requested_count: usize,
        affected: usize,
        elapsed: Duration,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            operation,
            backend,
            requested_count,
            affected,
            result_cardinality: None,
            elapsed_seconds: elapsed.as_secs_f64(),
            started_at,
        }
    }

    pub fn with_cardinality(mut self, cardinality: usize) -> Self {
        self.result_cardinality = Some(cardinality);
        self
    }

    /// Human readable block, one per report.
    pub fn render_text(&self) -> String {
        let backend = self.backend.as_str().to_uppercase();
        let mut out = String::new();
        let _ = writeln!(out, "{RULE}");
        match self.operation {
            Operation::Insert => {
                let _ = writeln!(
                    out,
                    "INSERTING {} DOCUMENT(S) INTO {backend}",
                    self.requested_count
                );
            }
            Operation::Find => {
                let _ = writeln!(
                    out,
                    "RUNNING THE QUERY {} TIME(S) ON {backend}",
                    self.requested_count
                );
                let _ = writeln!(
                    out,
                    "LAST ITERATION RETURNED {} DOCUMENT(S)",
                    self.result_cardinality.unwrap_or(0)
                );
            }
            Operation::Update => {
                let _ = writeln!(
                    out,
                    "UPDATING {} DOCUMENT(S) ON {backend}",
                    self.requested_count
                );
            }
            Operation::Delete => {
                let _ = writeln!(
                    out,
                    "REMOVING {} DOCUMENT(S) FROM {backend}",
                    self.requested_count
                );
            }
        }
        if self.operation != Operation::Find && self.affected != self.requested_count {
            let _ = writeln!(out, "ONLY {} DOCUMENT(S) AVAILABLE", self.affected);
        }
        let _ = writeln!(out, "DURATION: {:.6}", self.elapsed_seconds);
        let _ = write!(out, "{RULE}");
        out
    }
}
