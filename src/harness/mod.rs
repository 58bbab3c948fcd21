//! The benchmark harness: one dataset, one handle per backend, and the four
//! timed operations.
//!
//! Each operation borrows the harness mutably, so calls against a handle are
//! serialized by construction. Timing uses [`Instant`] sampled right around
//! the measured loop; logging and setup happen outside it.

mod report;

use std::collections::HashMap;
use std::time::Instant;

use chrono::Utc;
use log::{debug, info};

use crate::backends::{self, DocumentStore};
use crate::conf::{Config, WorkloadConfig};
use crate::core::{BackendKind, BenchError, Operation};
use crate::dataset::Dataset;

pub use report::BenchReport;

pub struct Harness {
    dataset: Dataset,
    workload: WorkloadConfig,
    stores: HashMap<BackendKind, Box<dyn DocumentStore>>,
}

impl Harness {
    pub fn new(dataset: Dataset, workload: WorkloadConfig) -> Self {
        Self {
            dataset,
            workload,
            stores: HashMap::new(),
        }
    }

    /// Load the configured dataset. No backend is connected yet.
    pub fn from_config(config: &Config) -> Result<Self, BenchError> {
        let dataset = Dataset::load(&config.dataset.path)?;
        Ok(Self::new(dataset, config.workload.clone()))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn workload(&self) -> &WorkloadConfig {
        &self.workload
    }

    /// Open a live connection for `kind`, replacing any previous one.
    pub async fn connect(&mut self, kind: BackendKind, config: &Config) -> Result<(), BenchError> {
        let store = backends::connect(kind, config).await?;
        self.attach(store);
        Ok(())
    }

    /// Use an already built store for its kind, replacing any previous one.
    pub fn attach(&mut self, store: Box<dyn DocumentStore>) {
        self.stores.insert(store.kind(), store);
    }

    pub fn is_connected(&self, kind: BackendKind) -> bool {
        self.stores.contains_key(&kind)
    }

    fn store(
        stores: &mut HashMap<BackendKind, Box<dyn DocumentStore>>,
        kind: BackendKind,
    ) -> Result<&mut Box<dyn DocumentStore>, BenchError> {
        stores.get_mut(&kind).ok_or(BenchError::NotConnected(kind))
    }

    pub async fn run(
        &mut self,
        operation: Operation,
        kind: BackendKind,
        count: usize,
    ) -> Result<BenchReport, BenchError> {
        match operation {
            Operation::Insert => self.insert(kind, count).await,
            Operation::Find => self.find(kind, count).await,
            Operation::Update => self.update(kind, count).await,
            Operation::Delete => self.delete(kind, count).await,
        }
    }

    /// Run `operation` against both backends, MongoDB first.
    pub async fn compare(
        &mut self,
        operation: Operation,
        count: usize,
    ) -> Result<Vec<BenchReport>, BenchError> {
        if let Some(missing) = BackendKind::ALL.into_iter().find(|k| !self.is_connected(*k)) {
            return Err(BenchError::NotConnected(missing));
        }
        let mut reports = Vec::with_capacity(BackendKind::ALL.len());
        for kind in BackendKind::ALL {
            reports.push(self.run(operation, kind, count).await?);
        }
        Ok(reports)
    }

    /// Reset the collection, then insert the first `count` dataset documents
    /// one by one. Only the insertion loop is timed. Fewer than `count`
    /// documents are inserted when the dataset is shorter.
    pub async fn insert(
        &mut self,
        kind: BackendKind,
        count: usize,
    ) -> Result<BenchReport, BenchError> {
        let store = Self::store(&mut self.stores, kind)?;
        let documents = self.dataset.take(count);

        debug!("resetting {} collection {}", kind, self.workload.collection);
        store.reset().await?;

        let started_at = Utc::now();
        let start = Instant::now();
        for doc in documents {
            store.insert_one(doc).await?;
        }
        let elapsed = start.elapsed();

        let report = BenchReport::new(
            Operation::Insert,
            kind,
            count,
            documents.len(),
            elapsed,
            started_at,
        );
        log_report(&report);
        Ok(report)
    }

    /// Execute the find query `iterations` times.
    ///
    /// Only the cardinality of the last execution is reported; zero
    /// iterations report a cardinality of zero.
    pub async fn find(
        &mut self,
        kind: BackendKind,
        iterations: usize,
    ) -> Result<BenchReport, BenchError> {
        let store = Self::store(&mut self.stores, kind)?;
        let query = &self.workload.find;

        let started_at = Utc::now();
        let start = Instant::now();
        let mut last = 0;
        for _ in 0..iterations {
            last = store.find(query).await?;
        }
        let elapsed = start.elapsed();

        let report = BenchReport::new(
            Operation::Find,
            kind,
            iterations,
            iterations,
            elapsed,
            started_at,
        )
        .with_cardinality(last);
        log_report(&report);
        Ok(report)
    }

    /// Patch up to `count` stored documents. Selection and mutation are both
    /// timed.
    pub async fn update(
        &mut self,
        kind: BackendKind,
        count: usize,
    ) -> Result<BenchReport, BenchError> {
        let store = Self::store(&mut self.stores, kind)?;
        let patch = &self.workload.update;

        let started_at = Utc::now();
        let start = Instant::now();
        let updated = store.update(count, patch).await?;
        let elapsed = start.elapsed();

        let report = BenchReport::new(Operation::Update, kind, count, updated, elapsed, started_at);
        log_report(&report);
        Ok(report)
    }

    /// Remove up to `count` documents, one backend call each. Building the
    /// delete plan is not timed; a positional plan fails with
    /// [`BenchError::OutOfRangeError`] before deleting anything when `count`
    /// exceeds the stored documents.
    pub async fn delete(
        &mut self,
        kind: BackendKind,
        count: usize,
    ) -> Result<BenchReport, BenchError> {
        let store = Self::store(&mut self.stores, kind)?;
        let mut cursor = store.prepare_delete(count).await?;
        debug!("prepared {} delete plan for {} documents", kind, count);

        let started_at = Utc::now();
        let start = Instant::now();
        let mut deleted = 0;
        while let Some(target) = cursor.next_target() {
            if !store.delete_one(&target).await? {
                break;
            }
            deleted += 1;
        }
        let elapsed = start.elapsed();

        let report = BenchReport::new(Operation::Delete, kind, count, deleted, elapsed, started_at);
        log_report(&report);
        Ok(report)
    }

    /// Documents currently stored in the backend.
    pub async fn count(&mut self, kind: BackendKind) -> Result<usize, BenchError> {
        Self::store(&mut self.stores, kind)?.count().await
    }
}

fn log_report(report: &BenchReport) {
    info!(
        operation = report.operation,
        backend = report.backend,
        requested = report.requested_count,
        affected = report.affected;
        "{} {} finished in {:.6}s",
        report.backend,
        report.operation,
        report.elapsed_seconds
    );
}
