//! Pluggable document store trait and the adapters under comparison.
//!
//! The harness only speaks in terms of [`DocumentStore`]; each adapter
//! translates the workload (any-of equality filter, field assignments)
//! into its own query dialect.

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::conf::{Config, FindConfig, UpdateConfig};
use crate::core::{BackendKind, BenchError};
use crate::dataset::Document;

pub mod couch;
pub mod mongo;

pub use couch::CouchStore;
pub use mongo::MongoStore;

/// A stored document as seen by a positional delete.
#[derive(Debug, Clone, PartialEq)]
pub struct DocRef {
    pub id: String,
    /// Revision token, for stores that use optimistic concurrency.
    pub rev: Option<String>,
}

/// What a single delete call removes.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteTarget {
    /// Whichever document the store matches first.
    AnyDocument,
    Document(DocRef),
}

/// Plan for a delete run, produced outside the timed region.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteCursor {
    /// Issue up to `remaining` independent "delete any" calls.
    Predicate { remaining: usize },
    /// Delete these listed documents in order. The listing is a snapshot:
    /// documents removed by someone else after it was taken surface as a
    /// backend error when their turn comes.
    Snapshot(VecDeque<DocRef>),
}

impl DeleteCursor {
    pub fn predicate(count: usize) -> Self {
        DeleteCursor::Predicate { remaining: count }
    }

    /// Keep the first `count` entries of `listing`.
    ///
    /// Positional access past the end of the listing is refused up front
    /// rather than deleting a prefix and failing halfway.
    pub fn snapshot(count: usize, mut listing: Vec<DocRef>) -> Result<Self, BenchError> {
        if count > listing.len() {
            return Err(BenchError::OutOfRangeError {
                requested: count,
                available: listing.len(),
            });
        }
        listing.truncate(count);
        Ok(DeleteCursor::Snapshot(listing.into()))
    }

    pub fn next_target(&mut self) -> Option<DeleteTarget> {
        match self {
            DeleteCursor::Predicate { remaining } => {
                if *remaining == 0 {
                    return None;
                }
                *remaining -= 1;
                Some(DeleteTarget::AnyDocument)
            }
            DeleteCursor::Snapshot(refs) => refs.pop_front().map(DeleteTarget::Document),
        }
    }
}

/// A document store that can be benchmarked.
///
/// Methods take `&mut self`: one caller at a time per connection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Drop the benchmark collection and create it empty.
    async fn reset(&mut self) -> Result<(), BenchError>;

    async fn insert_one(&mut self, doc: &Document) -> Result<(), BenchError>;

    /// Run the find query once and return how many documents came back.
    async fn find(&mut self, query: &FindConfig) -> Result<usize, BenchError>;

    /// Select up to `count` documents and apply `patch` to each.
    /// Returns the number of documents updated.
    async fn update(&mut self, count: usize, patch: &UpdateConfig) -> Result<usize, BenchError>;

    /// Build the delete plan. Not timed.
    async fn prepare_delete(&mut self, count: usize) -> Result<DeleteCursor, BenchError> {
        Ok(DeleteCursor::predicate(count))
    }

    /// Returns false when there was nothing left to delete.
    async fn delete_one(&mut self, target: &DeleteTarget) -> Result<bool, BenchError>;

    /// Number of documents currently stored.
    async fn count(&mut self) -> Result<usize, BenchError>;
}

/// Open a live connection to the store of the given kind.
pub async fn connect(
    kind: BackendKind,
    config: &Config,
) -> Result<Box<dyn DocumentStore>, BenchError> {
    let collection = &config.workload.collection;
    match kind {
        BackendKind::Mongodb => Ok(Box::new(
            MongoStore::connect(&config.mongodb, collection).await?,
        )),
        BackendKind::Couchdb => Ok(Box::new(
            CouchStore::connect(&config.couchdb, collection).await?,
        )),
    }
}
