//! MongoDB adapter.
//!
//! Database and collection are both named after the workload collection.

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document as BsonDocument, doc};
use log::{debug, info};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use tokio_stream::StreamExt;

use super::{DeleteTarget, DocumentStore};
use crate::conf::{FindConfig, MongoConfig, UpdateConfig};
use crate::core::{BackendKind, BenchError};
use crate::dataset::Document;

pub struct MongoStore {
    // Kept so the connection pool lives as long as the store.
    _client: Client,
    collection: Collection<BsonDocument>,
}

impl MongoStore {
    pub async fn connect(config: &MongoConfig, collection: &str) -> Result<Self, BenchError> {
        let connection_error = |e: mongodb::error::Error| BenchError::ConnectionError {
            backend: BackendKind::Mongodb,
            reason: e.to_string(),
        };

        let mut options = ClientOptions::parse(config.uri())
            .await
            .map_err(connection_error)?;
        options.app_name = Some(String::from("docbench"));
        options.connect_timeout = Some(config.connect_timeout);
        options.server_selection_timeout = Some(config.connect_timeout);

        let client = Client::with_options(options).map_err(connection_error)?;
        // The driver connects lazily; ping so an unreachable server fails here.
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(connection_error)?;

        info!("connected to mongodb at {}", config.uri());
        let collection = client
            .database(collection)
            .collection::<BsonDocument>(collection);
        Ok(Self {
            _client: client,
            collection,
        })
    }
}

/// `{"$or": [{field: value}, ...]}`
pub fn find_filter(query: &FindConfig) -> Result<BsonDocument, BenchError> {
    let mut terms = Vec::with_capacity(query.any_of.len());
    for term in &query.any_of {
        let mut clause = BsonDocument::new();
        clause.insert(term.field.clone(), bson::to_bson(&term.value)?);
        terms.push(Bson::Document(clause));
    }
    Ok(doc! { "$or": terms })
}

/// `{"$set": {field: value, ...}}`
pub fn update_document(patch: &UpdateConfig) -> Result<BsonDocument, BenchError> {
    let set = bson::to_document(&patch.set)?;
    Ok(doc! { "$set": set })
}

fn any_document() -> BsonDocument {
    doc! { "_id": { "$exists": true } }
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Mongodb
    }

    async fn reset(&mut self) -> Result<(), BenchError> {
        debug!("dropping mongodb collection {}", self.collection.name());
        self.collection.drop().await?;
        Ok(())
    }

    async fn insert_one(&mut self, doc: &Document) -> Result<(), BenchError> {
        let doc = bson::to_document(doc)?;
        self.collection.insert_one(doc).await?;
        Ok(())
    }

    async fn find(&mut self, query: &FindConfig) -> Result<usize, BenchError> {
        let filter = find_filter(query)?;
        let mut cursor = self
            .collection
            .find(filter)
            .limit(query.limit as i64)
            .await?;

        let mut found = 0;
        while let Some(doc) = cursor.next().await {
            doc?;
            found += 1;
        }
        Ok(found)
    }

    async fn update(&mut self, count: usize, patch: &UpdateConfig) -> Result<usize, BenchError> {
        // limit(0) means "no limit" to the server.
        if count == 0 {
            return Ok(0);
        }

        let mut cursor = self
            .collection
            .find(doc! {})
            .projection(doc! { "_id": 1 })
            .limit(count as i64)
            .await?;
        let mut ids = Vec::with_capacity(count);
        while let Some(doc) = cursor.next().await {
            if let Some(id) = doc?.get("_id") {
                ids.push(id.clone());
            }
        }
        if ids.is_empty() {
            return Ok(0);
        }

        let result = self
            .collection
            .update_many(doc! { "_id": { "$in": ids } }, update_document(patch)?)
            .await?;
        Ok(result.matched_count as usize)
    }

    async fn delete_one(&mut self, target: &DeleteTarget) -> Result<bool, BenchError> {
        let filter = match target {
            DeleteTarget::AnyDocument => any_document(),
            DeleteTarget::Document(doc_ref) => match ObjectId::parse_str(&doc_ref.id) {
                Ok(oid) => doc! { "_id": oid },
                Err(_) => doc! { "_id": doc_ref.id.as_str() },
            },
        };
        let result = self.collection.delete_one(filter).await?;
        Ok(result.deleted_count > 0)
    }

    async fn count(&mut self) -> Result<usize, BenchError> {
        Ok(self.collection.count_documents(doc! {}).await? as usize)
    }
}
