//! CouchDB adapter over the HTTP API.
//!
//! Every request carries the configured credentials as basic auth. The
//! benchmark database is named after the workload collection.

use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::{DeleteCursor, DeleteTarget, DocRef, DocumentStore};
use crate::conf::{CouchConfig, FindConfig, UpdateConfig};
use crate::core::{BackendKind, BenchError};
use crate::dataset::Document;

const DESIGN_PREFIX: &str = "_design/";

pub struct CouchStore {
    client: Client,
    base_url: Url,
    db: String,
    user: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    docs: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct AllDocsResponse {
    rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
struct AllDocsRow {
    id: String,
    value: RowValue,
    #[serde(default)]
    doc: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RowValue {
    rev: String,
}

#[derive(Debug, Deserialize)]
struct BulkResult {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DbInfo {
    doc_count: usize,
}

impl CouchStore {
    pub async fn connect(config: &CouchConfig, db: &str) -> Result<Self, BenchError> {
        let connection_error = |reason: String| BenchError::ConnectionError {
            backend: BackendKind::Couchdb,
            reason,
        };

        let base_url = Url::parse(&config.base_url()).map_err(|e| connection_error(e.to_string()))?;
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| connection_error(e.to_string()))?;

        let store = Self {
            client,
            base_url,
            db: db.to_string(),
            user: config.user.clone(),
            password: config.password.clone(),
        };

        let response = store
            .request(Method::GET, &[])?
            .send()
            .await
            .map_err(|e| connection_error(e.to_string()))?;
        if !response.status().is_success() {
            return Err(connection_error(format!(
                "server answered {}",
                response.status()
            )));
        }

        info!("connected to couchdb at {}", config.base_url());
        Ok(store)
    }

    fn url(&self, segments: &[&str]) -> Result<Url, BenchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BenchError::BackendError(format!("invalid base url {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, BenchError> {
        Ok(self
            .client
            .request(method, self.url(segments)?)
            .basic_auth(&self.user, Some(&self.password)))
    }

    async fn all_docs(&self, limit: Option<usize>) -> Result<Vec<AllDocsRow>, BenchError> {
        let mut request = self
            .request(Method::GET, &[self.db.as_str(), "_all_docs"])?
            .query(&[("include_docs", "true")]);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        let response = expect_success(request.send().await?, "listing documents").await?;
        let listing: AllDocsResponse = response.json().await?;
        Ok(listing
            .rows
            .into_iter()
            .filter(|row| !row.id.starts_with(DESIGN_PREFIX))
            .collect())
    }

    async fn delete_ref(&self, doc_ref: &DocRef) -> Result<(), BenchError> {
        let mut request = self.request(Method::DELETE, &[self.db.as_str(), doc_ref.id.as_str()])?;
        if let Some(rev) = &doc_ref.rev {
            request = request.query(&[("rev", rev)]);
        }
        expect_success(request.send().await?, "deleting document").await?;
        Ok(())
    }
}

/// Mango selector: `{"$or": [{field: value}, ...]}` capped at `limit`.
pub fn find_body(query: &FindConfig) -> Value {
    let terms: Vec<Value> = query
        .any_of
        .iter()
        .map(|term| {
            let mut clause = Map::new();
            clause.insert(term.field.clone(), term.value.clone());
            Value::Object(clause)
        })
        .collect();
    json!({
        "selector": { "$or": terms },
        "limit": query.limit,
    })
}

async fn expect_success(response: Response, action: &str) -> Result<Response, BenchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BenchError::BackendError(format!(
        "couchdb: {action} failed with {status}: {body}"
    )))
}

#[async_trait]
impl DocumentStore for CouchStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Couchdb
    }

    async fn reset(&mut self) -> Result<(), BenchError> {
        debug!("recreating couchdb database {}", self.db);
        let response = self.request(Method::DELETE, &[self.db.as_str()])?.send().await?;
        if response.status() != StatusCode::NOT_FOUND {
            expect_success(response, "dropping database").await?;
        }
        let response = self.request(Method::PUT, &[self.db.as_str()])?.send().await?;
        expect_success(response, "creating database").await?;
        Ok(())
    }

    async fn insert_one(&mut self, doc: &Document) -> Result<(), BenchError> {
        let response = self.request(Method::POST, &[self.db.as_str()])?.json(doc).send().await?;
        expect_success(response, "inserting document").await?;
        Ok(())
    }

    async fn find(&mut self, query: &FindConfig) -> Result<usize, BenchError> {
        let response = self
            .request(Method::POST, &[self.db.as_str(), "_find"])?
            .json(&find_body(query))
            .send()
            .await?;
        let found: FindResponse = expect_success(response, "finding documents")
            .await?
            .json()
            .await?;
        Ok(found.docs.len())
    }

    async fn update(&mut self, count: usize, patch: &UpdateConfig) -> Result<usize, BenchError> {
        if count == 0 {
            return Ok(0);
        }

        let docs: Vec<Map<String, Value>> = self
            .all_docs(Some(count))
            .await?
            .into_iter()
            .filter_map(|row| row.doc)
            .map(|mut doc| {
                patch.apply(&mut doc);
                doc
            })
            .collect();
        if docs.is_empty() {
            return Ok(0);
        }

        let response = self
            .request(Method::POST, &[self.db.as_str(), "_bulk_docs"])?
            .json(&json!({ "docs": docs }))
            .send()
            .await?;
        let results: Vec<BulkResult> = expect_success(response, "updating documents")
            .await?
            .json()
            .await?;

        if let Some(failed) = results.iter().find(|r| r.error.is_some()) {
            return Err(BenchError::BackendError(format!(
                "couchdb: updating {} failed: {} ({})",
                failed.id.as_deref().unwrap_or("?"),
                failed.error.as_deref().unwrap_or_default(),
                failed.reason.as_deref().unwrap_or_default(),
            )));
        }
        Ok(results.len())
    }

    async fn prepare_delete(&mut self, count: usize) -> Result<DeleteCursor, BenchError> {
        let listing = self
            .all_docs(None)
            .await?
            .into_iter()
            .map(|row| DocRef {
                id: row.id,
                rev: Some(row.value.rev),
            })
            .collect();
        DeleteCursor::snapshot(count, listing)
    }

    async fn delete_one(&mut self, target: &DeleteTarget) -> Result<bool, BenchError> {
        match target {
            DeleteTarget::Document(doc_ref) => {
                self.delete_ref(doc_ref).await?;
                Ok(true)
            }
            DeleteTarget::AnyDocument => {
                let Some(row) = self.all_docs(Some(1)).await?.into_iter().next() else {
                    return Ok(false);
                };
                self.delete_ref(&DocRef {
                    id: row.id,
                    rev: Some(row.value.rev),
                })
                .await?;
                Ok(true)
            }
        }
    }

    async fn count(&mut self) -> Result<usize, BenchError> {
        let response = self.request(Method::GET, &[self.db.as_str()])?.send().await?;
        let info: DbInfo = expect_success(response, "reading database info")
            .await?
            .json()
            .await?;
        Ok(info.doc_count)
    }
}
