//! Pinecone serverless index backend.
//!
//! Talks to the Pinecone REST API directly:
//!
//! | Plane | Call | Purpose |
//! |-------|------|---------|
//! | control | `GET /indexes` | list existing indexes |
//! | control | `POST /indexes` | create the index (cosine, 384 dims, serverless) |
//! | control | `GET /indexes/{name}` | readiness and data-plane host |
//! | data | `POST https://{host}/vectors/upsert` | write records |
//! | data | `POST https://{host}/query` | top-k similarity search with metadata |
//!
//! The data-plane host is resolved once and cached for the life of the
//! process. Requires `PINECONE_API_KEY`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::config::{self, StoreConfig, EMBEDDING_DIMS};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{QueryResult, RecordMetadata, ScoredRecord, VectorRecord};

use super::VectorStore;

const API_VERSION: &str = "2025-01";

/// Polls of `describe_index` while waiting for a new index to become ready.
const READY_POLL_ATTEMPTS: u32 = 60;
const READY_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct PineconeStore {
    index_name: String,
    cloud: String,
    region: String,
    control_url: String,
    api_key: String,
    client: reqwest::Client,
    host: OnceCell<String>,
}

impl PineconeStore {
    pub fn new(config: &StoreConfig, index_name: &str) -> anyhow::Result<Self> {
        let api_key = config::api_key(config::PINECONE_API_KEY_ENV)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            index_name: index_name.to_string(),
            cloud: config.cloud.clone(),
            region: config.region.clone(),
            control_url: config.control_url.trim_end_matches('/').to_string(),
            api_key,
            client,
            host: OnceCell::new(),
        })
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    async fn send<T: for<'de> Deserialize<'de>>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> PipelineResult<T> {
        let response = builder.send().await.map_err(PipelineError::store)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::StoreFailure(format!(
                "Pinecone API error {}: {}",
                status, body
            )));
        }
        response.json::<T>().await.map_err(PipelineError::store)
    }

    async fn list_indexes(&self) -> PipelineResult<Vec<IndexDescription>> {
        let url = format!("{}/indexes", self.control_url);
        let list: IndexList = self.send(self.request(reqwest::Method::GET, url)).await?;
        Ok(list.indexes)
    }

    async fn describe_index(&self) -> PipelineResult<IndexDescription> {
        let url = format!("{}/indexes/{}", self.control_url, self.index_name);
        self.send(self.request(reqwest::Method::GET, url)).await
    }

    async fn create_index(&self) -> PipelineResult<()> {
        let url = format!("{}/indexes", self.control_url);
        let body = serde_json::json!({
            "name": self.index_name,
            "dimension": EMBEDDING_DIMS,
            "metric": "cosine",
            "spec": {
                "serverless": {
                    "cloud": self.cloud,
                    "region": self.region,
                }
            }
        });
        let _: IndexDescription = self
            .send(self.request(reqwest::Method::POST, url).json(&body))
            .await?;
        Ok(())
    }

    async fn wait_until_ready(&self) -> PipelineResult<IndexDescription> {
        for _ in 0..READY_POLL_ATTEMPTS {
            let desc = self.describe_index().await?;
            if desc.status.as_ref().is_some_and(|s| s.ready) {
                return Ok(desc);
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
        Err(PipelineError::StoreFailure(format!(
            "index '{}' did not become ready",
            self.index_name
        )))
    }

    /// Data-plane host, resolved via `describe_index` on first use.
    async fn host(&self) -> PipelineResult<&str> {
        self.host
            .get_or_try_init(|| async {
                let desc = self.describe_index().await?;
                host_of(&desc)
            })
            .await
            .map(String::as_str)
    }
}

fn host_of(desc: &IndexDescription) -> PipelineResult<String> {
    if desc.dimension.is_some_and(|d| d != EMBEDDING_DIMS) {
        return Err(PipelineError::DimensionMismatch {
            expected: EMBEDDING_DIMS,
            actual: desc.dimension.unwrap_or_default(),
        });
    }
    match desc.host.as_deref() {
        Some(h) if !h.is_empty() => Ok(data_plane_url(h)),
        _ => Err(PipelineError::StoreFailure(format!(
            "index '{}' has no host yet",
            desc.name
        ))),
    }
}

fn data_plane_url(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", host.trim_end_matches('/'))
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    fn index_name(&self) -> &str {
        &self.index_name
    }

    async fn ensure_index(&self) -> PipelineResult<()> {
        let exists = self
            .list_indexes()
            .await?
            .iter()
            .any(|i| i.name == self.index_name);

        let desc = if exists {
            tracing::info!(index = %self.index_name, "index exists");
            self.describe_index().await?
        } else {
            tracing::info!(
                index = %self.index_name,
                dims = EMBEDDING_DIMS,
                cloud = %self.cloud,
                region = %self.region,
                "creating index"
            );
            self.create_index().await?;
            self.wait_until_ready().await?
        };

        let host = host_of(&desc)?;
        // Another task may have resolved it concurrently; both values agree.
        let _ = self.host.set(host);
        Ok(())
    }

    async fn upsert(&self, records: &[VectorRecord]) -> PipelineResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let url = format!("{}/vectors/upsert", self.host().await?);
        let body = UpsertRequest {
            vectors: records.iter().map(WireVector::from).collect(),
        };
        let response: UpsertResponse = self
            .send(self.request(reqwest::Method::POST, url).json(&body))
            .await?;
        tracing::debug!(
            index = %self.index_name,
            upserted = response.upserted_count.unwrap_or_default(),
            "upsert complete"
        );
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> PipelineResult<QueryResult> {
        let url = format!("{}/query", self.host().await?);
        let body = serde_json::json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
            "includeValues": false,
        });
        let response: QueryResponse = self
            .send(self.request(reqwest::Method::POST, url).json(&body))
            .await?;
        response.matches.into_iter().map(ScoredRecord::try_from).collect()
    }
}

// ============ Wire types ============

#[derive(Debug, Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexDescription>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    name: String,
    #[serde(default)]
    dimension: Option<usize>,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    status: Option<IndexStatus>,
}

#[derive(Debug, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<WireVector<'a>>,
}

#[derive(Debug, Serialize)]
struct WireVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a RecordMetadata,
}

impl<'a> From<&'a VectorRecord> for WireVector<'a> {
    fn from(r: &'a VectorRecord) -> Self {
        Self {
            id: &r.id,
            values: &r.values,
            metadata: &r.metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<WireMatch>,
}

#[derive(Debug, Deserialize)]
struct WireMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<WireMetadata>,
}

/// Pinecone stores every number as a double, so `chunk` comes back as `3.0`.
#[derive(Debug, Deserialize)]
struct WireMetadata {
    #[serde(default)]
    text: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    chunk: f64,
}

impl TryFrom<WireMatch> for ScoredRecord {
    type Error = PipelineError;

    fn try_from(m: WireMatch) -> PipelineResult<Self> {
        let meta = m.metadata.ok_or_else(|| {
            PipelineError::StoreFailure(format!("match {} has no metadata", m.id))
        })?;
        Ok(ScoredRecord {
            id: m.id,
            score: m.score,
            metadata: RecordMetadata {
                text: meta.text,
                source: meta.source,
                chunk: meta.chunk as usize,
            },
        })
    }
}
