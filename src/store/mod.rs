//! Vector store abstraction.
//!
//! The [`VectorStore`] trait is the only way the pipelines touch persisted
//! vectors. Backends:
//!
//! | Backend | Module | Use |
//! |---------|--------|-----|
//! | Pinecone serverless index | [`pinecone`] | production |
//! | In-process brute-force cosine index | [`memory`] | tests, local runs |
//!
//! # Contract
//!
//! - [`ensure_index`](VectorStore::ensure_index) is a one-time startup action
//!   and is idempotent: it checks for the index before creating it.
//! - [`upsert`](VectorStore::upsert) overwrites records with an existing id
//!   and inserts the rest, in one call.
//! - [`query`](VectorStore::query) returns at most `top_k` records ranked by
//!   descending cosine similarity. Order among equal scores is unspecified.
//! - Service failures surface as [`PipelineError::StoreFailure`]; nothing is
//!   silently dropped.
//!
//! [`PipelineError::StoreFailure`]: crate::error::PipelineError::StoreFailure

pub mod memory;
pub mod pinecone;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::error::PipelineResult;
use crate::models::{QueryResult, VectorRecord};

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Name of the backing index.
    fn index_name(&self) -> &str;

    /// Create the index if it does not exist yet.
    async fn ensure_index(&self) -> PipelineResult<()>;

    /// Insert or overwrite records by id.
    async fn upsert(&self, records: &[VectorRecord]) -> PipelineResult<()>;

    /// Return the `top_k` most similar records, best first.
    async fn query(&self, vector: &[f32], top_k: usize) -> PipelineResult<QueryResult>;
}

/// Create the configured [`VectorStore`] for `index_name`.
pub fn create_store(config: &StoreConfig, index_name: &str) -> anyhow::Result<Arc<dyn VectorStore>> {
    match config.provider.as_str() {
        "pinecone" => Ok(Arc::new(pinecone::PineconeStore::new(config, index_name)?)),
        "memory" => Ok(Arc::new(memory::InMemoryStore::new(index_name))),
        other => anyhow::bail!("Unknown store provider: {}", other),
    }
}
