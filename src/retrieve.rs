//! Retrieval pipeline: embed the question, then query the vector store.
//!
//! The query is embedded by the same [`EmbeddingProvider`] used at ingestion
//! time, and the vector is checked against the index dimension before it is
//! sent. Nothing is cached between calls.

use std::sync::Arc;
use std::time::Instant;

use crate::embedding::{embed_query, EmbeddingProvider};
use crate::error::{PipelineError, PipelineResult};
use crate::models::QueryResult;
use crate::store::VectorStore;

pub struct RetrievalPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl RetrievalPipeline {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Return up to `top_k` stored chunks most similar to `query`, best first.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> PipelineResult<QueryResult> {
        if query.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "query must not be empty".to_string(),
            ));
        }
        if top_k == 0 {
            return Err(PipelineError::InvalidInput(
                "top_k must be >= 1".to_string(),
            ));
        }

        let started = Instant::now();
        let vector = embed_query(self.embedder.as_ref(), query).await?;
        let matches = self.store.query(&vector, top_k).await?;
        tracing::debug!(
            top_k,
            matches = matches.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "retrieval complete"
        );
        Ok(matches)
    }
}
