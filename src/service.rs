//! Question-answering service: the wiring of all pipelines and adapters.
//!
//! A [`QaService`] is built once at startup from explicitly injected
//! adapters and shared (behind an `Arc`) by every request. It holds no
//! mutable state of its own; all persistence belongs to the vector store.
//!
//! ```text
//! upload ──▶ IngestionPipeline ──▶ VectorStore.upsert
//! question ─▶ RetrievalPipeline ─▶ VectorStore.query ─▶ assemble ─▶ Generator
//! ```

use std::sync::Arc;

use crate::config::{Config, INDEX_NAME};
use crate::context::assemble;
use crate::embedding::{create_provider, EmbeddingProvider};
use crate::error::PipelineResult;
use crate::generation::{self, create_generator, Generator};
use crate::ingest::IngestionPipeline;
use crate::models::{AnswerResponse, Document, IngestionResult};
use crate::retrieve::RetrievalPipeline;
use crate::store::{create_store, VectorStore};

pub struct QaService {
    ingestion: IngestionPipeline,
    retrieval: RetrievalPipeline,
    generator: Arc<dyn Generator>,
    store: Arc<dyn VectorStore>,
    top_k: usize,
}

impl QaService {
    /// Assemble a service from already-constructed adapters.
    pub fn new(
        config: &Config,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            ingestion: IngestionPipeline::new(
                embedder.clone(),
                store.clone(),
                config.chunking,
                config.embedding.batch_size,
            ),
            retrieval: RetrievalPipeline::new(embedder, store.clone()),
            generator,
            store,
            top_k: config.retrieval.top_k,
        }
    }

    /// Build every adapter from configuration and make sure the index exists.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let embedder = create_provider(&config.embedding)?;
        let store = create_store(&config.store, INDEX_NAME)?;
        let generator = create_generator(&config.generation)?;
        store.ensure_index().await?;
        Ok(Self::new(config, embedder, store, generator))
    }

    pub fn index_name(&self) -> &str {
        self.store.index_name()
    }

    pub async fn ingest(&self, documents: Vec<Document>) -> Vec<IngestionResult> {
        self.ingestion.ingest_all(documents).await
    }

    /// Answer `query` from the `top_k` best-matching chunks.
    ///
    /// Any failure (embedding, store query, generation) aborts the whole
    /// answer; there is no partial fallback.
    pub async fn ask(&self, query: &str, top_k: Option<usize>) -> PipelineResult<AnswerResponse> {
        let top_k = top_k.unwrap_or(self.top_k);
        let matches = self.retrieval.retrieve(query, top_k).await?;
        let context = assemble(&matches);
        let answer = generation::answer(self.generator.as_ref(), query, &context.text).await?;
        tracing::info!(sources = context.sources.len(), "answered question");

        Ok(AnswerResponse {
            query: query.to_string(),
            answer,
            sources: context.sources,
        })
    }
}
