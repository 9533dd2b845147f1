//! Ingestion pipeline orchestration.
//!
//! For each uploaded document: extension check → text extraction →
//! chunking → embedding → one batched upsert. Every chunk gets a fresh
//! UUID, so re-ingesting a document writes a new, disjoint set of records.
//!
//! Documents in a batch are independent: they are processed concurrently,
//! one document's failure is captured in its own [`IngestionResult`], and
//! results come back in input order. Nothing is retained after a document
//! has been upserted.

use futures_util::future::join_all;
use std::sync::Arc;
use uuid::Uuid;

use crate::chunk::chunk_document;
use crate::config::ChunkingConfig;
use crate::embedding::{embed_texts, EmbeddingProvider};
use crate::error::{PipelineError, PipelineResult};
use crate::extract::extract_text_blocking;
use crate::models::{Document, IngestionResult, RecordMetadata, VectorRecord};
use crate::store::VectorStore;

pub struct IngestionPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    chunking: ChunkingConfig,
    batch_size: usize,
}

impl IngestionPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        chunking: ChunkingConfig,
        batch_size: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            chunking,
            batch_size,
        }
    }

    /// Ingest one document, capturing any failure in the result.
    pub async fn ingest(&self, document: Document) -> IngestionResult {
        let outcome = self.try_ingest(&document).await;
        match &outcome {
            Ok(chunks) => {
                tracing::info!(filename = %document.filename, chunks, "ingested document")
            }
            Err(e) => tracing::warn!(
                filename = %document.filename,
                code = e.code(),
                error = %e,
                "document ingestion failed"
            ),
        }
        IngestionResult {
            filename: document.filename,
            outcome,
        }
    }

    /// Ingest several documents concurrently. Results preserve input order.
    pub async fn ingest_all(&self, documents: Vec<Document>) -> Vec<IngestionResult> {
        join_all(documents.into_iter().map(|d| self.ingest(d))).await
    }

    async fn try_ingest(&self, document: &Document) -> PipelineResult<usize> {
        let text = match extract_text_blocking(document.clone()).await {
            Ok(text) => text,
            Err(PipelineError::PdfExtractionEmpty) => {
                tracing::warn!(filename = %document.filename, "PDF has no extractable text");
                return Ok(0);
            }
            Err(e) => return Err(e),
        };

        let chunks = chunk_document(
            &document.filename,
            &text,
            self.chunking.size,
            self.chunking.overlap,
        )?;
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embed_texts(self.embedder.as_ref(), &texts, self.batch_size).await?;

        let records: Vec<VectorRecord> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, values)| VectorRecord {
                id: Uuid::new_v4().to_string(),
                values,
                metadata: RecordMetadata {
                    text: chunk.text,
                    source: chunk.source,
                    chunk: chunk.ordinal,
                },
            })
            .collect();

        let count = records.len();
        self.store.upsert(&records).await?;
        Ok(count)
    }
}
