//! In-memory [`VectorStore`] implementation for tests and local runs.
//!
//! Records live in a `Vec` behind `std::sync::RwLock`. Query is brute-force
//! cosine similarity over every stored vector. Like a remote index, the
//! store refuses reads and writes until [`ensure_index`] has run, and
//! rejects vectors whose length differs from the index dimension.
//!
//! [`ensure_index`]: VectorStore::ensure_index

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::config::EMBEDDING_DIMS;
use crate::embedding::cosine_similarity;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{QueryResult, ScoredRecord, VectorRecord};

use super::VectorStore;

pub struct InMemoryStore {
    index_name: String,
    dims: usize,
    created: AtomicBool,
    records: RwLock<Vec<VectorRecord>>,
}

impl InMemoryStore {
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            dims: EMBEDDING_DIMS,
            created: AtomicBool::new(false),
            records: RwLock::new(Vec::new()),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored record, in insertion order.
    pub fn records(&self) -> Vec<VectorRecord> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }

    fn require_index(&self) -> PipelineResult<()> {
        if !self.created.load(Ordering::Acquire) {
            return Err(PipelineError::StoreFailure(format!(
                "index '{}' does not exist",
                self.index_name
            )));
        }
        Ok(())
    }

    fn require_dims(&self, vector: &[f32]) -> PipelineResult<()> {
        if vector.len() != self.dims {
            return Err(PipelineError::StoreFailure(format!(
                "vector dimension {} does not match index dimension {}",
                vector.len(),
                self.dims
            )));
        }
        Ok(())
    }
}

fn poisoned<T>(_: T) -> PipelineError {
    PipelineError::StoreFailure("in-memory index lock poisoned".to_string())
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn index_name(&self) -> &str {
        &self.index_name
    }

    async fn ensure_index(&self) -> PipelineResult<()> {
        if !self.created.swap(true, Ordering::AcqRel) {
            tracing::info!(index = %self.index_name, dims = self.dims, "created in-memory index");
        }
        Ok(())
    }

    async fn upsert(&self, records: &[VectorRecord]) -> PipelineResult<()> {
        self.require_index()?;
        for r in records {
            self.require_dims(&r.values)?;
        }

        let mut stored = self.records.write().map_err(poisoned)?;
        for r in records {
            match stored.iter_mut().find(|s| s.id == r.id) {
                Some(existing) => *existing = r.clone(),
                None => stored.push(r.clone()),
            }
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> PipelineResult<QueryResult> {
        self.require_index()?;
        self.require_dims(vector)?;

        let stored = self.records.read().map_err(poisoned)?;
        let mut matches: Vec<ScoredRecord> = stored
            .iter()
            .map(|r| ScoredRecord {
                id: r.id.clone(),
                score: cosine_similarity(vector, &r.values),
                metadata: r.metadata.clone(),
            })
            .collect();
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(top_k);
        Ok(matches)
    }
}
