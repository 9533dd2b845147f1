//! Core data models that flow through the ingestion and retrieval pipelines.
//!
//! Documents and chunks are request-scoped; [`VectorRecord`]s are owned by
//! the vector store once upserted. Nothing here is cached across requests.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::PipelineError;

/// An uploaded document, alive only for the duration of one ingestion.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub content: Vec<u8>,
}

impl Document {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Lowercased extension including the leading dot (`".pdf"`), or an
    /// empty string when the filename has none.
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default()
    }
}

/// A segment of a document's extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Filename of the document the chunk was cut from.
    pub source: String,
    /// Position of the chunk within its document, starting at 0.
    pub ordinal: usize,
    /// Character offset of the first character in the extracted text.
    pub start: usize,
    pub text: String,
}

/// Metadata persisted alongside every vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub text: String,
    pub source: String,
    pub chunk: usize,
}

/// The unit persisted in the vector store.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: RecordMetadata,
}

/// One ranked match from a similarity query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub id: String,
    pub score: f32,
    pub metadata: RecordMetadata,
}

/// Ranked matches for one query, best first.
pub type QueryResult = Vec<ScoredRecord>;

/// Citation for one retrieved chunk, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub id: String,
    pub source: String,
    pub chunk: usize,
    pub score: f32,
}

impl From<&ScoredRecord> for SourceRef {
    fn from(record: &ScoredRecord) -> Self {
        Self {
            id: record.id.clone(),
            source: record.metadata.source.clone(),
            chunk: record.metadata.chunk,
            score: record.score,
        }
    }
}

/// Outcome of ingesting a single document.
///
/// Serializes as `{filename, status: "success", chunks}` or
/// `{filename, status: "error", code, error}`.
#[derive(Debug)]
pub struct IngestionResult {
    pub filename: String,
    pub outcome: Result<usize, PipelineError>,
}

impl IngestionResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn chunks(&self) -> Option<usize> {
        self.outcome.as_ref().ok().copied()
    }

    pub fn error(&self) -> Option<&PipelineError> {
        self.outcome.as_ref().err()
    }
}

impl Serialize for IngestionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("filename", &self.filename)?;
        match &self.outcome {
            Ok(chunks) => {
                map.serialize_entry("status", "success")?;
                map.serialize_entry("chunks", chunks)?;
            }
            Err(e) => {
                map.serialize_entry("status", "error")?;
                map.serialize_entry("code", e.code())?;
                map.serialize_entry("error", &e.to_string())?;
            }
        }
        map.end()
    }
}

/// Response to a question: the model's answer plus ordered citations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub query: String,
    pub answer: String,
    pub sources: Vec<SourceRef>,
}
