//! Typed error taxonomy for the ingestion and question-answering pipelines.
//!
//! Every adapter and pipeline stage returns [`PipelineError`], so callers can
//! branch on the failure kind instead of matching on message text. Each
//! variant maps to a stable machine-readable code (see [`PipelineError::code`])
//! used in HTTP error envelopes and per-document ingestion results.
//!
//! | Variant | Code | Raised by |
//! |---------|------|-----------|
//! | `UnsupportedFileType` | `unsupported_file_type` | extension check |
//! | `DecodeError` | `decode_error` | `.txt` extraction |
//! | `PdfExtraction` | `pdf_extraction` | malformed PDF |
//! | `PdfExtractionEmpty` | `pdf_extraction_empty` | PDF without text |
//! | `InvalidInput` | `invalid_input` | empty embed input, bad query |
//! | `EmbeddingFailure` | `embedding_failure` | embedding backend |
//! | `DimensionMismatch` | `dimension_mismatch` | embedding/index dims disagree |
//! | `StoreFailure` | `store_failure` | vector store |
//! | `GenerationFailure` | `generation_failure` | language model |
//! | `InvalidConfiguration` | `invalid_configuration` | chunk size/overlap |

use thiserror::Error;

/// Convenience alias used throughout the pipeline modules.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unsupported file type '{extension}': only .pdf or .txt allowed")]
    UnsupportedFileType { extension: String },

    #[error("document is not valid UTF-8 text: {0}")]
    DecodeError(#[from] std::str::Utf8Error),

    #[error("PDF extraction failed: {0}")]
    PdfExtraction(String),

    #[error("PDF contains no extractable text")]
    PdfExtractionEmpty,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("embedding failed: {0}")]
    EmbeddingFailure(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("vector store error: {0}")]
    StoreFailure(String),

    #[error("generation failed: {0}")]
    GenerationFailure(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl PipelineError {
    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::UnsupportedFileType { .. } => "unsupported_file_type",
            PipelineError::DecodeError(_) => "decode_error",
            PipelineError::PdfExtraction(_) => "pdf_extraction",
            PipelineError::PdfExtractionEmpty => "pdf_extraction_empty",
            PipelineError::InvalidInput(_) => "invalid_input",
            PipelineError::EmbeddingFailure(_) => "embedding_failure",
            PipelineError::DimensionMismatch { .. } => "dimension_mismatch",
            PipelineError::StoreFailure(_) => "store_failure",
            PipelineError::GenerationFailure(_) => "generation_failure",
            PipelineError::InvalidConfiguration(_) => "invalid_configuration",
        }
    }

    /// True when the failure was caused by the caller's input rather than
    /// an upstream service or server-side misconfiguration.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::UnsupportedFileType { .. }
                | PipelineError::DecodeError(_)
                | PipelineError::PdfExtraction(_)
                | PipelineError::PdfExtractionEmpty
                | PipelineError::InvalidInput(_)
        )
    }

    pub(crate) fn embedding(err: impl std::fmt::Display) -> Self {
        PipelineError::EmbeddingFailure(err.to_string())
    }

    pub(crate) fn store(err: impl std::fmt::Display) -> Self {
        PipelineError::StoreFailure(err.to_string())
    }

    pub(crate) fn generation(err: impl std::fmt::Display) -> Self {
        PipelineError::GenerationFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_message_names_extension() {
        let err = PipelineError::UnsupportedFileType {
            extension: ".docx".to_string(),
        };
        assert!(err.to_string().contains(".docx"));
        assert!(err.to_string().contains("only .pdf or .txt allowed"));
        assert_eq!(err.code(), "unsupported_file_type");
    }

    #[test]
    fn decode_error_converts_from_utf8_error() {
        let bytes = [0xff, 0xfe, 0x00];
        let err: PipelineError = std::str::from_utf8(&bytes).unwrap_err().into();
        assert_eq!(err.code(), "decode_error");
        assert!(err.is_client_error());
    }

    #[test]
    fn upstream_failures_are_server_errors() {
        assert!(!PipelineError::store("down").is_client_error());
        assert!(!PipelineError::embedding("oom").is_client_error());
        assert!(!PipelineError::generation("timeout").is_client_error());
        assert!(!PipelineError::DimensionMismatch {
            expected: 384,
            actual: 768
        }
        .is_client_error());
    }
}
