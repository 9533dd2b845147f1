//! # docqa
//!
//! Retrieval-augmented question answering over uploaded documents.
//!
//! Text and PDF documents are split into overlapping chunks, embedded,
//! and stored in a similarity index. Questions are embedded the same way,
//! the closest chunks are retrieved, and a language model answers from
//! those chunks alone, returning the answer with cited sources.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────────────┐   ┌─────────────┐
//! │  Upload  │──▶│ Extract → Chunk → Embed  │──▶│ VectorStore │
//! └──────────┘   └──────────────────────────┘   └──────┬──────┘
//!                                                       │ query
//! ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌───────▼─────┐
//! │  Answer  │◀──│Generator │◀──│ Assemble │◀──│  Retrieve   │
//! └──────────┘   └──────────┘   └──────────┘   └─────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration, environment credentials, fixed index constants |
//! | [`error`] | Typed error taxonomy shared by every stage |
//! | [`models`] | `Document`, `Chunk`, `VectorRecord`, `ScoredRecord`, results |
//! | [`chunk`] | Fixed-size overlapping chunker |
//! | [`extract`] | `.txt` / `.pdf` text extraction |
//! | [`embedding`] | Embedding provider trait, local and OpenAI backends |
//! | [`store`] | Vector store trait, Pinecone and in-memory backends |
//! | [`ingest`] | Ingestion pipeline |
//! | [`retrieve`] | Retrieval pipeline |
//! | [`context`] | Context assembly with provenance |
//! | [`generation`] | Instruction template and chat-completions backend |
//! | [`service`] | Dependency-injected wiring of all of the above |
//! | [`server`] | Axum HTTP API |
//! | [`logging`] | Tracing subscriber setup |

pub mod chunk;
pub mod config;
pub mod context;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generation;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod retrieve;
pub mod server;
pub mod service;
pub mod store;

pub use error::{PipelineError, PipelineResult};
pub use service::QaService;
