//! Fake adapters shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use docqa::config::{Config, EMBEDDING_DIMS, INDEX_NAME};
use docqa::embedding::EmbeddingProvider;
use docqa::generation::{Generator, NOT_ENOUGH_INFORMATION};
use docqa::models::{QueryResult, VectorRecord};
use docqa::store::memory::InMemoryStore;
use docqa::store::VectorStore;
use docqa::{PipelineError, PipelineResult, QaService};

/// Deterministic bag-of-words embedder: each lowercase word is hashed
/// (FNV-1a) into one of 384 buckets. Exact strings can be pinned to a
/// chosen vector with [`KeywordEmbedder::pin`].
#[derive(Default)]
pub struct KeywordEmbedder {
    pinned: Mutex<HashMap<String, Vec<f32>>>,
}

impl KeywordEmbedder {
    pub fn pin(&self, text: &str, vector: Vec<f32>) {
        self.pinned
            .lock()
            .unwrap()
            .insert(text.to_string(), vector);
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        if let Some(v) = self.pinned.lock().unwrap().get(text) {
            return v.clone();
        }
        let mut v = vec![0.0f32; EMBEDDING_DIMS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hash: u64 = 0xcbf29ce484222325;
            for b in word.to_lowercase().bytes() {
                hash ^= b as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            v[(hash % EMBEDDING_DIMS as u64) as usize] += 1.0;
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn model_name(&self) -> &str {
        "keyword-test"
    }
    fn dims(&self) -> usize {
        EMBEDDING_DIMS
    }
    async fn embed(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}

/// Answers with the sentinel when the prompt's context is empty, otherwise
/// echoes the first context line. Records every prompt.
#[derive(Default)]
pub struct ScriptedGenerator {
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn model_name(&self) -> &str {
        "scripted"
    }
    async fn complete(&self, prompt: &str) -> PipelineResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let context = prompt
            .split_once("Context:\n")
            .and_then(|(_, rest)| rest.rsplit_once("\n\nAnswer:"))
            .map(|(ctx, _)| ctx.trim())
            .unwrap_or_default();
        if context.is_empty() {
            Ok(NOT_ENOUGH_INFORMATION.to_string())
        } else {
            Ok(format!("From context: {}", context.lines().next().unwrap_or_default()))
        }
    }
}

pub struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    fn model_name(&self) -> &str {
        "failing"
    }
    async fn complete(&self, _prompt: &str) -> PipelineResult<String> {
        Err(PipelineError::GenerationFailure(
            "model unavailable".to_string(),
        ))
    }
}

/// Store whose index is unreachable.
pub struct UnavailableStore;

#[async_trait]
impl VectorStore for UnavailableStore {
    fn index_name(&self) -> &str {
        INDEX_NAME
    }
    async fn ensure_index(&self) -> PipelineResult<()> {
        Ok(())
    }
    async fn upsert(&self, _records: &[VectorRecord]) -> PipelineResult<()> {
        Err(PipelineError::StoreFailure("connection refused".to_string()))
    }
    async fn query(&self, _vector: &[f32], _top_k: usize) -> PipelineResult<QueryResult> {
        Err(PipelineError::StoreFailure("connection refused".to_string()))
    }
}

/// Everything a test needs to drive and inspect a [`QaService`].
pub struct Harness {
    pub service: Arc<QaService>,
    pub store: Arc<InMemoryStore>,
    pub embedder: Arc<KeywordEmbedder>,
    pub generator: Arc<ScriptedGenerator>,
}

pub async fn harness() -> Harness {
    harness_with_config(Config::default()).await
}

pub async fn harness_with_config(config: Config) -> Harness {
    let store = Arc::new(InMemoryStore::new(INDEX_NAME));
    store.ensure_index().await.unwrap();
    let embedder = Arc::new(KeywordEmbedder::default());
    let generator = Arc::new(ScriptedGenerator::default());
    let service = Arc::new(QaService::new(
        &config,
        embedder.clone(),
        store.clone(),
        generator.clone(),
    ));
    Harness {
        service,
        store,
        embedder,
        generator,
    }
}

/// `len` characters of varied lowercase prose.
pub fn text_of_len(len: usize) -> String {
    let words = ["lease ", "tenant ", "landlord ", "rent ", "notice "];
    let mut s = String::with_capacity(len + 16);
    let mut i = 0;
    while s.len() < len {
        s.push_str(words[i % words.len()]);
        i += 1;
    }
    s.truncate(len);
    s
}

/// Minimal valid single-page PDF whose content stream is `content`.
/// Builds body then xref with correct byte offsets so pdf-extract can parse it.
pub fn minimal_pdf(content: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(
        format!(
            "4 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
            content.len(),
            content
        )
        .as_bytes(),
    );
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

/// PDF containing `phrase` drawn in Helvetica.
pub fn pdf_with_phrase(phrase: &str) -> Vec<u8> {
    minimal_pdf(&format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", phrase))
}
