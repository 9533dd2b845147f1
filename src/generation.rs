//! Language-model generation adapter.
//!
//! Wraps a question and its retrieved context in a fixed instruction
//! template that tells the model to answer only from the context and to
//! reply with [`NOT_ENOUGH_INFORMATION`] otherwise. The instruction is a
//! request to the model; the returned answer is not checked for grounding.
//!
//! Backends speak the OpenAI chat-completions protocol (Groq and OpenAI both
//! do). Decoding uses a fixed low temperature. Failures are not retried.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{self, GenerationConfig};
use crate::error::{PipelineError, PipelineResult};

/// Sentinel the model is instructed to return when the context is insufficient.
pub const NOT_ENOUGH_INFORMATION: &str = "Not enough information.";

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[async_trait]
pub trait Generator: Send + Sync {
    fn model_name(&self) -> &str;

    /// Send a fully-formed prompt and return the model's reply.
    async fn complete(&self, prompt: &str) -> PipelineResult<String>;
}

/// Render the instruction template for `query` grounded on `context`.
pub fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "You are a helpful legal assistant.\n\
         Use ONLY the given context to answer the question.\n\
         If not found, reply: \"{sentinel}\"\n\
         \n\
         Question: {query}\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Answer:\n",
        sentinel = NOT_ENOUGH_INFORMATION,
        query = query,
        context = context,
    )
}

/// Answer `query` from `context` with the given generator.
pub async fn answer(generator: &dyn Generator, query: &str, context: &str) -> PipelineResult<String> {
    let prompt = build_prompt(query, context);
    generator.complete(&prompt).await
}

// ============ Disabled ============

/// Always fails; used when `generation.provider = "disabled"`.
pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _prompt: &str) -> PipelineResult<String> {
        Err(PipelineError::GenerationFailure(
            "generation provider is disabled".to_string(),
        ))
    }
}

// ============ Chat completions ============

/// Generator for OpenAI-compatible `POST {base_url}/chat/completions`.
pub struct ChatCompletionsGenerator {
    base_url: String,
    model: String,
    temperature: f32,
    api_key: String,
    client: reqwest::Client,
}

impl ChatCompletionsGenerator {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        api_key: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature,
            api_key,
            client,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

fn first_answer(response: ChatResponse) -> PipelineResult<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| PipelineError::GenerationFailure("model returned no choices".to_string()))
}

#[async_trait]
impl Generator for ChatCompletionsGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> PipelineResult<String> {
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.trim())
            .json(&body)
            .send()
            .await
            .map_err(PipelineError::generation)?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(PipelineError::GenerationFailure(format!(
                "chat completions returned {}: {}",
                status, text
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(PipelineError::generation)?;
        first_answer(parsed)
    }
}

/// Create the configured [`Generator`].
///
/// | Config Value | Endpoint | Credential |
/// |-------------|----------|------------|
/// | `"groq"` | `https://api.groq.com/openai/v1` | `GROQ_API_KEY` |
/// | `"openai"` | `https://api.openai.com/v1` | `OPENAI_API_KEY` |
/// | `"disabled"` | none | none |
pub fn create_generator(config: &GenerationConfig) -> anyhow::Result<Arc<dyn Generator>> {
    let (default_url, key_env) = match config.provider.as_str() {
        "disabled" => return Ok(Arc::new(DisabledGenerator)),
        "groq" => (GROQ_BASE_URL, config::GROQ_API_KEY_ENV),
        "openai" => (OPENAI_BASE_URL, config::OPENAI_API_KEY_ENV),
        other => anyhow::bail!("Unknown generation provider: {}", other),
    };

    let base_url = config.base_url.clone().unwrap_or_else(|| default_url.to_string());
    let generator = ChatCompletionsGenerator::new(
        base_url,
        config.model.clone(),
        config.temperature,
        config::api_key(key_env)?,
        Duration::from_secs(config.timeout_secs),
    )?;
    tracing::info!(provider = %config.provider, model = %config.model, "generator ready");
    Ok(Arc::new(generator))
}
