//! OpenAI-compatible chat backend over HTTP.
//!
//! Any endpoint speaking the `/chat/completions` shape works (hosted APIs or
//! a local inference server). The orchestrator enforces its own turn
//! timeout; the client timeout here only bounds a hung connection.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

use anihan_agent::llm::LanguageBackend;
use anihan_core::config::LlmConfig;
use anihan_core::domain::conversation::Message;

pub struct OpenAiCompatBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl OpenAiCompatBackend {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| anyhow!("llm.base_url is required for the HTTP backend"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .context("building llm http client")?;

        Ok(Self { client, base_url, model: config.model.clone(), api_key: config.api_key.clone() })
    }
}

fn chat_payload(model: &str, system_prompt: &str, history: &[Message]) -> Value {
    let mut messages = vec![json!({"role": "system", "content": system_prompt})];
    for message in history {
        messages.push(json!({
            "role": message.role.as_str(),
            "content": message.content,
        }));
    }
    json!({"model": model, "messages": messages})
}

fn extract_content(payload: &Value) -> Option<String> {
    payload
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_owned)
}

#[async_trait]
impl LanguageBackend for OpenAiCompatBackend {
    async fn generate(&self, system_prompt: &str, history: &[Message]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let mut request =
            self.client.post(url).json(&chat_payload(&self.model, system_prompt, history));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request
            .send()
            .await
            .context("llm request failed")?
            .error_for_status()
            .context("llm returned an error status")?;
        let payload: Value = response.json().await.context("llm response was not json")?;
        extract_content(&payload).ok_or_else(|| anyhow!("malformed completion payload"))
    }
}
