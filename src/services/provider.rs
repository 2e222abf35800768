use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::CoreConfig;

const ERROR_SNIPPET_CHARS: usize = 400;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("provider response has no candidate text")]
    MissingText,
}

/// The remote structured-generation boundary.
///
/// Implementations take a credential, a model name, a free-text prompt and a
/// response schema, and return the raw text of the first candidate.
pub trait GenerativeProvider {
    fn generate_structured(
        &self,
        credential: &str,
        model: &str,
        prompt: &str,
        schema: &Value,
    ) -> Result<String, ProviderError>;
}

pub struct GeminiProvider {
    client: Client,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(GeminiProvider {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(cfg: &CoreConfig) -> Result<Self, ProviderError> {
        Self::new(cfg.base_url.clone(), cfg.timeout)
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

impl GenerativeProvider for GeminiProvider {
    fn generate_structured(
        &self,
        credential: &str,
        model: &str,
        prompt: &str,
        schema: &Value,
    ) -> Result<String, ProviderError> {
        let body = request_body(prompt, schema);

        // Key goes in a header so it never shows up in reqwest's URL-bearing errors.
        let resp = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", credential)
            .json(&body)
            .send()?;

        let status = resp.status();
        let text = resp.text()?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message: extract_error_message(status, &text),
            });
        }

        extract_candidate_text(&text)
    }
}

pub fn request_body(prompt: &str, schema: &Value) -> Value {
    json!({
        "contents": [
            { "role": "user", "parts": [ { "text": prompt } ] }
        ],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": schema
        }
    })
}

pub fn extract_candidate_text(body: &str) -> Result<String, ProviderError> {
    #[derive(Deserialize)]
    struct Envelope {
        candidates: Option<Vec<Candidate>>,
    }
    #[derive(Deserialize)]
    struct Candidate {
        content: Option<Content>,
    }
    #[derive(Deserialize)]
    struct Content {
        parts: Option<Vec<Part>>,
    }
    #[derive(Deserialize)]
    struct Part {
        text: Option<String>,
    }

    let env: Envelope = serde_json::from_str(body).map_err(|_| ProviderError::MissingText)?;

    // Structured output can arrive split across parts; join them in order.
    let text: String = env
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content)
        .and_then(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.trim().is_empty() {
        return Err(ProviderError::MissingText);
    }

    Ok(text)
}

fn extract_error_message(status: StatusCode, body_text: &str) -> String {
    // { "error": { "message": "..." } } or { "message": "..." }
    if let Ok(v) = serde_json::from_str::<Value>(body_text) {
        if let Some(msg) = v
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return msg.to_string();
        }
        if let Some(msg) = v.get("message").and_then(|m| m.as_str()) {
            return msg.to_string();
        }
    }

    let trimmed = body_text.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string();
    }

    if trimmed.chars().count() > ERROR_SNIPPET_CHARS {
        let snippet: String = trimmed.chars().take(ERROR_SNIPPET_CHARS).collect();
        format!("{snippet}...")
    } else {
        trimmed.to_string()
    }
}
