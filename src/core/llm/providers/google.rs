//! Google Provider Implementation (API Key-based)
//!
//! Talks to the Generative Language API (`generateContent`). Text requests ask
//! for a JSON response body; image requests ask for `TEXT` + `IMAGE` response
//! modalities and surface the inline image as a data URI.

use crate::config::ProviderConfig;
use crate::core::llm::error::{ProviderError, Result};
use crate::core::llm::provider::{ModelProvider, ModelReply, ModelRequest};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Google provider (API key-based)
pub struct GoogleProvider {
    api_key: String,
    model: String,
    image_model: String,
    base_url: String,
    client: Client,
}

impl GoogleProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key: api_key.trim().to_string(),
            image_model: model.clone(),
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(config.api_key.clone().unwrap_or_default(), config.model.clone())
            .with_image_model(config.image_model.clone())
            .with_base_url(config.base_url.clone())
    }

    pub fn with_image_model(mut self, model: String) -> Self {
        self.image_model = model;
        self
    }

    /// Override the API host (tests point this at a mock server)
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_body(request: &ModelRequest) -> Value {
        let mut gen_config = serde_json::Map::new();
        if let Some(temp) = request.temperature {
            gen_config.insert("temperature".to_string(), json!(temp));
        }
        if let Some(max) = request.max_output_tokens {
            gen_config.insert("maxOutputTokens".to_string(), json!(max));
        }
        if request.wants_image {
            gen_config.insert("responseModalities".to_string(), json!(["TEXT", "IMAGE"]));
        } else {
            gen_config.insert("responseMimeType".to_string(), json!("application/json"));
        }

        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt }]
            }],
            "generationConfig": Value::Object(gen_config),
        })
    }
}

/// Concatenated text parts and the first inline image of the first candidate
fn parse_candidate(json: &Value) -> Result<(String, Option<String>)> {
    let parts = json["candidates"]
        .as_array()
        .and_then(|arr| arr.first())
        .and_then(|c| c["content"]["parts"].as_array())
        .ok_or_else(|| ProviderError::InvalidResponse("Missing content".to_string()))?;

    let mut text = String::new();
    let mut media = None;
    for part in parts {
        if let Some(t) = part["text"].as_str() {
            text.push_str(t);
        }
        if media.is_none() {
            let inline = &part["inlineData"];
            if let (Some(mime), Some(data)) = (inline["mimeType"].as_str(), inline["data"].as_str()) {
                if !data.is_empty() {
                    media = Some(format!("data:{};base64,{}", mime, data));
                }
            }
        }
    }
    Ok((text, media))
}

#[async_trait]
impl ModelProvider for GoogleProvider {
    fn id(&self) -> &'static str {
        "google"
    }

    async fn invoke(&self, request: ModelRequest) -> Result<ModelReply> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Google API key is not set".to_string(),
            ));
        }

        let model = if request.wants_image {
            &self.image_model
        } else {
            &self.model
        };
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        let body = Self::build_body(&request);

        let start = std::time::Instant::now();
        let resp = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let latency = start.elapsed().as_millis() as u64;

        if !status.is_success() {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let text = resp.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => ProviderError::Auth(text),
                429 => ProviderError::RateLimited {
                    retry_after_secs: retry_after.unwrap_or(0),
                },
                code => ProviderError::Api {
                    status: code,
                    message: text,
                },
            });
        }

        let json: Value = resp.json().await?;
        let (content, media_url) = parse_candidate(&json)?;

        log::debug!(
            "google {} replied in {}ms ({} chars, media: {})",
            model,
            latency,
            content.len(),
            media_url.is_some()
        );

        Ok(ModelReply {
            content,
            media_url,
            model: model.clone(),
            provider: "google".to_string(),
            latency_ms: latency,
        })
    }
}
