//! Model Provider trait and request/reply types

use super::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single prompt sent to a hosted model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    pub prompt: String,
    /// Ask for an image artifact instead of structured text
    #[serde(default)]
    pub wants_image: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl ModelRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            wants_image: false,
            temperature: None,
            max_output_tokens: None,
        }
    }

    pub fn image(prompt: impl Into<String>) -> Self {
        Self {
            wants_image: true,
            ..Self::text(prompt)
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max: Option<u32>) -> Self {
        self.max_output_tokens = max;
        self
    }
}

/// Raw, unvalidated reply from a model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelReply {
    pub content: String,
    /// Media reference (data URI or URL) for image requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    pub model: String,
    pub provider: String,
    pub latency_ms: u64,
}

impl ModelReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn media(url: impl Into<String>) -> Self {
        Self {
            media_url: Some(url.into()),
            ..Default::default()
        }
    }
}

/// A hosted language/image model
///
/// The only I/O the generation pipeline performs goes through this trait.
/// Implementations must not retry on their own.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Short provider identifier used in logs
    fn id(&self) -> &'static str;

    async fn invoke(&self, request: ModelRequest) -> Result<ModelReply>;
}
