//! Flow Executor
//!
//! Runs one flow end to end: resolve the definition, check the input
//! contract, render the prompt, call the model provider once, then check the
//! reply against the output contract. Nothing here retries; every failure is
//! surfaced to the caller exactly once.

use super::error::GenerationError;
use super::flows::{Artifact, FlowDefinition, FlowRegistry};
use super::output::FlowOutput;
use crate::config::GenerationSettings;
use crate::core::llm::{ModelProvider, ModelReply, ModelRequest, ProviderError};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Upper bound on a single provider call
    pub provider_timeout: Duration,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(60),
            temperature: None,
            max_output_tokens: None,
        }
    }
}

impl From<&GenerationSettings> for ExecutorConfig {
    fn from(settings: &GenerationSettings) -> Self {
        Self {
            provider_timeout: settings.provider_timeout(),
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
        }
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// A successful flow execution
#[derive(Debug, Clone)]
pub struct FlowOutcome {
    pub flow_id: &'static str,
    /// Validated, normalized output object
    pub raw: Value,
    pub output: FlowOutput,
    pub prompt: String,
    pub provider: String,
    pub model: String,
    pub latency_ms: u64,
}

// ============================================================================
// Executor
// ============================================================================

pub struct FlowExecutor {
    registry: Arc<FlowRegistry>,
    provider: Arc<dyn ModelProvider>,
    config: ExecutorConfig,
}

impl FlowExecutor {
    pub fn new(registry: Arc<FlowRegistry>, provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            registry,
            provider,
            config: ExecutorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &FlowRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Validate `input` and return the prompt that would be sent, without
    /// calling the model
    pub fn render_prompt(&self, flow_id: &str, input: &Value) -> Result<String, GenerationError> {
        let flow = self.registry.lookup(flow_id)?;
        let values = prepare_input(flow, input)?;
        Ok(build_prompt(flow, &values))
    }

    /// Execute a flow against the model provider
    #[tracing::instrument(skip(self, input), fields(provider = self.provider.id()))]
    pub async fn execute(&self, flow_id: &str, input: &Value) -> Result<FlowOutcome, GenerationError> {
        // 1. Resolve the flow
        let flow = self.registry.lookup(flow_id)?;

        // 2. Check the input contract; nothing below runs on bad input
        let values = prepare_input(flow, input)?;

        // 3. Render the prompt
        let prompt = build_prompt(flow, &values);
        debug!(prompt_len = prompt.len(), "Rendered prompt");

        // 4. Call the provider, bounded by the configured timeout
        let request = ModelRequest {
            prompt: prompt.clone(),
            wants_image: flow.artifact == Artifact::Image,
            temperature: flow.temperature.or(self.config.temperature),
            max_output_tokens: self.config.max_output_tokens,
        };
        let started = Instant::now();
        let reply = self.invoke(flow, request).await?;
        let latency_ms = started.elapsed().as_millis() as u64;

        // 5. Check the reply against the output contract
        let raw = match flow.artifact {
            Artifact::Text => validate_text_reply(flow, &reply)?,
            Artifact::Image => validate_image_reply(flow, &reply)?,
        };

        // 6. Decode into the typed output
        let output = FlowOutput::decode(flow.kind, raw.clone()).map_err(|e| {
            GenerationError::MalformedOutput {
                flow: flow.id().to_string(),
                reason: e.to_string(),
            }
        })?;

        info!(flow = flow.id(), latency_ms, "Flow completed");

        Ok(FlowOutcome {
            flow_id: flow.id(),
            raw,
            output,
            prompt,
            provider: reply.provider,
            model: reply.model,
            latency_ms,
        })
    }

    async fn invoke(
        &self,
        flow: &FlowDefinition,
        request: ModelRequest,
    ) -> Result<ModelReply, GenerationError> {
        let timeout = self.config.provider_timeout;
        match tokio::time::timeout(timeout, self.provider.invoke(request)).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(ProviderError::Timeout)) => {
                warn!(flow = flow.id(), "Provider reported a timeout");
                Err(GenerationError::Timeout {
                    flow: flow.id().to_string(),
                })
            }
            Ok(Err(source)) => {
                warn!(flow = flow.id(), error = %source, "Provider call failed");
                Err(GenerationError::Provider {
                    flow: flow.id().to_string(),
                    source,
                })
            }
            Err(_) => {
                warn!(flow = flow.id(), timeout_secs = timeout.as_secs_f64(), "Provider call timed out");
                Err(GenerationError::Timeout {
                    flow: flow.id().to_string(),
                })
            }
        }
    }
}

fn prepare_input(flow: &FlowDefinition, input: &Value) -> Result<Map<String, Value>, GenerationError> {
    let validated = flow
        .input
        .validate(input)
        .map_err(|violation| GenerationError::InvalidInput {
            flow: flow.id().to_string(),
            violation,
        })?;

    let mut values = match validated {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    if let Some(derive) = flow.derive_inputs {
        derive(&mut values);
    }
    Ok(values)
}

fn build_prompt(flow: &FlowDefinition, values: &Map<String, Value>) -> String {
    let mut prompt = flow.template.render(values);
    if flow.artifact == Artifact::Text {
        let skeleton = serde_json::to_string_pretty(&flow.output.skeleton()).unwrap_or_default();
        prompt.push_str("\n\nOutput Format (JSON):\n");
        prompt.push_str(&skeleton);
        prompt.push_str("\n\nRespond with a single JSON object in exactly this format.");
    }
    prompt
}

fn validate_text_reply(flow: &FlowDefinition, reply: &ModelReply) -> Result<Value, GenerationError> {
    let malformed = |reason: String| GenerationError::MalformedOutput {
        flow: flow.id().to_string(),
        reason,
    };

    let parsed = extract_json(&reply.content)
        .ok_or_else(|| malformed("reply did not contain a JSON object".to_string()))?;

    flow.output.validate(&parsed).map_err(|violation| {
        warn!(flow = flow.id(), %violation, "Reply violated the output contract");
        malformed(violation.to_string())
    })
}

fn validate_image_reply(flow: &FlowDefinition, reply: &ModelReply) -> Result<Value, GenerationError> {
    match reply.media_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Ok(json!({ "imageDataUri": url })),
        _ => Err(GenerationError::NoArtifactProduced {
            flow: flow.id().to_string(),
        }),
    }
}

/// Pull a JSON object out of a model reply: a fenced ```json block first, then
/// the first balanced `{...}` that parses, then the whole text.
pub fn extract_json(content: &str) -> Option<Value> {
    if let Some(start) = content.find("```json") {
        if let Some(end) = content[start + 7..].find("```") {
            let json_str = content[start + 7..start + 7 + end].trim();
            if let Ok(value) = serde_json::from_str::<Value>(json_str) {
                return Some(value);
            }
        }
    }

    for (idx, _) in content.match_indices('{') {
        let substring = &content[idx..];
        let mut depth = 0;
        let mut end_idx = None;
        let mut in_string = false;
        let mut escaped = false;

        for (i, ch) in substring.char_indices() {
            if escaped {
                escaped = false;
                continue;
            }

            match ch {
                '\\' if in_string => escaped = true,
                '"' => in_string = !in_string,
                '{' if !in_string => depth += 1,
                '}' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        end_idx = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }

        if let Some(end) = end_idx {
            if let Ok(value) = serde_json::from_str::<Value>(&substring[..=end]) {
                return Some(value);
            }
        }
    }

    serde_json::from_str::<Value>(content.trim()).ok()
}
