//! Interactive Augmentation
//!
//! Some flows produce content with anchors in it (book titles on a shelf).
//! [`augment`] wraps such content in a live view where each anchor can run
//! the flow's secondary flow on demand. Anchors are tracked independently:
//! several may be loading at once, a repeat trigger on a loading anchor is
//! ignored, and a failure only resets its own anchor.

use super::error::GenerationError;
use super::executor::FlowExecutor;
use super::flows::AugmentationSpec;
use super::formatter::{self, PatchPlacement, RenderedContent};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Per-anchor request state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorStatus {
    Idle,
    Loading,
    Patched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Patched(PatchPlacement),
    /// The anchor already has a request in flight
    Ignored,
}

/// Live view over augmentable content
pub struct InteractiveContent {
    spec: AugmentationSpec,
    executor: Arc<FlowExecutor>,
    document: Mutex<RenderedContent>,
    anchors: Mutex<HashMap<String, AnchorStatus>>,
}

/// Wrap `content` produced by `flow_id` in a live view.
///
/// Returns `Ok(None)` when the flow declares no augmentation.
pub fn augment(
    content: RenderedContent,
    flow_id: &str,
    executor: Arc<FlowExecutor>,
) -> Result<Option<InteractiveContent>, GenerationError> {
    let flow = executor.registry().lookup(flow_id)?;
    let Some(spec) = flow.augmentation else {
        return Ok(None);
    };

    let anchors = content
        .anchors()
        .into_iter()
        .map(|a| (a.entity_key.clone(), AnchorStatus::Idle))
        .collect();

    Ok(Some(InteractiveContent {
        spec,
        executor,
        document: Mutex::new(content),
        anchors: Mutex::new(anchors),
    }))
}

impl InteractiveContent {
    /// Run the secondary flow for `key` and patch its fragment.
    ///
    /// A patched anchor may be triggered again; the new patch replaces the old
    /// one. On failure the anchor goes back to the status it had before, so an
    /// earlier patch that is still shown keeps the anchor `Patched`.
    pub async fn trigger(&self, key: &str) -> Result<TriggerOutcome, GenerationError> {
        let previous = {
            let mut anchors = self.anchors.lock().await;
            let previous = anchors.get(key).copied().unwrap_or(AnchorStatus::Idle);
            if previous == AnchorStatus::Loading {
                debug!(anchor = key, "Anchor already loading, ignoring trigger");
                return Ok(TriggerOutcome::Ignored);
            }
            anchors.insert(key.to_string(), AnchorStatus::Loading);
            previous
        };

        let mut input = Map::new();
        input.insert(self.spec.key_field.to_string(), Value::String(key.to_string()));
        let result = self
            .executor
            .execute(self.spec.flow.id(), &Value::Object(input))
            .await;

        match result {
            Ok(outcome) => {
                let patch = formatter::format(&outcome.output).to_html();
                let placement = self.document.lock().await.patch(key, patch);
                self.anchors
                    .lock()
                    .await
                    .insert(key.to_string(), AnchorStatus::Patched);
                debug!(anchor = key, ?placement, "Anchor patched");
                Ok(TriggerOutcome::Patched(placement))
            }
            Err(source) => {
                self.anchors.lock().await.insert(key.to_string(), previous);
                warn!(
                    anchor = key,
                    flow = source.flow().unwrap_or(self.spec.flow.id()),
                    error = %source,
                    "Augmentation failed"
                );
                Err(GenerationError::AugmentationFailed {
                    key: key.to_string(),
                    source: Box::new(source),
                })
            }
        }
    }

    /// Status of an anchor; unknown keys are idle
    pub async fn status(&self, key: &str) -> AnchorStatus {
        self.anchors
            .lock()
            .await
            .get(key)
            .copied()
            .unwrap_or(AnchorStatus::Idle)
    }

    pub async fn document(&self) -> RenderedContent {
        self.document.lock().await.clone()
    }

    pub async fn html(&self) -> String {
        self.document.lock().await.to_html()
    }

    /// Anchor keys present in the original content, in document order
    pub async fn anchor_keys(&self) -> Vec<String> {
        self.document
            .lock()
            .await
            .anchors()
            .into_iter()
            .map(|a| a.entity_key.clone())
            .collect()
    }
}
