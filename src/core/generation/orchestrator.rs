//! Block Orchestrator
//!
//! One orchestrator per block instance. It owns the block's editable state
//! (options, refinement text, campaign toggle) and the lifecycle of the last
//! generation:
//!
//! ```text
//! Idle ──generate──▶ Generating ──ok──▶ Ready ──generate──▶ Generating
//!                         │                                     │
//!                         └──err──▶ Failed ◀────────err─────────┘
//! ```
//!
//! The state mutex is never held across the provider or library await.
//! Completions are tagged with a sequence number so a result that arrives
//! after a newer request or after `close()` is dropped.

use super::augmentation::{augment, InteractiveContent};
use super::blocks::{BlockDefinition, CampaignSnapshot, InputSources};
use super::error::GenerationError;
use super::executor::FlowExecutor;
use super::formatter::{self, RenderedContent};
use super::options::{resolve_options, BlockError, OptionValue};
use super::output::FlowOutput;
use crate::core::campaign::{CampaignContextProvider, NO_CAMPAIGN};
use crate::core::library::LibrarySink;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

// ============================================================================
// Public types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    Idle,
    Generating,
    Ready,
    Failed,
}

/// A generate call with every user-editable piece frozen
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub flow_id: &'static str,
    pub refinement: String,
    pub use_campaign_context: bool,
    pub resolved_options: IndexMap<String, String>,
    /// Campaign active when the request was frozen, if used
    pub campaign_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub flow_id: &'static str,
    pub campaign_id: Option<String>,
    pub raw: Value,
    pub output: FlowOutput,
    pub rendered: RenderedContent,
    pub created_at: DateTime<Utc>,
}

impl GenerationResult {
    pub fn html(&self) -> String {
        self.rendered.to_html()
    }
}

/// Point-in-time view of a block
#[derive(Debug, Clone)]
pub struct BlockSnapshot {
    pub status: BlockStatus,
    pub result: Option<GenerationResult>,
    pub error: Option<GenerationError>,
    pub refinement: String,
    pub use_campaign_context: bool,
    pub options: IndexMap<String, OptionValue>,
}

#[derive(Debug, Clone)]
pub enum GenerateOutcome {
    Ready(GenerationResult),
    Failed(GenerationError),
    /// A generation was already in flight, or the block is closed
    Ignored,
    /// Superseded or closed before the reply arrived
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { item_id: String },
    NothingToSave,
}

impl SaveOutcome {
    pub fn message(&self) -> String {
        match self {
            SaveOutcome::Saved { .. } => "Saved to library.".to_string(),
            SaveOutcome::NothingToSave => "Generate something before saving.".to_string(),
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

struct BlockState {
    options: IndexMap<String, OptionValue>,
    refinement: String,
    use_campaign_context: bool,
    status: BlockStatus,
    result: Option<GenerationResult>,
    error: Option<GenerationError>,
    sequence: u64,
    closed: bool,
}

pub struct BlockOrchestrator {
    block: BlockDefinition,
    executor: Arc<FlowExecutor>,
    campaigns: Arc<dyn CampaignContextProvider>,
    library: Arc<dyn LibrarySink>,
    state: Mutex<BlockState>,
}

impl BlockOrchestrator {
    pub fn new(
        block: BlockDefinition,
        executor: Arc<FlowExecutor>,
        campaigns: Arc<dyn CampaignContextProvider>,
        library: Arc<dyn LibrarySink>,
    ) -> Self {
        let options = block
            .options
            .iter()
            .map(|o| (o.id.clone(), o.default_value()))
            .collect();

        Self {
            block,
            executor,
            campaigns,
            library,
            state: Mutex::new(BlockState {
                options,
                refinement: String::new(),
                use_campaign_context: true,
                status: BlockStatus::Idle,
                result: None,
                error: None,
                sequence: 0,
                closed: false,
            }),
        }
    }

    pub fn block(&self) -> &BlockDefinition {
        &self.block
    }

    // ------------------------------------------------------------------------
    // Editable state
    // ------------------------------------------------------------------------

    pub async fn update_option(&self, option_id: &str, value: OptionValue) -> Result<(), BlockError> {
        let option = self
            .block
            .find_option(option_id)
            .ok_or_else(|| BlockError::UnknownOption(option_id.to_string()))?;
        option.accepts(&value)?;

        self.state
            .lock()
            .await
            .options
            .insert(option.id.clone(), value);
        Ok(())
    }

    pub async fn update_refinement(&self, text: impl Into<String>) {
        self.state.lock().await.refinement = text.into();
    }

    pub async fn update_campaign_context_toggle(&self, enabled: bool) {
        self.state.lock().await.use_campaign_context = enabled;
    }

    pub async fn snapshot(&self) -> BlockSnapshot {
        let state = self.state.lock().await;
        BlockSnapshot {
            status: state.status,
            result: state.result.clone(),
            error: state.error.clone(),
            refinement: state.refinement.clone(),
            use_campaign_context: state.use_campaign_context,
            options: state.options.clone(),
        }
    }

    /// Stop accepting work; any in-flight completion is discarded
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        state.closed = true;
        state.sequence += 1;
        debug!(block = self.block.id, "Block closed");
    }

    // ------------------------------------------------------------------------
    // Generation
    // ------------------------------------------------------------------------

    /// Run the block's flow with the current state
    pub async fn generate(&self) -> GenerateOutcome {
        // Freeze the request and enter Generating
        let (sequence, frozen) = {
            let mut state = self.state.lock().await;
            if state.closed || state.status == BlockStatus::Generating {
                debug!(block = self.block.id, "Generate ignored");
                return GenerateOutcome::Ignored;
            }
            state.sequence += 1;
            state.status = BlockStatus::Generating;
            state.result = None;
            state.error = None;
            (
                state.sequence,
                (
                    state.refinement.clone(),
                    state.use_campaign_context,
                    state.options.clone(),
                ),
            )
        };

        let outcome = self.run(frozen).await;

        let mut state = self.state.lock().await;
        if state.closed || state.sequence != sequence {
            debug!(block = self.block.id, sequence, "Stale completion discarded");
            return GenerateOutcome::Discarded;
        }

        match outcome {
            Ok(result) => {
                info!(block = self.block.id, flow = result.flow_id, "Block ready");
                state.status = BlockStatus::Ready;
                state.result = Some(result.clone());
                GenerateOutcome::Ready(result)
            }
            Err(err) => {
                warn!(
                    block = self.block.id,
                    flow = err.flow().unwrap_or(self.block.flow.id()),
                    error = %err,
                    "Block generation failed"
                );
                state.status = BlockStatus::Failed;
                state.error = Some(err.clone());
                GenerateOutcome::Failed(err)
            }
        }
    }

    async fn run(
        &self,
        (refinement, use_campaign_context, options): (String, bool, IndexMap<String, OptionValue>),
    ) -> Result<GenerationResult, GenerationError> {
        let (request, input) = self
            .prepare(refinement, use_campaign_context, &options)
            .await?;

        let outcome = self.executor.execute(request.flow_id, &input).await?;
        let rendered = formatter::format(&outcome.output);

        Ok(GenerationResult {
            flow_id: request.flow_id,
            campaign_id: request.campaign_id,
            raw: outcome.raw,
            output: outcome.output,
            rendered,
            created_at: Utc::now(),
        })
    }

    /// Prompt the current state would send, without calling the model
    pub async fn preview_prompt(&self) -> Result<String, GenerationError> {
        let (refinement, use_campaign_context, options) = {
            let state = self.state.lock().await;
            (
                state.refinement.clone(),
                state.use_campaign_context,
                state.options.clone(),
            )
        };
        let (request, input) = self
            .prepare(refinement, use_campaign_context, &options)
            .await?;
        self.executor.render_prompt(request.flow_id, &input)
    }

    async fn prepare(
        &self,
        refinement: String,
        use_campaign_context: bool,
        options: &IndexMap<String, OptionValue>,
    ) -> Result<(GenerationRequest, Value), GenerationError> {
        let flow_id = self.block.flow.id();
        let resolved_options = resolve_options(&self.block.options, options).map_err(|violation| {
            GenerationError::InvalidInput {
                flow: flow_id.to_string(),
                violation,
            }
        })?;

        let campaign = if use_campaign_context && self.block.uses_campaign() {
            self.campaign_snapshot().await
        } else {
            None
        };

        let input = self.block.build_input(&InputSources {
            refinement: &refinement,
            options: Some(&resolved_options),
            campaign: campaign.as_ref(),
        });

        let request = GenerationRequest {
            flow_id,
            refinement,
            use_campaign_context,
            resolved_options,
            campaign_id: campaign.map(|c| c.id),
        };
        Ok((request, input))
    }

    async fn campaign_snapshot(&self) -> Option<CampaignSnapshot> {
        let id = self.campaigns.active_campaign_id().await?;
        let context = self.campaigns.context_string(&id).await;
        if context == NO_CAMPAIGN {
            return None;
        }
        let roster = self.campaigns.roster(&id).await;
        Some(CampaignSnapshot { id, context, roster })
    }

    // ------------------------------------------------------------------------
    // Save and augmentation
    // ------------------------------------------------------------------------

    /// Hand the current result to the library.
    ///
    /// The item is attached to the campaign that was active when the result
    /// was generated.
    pub async fn save(&self) -> Result<SaveOutcome, GenerationError> {
        let result = {
            let state = self.state.lock().await;
            match (&state.status, &state.result) {
                (BlockStatus::Ready, Some(result)) => result.clone(),
                _ => return Ok(SaveOutcome::NothingToSave),
            }
        };

        match self
            .library
            .save(result.campaign_id.clone(), result.flow_id.to_string(), result.raw)
            .await
        {
            Ok(item_id) => {
                info!(block = self.block.id, item_id = %item_id, "Saved to library");
                Ok(SaveOutcome::Saved { item_id })
            }
            Err(err) => {
                warn!(block = self.block.id, error = %err, "Save failed");
                Err(GenerationError::SaveFailed(err))
            }
        }
    }

    /// Live view over the current result, when the flow supports augmentation
    pub async fn interactive(&self) -> Result<Option<InteractiveContent>, GenerationError> {
        let rendered = {
            let state = self.state.lock().await;
            match (&state.status, &state.result) {
                (BlockStatus::Ready, Some(result)) => result.rendered.clone(),
                _ => return Ok(None),
            }
        };
        augment(rendered, self.block.flow.id(), self.executor.clone())
    }
}
