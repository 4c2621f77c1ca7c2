//! Content generation pipeline.
//!
//! A block collects user input, a flow turns it into a prompt and a validated
//! structured result, and the formatter turns that result into markup.
//!
//! # Architecture
//!
//! ```text
//! BlockOrchestrator ──▶ FlowExecutor ──▶ ModelProvider
//!   │  options, refinement   │  FlowRegistry lookup
//!   │  campaign context      │  input contract, PromptTemplate
//!   │                        │  output contract
//!   ▼                        ▼
//! LibrarySink            FlowOutput ──▶ formatter ──▶ RenderedContent
//!                                                        │
//!                                  InteractiveContent ◀──┘ (per-anchor flows)
//! ```
//!
//! # Modules
//!
//! - `contracts` - Structural schemas for flow inputs and outputs
//! - `templates` - Prompt template parsing and rendering
//! - `flows` - Flow definitions and the built-in registry
//! - `output` - Typed per-flow results
//! - `executor` - Single flow execution against a model provider
//! - `options` - Block options and option values
//! - `blocks` - Built-in block catalogue and input assembly
//! - `orchestrator` - Per-block lifecycle, save and concurrency rules
//! - `formatter` - Markup rendering with patchable anchors
//! - `augmentation` - On-demand secondary flows for anchored content
//! - `error` - Error taxonomy

pub mod augmentation;
pub mod blocks;
pub mod contracts;
pub mod error;
pub mod executor;
pub mod flows;
pub mod formatter;
pub mod options;
pub mod orchestrator;
pub mod output;
pub mod templates;

pub use augmentation::{augment, AnchorStatus, InteractiveContent, TriggerOutcome};
pub use blocks::{builtin_blocks, find_block, BlockDefinition, CampaignSnapshot, InputBinding};
pub use contracts::{ContractViolation, FieldSchema, FieldType, ObjectSchema, ViolationKind};
pub use error::GenerationError;
pub use executor::{extract_json, ExecutorConfig, FlowExecutor, FlowOutcome};
pub use flows::{Artifact, AugmentationSpec, FlowDefinition, FlowKind, FlowRegistry};
pub use formatter::{
    format, AnchoredFragment, AugmentationAnchor, MarkupNode, PatchPlacement, RenderedContent,
};
pub use options::{resolve_options, BlockError, BlockOption, OptionKind, OptionValue};
pub use orchestrator::{
    BlockOrchestrator, BlockSnapshot, BlockStatus, GenerateOutcome, GenerationRequest,
    GenerationResult, SaveOutcome,
};
pub use output::FlowOutput;
pub use templates::{PromptTemplate, TemplateError};
