//! Flow Registry
//!
//! A flow binds an id to an input contract, an output contract and a prompt
//! template. The registry is assembled once and is read-only afterwards; the
//! process-wide instance lives behind [`FlowRegistry::builtin`].

mod catalogue;

pub(crate) use catalogue::{COMPLEXITY, MAP_TYPES};

use super::contracts::ObjectSchema;
use super::error::GenerationError;
use super::templates::{PromptTemplate, TemplateError};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Flow Types
// ============================================================================

/// Every built-in flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowKind {
    AdventureIdea,
    StrongStart,
    PlotHook,
    SecretsAndClues,
    Npc,
    Location,
    Puzzle,
    Riddle,
    BookshelfContents,
    BookPassage,
    TavernMenu,
    MagicItem,
    MagicItemTraits,
    Prophecy,
    RandomContents,
    CampaignContext,
    MapImage,
}

impl FlowKind {
    pub const ALL: [FlowKind; 17] = [
        FlowKind::AdventureIdea,
        FlowKind::StrongStart,
        FlowKind::PlotHook,
        FlowKind::SecretsAndClues,
        FlowKind::Npc,
        FlowKind::Location,
        FlowKind::Puzzle,
        FlowKind::Riddle,
        FlowKind::BookshelfContents,
        FlowKind::BookPassage,
        FlowKind::TavernMenu,
        FlowKind::MagicItem,
        FlowKind::MagicItemTraits,
        FlowKind::Prophecy,
        FlowKind::RandomContents,
        FlowKind::CampaignContext,
        FlowKind::MapImage,
    ];

    /// Registry id
    pub fn id(&self) -> &'static str {
        match self {
            FlowKind::AdventureIdea => "adventure-idea",
            FlowKind::StrongStart => "strong-start",
            FlowKind::PlotHook => "plot-hook",
            FlowKind::SecretsAndClues => "secrets-and-clues",
            FlowKind::Npc => "npc",
            FlowKind::Location => "location",
            FlowKind::Puzzle => "puzzle",
            FlowKind::Riddle => "riddle",
            FlowKind::BookshelfContents => "bookshelf-contents",
            FlowKind::BookPassage => "book-passage",
            FlowKind::TavernMenu => "tavern-menu",
            FlowKind::MagicItem => "magic-item",
            FlowKind::MagicItemTraits => "magic-item-traits",
            FlowKind::Prophecy => "prophecy",
            FlowKind::RandomContents => "random-contents",
            FlowKind::CampaignContext => "campaign-context",
            FlowKind::MapImage => "map-image",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.id() == id)
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// What the model is asked to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    /// A JSON object checked against the output contract
    Text,
    /// A media reference; the output contract wraps it
    Image,
}

/// Secondary flow that can be run per anchor in a flow's rendered output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AugmentationSpec {
    pub flow: FlowKind,
    /// Input field of the secondary flow that receives the anchor key
    pub key_field: &'static str,
}

/// Hook that adds derived fields to validated input before rendering
pub type DeriveInputs = fn(&mut Map<String, Value>);

/// A complete flow definition
#[derive(Debug, Clone)]
pub struct FlowDefinition {
    pub kind: FlowKind,
    pub title: &'static str,
    pub input: ObjectSchema,
    pub output: ObjectSchema,
    pub template: PromptTemplate,
    pub artifact: Artifact,
    pub augmentation: Option<AugmentationSpec>,
    pub derive_inputs: Option<DeriveInputs>,
    /// Per-flow sampling temperature, overriding the configured one
    pub temperature: Option<f32>,
}

impl FlowDefinition {
    pub fn new(
        kind: FlowKind,
        title: &'static str,
        input: ObjectSchema,
        output: ObjectSchema,
        template: &str,
    ) -> Result<Self, TemplateError> {
        Ok(Self {
            kind,
            title,
            input,
            output,
            template: PromptTemplate::parse(template)?,
            artifact: Artifact::Text,
            augmentation: None,
            derive_inputs: None,
            temperature: None,
        })
    }

    pub fn id(&self) -> &'static str {
        self.kind.id()
    }

    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.artifact = artifact;
        self
    }

    pub fn with_augmentation(mut self, flow: FlowKind, key_field: &'static str) -> Self {
        self.augmentation = Some(AugmentationSpec { flow, key_field });
        self
    }

    pub fn with_derived_inputs(mut self, derive: DeriveInputs) -> Self {
        self.derive_inputs = Some(derive);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

// ============================================================================
// Registry
// ============================================================================

static BUILTIN: Lazy<Arc<FlowRegistry>> = Lazy::new(|| {
    // Built-in templates are constants covered by tests
    Arc::new(FlowRegistry::with_builtin_flows().expect("built-in flow templates must parse"))
});

/// Read-only mapping from flow id to definition
#[derive(Debug)]
pub struct FlowRegistry {
    flows: IndexMap<&'static str, FlowDefinition>,
}

impl FlowRegistry {
    /// The shared process-wide registry
    pub fn builtin() -> Arc<FlowRegistry> {
        Arc::clone(&BUILTIN)
    }

    /// Build a fresh registry holding the built-in catalogue
    pub fn with_builtin_flows() -> Result<Self, TemplateError> {
        Ok(Self::from_definitions(catalogue::definitions()?))
    }

    /// Build a registry from explicit definitions (later ids win)
    pub fn from_definitions(definitions: Vec<FlowDefinition>) -> Self {
        let flows = definitions.into_iter().map(|d| (d.id(), d)).collect();
        Self { flows }
    }

    pub fn lookup(&self, flow_id: &str) -> Result<&FlowDefinition, GenerationError> {
        self.flows
            .get(flow_id)
            .ok_or_else(|| GenerationError::UnknownFlow(flow_id.to_string()))
    }

    pub fn contains(&self, flow_id: &str) -> bool {
        self.flows.contains_key(flow_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.flows.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlowDefinition> {
        self.flows.values()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}
