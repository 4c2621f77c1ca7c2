//! Campaign Context
//!
//! A campaign is owned by the campaign-management side of the application;
//! the generation pipeline only ever sees it through
//! [`CampaignContextProvider`], which turns the active campaign into a prose
//! context string and a character roster at request time.

mod active;

pub use active::{ActiveCampaign, CampaignError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Context string used when no campaign can be resolved
pub const NO_CAMPAIGN: &str = "No campaign loaded.";

/// A player character in a campaign roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerCharacter {
    pub name: String,
    /// One-sentence description
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub motivation: String,
}

/// Campaign entity as seen by the generation pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub characters: Vec<PlayerCharacter>,
}

impl Campaign {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            characters: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_character(mut self, name: &str, motivation: &str) -> Self {
        self.characters.push(PlayerCharacter {
            name: name.to_string(),
            details: String::new(),
            motivation: motivation.to_string(),
        });
        self
    }

    /// Prose summary injected into prompts:
    ///
    /// ```text
    /// Campaign Name: <name>
    ///
    /// <description>
    ///
    /// **Characters**:
    /// - <name>: <motivation>
    /// ```
    pub fn context_string(&self) -> String {
        let characters = self
            .characters
            .iter()
            .map(|c| format!("- {}: {}", c.name, c.motivation))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Campaign Name: {}\n\n{}\n\n**Characters**:\n{}",
            self.name, self.description, characters
        )
    }

    /// Character names in roster order
    pub fn roster(&self) -> Vec<String> {
        self.characters.iter().map(|c| c.name.clone()).collect()
    }
}

/// Source of campaign context for prompts
///
/// Implementations must recompute on every call; results are never cached by
/// the pipeline, so edits to the active campaign show up on the next request.
#[async_trait]
pub trait CampaignContextProvider: Send + Sync {
    /// The campaign the facilitator is currently running, if any
    async fn active_campaign_id(&self) -> Option<String>;

    /// Context string for a campaign, or [`NO_CAMPAIGN`] if it does not exist
    async fn context_string(&self, campaign_id: &str) -> String;

    /// Character names for a campaign (empty if it does not exist)
    async fn roster(&self, campaign_id: &str) -> Vec<String>;
}
