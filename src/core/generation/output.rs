//! Typed flow outputs
//!
//! A model reply is first checked against the flow's output contract; only
//! the normalized value is then decoded into one of these types.

use super::flows::FlowKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdventureIdea {
    pub title: String,
    pub summary: String,
    pub conflict: String,
    pub locations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrongStart {
    pub strong_start: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotHook {
    pub hook: String,
    pub clues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretsAndClues {
    pub secrets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub name: String,
    pub description: String,
    pub mannerisms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub description: String,
    pub clues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Puzzle {
    pub title: String,
    pub description: String,
    pub solution: String,
    pub clues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Riddle {
    pub riddle: String,
    pub solution: String,
    pub clues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookshelf {
    pub books: Vec<Book>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookPassage {
    pub passage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub price: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TavernMenu {
    pub name: String,
    pub description: String,
    pub food: Vec<MenuItem>,
    pub drinks: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagicItem {
    pub name: String,
    pub description: String,
    pub powers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagicItemTraits {
    pub traits: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prophecy {
    pub prophecy: String,
    pub meanings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomContents {
    pub container: String,
    pub contents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSketch {
    pub name: String,
    pub details: String,
    pub motivation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignOutline {
    pub name: String,
    pub description: String,
    pub characters: Vec<CharacterSketch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapImage {
    pub image_data_uri: String,
}

/// Output of any built-in flow
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlowOutput {
    AdventureIdea(AdventureIdea),
    StrongStart(StrongStart),
    PlotHook(PlotHook),
    SecretsAndClues(SecretsAndClues),
    Npc(Npc),
    Location(Location),
    Puzzle(Puzzle),
    Riddle(Riddle),
    Bookshelf(Bookshelf),
    BookPassage(BookPassage),
    TavernMenu(TavernMenu),
    MagicItem(MagicItem),
    MagicItemTraits(MagicItemTraits),
    Prophecy(Prophecy),
    RandomContents(RandomContents),
    CampaignOutline(CampaignOutline),
    MapImage(MapImage),
}

impl FlowOutput {
    /// Decode a contract-checked value for `kind`
    pub fn decode(kind: FlowKind, value: Value) -> Result<Self, serde_json::Error> {
        use serde_json::from_value as decode;
        Ok(match kind {
            FlowKind::AdventureIdea => FlowOutput::AdventureIdea(decode(value)?),
            FlowKind::StrongStart => FlowOutput::StrongStart(decode(value)?),
            FlowKind::PlotHook => FlowOutput::PlotHook(decode(value)?),
            FlowKind::SecretsAndClues => FlowOutput::SecretsAndClues(decode(value)?),
            FlowKind::Npc => FlowOutput::Npc(decode(value)?),
            FlowKind::Location => FlowOutput::Location(decode(value)?),
            FlowKind::Puzzle => FlowOutput::Puzzle(decode(value)?),
            FlowKind::Riddle => FlowOutput::Riddle(decode(value)?),
            FlowKind::BookshelfContents => FlowOutput::Bookshelf(decode(value)?),
            FlowKind::BookPassage => FlowOutput::BookPassage(decode(value)?),
            FlowKind::TavernMenu => FlowOutput::TavernMenu(decode(value)?),
            FlowKind::MagicItem => FlowOutput::MagicItem(decode(value)?),
            FlowKind::MagicItemTraits => FlowOutput::MagicItemTraits(decode(value)?),
            FlowKind::Prophecy => FlowOutput::Prophecy(decode(value)?),
            FlowKind::RandomContents => FlowOutput::RandomContents(decode(value)?),
            FlowKind::CampaignContext => FlowOutput::CampaignOutline(decode(value)?),
            FlowKind::MapImage => FlowOutput::MapImage(decode(value)?),
        })
    }

    pub fn kind(&self) -> FlowKind {
        match self {
            FlowOutput::AdventureIdea(_) => FlowKind::AdventureIdea,
            FlowOutput::StrongStart(_) => FlowKind::StrongStart,
            FlowOutput::PlotHook(_) => FlowKind::PlotHook,
            FlowOutput::SecretsAndClues(_) => FlowKind::SecretsAndClues,
            FlowOutput::Npc(_) => FlowKind::Npc,
            FlowOutput::Location(_) => FlowKind::Location,
            FlowOutput::Puzzle(_) => FlowKind::Puzzle,
            FlowOutput::Riddle(_) => FlowKind::Riddle,
            FlowOutput::Bookshelf(_) => FlowKind::BookshelfContents,
            FlowOutput::BookPassage(_) => FlowKind::BookPassage,
            FlowOutput::TavernMenu(_) => FlowKind::TavernMenu,
            FlowOutput::MagicItem(_) => FlowKind::MagicItem,
            FlowOutput::MagicItemTraits(_) => FlowKind::MagicItemTraits,
            FlowOutput::Prophecy(_) => FlowKind::Prophecy,
            FlowOutput::RandomContents(_) => FlowKind::RandomContents,
            FlowOutput::CampaignOutline(_) => FlowKind::CampaignContext,
            FlowOutput::MapImage(_) => FlowKind::MapImage,
        }
    }
}
