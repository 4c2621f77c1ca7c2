//! Block catalogue
//!
//! A block is the user-facing unit bound to one flow. Its definition says
//! which options it shows and how the pieces a user supplies (refinement text,
//! option values, the active campaign) become the flow's input object.

use super::flows::{FlowKind, COMPLEXITY, MAP_TYPES};
use super::options::BlockOption;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

/// Campaign data captured for one request
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignSnapshot {
    pub id: String,
    pub context: String,
    pub roster: Vec<String>,
}

/// How one input field is filled
#[derive(Debug, Clone, PartialEq)]
pub enum InputBinding {
    /// Campaign context, a blank line, then the refinement text. Refinement
    /// only when no campaign is in play.
    ContextAndRefinement(&'static str),
    /// Campaign context only; empty when no campaign is in play
    ContextOnly(&'static str),
    /// The refinement text as typed
    Refinement(&'static str),
    /// Resolved value of a block option
    FromOption {
        option: &'static str,
        field: &'static str,
    },
    /// Comma-separated character names from the campaign roster
    Roster(&'static str),
    Fixed(&'static str, Value),
}

/// Everything needed to build a flow input, frozen at generate time
#[derive(Debug, Clone, Default)]
pub struct InputSources<'a> {
    pub refinement: &'a str,
    pub options: Option<&'a IndexMap<String, String>>,
    pub campaign: Option<&'a CampaignSnapshot>,
}

#[derive(Debug, Clone)]
pub struct BlockDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub flow: FlowKind,
    pub options: Vec<BlockOption>,
    pub bindings: Vec<InputBinding>,
}

impl BlockDefinition {
    fn new(id: &'static str, title: &'static str, description: &'static str, flow: FlowKind) -> Self {
        Self {
            id,
            title,
            description,
            flow,
            options: Vec::new(),
            bindings: Vec::new(),
        }
    }

    fn option(mut self, option: BlockOption) -> Self {
        self.options.push(option);
        self
    }

    fn bind(mut self, binding: InputBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Whether any binding reads from the campaign
    pub fn uses_campaign(&self) -> bool {
        self.bindings.iter().any(|b| {
            matches!(
                b,
                InputBinding::ContextAndRefinement(_)
                    | InputBinding::ContextOnly(_)
                    | InputBinding::Roster(_)
            )
        })
    }

    pub fn find_option(&self, id: &str) -> Option<&BlockOption> {
        self.options.iter().find(|o| o.id == id)
    }

    /// Assemble the flow input object from the frozen request pieces
    pub fn build_input(&self, sources: &InputSources<'_>) -> Value {
        let mut input = Map::new();
        for binding in &self.bindings {
            let (field, value) = match binding {
                InputBinding::ContextAndRefinement(field) => {
                    let value = match sources.campaign {
                        Some(c) => format!("{}\n\n{}", c.context, sources.refinement),
                        None => sources.refinement.to_string(),
                    };
                    (*field, Value::String(value))
                }
                InputBinding::ContextOnly(field) => {
                    let value = sources.campaign.map(|c| c.context.clone()).unwrap_or_default();
                    (*field, Value::String(value))
                }
                InputBinding::Refinement(field) => {
                    (*field, Value::String(sources.refinement.to_string()))
                }
                InputBinding::FromOption { option, field } => {
                    match sources.options.and_then(|o| o.get(*option)) {
                        Some(v) => (*field, Value::String(v.clone())),
                        None => continue,
                    }
                }
                InputBinding::Roster(field) => {
                    let names = sources.campaign.map(|c| c.roster.join(", ")).unwrap_or_default();
                    (*field, Value::String(names))
                }
                InputBinding::Fixed(field, value) => (*field, value.clone()),
            };
            input.insert(field.to_string(), value);
        }
        Value::Object(input)
    }
}

static BLOCKS: Lazy<Vec<BlockDefinition>> = Lazy::new(|| {
    use InputBinding::*;

    vec![
        BlockDefinition::new(
            "adventure-idea",
            "Adventure Idea",
            "Generate a complete adventure concept with a title, summary, conflict, and key locations.",
            FlowKind::AdventureIdea,
        )
        .bind(ContextAndRefinement("campaignSetting")),
        BlockDefinition::new(
            "strong-start",
            "Strong Start",
            "Create exciting opening scenes that immediately hook your players into the action.",
            FlowKind::StrongStart,
        )
        .bind(ContextAndRefinement("campaignSetting"))
        .bind(Roster("playerCharacters")),
        BlockDefinition::new(
            "plot-hook",
            "Plot Hook",
            "Design compelling plot hooks with related clues to draw players into your story.",
            FlowKind::PlotHook,
        )
        .bind(ContextAndRefinement("campaignSetting"))
        .bind(Roster("playerCharacters")),
        BlockDefinition::new(
            "secret-clue",
            "Secrets & Clues",
            "Generate a list of secrets and clues for your players to uncover during a session.",
            FlowKind::SecretsAndClues,
        )
        .bind(ContextAndRefinement("campaignSetting"))
        .bind(Fixed("numSecrets", json!(5))),
        BlockDefinition::new(
            "npc",
            "NPC",
            "Create a unique Non-Player Character with a name, description, and distinct mannerisms.",
            FlowKind::Npc,
        )
        .bind(ContextAndRefinement("campaignSetting")),
        BlockDefinition::new(
            "location",
            "Location",
            "Generate a rich description of a new location, complete with discoverable secrets and clues.",
            FlowKind::Location,
        )
        .bind(ContextAndRefinement("campaignSetting")),
        BlockDefinition::new(
            "puzzle",
            "Puzzle",
            "Design a fantasy puzzle with a title, description, solution, and helpful clues.",
            FlowKind::Puzzle,
        )
        .option(BlockOption::choice("complexity", "Complexity", COMPLEXITY, "Common"))
        .bind(ContextAndRefinement("campaignSetting"))
        .bind(FromOption {
            option: "complexity",
            field: "complexity",
        }),
        BlockDefinition::new(
            "riddle",
            "Riddle",
            "Create a clever riddle with a solution and clues, scaled to your desired complexity.",
            FlowKind::Riddle,
        )
        .option(BlockOption::choice("complexity", "Complexity", COMPLEXITY, "Simple"))
        .bind(ContextAndRefinement("campaignSetting"))
        .bind(FromOption {
            option: "complexity",
            field: "complexity",
        }),
        BlockDefinition::new(
            "bookshelf-contents",
            "Bookshelf Contents",
            "Populate a bookshelf with interesting books, then generate passages from within them.",
            FlowKind::BookshelfContents,
        )
        .bind(ContextAndRefinement("campaignSetting")),
        BlockDefinition::new(
            "tavern-menu",
            "Tavern Menu",
            "Quickly create a menu for a tavern or eatery, complete with food, drinks, and prices.",
            FlowKind::TavernMenu,
        )
        .bind(ContextAndRefinement("campaignSetting")),
        BlockDefinition::new(
            "magic-item",
            "Magic Item",
            "Invent a unique magic item with a name, description, and a list of its powers.",
            FlowKind::MagicItem,
        )
        .bind(ContextAndRefinement("campaignSetting")),
        BlockDefinition::new(
            "prophecy",
            "Prophecy",
            "Craft a cryptic prophecy and come up with multiple possible interpretations.",
            FlowKind::Prophecy,
        )
        .bind(ContextAndRefinement("campaignSetting")),
        BlockDefinition::new(
            "random-contents",
            "Random Contents",
            "Generate a list of random items found in a container like a pocket, chest, or backpack.",
            FlowKind::RandomContents,
        )
        .option(
            BlockOption::choice(
                "container",
                "Container",
                &["Pocket", "Backpack", "Chest", "Drawer", "Sack", "Crate"],
                "Chest",
            )
            .allowing_custom(),
        )
        .bind(ContextOnly("campaignSetting"))
        .bind(FromOption {
            option: "container",
            field: "container",
        })
        .bind(Refinement("context")),
        BlockDefinition::new(
            "map",
            "Map",
            "Generate a fantasy map image of a world, city, treasure trail, or battlefield.",
            FlowKind::MapImage,
        )
        .option(BlockOption::choice("mapType", "Map Type", MAP_TYPES, "World"))
        .bind(FromOption {
            option: "mapType",
            field: "mapType",
        })
        .bind(Refinement("prompt")),
        BlockDefinition::new(
            "campaign-context",
            "Campaign Context",
            "Draft a new campaign with a name, a setting description, and three pre-made characters.",
            FlowKind::CampaignContext,
        )
        .option(BlockOption::text("theme", "Theme"))
        .option(BlockOption::text("campaignName", "Campaign Name"))
        .bind(FromOption {
            option: "theme",
            field: "theme",
        })
        .bind(FromOption {
            option: "campaignName",
            field: "campaignName",
        }),
    ]
});

/// Every built-in block, in display order
pub fn builtin_blocks() -> &'static [BlockDefinition] {
    &BLOCKS
}

pub fn find_block(id: &str) -> Option<&'static BlockDefinition> {
    BLOCKS.iter().find(|b| b.id == id)
}
