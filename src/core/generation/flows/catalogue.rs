//! Built-in flow catalogue

use super::{Artifact, FlowDefinition, FlowKind};
use crate::core::generation::contracts::{FieldSchema, FieldType, ObjectSchema};
use crate::core::generation::templates::TemplateError;
use serde_json::{json, Map, Value};

pub(crate) const COMPLEXITY: &[&str] = &["Simple", "Common", "Challenging"];
pub(crate) const MAP_TYPES: &[&str] = &["World", "City", "Treasure", "Battle"];

pub(super) fn definitions() -> Result<Vec<FlowDefinition>, TemplateError> {
    Ok(vec![
        adventure_idea()?,
        strong_start()?,
        plot_hook()?,
        secrets_and_clues()?,
        npc()?,
        location()?,
        puzzle()?,
        riddle()?,
        bookshelf_contents()?,
        book_passage()?,
        tavern_menu()?,
        magic_item()?,
        magic_item_traits()?,
        prophecy()?,
        random_contents()?,
        campaign_context()?,
        map_image()?,
    ])
}

fn text(name: &str, description: &str) -> FieldSchema {
    FieldSchema::required(name, FieldType::String, description)
}

fn optional_text(name: &str, description: &str) -> FieldSchema {
    FieldSchema::optional(name, FieldType::String, description)
}

fn strings_exactly(name: &str, len: usize, description: &str) -> FieldSchema {
    FieldSchema::required(name, FieldType::list_of_exactly(FieldType::String, len), description)
}

fn strings_between(name: &str, min: usize, max: usize, description: &str) -> FieldSchema {
    FieldSchema::required(
        name,
        FieldType::list_between(FieldType::String, min, max),
        description,
    )
}

fn setting(description: &str) -> FieldSchema {
    text("campaignSetting", description)
}

fn optional_setting(description: &str) -> FieldSchema {
    optional_text("campaignSetting", description)
}

// ============================================================================
// Adventure Building
// ============================================================================

fn adventure_idea() -> Result<FlowDefinition, TemplateError> {
    FlowDefinition::new(
        FlowKind::AdventureIdea,
        "Adventure Idea",
        ObjectSchema::new(vec![optional_setting(
            "The general setting of the campaign and any user-provided context.",
        )]),
        ObjectSchema::new(vec![
            text("title", "A catchy and evocative title for the adventure."),
            text(
                "summary",
                "A one-paragraph summary of the adventure's premise and what the players will be doing.",
            ),
            text("conflict", "The central conflict or problem the players must resolve."),
            strings_exactly(
                "locations",
                3,
                "Three key locations that are likely to feature in the adventure.",
            ),
        ]),
        "You are an expert adventure crafter for tabletop RPGs. Generate a complete adventure idea.

{{#if campaignSetting}}
Base the adventure on the following campaign setting:
{{{campaignSetting}}}
{{else}}
The user has not provided a campaign setting, so create a generic fantasy adventure.
{{/if}}

The adventure idea should include:
1. A creative title.
2. A one-paragraph summary.
3. A clear central conflict.
4. Three distinct and interesting locations.",
    )
}

fn strong_start() -> Result<FlowDefinition, TemplateError> {
    FlowDefinition::new(
        FlowKind::StrongStart,
        "Strong Start",
        ObjectSchema::new(vec![
            setting("The setting of the campaign."),
            text(
                "playerCharacters",
                "A description of the player characters in the campaign, and any specific user requests.",
            ),
        ]),
        ObjectSchema::new(vec![strings_between(
            "strongStart",
            3,
            5,
            "Compelling opening scene ideas as bullet points.",
        )]),
        "You are an experienced Game Master known for creating exciting opening scenes.
Based on the campaign setting and player characters provided, generate 3 to 5 \"Strong Start\" bullet points to hook the players.
Each bullet point should be a concise, actionable, and exciting situation that immediately involves the characters. Vary the length and style of each point.

Campaign Setting: {{{campaignSetting}}}
{{#if playerCharacters}}Player Characters & Context: {{{playerCharacters}}}{{/if}}",
    )
}

fn plot_hook() -> Result<FlowDefinition, TemplateError> {
    FlowDefinition::new(
        FlowKind::PlotHook,
        "Plot Hook",
        ObjectSchema::new(vec![
            setting("The general setting of the campaign."),
            text(
                "playerCharacters",
                "A description of the player characters, their motivations, and any specific user requests.",
            ),
        ]),
        ObjectSchema::new(vec![
            text("hook", "A compelling, one-paragraph plot hook to engage the players."),
            strings_exactly(
                "clues",
                3,
                "Clues that can lead the players to investigate the hook.",
            ),
        ]),
        "You are an expert Game Master who excels at creating engaging adventures.
Based on the provided campaign setting and player characters, generate a compelling plot hook and three related clues.

Campaign Setting: {{{campaignSetting}}}
{{#if playerCharacters}}Player Characters & Context: {{{playerCharacters}}}{{/if}}

The plot hook should be a single paragraph. The clues should be three distinct, actionable pieces of information that the players can discover.",
    )
}

fn secrets_and_clues() -> Result<FlowDefinition, TemplateError> {
    FlowDefinition::new(
        FlowKind::SecretsAndClues,
        "Secrets & Clues",
        ObjectSchema::new(vec![
            setting("The campaign setting for the session."),
            optional_text(
                "potentialScenes",
                "Potential scenes that might occur during the session and any other user-provided context.",
            ),
            optional_text(
                "characterMotivations",
                "The motivations of the player characters, used to tailor the secrets and clues.",
            ),
            FieldSchema::optional(
                "numSecrets",
                FieldType::number_between(3.0, 5.0),
                "The number of secrets and clues to generate.",
            )
            .with_default(json!(3)),
        ]),
        ObjectSchema::new(vec![strings_between(
            "secrets",
            3,
            5,
            "Secrets and clues related to the campaign and scenes. Vary the length and complexity of each item.",
        )]),
        "You are an experienced Game Master, skilled at creating engaging mysteries and plot hooks for tabletop RPGs.

Generate a list of {{numSecrets}} secrets and/or clues that the players might uncover during the session. These should be related to the overall campaign setting and character motivations provided. Focus on interesting and diverse items that can drive the plot forward. Do not number them. Vary the length and complexity of each item to resemble a list from a GM guide.

Campaign Setting: {{{campaignSetting}}}
{{#if potentialScenes}}Potential Scenes & Context: {{{potentialScenes}}}{{/if}}
{{#if characterMotivations}}Character Motivations: {{{characterMotivations}}}{{/if}}",
    )
}

// ============================================================================
// Characters, Places, Mysteries
// ============================================================================

fn npc() -> Result<FlowDefinition, TemplateError> {
    FlowDefinition::new(
        FlowKind::Npc,
        "NPC",
        ObjectSchema::new(vec![setting(
            "The general setting of the campaign (e.g., dark fantasy, high fantasy, sci-fi).",
        )]),
        ObjectSchema::new(vec![
            text("name", "A unique and fitting name for the NPC."),
            text("description", "A one-sentence description of the NPC's appearance and role."),
            strings_exactly("mannerisms", 3, "Distinct mannerisms or quirks the NPC exhibits."),
        ]),
        "You are a character designer for tabletop RPGs. Create a unique Non-Player Character (NPC) based on the campaign setting.

Campaign Setting: {{{campaignSetting}}}

Generate a name, a one-sentence description, and three distinct mannerisms for the NPC.",
    )
}

fn location() -> Result<FlowDefinition, TemplateError> {
    FlowDefinition::new(
        FlowKind::Location,
        "Location",
        ObjectSchema::new(vec![setting(
            "The general setting of the campaign (e.g., dark fantasy, high fantasy, post-apocalyptic).",
        )]),
        ObjectSchema::new(vec![
            text("name", "A unique and evocative name for the location."),
            text(
                "description",
                "A rich, two-paragraph description of the location, appealing to multiple senses.",
            ),
            strings_exactly(
                "clues",
                3,
                "Clues or secrets that players might discover at this location.",
            ),
        ]),
        "You are a world-building expert for tabletop RPGs. Create a compelling fantasy location based on the provided campaign setting.

Campaign Setting: {{{campaignSetting}}}

Generate a unique name, a detailed two-paragraph description, and three distinct clues or secrets associated with the location. The clues should be mysterious and provide hooks for further adventure.",
    )
}

fn puzzle() -> Result<FlowDefinition, TemplateError> {
    FlowDefinition::new(
        FlowKind::Puzzle,
        "Puzzle",
        ObjectSchema::new(vec![
            setting(
                "The general setting of the campaign (e.g., ancient ruins, wizard's tower, fey forest) and any user-provided context.",
            ),
            FieldSchema::optional(
                "complexity",
                FieldType::one_of(COMPLEXITY),
                "How difficult the puzzle should be.",
            )
            .with_default(json!("Common")),
        ]),
        ObjectSchema::new(vec![
            text("title", "An evocative title for the puzzle."),
            text(
                "description",
                "A detailed, one-paragraph description of the puzzle the players encounter.",
            ),
            text("solution", "A clear and concise explanation of the puzzle's solution."),
            strings_exactly(
                "clues",
                3,
                "Cryptic but helpful clues to guide the players toward the solution.",
            ),
        ]),
        "You are a brilliant puzzle master for tabletop RPGs. Create a clever fantasy puzzle appropriate for the given setting.

Complexity: {{complexity}}
Campaign Setting & Context: {{{campaignSetting}}}

Generate a title, a one-paragraph description of the puzzle, a clear solution, and three cryptic clues. The puzzle should be solvable with logic and observation, not just a single skill check.
- Simple: Ages 8+ can figure this out pretty easily.
- Common: A typical challenge for teens or adults (13+).
- Challenging: A real head-scratcher for adults (18+).",
    )
}

fn riddle() -> Result<FlowDefinition, TemplateError> {
    FlowDefinition::new(
        FlowKind::Riddle,
        "Riddle",
        ObjectSchema::new(vec![
            setting(
                "The general setting of the campaign and any user-provided context (e.g., \"a riddle for a sphinx guarding a bridge\").",
            ),
            FieldSchema::optional(
                "complexity",
                FieldType::one_of(COMPLEXITY),
                "The complexity of the riddle.",
            )
            .with_default(json!("Simple")),
        ]),
        ObjectSchema::new(vec![
            text(
                "riddle",
                "The text of the riddle, written in a style fitting the fantasy setting.",
            ),
            text("solution", "The answer to the riddle."),
            strings_exactly(
                "clues",
                3,
                "Brief clues the GM could drop if the players are struggling.",
            ),
        ]),
        "You are a master of riddles and puzzles for tabletop RPGs. Create a riddle based on the provided context.

Complexity: {{{complexity}}}
{{#if campaignSetting}}Campaign Context: {{{campaignSetting}}}{{/if}}

Generate a riddle, its solution, and three clues to help players who are stuck.
The riddle's complexity should match the requested level:
- Simple: Ages 8+ can figure this out pretty easily.
- Common: A typical challenge for teens or adults (13+).
- Challenging: A real head-scratcher for adults (18+).",
    )
}

// ============================================================================
// Set Dressing
// ============================================================================

fn bookshelf_contents() -> Result<FlowDefinition, TemplateError> {
    let book = ObjectSchema::new(vec![
        text("title", "The title of the book. Should be intriguing and unique."),
        text(
            "description",
            "A short, one-sentence description of the book's physical appearance and general subject matter.",
        ),
    ]);

    Ok(FlowDefinition::new(
        FlowKind::BookshelfContents,
        "Bookshelf Contents",
        ObjectSchema::new(vec![optional_setting(
            "The general setting of the campaign and any context about the bookshelf's location or owner.",
        )]),
        ObjectSchema::new(vec![FieldSchema::required(
            "books",
            FieldType::list_between(FieldType::Object(book), 4, 8),
            "Books found on the shelf.",
        )]),
        "You are a creative librarian for a fantasy world. A player is examining a bookshelf.

{{#if campaignSetting}}Context: {{{campaignSetting}}}{{/if}}

Generate a list of 4 to 8 interesting book titles and short descriptions. The books should be a mix of mundane and mysterious, fitting the context if provided.",
    )?
    .with_augmentation(FlowKind::BookPassage, "bookTitle"))
}

fn book_passage() -> Result<FlowDefinition, TemplateError> {
    FlowDefinition::new(
        FlowKind::BookPassage,
        "Book Passage",
        ObjectSchema::new(vec![text(
            "bookTitle",
            "The title of the book to generate a passage from.",
        )]),
        ObjectSchema::new(vec![text(
            "passage",
            "A short, evocative passage (2-3 sentences) from the book, written as prose, not a summary.",
        )]),
        "You are an author. A reader has opened a book titled \"{{bookTitle}}\". Write a short, interesting prose passage (2-3 sentences) from somewhere inside this book. The passage should be intriguing and hint at the book's larger contents without summarizing it. Do not start with \"This passage...\" or similar, just write the passage itself.",
    )
}

fn tavern_menu() -> Result<FlowDefinition, TemplateError> {
    let item = || {
        FieldType::list_between(
            FieldType::Object(ObjectSchema::new(vec![
                text("name", "The name of the food or drink item."),
                text("price", "The price of the item (e.g., \"5 cp\", \"2 sp\")."),
                text("description", "A brief, flavorful description of the item."),
            ])),
            3,
            5,
        )
    };

    FlowDefinition::new(
        FlowKind::TavernMenu,
        "Tavern Menu",
        ObjectSchema::new(vec![optional_setting(
            "The general setting of the campaign and any context about the tavern (e.g., \"a rough dockside inn\", \"an elven bistro\").",
        )]),
        ObjectSchema::new(vec![
            text("name", "A creative name for the tavern or eatery."),
            text("description", "A one-sentence description of the tavern's atmosphere."),
            FieldSchema::required("food", item(), "Food items."),
            FieldSchema::required("drinks", item(), "Drink items."),
        ]),
        "You are a tavern keeper in a fantasy world. Create a menu for your establishment.

{{#if campaignSetting}}
The context for the tavern is: {{{campaignSetting}}}
{{else}}
The user has not provided any context, so create a menu for a typical, cozy fantasy tavern.
{{/if}}

Generate a menu that includes:
1. A creative name for the tavern.
2. A one-sentence description of its atmosphere.
3. A list of 3-5 food items with prices and descriptions.
4. A list of 3-5 drink items with prices and descriptions.",
    )
}

fn magic_item() -> Result<FlowDefinition, TemplateError> {
    FlowDefinition::new(
        FlowKind::MagicItem,
        "Magic Item",
        ObjectSchema::new(vec![setting(
            "The general setting of the campaign and any user-provided context (e.g., \"a holy sword for a paladin\").",
        )]),
        ObjectSchema::new(vec![
            text("name", "A unique and evocative name for the magic item."),
            text(
                "description",
                "A one-paragraph description of the item's appearance and history.",
            ),
            strings_exactly(
                "powers",
                3,
                "Descriptions of the item's magical powers or properties.",
            ),
        ]),
        "You are a legendary artificer who creates powerful magic items for tabletop RPGs.

Campaign Setting & Context: {{{campaignSetting}}}

Generate a unique magic item with a name, a one-paragraph description of its appearance and lore, and three distinct magical powers. The powers should be creative and offer interesting utility, not just combat bonuses.",
    )
}

fn magic_item_traits() -> Result<FlowDefinition, TemplateError> {
    FlowDefinition::new(
        FlowKind::MagicItemTraits,
        "Magic Item Traits",
        ObjectSchema::new(vec![
            text("itemType", "The type of magic item (e.g., sword, ring, amulet)."),
            optional_text(
                "itemTheme",
                "The theme or origin of the magic item (e.g., elven, dwarven, celestial).",
            ),
            FieldSchema::optional(
                "numberOfTraits",
                FieldType::number_between(1.0, 10.0),
                "The number of traits to generate for the magic item.",
            )
            .with_default(json!(3)),
        ]),
        ObjectSchema::new(vec![FieldSchema::required(
            "traits",
            FieldType::list(FieldType::String),
            "Unique and interesting traits for the magic item.",
        )]),
        "You are a creative fantasy writer, skilled at creating unique magic items for tabletop role-playing games.

Generate {{numberOfTraits}} traits for a magic item of type \"{{{itemType}}}\".

{{#if itemTheme}}The item's theme is \"{{{itemTheme}}}\".{{/if}}

Traits should be concise, evocative, and add interesting properties to the item, avoiding direct combat bonuses. Focus on flavor and unique non-mechanical effects.

Example traits:
- Glows faintly when near treasure.
- Whispers secrets to its wielder in Elvish.
- Feels warm to the touch, even in cold environments.",
    )
}

fn prophecy() -> Result<FlowDefinition, TemplateError> {
    FlowDefinition::new(
        FlowKind::Prophecy,
        "Prophecy",
        ObjectSchema::new(vec![setting(
            "The general setting of the campaign and any user-provided context (e.g., \"a prophecy about the return of a dragon\").",
        )]),
        ObjectSchema::new(vec![
            text(
                "prophecy",
                "A cryptic, one-paragraph prophecy written in a poetic or archaic style.",
            ),
            strings_exactly(
                "meanings",
                3,
                "Interpretations or possible meanings of the prophecy, which could be true, false, or metaphorical.",
            ),
        ]),
        "You are a mysterious oracle, weaving cryptic prophecies for tabletop RPGs.

Campaign Setting & Context: {{{campaignSetting}}}

Generate a vague and poetic one-paragraph prophecy. Then, provide three different possible interpretations of what the prophecy could mean. These interpretations should be distinct and provide potential plot hooks.",
    )
}

fn random_contents() -> Result<FlowDefinition, TemplateError> {
    FlowDefinition::new(
        FlowKind::RandomContents,
        "Random Contents",
        ObjectSchema::new(vec![
            optional_setting("The general setting of the campaign."),
            text(
                "container",
                "The type of container being searched (e.g., pocket, backpack, chest).",
            ),
            optional_text(
                "context",
                "Additional context about the location or owner of the container (e.g., \"a wizard's desk drawer\").",
            ),
        ]),
        ObjectSchema::new(vec![
            text("container", "The container that was searched."),
            strings_between(
                "contents",
                3,
                7,
                "Items found inside the container; a mix of mundane and interesting, with varied descriptions.",
            ),
        ]),
        "You are a Game Master's assistant, helping to quickly populate the world with interesting details. A player is searching a container.

Container: {{{container}}}
{{#if context}}Context: {{{context}}}{{/if}}
{{#if campaignSetting}}Campaign Setting: {{{campaignSetting}}}{{/if}}

Generate a list of 3 to 7 items that might be found inside. The list should be plausible for the container and context. Include a mix of mundane and at least one interesting or unusual item. Vary the length and detail of the descriptions for each item to make the list feel authentic.",
    )
}

// ============================================================================
// Campaign and Maps
// ============================================================================

fn campaign_context() -> Result<FlowDefinition, TemplateError> {
    let character = ObjectSchema::new(vec![
        text("name", "The character's name."),
        text("details", "A brief, one-sentence description of the character."),
        text("motivation", "The character's primary motivation."),
    ]);

    FlowDefinition::new(
        FlowKind::CampaignContext,
        "Campaign Context",
        ObjectSchema::new(vec![
            optional_text(
                "theme",
                "Theme for the campaign (e.g., 'dark fantasy', 'pirate adventure').",
            ),
            optional_text("campaignName", "A user-provided name for the campaign."),
        ]),
        ObjectSchema::new(vec![
            text(
                "name",
                "A catchy and highly original name for the campaign. If the user provided a name, use that.",
            ),
            text(
                "description",
                "A two-paragraph description of the campaign setting and central conflict.",
            ),
            FieldSchema::required(
                "characters",
                FieldType::list_of_exactly(FieldType::Object(character), 3),
                "Distinct player characters.",
            ),
        ]),
        "You are a creative world-builder for tabletop RPGs, known for your highly original and unique ideas.

{{#if theme}}The user wants a campaign with a \"{{theme}}\" theme.{{else}}The user has not specified a theme, so create a classic high fantasy campaign, but make it feel fresh and new.{{/if}}

{{#if campaignName}}
The campaign name is \"{{campaignName}}\". Use this name.
{{else}}
Generate a unique and evocative campaign name. Do NOT use common or generic fantasy names (e.g., Eldoria, Silver-something, Dragon-something). Be creative and original.
{{/if}}

Generate a compelling campaign context that includes:
1. The campaign name.
2. A rich, two-paragraph description of the world, its main conflict, and what makes it interesting. Avoid tired fantasy tropes.
3. Three pre-made player characters, each with a name, a one-sentence description, and a clear motivation that ties them to the campaign's conflict.",
    )
}

fn map_image() -> Result<FlowDefinition, TemplateError> {
    Ok(FlowDefinition::new(
        FlowKind::MapImage,
        "Map",
        ObjectSchema::new(vec![
            FieldSchema::required(
                "mapType",
                FieldType::one_of(MAP_TYPES),
                "The type of map to generate.",
            ),
            text("prompt", "A description of the map to generate."),
        ]),
        ObjectSchema::new(vec![text(
            "imageDataUri",
            "The generated map image as a data URI ('data:<mimetype>;base64,<encoded_data>').",
        )]),
        "Generate an image of a fantasy {{mapType}} map.

{{#if prompt}}The user's description is: \"{{prompt}}\".{{/if}}

Incorporate the following stylistic elements: {{style}}",
    )?
    .with_artifact(Artifact::Image)
    .with_derived_inputs(map_style))
}

fn map_style(values: &mut Map<String, Value>) {
    let style = match values.get("mapType").and_then(Value::as_str) {
        Some("World") => "ancient, fantasy, cartography, detailed, epic, continents, oceans, mountains, forests",
        Some("City") => "fantasy city map, bird's eye view, intricate details, medieval or fantasy architecture, streets, buildings, walls",
        Some("Treasure") => "old parchment, hand-drawn, pirate map, dotted lines, compass rose, landmarks, X marks the spot",
        Some("Battle") => "top-down, grid (optional), tactical, dungeon, forest clearing, battlefield, key terrain features",
        _ => return,
    };
    values.insert("style".to_string(), Value::String(style.to_string()));
}
