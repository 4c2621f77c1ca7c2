//! Formatter
//!
//! Maps a typed flow output to a small markup document. The document is a list
//! of nodes rather than one string so that anchored fragments (a book on a
//! shelf) can be patched by identity later on. All model text is HTML-escaped;
//! list order is preserved.

use super::output::{FlowOutput, MenuItem};
use serde::{Deserialize, Serialize};

/// Identifier of an entity embedded in rendered output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AugmentationAnchor {
    pub entity_key: String,
}

/// A fragment that secondary content can be attached to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchoredFragment {
    pub anchor: AugmentationAnchor,
    pub markup: String,
    /// Secondary content currently attached, if any
    pub patch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarkupNode {
    Markup { html: String },
    Anchor(AnchoredFragment),
}

/// Where a patch ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchPlacement {
    /// Attached to the existing fragment for the anchor
    InPlace,
    /// No fragment matched; added as a new trailing fragment
    Appended,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderedContent {
    pub nodes: Vec<MarkupNode>,
}

impl RenderedContent {
    fn push_markup(&mut self, html: impl Into<String>) {
        let html = html.into();
        if let Some(MarkupNode::Markup { html: last }) = self.nodes.last_mut() {
            last.push_str(&html);
        } else {
            self.nodes.push(MarkupNode::Markup { html });
        }
    }

    fn push_anchor(&mut self, key: &str, markup: String) {
        self.nodes.push(MarkupNode::Anchor(AnchoredFragment {
            anchor: AugmentationAnchor {
                entity_key: key.to_string(),
            },
            markup,
            patch: None,
        }));
    }

    /// Anchors in document order
    pub fn anchors(&self) -> Vec<&AugmentationAnchor> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                MarkupNode::Anchor(fragment) => Some(&fragment.anchor),
                MarkupNode::Markup { .. } => None,
            })
            .collect()
    }

    pub fn fragment(&self, key: &str) -> Option<&AnchoredFragment> {
        self.nodes.iter().find_map(|node| match node {
            MarkupNode::Anchor(f) if f.anchor.entity_key == key => Some(f),
            _ => None,
        })
    }

    /// Attach `markup` to the first fragment anchored at `key`, replacing any
    /// earlier patch. If no fragment matches, the patch is appended instead
    /// of being dropped.
    pub fn patch(&mut self, key: &str, markup: String) -> PatchPlacement {
        for node in &mut self.nodes {
            if let MarkupNode::Anchor(fragment) = node {
                if fragment.anchor.entity_key == key {
                    fragment.patch = Some(markup);
                    return PatchPlacement::InPlace;
                }
            }
        }

        self.nodes.push(MarkupNode::Anchor(AnchoredFragment {
            anchor: AugmentationAnchor {
                entity_key: key.to_string(),
            },
            markup: String::new(),
            patch: Some(markup),
        }));
        PatchPlacement::Appended
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                MarkupNode::Markup { html } => out.push_str(html),
                MarkupNode::Anchor(fragment) => {
                    out.push_str(&format!(
                        "<div class=\"anchored\" data-anchor=\"{}\">",
                        escape(&fragment.anchor.entity_key)
                    ));
                    out.push_str(&fragment.markup);
                    if let Some(patch) = &fragment.patch {
                        out.push_str("<div class=\"patch\">");
                        out.push_str(patch);
                        out.push_str("</div>");
                    }
                    out.push_str("</div>");
                }
            }
        }
        out
    }
}

/// Escape text for inclusion in HTML
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn list(items: &[String]) -> String {
    let mut out = String::from("<ul>");
    for item in items {
        out.push_str("<li>");
        out.push_str(&escape(item));
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    out
}

fn menu(items: &[MenuItem]) -> String {
    let mut out = String::from("<ul>");
    for item in items {
        out.push_str(&format!(
            "<li><strong>{}</strong> ({}): {}</li>",
            escape(&item.name),
            escape(&item.price),
            escape(&item.description)
        ));
    }
    out.push_str("</ul>");
    out
}

/// Render a flow output
pub fn format(output: &FlowOutput) -> RenderedContent {
    let mut doc = RenderedContent::default();
    let e = escape;

    match output {
        FlowOutput::AdventureIdea(r) => doc.push_markup(format!(
            "<h2>Adventure: {}</h2><p><strong>Summary:</strong> {}</p><p><strong>Conflict:</strong> {}</p><h3>Potential Locations:</h3>{}",
            e(&r.title),
            e(&r.summary),
            e(&r.conflict),
            list(&r.locations)
        )),
        FlowOutput::StrongStart(r) => {
            doc.push_markup(format!("<h2>Strong Start</h2>{}", list(&r.strong_start)))
        }
        FlowOutput::PlotHook(r) => doc.push_markup(format!(
            "<h2>Plot Hook</h2><h3>Hook</h3><p>{}</p><h3>Clues</h3>{}",
            e(&r.hook),
            list(&r.clues)
        )),
        FlowOutput::SecretsAndClues(r) => {
            doc.push_markup(format!("<h2>Secrets &amp; Clues</h2>{}", list(&r.secrets)))
        }
        FlowOutput::Npc(r) => doc.push_markup(format!(
            "<h2>NPC: {}</h2><p><em>{}</em></p><h3>Mannerisms:</h3>{}",
            e(&r.name),
            e(&r.description),
            list(&r.mannerisms)
        )),
        FlowOutput::Location(r) => doc.push_markup(format!(
            "<h2>Location: {}</h2><p>{}</p><h3>Secrets &amp; Clues:</h3>{}",
            e(&r.name),
            e(&r.description),
            list(&r.clues)
        )),
        FlowOutput::Puzzle(r) => doc.push_markup(format!(
            "<h2>Puzzle: {}</h2><p>{}</p><h3>Solution:</h3><p>{}</p><h3>Clues:</h3>{}",
            e(&r.title),
            e(&r.description),
            e(&r.solution),
            list(&r.clues)
        )),
        FlowOutput::Riddle(r) => doc.push_markup(format!(
            "<h2>Riddle</h2><p><em>{}</em></p><h3>Solution:</h3><p>{}</p><h3>Clues:</h3>{}",
            e(&r.riddle),
            e(&r.solution),
            list(&r.clues)
        )),
        FlowOutput::Bookshelf(r) => {
            doc.push_markup("<h2>Bookshelf Contents</h2>");
            for book in &r.books {
                doc.push_anchor(
                    &book.title,
                    format!(
                        "<strong class=\"book-title\">{}</strong><p>{}</p>",
                        e(&book.title),
                        e(&book.description)
                    ),
                );
            }
        }
        FlowOutput::BookPassage(r) => doc.push_markup(format!("<p><em>{}</em></p>", e(&r.passage))),
        FlowOutput::TavernMenu(r) => doc.push_markup(format!(
            "<h2>Menu: {}</h2><p><em>{}</em></p><h3>Food</h3>{}<h3>Drinks</h3>{}",
            e(&r.name),
            e(&r.description),
            menu(&r.food),
            menu(&r.drinks)
        )),
        FlowOutput::MagicItem(r) => doc.push_markup(format!(
            "<h2>Magic Item: {}</h2><p><em>{}</em></p><h3>Powers:</h3>{}",
            e(&r.name),
            e(&r.description),
            list(&r.powers)
        )),
        FlowOutput::MagicItemTraits(r) => {
            doc.push_markup(format!("<h2>Magic Item Traits</h2>{}", list(&r.traits)))
        }
        FlowOutput::Prophecy(r) => doc.push_markup(format!(
            "<h2>Prophecy</h2><p><em>{}</em></p><h3>Possible Meanings:</h3>{}",
            e(&r.prophecy),
            list(&r.meanings)
        )),
        FlowOutput::RandomContents(r) => doc.push_markup(format!(
            "<h2>Contents of {}</h2>{}",
            e(&r.container),
            list(&r.contents)
        )),
        FlowOutput::CampaignOutline(r) => {
            let mut characters = String::from("<ul>");
            for c in &r.characters {
                characters.push_str(&format!(
                    "<li><strong>{}</strong>: {} <em>Motivation: {}</em></li>",
                    e(&c.name),
                    e(&c.details),
                    e(&c.motivation)
                ));
            }
            characters.push_str("</ul>");
            doc.push_markup(format!(
                "<h2>Campaign: {}</h2><p>{}</p><h3>Characters</h3>{}",
                e(&r.name),
                e(&r.description).replace("\n\n", "</p><p>"),
                characters
            ));
        }
        FlowOutput::MapImage(r) => doc.push_markup(format!(
            "<h2>Map</h2><img src=\"{}\" alt=\"Generated map\"/>",
            e(&r.image_data_uri)
        )),
    }

    doc
}
