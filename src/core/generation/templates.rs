//! Prompt Templates
//!
//! A tiny conditional template language for flow prompts:
//!
//! - `{{field}}` and `{{{field}}}` substitute a value (prompts are plain text,
//!   so the two forms are identical)
//! - `{{#if field}} ... {{else}} ... {{/if}}` includes a branch when the field
//!   is truthy; blocks nest
//!
//! Templates are parsed once into segments and rendered as a pure function of
//! the input map. Missing fields render as nothing.

use serde_json::{Map, Value};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TemplateError {
    #[error("Unclosed tag starting at byte {0}")]
    UnclosedTag(usize),

    #[error("Unclosed {{{{#if {0}}}}} block")]
    UnclosedIf(String),

    #[error("Unexpected {{{{{0}}}}} at byte {1}")]
    UnexpectedTag(String, usize),

    #[error("Unsupported helper: {0}")]
    UnsupportedHelper(String),

    #[error("Empty field name at byte {0}")]
    EmptyField(usize),
}

// ============================================================================
// Template
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Field(String),
    If {
        field: String,
        then: Vec<Segment>,
        otherwise: Vec<Segment>,
    },
}

struct OpenBlock {
    field: String,
    then: Vec<Segment>,
    otherwise: Vec<Segment>,
    in_else: bool,
}

/// A parsed prompt template
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut root: Vec<Segment> = Vec::new();
        let mut stack: Vec<OpenBlock> = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find("{{") {
            push_text(target(&mut root, &mut stack), &rest[..start]);

            let at = offset + start;
            let tail = &rest[start..];
            let (inner, consumed) = if tail.starts_with("{{{") {
                let end = tail.find("}}}").ok_or(TemplateError::UnclosedTag(at))?;
                (&tail[3..end], end + 3)
            } else {
                let end = tail.find("}}").ok_or(TemplateError::UnclosedTag(at))?;
                (&tail[2..end], end + 2)
            };

            let tag = inner.trim();
            if let Some(field) = tag.strip_prefix("#if") {
                let field = field.trim();
                if field.is_empty() {
                    return Err(TemplateError::EmptyField(at));
                }
                stack.push(OpenBlock {
                    field: field.to_string(),
                    then: Vec::new(),
                    otherwise: Vec::new(),
                    in_else: false,
                });
            } else if tag == "else" {
                match stack.last_mut() {
                    Some(block) if !block.in_else => block.in_else = true,
                    _ => return Err(TemplateError::UnexpectedTag(tag.to_string(), at)),
                }
            } else if tag == "/if" {
                let block = stack
                    .pop()
                    .ok_or_else(|| TemplateError::UnexpectedTag(tag.to_string(), at))?;
                target(&mut root, &mut stack).push(Segment::If {
                    field: block.field,
                    then: block.then,
                    otherwise: block.otherwise,
                });
            } else if tag.starts_with('#') || tag.starts_with('/') {
                return Err(TemplateError::UnsupportedHelper(tag.to_string()));
            } else if tag.is_empty() {
                return Err(TemplateError::EmptyField(at));
            } else {
                target(&mut root, &mut stack).push(Segment::Field(tag.to_string()));
            }

            offset += start + consumed;
            rest = &tail[consumed..];
        }
        push_text(target(&mut root, &mut stack), rest);

        if let Some(block) = stack.pop() {
            return Err(TemplateError::UnclosedIf(block.field));
        }

        Ok(Self {
            source: source.to_string(),
            segments: root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render with the given values. Blank-line runs left behind by empty
    /// conditionals are collapsed.
    pub fn render(&self, values: &Map<String, Value>) -> String {
        let mut out = String::new();
        render_segments(&self.segments, values, &mut out);
        tidy(&out)
    }

    /// Every field name the template reads, in first-use order
    pub fn referenced_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        collect_fields(&self.segments, &mut fields);
        fields
    }
}

fn target<'a>(root: &'a mut Vec<Segment>, stack: &'a mut [OpenBlock]) -> &'a mut Vec<Segment> {
    match stack.last_mut() {
        Some(block) if block.in_else => &mut block.otherwise,
        Some(block) => &mut block.then,
        None => root,
    }
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if !text.is_empty() {
        segments.push(Segment::Text(text.to_string()));
    }
}

fn render_segments(segments: &[Segment], values: &Map<String, Value>, out: &mut String) {
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Field(name) => {
                if let Some(value) = values.get(name) {
                    write_value(value, out);
                }
            }
            Segment::If {
                field,
                then,
                otherwise,
            } => {
                let branch = if is_truthy(values.get(field)) {
                    then
                } else {
                    otherwise
                };
                render_segments(branch, values, out);
            }
        }
    }
}

/// Missing, null, false, zero, empty strings and empty arrays are falsy
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(_)) => true,
    }
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(item, out);
            }
        }
        Value::Object(_) => out.push_str(&value.to_string()),
    }
}

fn collect_fields(segments: &[Segment], fields: &mut Vec<String>) {
    for segment in segments {
        match segment {
            Segment::Text(_) => {}
            Segment::Field(name) => {
                if !fields.contains(name) {
                    fields.push(name.clone());
                }
            }
            Segment::If {
                field,
                then,
                otherwise,
            } => {
                if !fields.contains(field) {
                    fields.push(field.clone());
                }
                collect_fields(then, fields);
                collect_fields(otherwise, fields);
            }
        }
    }
}

fn tidy(rendered: &str) -> String {
    let mut out = String::with_capacity(rendered.len());
    let mut blank_run = 0;
    for line in rendered.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}
