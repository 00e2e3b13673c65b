//! Skill document parser.
//!
//! A document is an optional YAML metadata block fenced by `---` lines,
//! followed by a markdown body whose `## ` headings delimit sections.
//! Parsing is pure: no defaults are applied here.

use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::{Mapping, Value};

use crate::error::{Result, SkillError};
use crate::models::SectionMap;

static SECTION_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##\s+(.+)$").expect("valid heading pattern"));

/// Key for content that precedes the first heading.
pub const INTRO_SECTION: &str = "intro";

/// Raw metadata and body of a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDocument {
    pub metadata: Mapping,
    pub body: String,
}

impl ParsedDocument {
    /// Sections of the body.
    pub fn sections(&self) -> SectionMap {
        extract_sections(&self.body)
    }
}

/// Split a document into its metadata mapping and body.
///
/// Without a complete `---` block the metadata is empty and the body is the
/// whole input.
pub fn parse_frontmatter(raw: &str) -> Result<ParsedDocument> {
    let Some((block, body)) = split_frontmatter(raw) else {
        return Ok(ParsedDocument {
            metadata: Mapping::new(),
            body: raw.to_string(),
        });
    };

    let metadata = if block.trim().is_empty() {
        Mapping::new()
    } else {
        match serde_yaml::from_str::<Value>(block) {
            Ok(Value::Mapping(mapping)) => mapping,
            Ok(Value::Null) => Mapping::new(),
            Ok(_) => {
                return Err(SkillError::Parse(
                    "metadata block must be a mapping of keys to values".to_string(),
                ))
            }
            Err(e) => return Err(SkillError::Parse(e.to_string())),
        }
    };

    Ok(ParsedDocument {
        metadata,
        body: body.to_string(),
    })
}

/// Locate the metadata block. Returns `(block, body)` slices of `raw`.
fn split_frontmatter(raw: &str) -> Option<(&str, &str)> {
    let mut lines = raw.split_inclusive('\n');
    let opening = lines.next()?;
    if !is_delimiter(opening) || !opening.ends_with('\n') {
        return None;
    }

    let rest = &raw[opening.len()..];
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if is_delimiter(line) {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == "---"
}

/// Heading text of a `## ` line, trimmed. Deeper headings don't match.
fn heading_text(line: &str) -> Option<&str> {
    let captures = SECTION_HEADING.captures(line)?;
    let text = captures.get(1)?.as_str().trim();
    (!text.is_empty()).then_some(text)
}

/// Split a markdown body into sections keyed by lowercased `## ` heading.
///
/// Every heading produces an entry, even an empty one. Content before the
/// first heading is kept under [`INTRO_SECTION`] only if non-blank. A
/// repeated heading overwrites the earlier section's content.
pub fn extract_sections(body: &str) -> SectionMap {
    let mut sections = SectionMap::new();
    let mut current: Option<String> = None;
    let mut buffer: Vec<&str> = Vec::new();

    for line in body.lines() {
        match heading_text(line) {
            Some(heading) => {
                flush_section(&mut sections, current.take(), &buffer);
                current = Some(heading.to_lowercase());
                buffer.clear();
            }
            None => buffer.push(line),
        }
    }
    flush_section(&mut sections, current, &buffer);

    sections
}

fn flush_section(sections: &mut SectionMap, heading: Option<String>, lines: &[&str]) {
    let content = lines.join("\n").trim().to_string();
    match heading {
        Some(heading) => sections.insert(heading, content),
        None if !content.is_empty() => sections.insert(INTRO_SECTION, content),
        None => {}
    }
}
