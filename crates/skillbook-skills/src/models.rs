//! Core data models for the skill library.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_yaml::{Mapping, Value};

// ── Enumerations ────────────────────────────────────────────────────────

/// Target platform a skill declares support for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Platform {
    ClaudeCode,
    ClaudeDesktop,
    ChatGpt,
    Cursor,
    Any,
    /// Token outside the known set, kept verbatim so it can still be indexed.
    Other(String),
}

impl Platform {
    /// Tokens accepted by the validator.
    pub const KNOWN: [&'static str; 5] = ["claude-code", "claude-desktop", "chatgpt", "cursor", "any"];

    /// Parse a platform token. Unknown tokens become [`Platform::Other`].
    pub fn parse(token: &str) -> Self {
        match token.trim().to_lowercase().as_str() {
            "claude-code" => Self::ClaudeCode,
            "claude-desktop" => Self::ClaudeDesktop,
            "chatgpt" => Self::ChatGpt,
            "cursor" => Self::Cursor,
            "any" => Self::Any,
            _ => Self::Other(token.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::ClaudeCode => "claude-code",
            Self::ClaudeDesktop => "claude-desktop",
            Self::ChatGpt => "chatgpt",
            Self::Cursor => "cursor",
            Self::Any => "any",
            Self::Other(token) => token,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Platform {
    fn from(token: String) -> Self {
        Self::parse(&token)
    }
}

impl From<Platform> for String {
    fn from(platform: Platform) -> Self {
        platform.as_str().to_string()
    }
}

/// Difficulty tier of a skill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Expert,
}

impl Complexity {
    pub const ALL: [Complexity; 4] = [
        Complexity::Beginner,
        Complexity::Intermediate,
        Complexity::Advanced,
        Complexity::Expert,
    ];

    /// Parse a complexity token, `None` if it is not one of the four tiers.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            "expert" => Some(Self::Expert),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Expert => "expert",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of an invocable capability listed under `tools`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    Mcp,
    Rest,
    Native,
    Cli,
}

impl ToolType {
    pub const ALL: [ToolType; 4] = [ToolType::Mcp, ToolType::Rest, ToolType::Native, ToolType::Cli];

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_lowercase().as_str() {
            "mcp" => Some(Self::Mcp),
            "rest" => Some(Self::Rest),
            "native" => Some(Self::Native),
            "cli" => Some(Self::Cli),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mcp => "mcp",
            Self::Rest => "rest",
            Self::Native => "native",
            Self::Cli => "cli",
        }
    }
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Metadata helpers ────────────────────────────────────────────────────

/// Look up a metadata field, treating an explicit `null` as absent.
pub(crate) fn field<'a>(metadata: &'a Mapping, key: &str) -> Option<&'a Value> {
    metadata.get(key).filter(|v| !v.is_null())
}

/// Render a scalar YAML value as a string. Sequences and mappings yield `None`.
pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_string(&tagged.value),
        _ => None,
    }
}

/// Collect the scalar items of a YAML sequence. `None` if the value is not a sequence.
pub(crate) fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_sequence()
        .map(|items| items.iter().filter_map(scalar_string).collect())
}

fn non_empty_string(metadata: &Mapping, key: &str) -> Option<String> {
    field(metadata, key)
        .and_then(scalar_string)
        .filter(|s| !s.trim().is_empty())
}

// ── Skill Record ────────────────────────────────────────────────────────

/// Lightweight skill metadata held by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillRecord {
    /// Two-segment identifier, `category/name`.
    pub path: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub tags: Vec<String>,
    pub platforms: Vec<Platform>,
    pub complexity: Complexity,
    category: String,
    /// Tool-type token to tool identifiers, in authoring order.
    pub tools: ToolMap,
}

impl SkillRecord {
    /// Build a record from raw metadata, applying the documented defaults.
    ///
    /// Fields of the wrong shape fall back to their defaults; rejecting them
    /// is the validator's job.
    pub fn from_metadata(path: &str, metadata: &Mapping) -> Self {
        let document_id = path.rsplit('/').next().unwrap_or(path);

        let tags = field(metadata, "tags")
            .and_then(string_list)
            .unwrap_or_default();

        let platforms = field(metadata, "platforms")
            .and_then(string_list)
            .map(|tokens| tokens.iter().map(|t| Platform::parse(t)).collect())
            .unwrap_or_else(|| vec![Platform::Any]);

        let complexity = field(metadata, "complexity")
            .and_then(scalar_string)
            .and_then(|c| Complexity::parse(&c))
            .unwrap_or_default();

        let mut tools = ToolMap::new();
        if let Some(mapping) = field(metadata, "tools").and_then(Value::as_mapping) {
            for (kind, list) in mapping {
                if let (Some(kind), Some(list)) = (scalar_string(kind), string_list(list)) {
                    tools.insert(kind, list);
                }
            }
        }

        Self {
            path: path.to_string(),
            name: non_empty_string(metadata, "name").unwrap_or_else(|| document_id.to_string()),
            version: non_empty_string(metadata, "version").unwrap_or_else(|| "1.0.0".to_string()),
            description: non_empty_string(metadata, "description").unwrap_or_default(),
            author: non_empty_string(metadata, "author").unwrap_or_else(|| "Unknown".to_string()),
            tags,
            platforms,
            complexity,
            category: category_of(path).to_string(),
            tools,
        }
    }

    /// Category, always the first segment of the path.
    pub fn category(&self) -> &str {
        &self.category
    }
}

/// First path segment, or `uncategorized` for an empty one.
pub(crate) fn category_of(path: &str) -> &str {
    match path.split('/').next() {
        Some(first) if !first.is_empty() => first,
        _ => "uncategorized",
    }
}

// ── Tools ───────────────────────────────────────────────────────────────

/// Tool buckets keyed by tool-type token, in the order the metadata lists them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolMap {
    buckets: Vec<(String, Vec<String>)>,
}

impl ToolMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a bucket. A repeated key replaces the list in place.
    pub fn insert(&mut self, kind: impl Into<String>, tools: Vec<String>) {
        let kind = kind.into();
        match self.buckets.iter_mut().find(|(k, _)| *k == kind) {
            Some(bucket) => bucket.1 = tools,
            None => self.buckets.push((kind, tools)),
        }
    }

    pub fn get(&self, kind: &str) -> Option<&[String]> {
        self.buckets
            .iter()
            .find(|(k, _)| k == kind)
            .map(|(_, tools)| tools.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.buckets
            .iter()
            .map(|(k, tools)| (k.as_str(), tools.as_slice()))
    }

    /// Every tool, bucket by bucket.
    pub fn all(&self) -> impl Iterator<Item = &String> {
        self.buckets.iter().flat_map(|(_, tools)| tools)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl Serialize for ToolMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buckets.len()))?;
        for (kind, tools) in &self.buckets {
            map.serialize_entry(kind, tools)?;
        }
        map.end()
    }
}

// ── Sections ────────────────────────────────────────────────────────────

/// Body sections keyed by lowercased heading, in first-seen order.
///
/// Inserting an existing key replaces its content but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap {
    entries: Vec<(String, String)>,
}

impl SectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, content: impl Into<String>) {
        let key = key.into();
        let content = content.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = content,
            None => self.entries.push((key, content)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for SectionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, content) in &self.entries {
            map.serialize_entry(key, content)?;
        }
        map.end()
    }
}

// ── Skill Document ──────────────────────────────────────────────────────

/// Fully parsed skill, produced on demand by the loader.
#[derive(Debug, Clone, Serialize)]
pub struct SkillDocument {
    #[serde(flatten)]
    pub record: SkillRecord,

    pub estimated_time: String,

    pub overview: String,
    pub prerequisites: String,
    pub procedure: String,
    pub tool_usage: String,
    pub best_practices: String,
    pub troubleshooting: String,
    pub examples: String,

    /// All `## ` sections, plus `intro` for leading content.
    pub sections: SectionMap,

    /// Body text after the metadata block, verbatim.
    pub raw_body: String,

    /// Metadata block exactly as parsed, before defaults.
    pub metadata: Mapping,
}

impl SkillDocument {
    /// Look up a section by heading name, case-insensitively.
    pub fn section(&self, name: &str) -> Option<&str> {
        self.sections.get(&name.trim().to_lowercase())
    }
}

// ── Registry Stats ──────────────────────────────────────────────────────

/// Counts over a discovered registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total_skills: usize,
    pub categories: usize,
    pub tags: usize,
    pub platforms: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_complexity: BTreeMap<String, usize>,
    /// When the discovery pass behind these counts finished.
    pub discovered_at: Option<DateTime<Utc>>,
}

// ── Validation ──────────────────────────────────────────────────────────

/// Outcome of checking one skill document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Skill path the report is for.
    pub path: String,

    /// Whether no errors were recorded.
    pub valid: bool,

    /// Policy violations that make the document invalid.
    pub errors: Vec<String>,

    /// Non-critical findings.
    pub warnings: Vec<String>,

    /// One-line summary of the counts.
    pub summary: String,
}

impl ValidationReport {
    /// Create a passing report.
    pub fn pass(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            summary: "Valid".to_string(),
        }
    }

    /// Report for a document whose file could not be read.
    pub fn read_failure(path: impl Into<String>, detail: impl fmt::Display) -> Self {
        let mut report = Self::pass(path);
        report.add_error(format!("Could not read file: {detail}"));
        report.summary = "Invalid: could not read file".to_string();
        report
    }

    /// Add an error.
    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
        self.valid = false;
        self.refresh_summary();
    }

    /// Add a warning.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
        self.refresh_summary();
    }

    fn refresh_summary(&mut self) {
        self.summary = if !self.errors.is_empty() {
            format!("Invalid: {} error(s)", self.errors.len())
        } else if !self.warnings.is_empty() {
            format!("Valid with {} warning(s)", self.warnings.len())
        } else {
            "Valid".to_string()
        };
    }
}
