//! Authoring policy checks for skill documents.
//!
//! The rule set is fixed. Errors make a document invalid; warnings flag
//! missing recommended content. A metadata block that fails to parse
//! short-circuits every other rule.

use std::path::Path;
use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::error::Result;
use crate::layout::{enumerate_documents, read_document, read_skill, DocumentEntry};
use crate::models::{field, scalar_string, Complexity, Platform, SectionMap, ToolType, ValidationReport};
use crate::parser::{parse_frontmatter, ParsedDocument};

const REQUIRED_FIELDS: [&str; 3] = ["name", "version", "description"];

const RECOMMENDED_FIELDS: [&str; 5] = ["author", "tags", "platforms", "tools", "complexity"];

const REQUIRED_SECTIONS: [&str; 1] = ["procedure"];

const RECOMMENDED_SECTIONS: [&str; 3] = ["overview", "prerequisites", "best practices"];

/// Procedures shorter than this (trimmed, in chars) draw a warning.
pub const MIN_PROCEDURE_LEN: usize = 50;

static SEMVER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+").expect("valid semver pattern"));

/// Stateless checker; every call returns a fresh report.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkillValidator;

impl SkillValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate raw document text.
    pub fn validate(&self, raw: &str, path: &str) -> ValidationReport {
        match parse_frontmatter(raw) {
            Ok(parsed) => self.validate_document(&parsed, path),
            Err(e) => {
                let mut report = ValidationReport::pass(path);
                report.add_error(e.to_string());
                report
            }
        }
    }

    /// Validate an already parsed document.
    pub fn validate_document(&self, document: &ParsedDocument, path: &str) -> ValidationReport {
        let mut report = ValidationReport::pass(path);
        check_metadata(&document.metadata, &mut report);
        check_tools(&document.metadata, &mut report);
        check_sections(&document.sections(), &mut report);
        report
    }

    /// Read and validate the skill at `category/name` under `root`.
    ///
    /// Unlike [`validate_all`](Self::validate_all), a missing or unreadable
    /// document is an error rather than a report.
    pub fn validate_path(&self, root: &Path, skill_path: &str) -> Result<ValidationReport> {
        let (file, raw) = read_skill(root, skill_path)?;
        debug!("Validating skill {} from {:?}", skill_path, file);
        Ok(self.validate(&raw, skill_path))
    }

    /// Validate every document under `root`, in category then document order.
    ///
    /// Wrapped directories without a skill file are skipped; any other read
    /// failure becomes a failing report for that entry. Only a failure to
    /// list `root` is returned as an error.
    pub fn validate_all(&self, root: &Path) -> Result<Vec<ValidationReport>> {
        let entries = enumerate_documents(root)?;

        let reports: Vec<ValidationReport> = entries
            .par_iter()
            .filter_map(|entry| self.validate_entry(entry))
            .collect();

        let invalid = reports.iter().filter(|r| !r.valid).count();
        info!(
            "Validated {} skills under {:?}: {} valid, {} invalid",
            reports.len(),
            root,
            reports.len() - invalid,
            invalid
        );
        Ok(reports)
    }

    fn validate_entry(&self, entry: &DocumentEntry) -> Option<ValidationReport> {
        let path = entry.skill_path();
        match read_document(&entry.file) {
            Ok(raw) => Some(self.validate(&raw, &path)),
            Err(e) if e.is_not_found() => {
                debug!("No document at {:?}, skipping", entry.file);
                None
            }
            Err(e) => Some(ValidationReport::read_failure(path, e)),
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Exact, case-sensitive match of a scalar against the allowed tokens.
fn is_one_of<'a>(value: &Value, allowed: impl IntoIterator<Item = &'a str>) -> bool {
    scalar_string(value).is_some_and(|token| allowed.into_iter().any(|a| a == token))
}

fn describe(value: &Value) -> String {
    scalar_string(value).unwrap_or_else(|| {
        serde_yaml::to_string(value)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    })
}

fn check_metadata(metadata: &Mapping, report: &mut ValidationReport) {
    for name in REQUIRED_FIELDS {
        if metadata.get(name).map_or(true, is_blank) {
            report.add_error(format!("Missing required field: {name}"));
        }
    }

    for name in RECOMMENDED_FIELDS {
        if field(metadata, name).is_none() {
            report.add_warning(format!("Missing recommended field: {name}"));
        }
    }

    if let Some(version) = field(metadata, "version").filter(|v| !is_blank(v)) {
        let version = describe(version);
        if !SEMVER_PREFIX.is_match(&version) {
            report.add_warning(format!("Version should follow semver format: {version}"));
        }
    }

    if let Some(complexity) = field(metadata, "complexity") {
        if !is_one_of(complexity, Complexity::ALL.iter().map(Complexity::as_str)) {
            let valid: Vec<&str> = Complexity::ALL.iter().map(Complexity::as_str).collect();
            report.add_error(format!(
                "Invalid complexity: {}. Valid: {}",
                describe(complexity),
                valid.join(", ")
            ));
        }
    }

    if let Some(platforms) = field(metadata, "platforms") {
        match platforms.as_sequence() {
            None => report.add_error("platforms must be an array".to_string()),
            Some(items) => {
                for item in items {
                    if !is_one_of(item, Platform::KNOWN) {
                        report.add_warning(format!("Unknown platform: {}", describe(item)));
                    }
                }
            }
        }
    }

    if let Some(tags) = field(metadata, "tags") {
        if !tags.is_sequence() {
            report.add_error("tags must be an array".to_string());
        }
    }
}

fn check_tools(metadata: &Mapping, report: &mut ValidationReport) {
    let Some(tools) = field(metadata, "tools") else {
        return;
    };
    let Some(tools) = tools.as_mapping() else {
        report.add_error("tools must be a mapping of tool type to list".to_string());
        return;
    };

    for (kind, list) in tools {
        let known = is_one_of(kind, ToolType::ALL.iter().map(ToolType::as_str));
        let kind = describe(kind);
        if !known {
            report.add_warning(format!("Unknown tool type: {kind}"));
        }
        if !list.is_sequence() {
            report.add_error(format!("tools.{kind} must be an array"));
        }
    }
}

fn check_sections(sections: &SectionMap, report: &mut ValidationReport) {
    for name in REQUIRED_SECTIONS {
        if !sections.contains(name) {
            report.add_error(format!("Missing required section: ## {name}"));
        }
    }

    for name in RECOMMENDED_SECTIONS {
        if !sections.contains(name) {
            report.add_warning(format!("Missing recommended section: ## {name}"));
        }
    }

    if let Some(procedure) = sections.get("procedure") {
        if procedure.trim().chars().count() < MIN_PROCEDURE_LEN {
            report.add_warning("Procedure section seems too short".to_string());
        }
    }
}
