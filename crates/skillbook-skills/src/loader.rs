//! On-demand loading of full skill documents.
//!
//! Unlike the registry, the loader parses the whole body into sections and
//! fails loudly: a missing file, unreadable file, or broken metadata block
//! is returned to the caller. Loaded documents are not cached.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::layout::read_skill;
use crate::models::{field, scalar_string, SectionMap, SkillDocument, SkillRecord, ToolType};
use crate::parser::{extract_sections, parse_frontmatter};

/// Loads skills from a library root.
#[derive(Debug, Clone)]
pub struct SkillLoader {
    root: PathBuf,
}

impl SkillLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load and fully parse the skill at `category/name`.
    pub fn load(&self, skill_path: &str) -> Result<SkillDocument> {
        let (file, raw) = read_skill(&self.root, skill_path)?;

        debug!("Loaded skill {} from {:?}", skill_path, file);
        parse_document(&raw, skill_path)
    }

    /// Load several skills, failing on the first error.
    pub fn load_many<S: AsRef<str>>(&self, skill_paths: &[S]) -> Result<Vec<SkillDocument>> {
        skill_paths.iter().map(|p| self.load(p.as_ref())).collect()
    }
}

/// First non-empty section among `keys`, or `""`.
fn first_section(sections: &SectionMap, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| sections.get(key))
        .find(|content| !content.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Parse raw document text into a full skill document.
pub fn parse_document(raw: &str, skill_path: &str) -> Result<SkillDocument> {
    let parsed = parse_frontmatter(raw)?;
    let sections = extract_sections(&parsed.body);

    let estimated_time = field(&parsed.metadata, "estimated_time")
        .and_then(scalar_string)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "varies".to_string());

    Ok(SkillDocument {
        record: SkillRecord::from_metadata(skill_path, &parsed.metadata),
        estimated_time,
        overview: first_section(&sections, &["overview", "description"]),
        prerequisites: first_section(&sections, &["prerequisites"]),
        procedure: first_section(&sections, &["procedure", "steps"]),
        tool_usage: first_section(&sections, &["tool usage", "tools"]),
        best_practices: first_section(&sections, &["best practices"]),
        troubleshooting: first_section(&sections, &["troubleshooting"]),
        examples: first_section(&sections, &["examples"]),
        sections,
        raw_body: parsed.body,
        metadata: parsed.metadata,
    })
}

fn bucket<'a>(document: &'a SkillDocument, kind: ToolType) -> &'a [String] {
    document.record.tools.get(kind.as_str()).unwrap_or_default()
}

/// Tools a document offers on `platform`.
///
/// Claude platforms get the `mcp` then `native` buckets, `chatgpt` gets
/// `rest`, and anything else gets every bucket in authoring order.
pub fn tools_for_platform(document: &SkillDocument, platform: &str) -> Vec<String> {
    match platform.trim().to_lowercase().as_str() {
        "claude-code" | "claude-desktop" => bucket(document, ToolType::Mcp)
            .iter()
            .chain(bucket(document, ToolType::Native))
            .cloned()
            .collect(),
        "chatgpt" => bucket(document, ToolType::Rest).to_vec(),
        _ => document.record.tools.all().cloned().collect(),
    }
}

/// Condensed prompt rendering of a document.
pub fn to_prompt(document: &SkillDocument) -> String {
    format!(
        "# {}\n\n{}\n\n## Procedure\n{}\n\n## Best Practices\n{}",
        document.record.name, document.record.description, document.procedure, document.best_practices
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SkillError;
    use crate::layout::SKILL_FILE_NAME;
    use crate::models::{Complexity, Platform};
    use std::fs;
    use tempfile::TempDir;

    const TRIAGE: &str = "---\nname: Incident Triage\nversion: 1.0.0\ndescription: Triages incoming incidents\n\
                          complexity: beginner\nplatforms: [any]\n---\n## Procedure\nDo X then Y.";

    fn tooled() -> SkillDocument {
        parse_document(
            "---\nname: Tools\ntools:\n  rest: [table-api]\n  mcp: [sn-query, sn-update]\n  native: [bash]\n  cli: [snc]\n---\n",
            "admin/tools",
        )
        .unwrap()
    }

    #[test]
    fn test_end_to_end_load() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("itsm")).unwrap();
        fs::write(temp_dir.path().join("itsm").join("incident-triage.md"), TRIAGE).unwrap();

        let document = SkillLoader::new(temp_dir.path())
            .load("itsm/incident-triage")
            .unwrap();
        assert_eq!(document.procedure, "Do X then Y.");
        assert_eq!(document.record.name, "Incident Triage");
        assert_eq!(document.record.complexity, Complexity::Beginner);
        assert_eq!(document.record.platforms, vec![Platform::Any]);
        assert_eq!(document.record.category(), "itsm");
        assert_eq!(document.raw_body, "## Procedure\nDo X then Y.");
        assert_eq!(document.estimated_time, "varies");
    }

    #[test]
    fn test_load_wrapped_layout() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("itsm").join("incident-triage");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(SKILL_FILE_NAME), TRIAGE).unwrap();

        let document = SkillLoader::new(temp_dir.path())
            .load("itsm/incident-triage")
            .unwrap();
        assert_eq!(document.record.path, "itsm/incident-triage");
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let err = SkillLoader::new(temp_dir.path()).load("itsm/missing").unwrap_err();
        assert!(matches!(err, SkillError::NotFound(ref p) if p == "itsm/missing"));
        assert_eq!(err.to_string(), "Skill not found: itsm/missing");
    }

    #[test]
    fn test_load_rejects_escaping_path() {
        let temp_dir = TempDir::new().unwrap();
        let err = SkillLoader::new(temp_dir.path()).load("../secrets").unwrap_err();
        assert!(matches!(err, SkillError::InvalidPath(_)));
    }

    #[test]
    fn test_load_bad_metadata_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("itsm")).unwrap();
        fs::write(
            temp_dir.path().join("itsm").join("broken.md"),
            "---\nname: [oops\n---\n",
        )
        .unwrap();

        let err = SkillLoader::new(temp_dir.path()).load("itsm/broken").unwrap_err();
        assert!(matches!(err, SkillError::Parse(_)));
    }

    #[test]
    fn test_load_many_fails_fast() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("itsm")).unwrap();
        fs::write(temp_dir.path().join("itsm").join("a.md"), TRIAGE).unwrap();

        let loader = SkillLoader::new(temp_dir.path());
        assert_eq!(loader.load_many(&["itsm/a", "itsm/a"]).unwrap().len(), 2);
        assert!(loader.load_many(&["itsm/a", "itsm/b"]).is_err());
    }

    #[test]
    fn test_section_aliases() {
        let document = parse_document(
            "## Description\nAbout.\n## Steps\n1. Go.\n## Tools\nUse the API.\n## Troubleshooting\nRetry.",
            "a/b",
        )
        .unwrap();
        assert_eq!(document.overview, "About.");
        assert_eq!(document.procedure, "1. Go.");
        assert_eq!(document.tool_usage, "Use the API.");
        assert_eq!(document.troubleshooting, "Retry.");
        assert_eq!(document.examples, "");
        assert_eq!(document.section("STEPS"), Some("1. Go."));
    }

    #[test]
    fn test_defaults_without_frontmatter() {
        let document = parse_document("Just text.", "admin/notes").unwrap();
        assert_eq!(document.record.name, "notes");
        assert_eq!(document.record.author, "Unknown");
        assert_eq!(document.sections.get("intro"), Some("Just text."));
        assert_eq!(document.procedure, "");
    }

    #[test]
    fn test_tools_for_claude_platforms() {
        let document = tooled();
        let expected = vec!["sn-query", "sn-update", "bash"];
        assert_eq!(tools_for_platform(&document, "claude-code"), expected);
        assert_eq!(tools_for_platform(&document, "Claude-Desktop"), expected);
    }

    #[test]
    fn test_tools_for_chatgpt() {
        assert_eq!(tools_for_platform(&tooled(), "chatgpt"), vec!["table-api"]);
    }

    #[test]
    fn test_tools_fallback_is_union() {
        let all = tools_for_platform(&tooled(), "cursor");
        assert_eq!(all, vec!["table-api", "sn-query", "sn-update", "bash", "snc"]);
        assert_eq!(tools_for_platform(&tooled(), "something-else"), all);
    }

    #[test]
    fn test_tools_without_buckets() {
        let document = parse_document(TRIAGE, "itsm/incident-triage").unwrap();
        assert!(tools_for_platform(&document, "claude-code").is_empty());
        assert!(tools_for_platform(&document, "any").is_empty());
    }

    #[test]
    fn test_to_prompt() {
        let document = parse_document(
            &format!("{TRIAGE}\n\n## Best Practices\nConfirm priority."),
            "itsm/incident-triage",
        )
        .unwrap();
        assert_eq!(
            to_prompt(&document),
            "# Incident Triage\n\nTriages incoming incidents\n\n## Procedure\nDo X then Y.\n\n## Best Practices\nConfirm priority."
        );
    }
}
