//! Skill discovery and in-memory indexing.
//!
//! A [`SkillRegistry`] is built by one [`SkillRegistry::discover`] pass over a
//! library root and is read-only afterwards. Besides the path-keyed record
//! map it keeps four secondary indices (tag, category, platform, complexity)
//! whose path lists preserve first-seen order.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::layout::{enumerate_documents, read_document, DocumentEntry};
use crate::models::{Platform, RegistryStats, SkillRecord};
use crate::parser::parse_frontmatter;
use crate::search;

// ── Path Index ──────────────────────────────────────────────────────────

/// Case-insensitive key → skill paths, in first-seen key order.
#[derive(Debug, Default)]
struct PathIndex {
    buckets: Vec<Bucket>,
    positions: HashMap<String, usize>,
}

#[derive(Debug)]
struct Bucket {
    /// Key as first seen, for display.
    label: String,
    paths: Vec<String>,
}

impl PathIndex {
    /// Add `path` under `key`. Keys differing only in case share a bucket,
    /// so a path repeated back to back is stored once.
    fn insert(&mut self, key: &str, path: &str) {
        let normalized = key.to_lowercase();
        let position = match self.positions.get(&normalized) {
            Some(&position) => position,
            None => {
                self.buckets.push(Bucket {
                    label: key.to_string(),
                    paths: Vec::new(),
                });
                self.positions.insert(normalized, self.buckets.len() - 1);
                self.buckets.len() - 1
            }
        };
        let paths = &mut self.buckets[position].paths;
        if paths.last().map(String::as_str) != Some(path) {
            paths.push(path.to_string());
        }
    }

    fn get(&self, key: &str) -> &[String] {
        self.positions
            .get(&key.to_lowercase())
            .map(|&position| self.buckets[position].paths.as_slice())
            .unwrap_or_default()
    }

    fn labels(&self) -> Vec<&str> {
        self.buckets.iter().map(|b| b.label.as_str()).collect()
    }

    fn counts(&self) -> BTreeMap<String, usize> {
        self.buckets
            .iter()
            .map(|b| (b.label.clone(), b.paths.len()))
            .collect()
    }

    fn len(&self) -> usize {
        self.buckets.len()
    }
}

// ── Registry ────────────────────────────────────────────────────────────

/// Indexed view of every skill under a library root.
pub struct SkillRegistry {
    root: PathBuf,
    skills: HashMap<String, SkillRecord>,
    /// Record keys in insertion order.
    order: Vec<String>,
    by_tag: PathIndex,
    by_category: PathIndex,
    by_platform: PathIndex,
    by_complexity: PathIndex,
    /// Documents skipped during discovery.
    errors: Vec<String>,
    discovered_at: Option<DateTime<Utc>>,
}

impl SkillRegistry {
    /// Create an empty registry for the library at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            skills: HashMap::new(),
            order: Vec::new(),
            by_tag: PathIndex::default(),
            by_category: PathIndex::default(),
            by_platform: PathIndex::default(),
            by_complexity: PathIndex::default(),
            errors: Vec::new(),
            discovered_at: None,
        }
    }

    /// Create a registry and run discovery immediately.
    pub fn discover_at(root: impl Into<PathBuf>) -> Result<Self> {
        let mut registry = Self::new(root);
        registry.discover()?;
        Ok(registry)
    }

    /// Library root this registry reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Index every skill under the root. Returns the number indexed.
    ///
    /// Documents that can't be read or whose metadata doesn't parse are
    /// skipped and listed in [`discovery_errors`](Self::discovery_errors).
    /// Only a failure to list the root aborts the pass.
    ///
    /// This is a single pass: running it again on a populated registry
    /// replaces records but appends duplicate index entries.
    pub fn discover(&mut self) -> Result<usize> {
        let entries = enumerate_documents(&self.root)?;

        // Reads run in parallel; collect keeps canonical order for indexing.
        let loaded: Vec<(DocumentEntry, Result<SkillRecord>)> = entries
            .into_par_iter()
            .map(|entry| {
                let record = read_record(&entry);
                (entry, record)
            })
            .collect();

        let mut indexed = 0;
        for (entry, result) in loaded {
            match result {
                Ok(record) => {
                    debug!("Indexed skill {}", record.path);
                    self.insert(record);
                    indexed += 1;
                }
                Err(e) if e.is_not_found() => {
                    debug!("No document at {:?}, skipping", entry.file);
                }
                Err(e) => {
                    warn!("Could not parse skill {}: {}", entry.skill_path(), e);
                    self.errors.push(format!("{}: {}", entry.skill_path(), e));
                }
            }
        }

        self.discovered_at = Some(Utc::now());
        info!(
            "Discovered {} skills in {} categories under {:?} ({} skipped)",
            indexed,
            self.by_category.len(),
            self.root,
            self.errors.len()
        );
        Ok(indexed)
    }

    fn insert(&mut self, record: SkillRecord) {
        let path = record.path.clone();

        for tag in &record.tags {
            self.by_tag.insert(tag, &path);
        }
        self.by_category.insert(record.category(), &path);
        for platform in &record.platforms {
            self.by_platform.insert(platform.as_str(), &path);
        }
        self.by_complexity.insert(record.complexity.as_str(), &path);

        if self.skills.insert(path.clone(), record).is_none() {
            self.order.push(path);
        }
    }

    fn resolve<'a>(&'a self, paths: impl IntoIterator<Item = &'a String>) -> Vec<&'a SkillRecord> {
        paths
            .into_iter()
            .filter_map(|path| self.skills.get(path))
            .collect()
    }

    /// All skills, in discovery order.
    pub fn get_all(&self) -> Vec<&SkillRecord> {
        self.resolve(&self.order)
    }

    /// Skill by `category/name` path.
    pub fn get(&self, path: &str) -> Option<&SkillRecord> {
        self.skills.get(path)
    }

    /// Skills carrying `tag`.
    pub fn find_by_tag(&self, tag: &str) -> Vec<&SkillRecord> {
        self.resolve(self.by_tag.get(tag))
    }

    /// Skills in `category`.
    pub fn find_by_category(&self, category: &str) -> Vec<&SkillRecord> {
        self.resolve(self.by_category.get(category))
    }

    /// Skills at the given complexity tier.
    pub fn find_by_complexity(&self, complexity: &str) -> Vec<&SkillRecord> {
        self.resolve(self.by_complexity.get(complexity))
    }

    /// Skills usable on `platform`: those declaring it, then those declaring
    /// `any`, each once.
    pub fn find_by_platform(&self, platform: &str) -> Vec<&SkillRecord> {
        let mut seen = HashSet::new();
        let any = Platform::Any.as_str();
        let paths = self
            .by_platform
            .get(platform)
            .iter()
            .chain(self.by_platform.get(any))
            .filter(|path| seen.insert(path.as_str()));
        self.resolve(paths)
    }

    /// Case-insensitive substring search over name, description, and tags.
    pub fn search(&self, query: &str) -> Vec<&SkillRecord> {
        let query_lower = query.to_lowercase();
        let results: Vec<&SkillRecord> = self
            .get_all()
            .into_iter()
            .filter(|record| search::matches(record, &query_lower))
            .collect();

        debug!("Skill search '{}' found {} results", query, results.len());
        results
    }

    /// Category names in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        self.by_category.labels()
    }

    /// Tags in first-seen order.
    pub fn tags(&self) -> Vec<&str> {
        self.by_tag.labels()
    }

    /// Counts computed from the current indices.
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            total_skills: self.skills.len(),
            categories: self.by_category.len(),
            tags: self.by_tag.len(),
            platforms: self.by_platform.len(),
            by_category: self.by_category.counts(),
            by_complexity: self.by_complexity.counts(),
            discovered_at: self.discovered_at,
        }
    }

    /// Documents skipped by discovery, as `path: reason`.
    pub fn discovery_errors(&self) -> &[String] {
        &self.errors
    }

    /// When the last discovery pass finished.
    pub fn discovered_at(&self) -> Option<DateTime<Utc>> {
        self.discovered_at
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

/// Read a document's metadata into a record, skipping section parsing.
fn read_record(entry: &DocumentEntry) -> Result<SkillRecord> {
    let raw = read_document(&entry.file)?;
    let parsed = parse_frontmatter(&raw)?;
    Ok(SkillRecord::from_metadata(&entry.skill_path(), &parsed.metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::SKILL_FILE_NAME;
    use crate::models::Complexity;
    use std::fs;
    use tempfile::TempDir;

    fn write_skill(root: &Path, path: &str, frontmatter: &str) {
        let file = root.join(format!("{path}.md"));
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(file, format!("---\n{frontmatter}\n---\n## Procedure\nDo it.\n")).unwrap();
    }

    fn fixture() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_skill(
            root,
            "itsm/incident-triage",
            "name: Incident Triage\ndescription: Triage Priority Incidents\ntags: [incidents, itsm]\nplatforms: [chatgpt]\ncomplexity: beginner",
        );
        write_skill(
            root,
            "itsm/change-review",
            "name: Change Review\ndescription: Review change requests\ntags: [changes, ITSM]\nplatforms: [claude-code]",
        );
        write_skill(
            root,
            "cmdb/ci-health",
            "name: CI Health\ndescription: Check configuration items\ntags: [cmdb]",
        );
        write_skill(
            root,
            "cmdb/relationships",
            "name: Relationships\ndescription: Map CI relationships\nplatforms: [chatgpt, any]\ncomplexity: expert",
        );
        temp_dir
    }

    fn paths(records: &[&SkillRecord]) -> Vec<String> {
        records.iter().map(|r| r.path.clone()).collect()
    }

    #[test]
    fn test_discover_grid() {
        let temp_dir = TempDir::new().unwrap();
        for category in ["admin", "catalog", "security"] {
            for skill in ["one", "two"] {
                write_skill(temp_dir.path(), &format!("{category}/{skill}"), "name: x");
            }
        }

        let registry = SkillRegistry::discover_at(temp_dir.path()).unwrap();
        assert_eq!(registry.get_all().len(), 6);
        assert_eq!(registry.categories(), vec!["admin", "catalog", "security"]);
        assert!(registry.discovered_at().is_some());
    }

    #[test]
    fn test_discovery_order_is_canonical() {
        let temp_dir = fixture();
        let registry = SkillRegistry::discover_at(temp_dir.path()).unwrap();
        assert_eq!(
            paths(&registry.get_all()),
            vec![
                "cmdb/ci-health",
                "cmdb/relationships",
                "itsm/change-review",
                "itsm/incident-triage"
            ]
        );
    }

    #[test]
    fn test_get_and_category() {
        let temp_dir = fixture();
        let registry = SkillRegistry::discover_at(temp_dir.path()).unwrap();

        let record = registry.get("itsm/incident-triage").unwrap();
        assert_eq!(record.name, "Incident Triage");
        assert_eq!(record.category(), "itsm");
        assert!(registry.get("itsm/missing").is_none());

        assert_eq!(registry.find_by_category("ITSM").len(), 2);
        assert!(registry.find_by_category("unknown").is_empty());
    }

    #[test]
    fn test_find_by_tag_case_insensitive() {
        let temp_dir = fixture();
        let registry = SkillRegistry::discover_at(temp_dir.path()).unwrap();

        assert_eq!(
            paths(&registry.find_by_tag("itsm")),
            vec!["itsm/change-review", "itsm/incident-triage"]
        );
        assert_eq!(registry.find_by_tag("Incidents").len(), 1);
        assert!(registry.find_by_tag("nothing").is_empty());
        // First-seen spelling is reported.
        assert!(registry.tags().contains(&"ITSM"));
    }

    #[test]
    fn test_find_by_platform_union() {
        let temp_dir = fixture();
        let registry = SkillRegistry::discover_at(temp_dir.path()).unwrap();

        // chatgpt-specific first, then `any` (including omitted platforms), each once.
        assert_eq!(
            paths(&registry.find_by_platform("ChatGPT")),
            vec!["cmdb/relationships", "itsm/incident-triage", "cmdb/ci-health"]
        );
        assert_eq!(
            paths(&registry.find_by_platform("any")),
            vec!["cmdb/ci-health", "cmdb/relationships"]
        );
        assert_eq!(
            paths(&registry.find_by_platform("cursor")),
            vec!["cmdb/ci-health", "cmdb/relationships"]
        );
    }

    #[test]
    fn test_find_by_platform_any_everywhere() {
        let temp_dir = TempDir::new().unwrap();
        write_skill(temp_dir.path(), "a/one", "name: One");
        write_skill(temp_dir.path(), "a/two", "name: Two\nplatforms: [any]");
        write_skill(temp_dir.path(), "b/three", "name: Three\nplatforms: [chatgpt, any]");

        let registry = SkillRegistry::discover_at(temp_dir.path()).unwrap();
        assert_eq!(registry.find_by_platform("any").len(), registry.len());
        assert_eq!(registry.find_by_platform("chatgpt").len(), 3);
    }

    #[test]
    fn test_find_by_complexity() {
        let temp_dir = fixture();
        let registry = SkillRegistry::discover_at(temp_dir.path()).unwrap();
        assert_eq!(registry.find_by_complexity("Expert").len(), 1);
        assert_eq!(
            registry.find_by_complexity(Complexity::Intermediate.as_str()).len(),
            2
        );
    }

    #[test]
    fn test_search_case_insensitive_substring() {
        let temp_dir = fixture();
        let registry = SkillRegistry::discover_at(temp_dir.path()).unwrap();

        for query in ["triage", "PRIORITY", "inc"] {
            let found = paths(&registry.search(query));
            assert!(
                found.contains(&"itsm/incident-triage".to_string()),
                "query {query} should match"
            );
        }
        assert_eq!(paths(&registry.search("cmdb")), vec!["cmdb/ci-health"]);
        assert!(registry.search("nonexistent").is_empty());
    }

    #[test]
    fn test_stats() {
        let temp_dir = fixture();
        let registry = SkillRegistry::discover_at(temp_dir.path()).unwrap();
        let stats = registry.stats();

        assert_eq!(stats.total_skills, 4);
        assert_eq!(stats.categories, 2);
        // incidents, itsm/ITSM, changes, cmdb
        assert_eq!(stats.tags, 4);
        // chatgpt, claude-code, any
        assert_eq!(stats.platforms, 3);
        assert_eq!(stats.by_category["itsm"], 2);
        assert_eq!(stats.by_complexity["intermediate"], 2);
        assert_eq!(stats.by_complexity["beginner"], 1);
        assert_eq!(stats.by_complexity["expert"], 1);
        assert_eq!(stats.discovered_at, registry.discovered_at());
        assert!(stats.discovered_at.is_some());
    }

    #[test]
    fn test_stats_before_discovery() {
        let registry = SkillRegistry::new("unused");
        let stats = registry.stats();
        assert_eq!(stats.total_skills, 0);
        assert!(stats.discovered_at.is_none());
    }

    #[test]
    fn test_tags_differing_in_case_index_once() {
        let temp_dir = TempDir::new().unwrap();
        write_skill(
            temp_dir.path(),
            "itsm/a",
            "name: A\ntags: [itsm, ITSM, Itsm]\nplatforms: [chatgpt, ChatGPT]",
        );

        let registry = SkillRegistry::discover_at(temp_dir.path()).unwrap();
        assert_eq!(paths(&registry.find_by_tag("itsm")), vec!["itsm/a"]);
        assert_eq!(registry.tags(), vec!["itsm"]);
        assert_eq!(paths(&registry.find_by_platform("chatgpt")), vec!["itsm/a"]);
        assert_eq!(registry.stats().tags, 1);
    }

    #[test]
    fn test_bad_metadata_skipped() {
        let temp_dir = fixture();
        let broken = temp_dir.path().join("itsm").join("broken.md");
        fs::write(&broken, "---\nname: [unclosed\n---\nbody").unwrap();

        let registry = SkillRegistry::discover_at(temp_dir.path()).unwrap();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.discovery_errors().len(), 1);
        assert!(registry.discovery_errors()[0].starts_with("itsm/broken"));
    }

    #[test]
    fn test_wrapped_layout_and_missing_skill_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let wrapped = root.join("catalog").join("request-item");
        fs::create_dir_all(&wrapped).unwrap();
        fs::write(
            wrapped.join(SKILL_FILE_NAME),
            "---\nname: Request Item\n---\n## Procedure\nSubmit.",
        )
        .unwrap();
        fs::create_dir_all(root.join("catalog").join("assets")).unwrap();

        let registry = SkillRegistry::discover_at(root).unwrap();
        assert_eq!(paths(&registry.get_all()), vec!["catalog/request-item"]);
        assert!(registry.discovery_errors().is_empty());
    }

    #[test]
    fn test_second_discover_duplicates_index_entries() {
        let temp_dir = fixture();
        let mut registry = SkillRegistry::new(temp_dir.path());
        registry.discover().unwrap();
        registry.discover().unwrap();

        assert_eq!(registry.len(), 4);
        assert_eq!(registry.find_by_category("itsm").len(), 4);
        // Platform lookups de-duplicate regardless.
        assert_eq!(registry.find_by_platform("chatgpt").len(), 3);
    }

    #[test]
    fn test_missing_root_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = SkillRegistry::new(temp_dir.path().join("nope"));
        assert!(registry.discover().is_err());
    }
}
