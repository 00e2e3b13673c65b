//! Metadata search and snippet extraction for skills.
//!
//! Search is a linear substring scan over name, description, and tags. The
//! libraries this serves hold at most a few thousand skills, so no inverted
//! index is built.

use crate::models::SkillRecord;

/// Lowercased text a record is searched against.
pub fn search_text(record: &SkillRecord) -> String {
    format!(
        "{} {} {}",
        record.name,
        record.description,
        record.tags.join(" ")
    )
    .to_lowercase()
}

/// Whether `record` matches an already lowercased query.
pub fn matches(record: &SkillRecord, query_lower: &str) -> bool {
    search_text(record).contains(query_lower)
}

// ── Snippet Extraction ──────────────────────────────────────────────────

/// Extract a snippet around a search term match.
///
/// Returns a portion of the content centered around the first
/// case-insensitive match, with ellipsis indicators if truncated.
pub fn extract_snippet(content: &str, term: &str, context_chars: usize) -> Option<String> {
    let term_lower = term.to_lowercase();
    if term_lower.is_empty() {
        return None;
    }

    // Match on lowercased chars but slice the original by char index, so
    // case folding that changes byte lengths can't split a character.
    let chars: Vec<char> = content.chars().collect();
    let lowered: Vec<String> = chars.iter().map(|c| c.to_lowercase().collect()).collect();
    let term_chars: Vec<char> = term_lower.chars().collect();

    let pos = (0..chars.len()).find(|&start| {
        let mut candidate = String::new();
        for piece in lowered.iter().skip(start) {
            if candidate.len() >= term_lower.len() {
                break;
            }
            candidate.push_str(piece);
        }
        candidate.starts_with(&term_lower)
    })?;

    let start = find_word_start(&chars, pos.saturating_sub(context_chars));
    let end = find_word_end(&chars, (pos + term_chars.len() + context_chars).min(chars.len()));

    let mut snippet = String::new();
    if start > 0 {
        snippet.push_str("...");
    }
    snippet.push_str(chars[start..end].iter().collect::<String>().trim());
    if end < chars.len() {
        snippet.push_str("...");
    }

    // Clean up whitespace.
    let snippet = snippet
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Some(snippet)
}

/// Find the start of a word boundary.
fn find_word_start(chars: &[char], pos: usize) -> usize {
    let mut start = pos;
    while start > 0 && !chars[start - 1].is_whitespace() {
        start -= 1;
    }
    start
}

/// Find the end of a word boundary.
fn find_word_end(chars: &[char], pos: usize) -> usize {
    let mut end = pos;
    while end < chars.len() && !chars[end].is_whitespace() {
        end += 1;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Mapping;

    fn record(name: &str, description: &str, tags: &[&str]) -> SkillRecord {
        let mut record = SkillRecord::from_metadata("itsm/test", &Mapping::new());
        record.name = name.to_string();
        record.description = description.to_string();
        record.tags = tags.iter().map(|t| t.to_string()).collect();
        record
    }

    #[test]
    fn test_search_text_joins_fields() {
        let r = record("Triage", "Sort Incidents", &["ITSM", "queue"]);
        assert_eq!(search_text(&r), "triage sort incidents itsm queue");
    }

    #[test]
    fn test_matches_across_field_boundary() {
        let r = record("Triage", "Sort incidents", &["itsm"]);
        assert!(matches(&r, "incidents itsm"));
        assert!(!matches(&r, "change"));
    }

    #[test]
    fn test_extract_snippet_basic() {
        let content = "This is a test of the snippet extraction function.";
        let snippet = extract_snippet(content, "snippet", 10).unwrap();
        assert!(snippet.contains("snippet"));
    }

    #[test]
    fn test_extract_snippet_at_start() {
        let content = "Test content here with more words";
        let snippet = extract_snippet(content, "Test", 10).unwrap();
        assert!(snippet.starts_with("Test"));
        assert!(snippet.ends_with("..."));
    }

    #[test]
    fn test_extract_snippet_not_found() {
        let content = "This content doesn't have the search term";
        assert!(extract_snippet(content, "missing", 10).is_none());
    }

    #[test]
    fn test_extract_snippet_case_insensitive() {
        let content = "This has a TERM in it";
        let snippet = extract_snippet(content, "term", 10).unwrap();
        assert!(snippet.contains("TERM"));
    }

    #[test]
    fn test_extract_snippet_multibyte() {
        let content = "Überprüfung der Störungen läuft täglich";
        let snippet = extract_snippet(content, "störungen", 5).unwrap();
        assert!(snippet.contains("Störungen"));
    }
}
