//! On-disk layout of a skill library.
//!
//! ```text
//! root/
//!   <category>/
//!     <skill>.md            flat layout
//!     <skill>/SKILL.md      wrapped layout
//! ```
//!
//! Both layouts name the same logical document, `category/skill`. Everything
//! that touches files goes through [`resolve_document`] so indexing and
//! validation never care which layout a document uses.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, SkillError};

/// File name inside a wrapped skill directory.
pub const SKILL_FILE_NAME: &str = "SKILL.md";

const DOCUMENT_EXTENSION: &str = ".md";

/// A document slot found while walking the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    pub category: String,
    pub id: String,
    /// Canonical file location. May not exist for a wrapped directory
    /// without a `SKILL.md`.
    pub file: PathBuf,
}

impl DocumentEntry {
    /// Registry key, `category/id`.
    pub fn skill_path(&self) -> String {
        format!("{}/{}", self.category, self.id)
    }
}

/// Canonical file for document `id` inside `category_dir`.
///
/// The flat `<id>.md` wins when it exists; otherwise the wrapped
/// `<id>/SKILL.md` location is returned whether or not it exists.
pub fn resolve_document(category_dir: &Path, id: &str) -> PathBuf {
    let flat = category_dir.join(format!("{id}{DOCUMENT_EXTENSION}"));
    if flat.is_file() {
        flat
    } else {
        category_dir.join(id).join(SKILL_FILE_NAME)
    }
}

/// Resolve a `category/name` skill path under `root`.
pub fn locate(root: &Path, skill_path: &str) -> Result<PathBuf> {
    let (category, id) = split_skill_path(skill_path)?;
    Ok(resolve_document(&root.join(category), id))
}

/// Split a skill path into `(category, id)`, rejecting anything that could
/// leave the library root.
pub fn split_skill_path(skill_path: &str) -> Result<(&str, &str)> {
    let invalid = || SkillError::InvalidPath(skill_path.to_string());

    let (category, id) = skill_path.split_once('/').ok_or_else(invalid)?;
    for segment in [category, id] {
        if segment.is_empty()
            || segment == "."
            || segment == ".."
            || segment.contains(&['/', '\\'][..])
        {
            return Err(invalid());
        }
    }
    Ok((category, id))
}

/// Every document slot under `root`, ordered by category then document id.
///
/// Only a failure to list `root` itself is an error. Unreadable category
/// directories are logged and skipped.
pub fn enumerate_documents(root: &Path) -> Result<Vec<DocumentEntry>> {
    let mut documents = Vec::new();

    for category in list_children(root)? {
        if !category.is_dir {
            continue;
        }
        let ids = match document_ids(&category.path) {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Skipping category {}: {}", category.name, e);
                continue;
            }
        };
        for id in ids {
            documents.push(DocumentEntry {
                file: resolve_document(&category.path, &id),
                category: category.name.clone(),
                id,
            });
        }
    }

    debug!("Found {} document slots under {:?}", documents.len(), root);
    Ok(documents)
}

struct Child {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

/// Immediate, non-hidden children of `dir`, sorted by name.
fn list_children(dir: &Path) -> Result<Vec<Child>> {
    let mut children = Vec::new();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(SkillError::io(dir, std::io::Error::from(e)));
            }
            Err(e) => {
                warn!("Skipping unreadable entry in {:?}: {}", dir, e);
                continue;
            }
        };

        let Some(name) = entry.file_name().to_str() else {
            warn!("Skipping non UTF-8 entry {:?}", entry.path());
            continue;
        };
        if name.starts_with('.') {
            continue;
        }

        children.push(Child {
            name: name.to_string(),
            path: entry.path().to_path_buf(),
            is_dir: entry.file_type().is_dir(),
        });
    }

    Ok(children)
}

/// Document ids in a category: `*.md` stems and subdirectory names, deduplicated.
fn document_ids(category_dir: &Path) -> Result<BTreeSet<String>> {
    let mut ids = BTreeSet::new();
    for child in list_children(category_dir)? {
        if child.is_dir {
            ids.insert(child.name);
        } else if let Some(stem) = child.name.strip_suffix(DOCUMENT_EXTENSION) {
            if !stem.is_empty() {
                ids.insert(stem.to_string());
            }
        }
    }
    Ok(ids)
}

/// Read a document file as UTF-8.
pub(crate) fn read_document(file: &Path) -> Result<String> {
    std::fs::read_to_string(file).map_err(|e| SkillError::io(file, e))
}

/// Resolve and read the skill at `category/name`. A missing file is
/// [`SkillError::NotFound`] naming the skill path.
pub(crate) fn read_skill(root: &Path, skill_path: &str) -> Result<(PathBuf, String)> {
    let file = locate(root, skill_path)?;
    match read_document(&file) {
        Ok(raw) => Ok((file, raw)),
        Err(e) if e.is_not_found() => Err(SkillError::NotFound(skill_path.to_string())),
        Err(e) => Err(e),
    }
}
