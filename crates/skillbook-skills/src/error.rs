use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by explicit skill operations.
///
/// Discovery and batch validation never surface per-document failures
/// through this type; they log and record them instead. Only single-document
/// loads and root directory listing fail with a `SkillError`.
#[derive(Error, Debug)]
pub enum SkillError {
    #[error("Skill not found: {0}")]
    NotFound(String),

    #[error("Invalid skill path: {0} (expected category/name)")]
    InvalidPath(String),

    #[error("Invalid YAML frontmatter: {0}")]
    Parse(String),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SkillError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the error means "no such document" rather than a broken one.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SkillError>;
