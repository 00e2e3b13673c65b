//! Skill library core for skillbook.
//!
//! Parses skill documents (YAML metadata block + `## Section` markdown body),
//! indexes a `category/skill` directory tree for lookup and search, loads
//! single documents in full, and checks documents against the authoring
//! policy.

pub mod error;
pub mod layout;
pub mod loader;
pub mod models;
pub mod parser;
pub mod registry;
pub mod search;
pub mod validation;

pub use error::{Result, SkillError};
pub use layout::{resolve_document, DocumentEntry, SKILL_FILE_NAME};
pub use loader::{parse_document, to_prompt, tools_for_platform, SkillLoader};
pub use models::{
    Complexity, Platform, RegistryStats, SectionMap, SkillDocument, SkillRecord, ToolMap,
    ToolType, ValidationReport,
};
pub use parser::{extract_sections, parse_frontmatter, ParsedDocument};
pub use registry::SkillRegistry;
pub use validation::SkillValidator;
