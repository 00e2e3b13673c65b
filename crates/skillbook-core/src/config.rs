use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured skills root.
pub const ROOT_ENV_VAR: &str = "SKILLBOOK_ROOT";

/// Top-level application configuration, loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub skills: SkillsConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from default path (~/.config/skillbook/config.toml),
    /// falling back to defaults if the file doesn't exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Write current configuration to the default path.
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::default_path())
    }

    /// Write current configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skillbook")
            .join("config.toml")
    }

    /// Skills root after applying overrides: explicit flag, then
    /// `SKILLBOOK_ROOT`, then the configured value.
    pub fn resolve_root(&self, flag: Option<&Path>) -> PathBuf {
        if let Some(root) = flag {
            return root.to_path_buf();
        }
        match std::env::var_os(ROOT_ENV_VAR) {
            Some(root) if !root.is_empty() => PathBuf::from(root),
            _ => self.skills.root.clone(),
        }
    }
}

/// Skill library location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillsConfig {
    /// Directory holding one subdirectory per category.
    pub root: PathBuf,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("skills"),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Emit JSON lines instead of human-readable logs.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "skillbook=info,skillbook_skills=info,warn".into(),
            json: false,
        }
    }
}
