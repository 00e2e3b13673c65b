mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use skillbook_core::config::{AppConfig, LoggingConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "skillbook",
    about = "Index, search, load, and validate a library of skill documents",
    version,
    author
)]
struct Cli {
    /// Path to config file (default: ~/.config/skillbook/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Skills root directory (overrides SKILLBOOK_ROOT and the config file)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List skills, optionally filtered
    List {
        /// Only skills in this category
        #[arg(short, long)]
        category: Option<String>,
        /// Only skills carrying this tag
        #[arg(short, long)]
        tag: Option<String>,
        /// Only skills usable on this platform
        #[arg(short, long)]
        platform: Option<String>,
        /// Only skills at this complexity tier
        #[arg(long)]
        complexity: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search skills by name, description, or tags
    Search {
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load and display a skill
    Load {
        /// Skill path, e.g. itsm/incident-triage
        path: String,
        /// Show one section only
        #[arg(short, long)]
        section: Option<String>,
        /// Output the condensed prompt rendering
        #[arg(long)]
        prompt: bool,
        /// List the tools available on this platform
        #[arg(short, long)]
        platform: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show skill metadata
    Info { path: String },

    /// Validate one skill, or every skill when no path is given
    Validate { path: Option<String> },

    /// Show library statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List all categories
    Categories,

    /// List all tags
    Tags,

    /// Show or manage configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize default configuration file
    Init,
    /// Print config file path
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config.
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    init_tracing(cli.verbose, &config.logging);

    let root = config.resolve_root(cli.root.as_deref());
    tracing::debug!("Using skills root {:?}", root);

    match cli.command {
        Commands::List {
            category,
            tag,
            platform,
            complexity,
            json,
        } => {
            let filter = commands::ListFilter {
                category,
                tag,
                platform,
                complexity,
            };
            commands::list(&root, &filter, json)?;
        }
        Commands::Search { query, json } => commands::search(&root, &query, json)?,
        Commands::Load {
            path,
            section,
            prompt,
            platform,
            json,
        } => {
            let view = if json {
                commands::LoadView::Json
            } else if prompt {
                commands::LoadView::Prompt
            } else if let Some(section) = section {
                commands::LoadView::Section(section)
            } else if let Some(platform) = platform {
                commands::LoadView::Tools(platform)
            } else {
                commands::LoadView::Full
            };
            commands::load(&root, &path, view)?;
        }
        Commands::Info { path } => commands::info(&root, &path)?,
        Commands::Validate { path } => commands::validate(&root, path.as_deref())?,
        Commands::Stats { json } => commands::stats(&root, json)?,
        Commands::Categories => commands::categories(&root)?,
        Commands::Tags => commands::tags(&root)?,
        Commands::Config { action } => handle_config_command(action, &config)?,
    }

    Ok(())
}

/// Logs go to stderr so `--json` output on stdout stays machine-readable.
fn init_tracing(verbose: bool, logging: &LoggingConfig) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter))
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn handle_config_command(action: Option<ConfigAction>, config: &AppConfig) -> Result<()> {
    match action {
        Some(ConfigAction::Show) | None => {
            let toml_str = toml::to_string_pretty(config)?;
            println!("{}", toml_str);
        }
        Some(ConfigAction::Init) => {
            let path = AppConfig::default_path();
            if path.exists() {
                println!("Config already exists at: {}", path.display());
            } else {
                config.save()?;
                println!("Created default config at: {}", path.display());
            }
        }
        Some(ConfigAction::Path) => {
            println!("{}", AppConfig::default_path().display());
        }
    }
    Ok(())
}
