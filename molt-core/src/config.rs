use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::options::OutputMode;

/// `.molt/config.toml`: persisted defaults, overridden by whatever CLI
/// flags the caller actually passes. Splits top-level settings from a
/// nested `defaults` table so new default fields can be added without
/// touching the top-level shape.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Keep executing later actions after a rename fails.
    #[serde(default)]
    pub continue_on_error: bool,

    /// Don't touch the filesystem; only emit the plan.
    #[serde(default)]
    pub dry_run: bool,

    /// "standard" | "new-names" | "both-names".
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// Allow separators in a rule's new name.
    #[serde(default)]
    pub allow_path: bool,

    /// Whether to use color output by default (`None` = auto-detect).
    #[serde(default)]
    pub use_color: Option<bool>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            continue_on_error: false,
            dry_run: false,
            output_format: default_output_format(),
            allow_path: false,
            use_color: None,
        }
    }
}

fn default_output_format() -> String {
    "standard".to_string()
}

impl DefaultsConfig {
    pub fn output_mode(&self) -> OutputMode {
        self.output_format.parse().unwrap_or_default()
    }
}

impl Config {
    /// Load `.molt/config.toml` under the current directory, if present.
    pub fn load() -> Result<Self> {
        if let Ok(cwd) = std::env::current_dir() {
            let config_path = cwd.join(".molt").join("config.toml");
            if config_path.exists() {
                return Self::load_from_path(&config_path);
            }
        }
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to `.molt/config.toml` under the current directory.
    pub fn save(&self) -> Result<()> {
        let cwd = std::env::current_dir()?;
        let config_dir = cwd.join(".molt");
        let config_path = config_dir.join("config.toml");

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        self.save_to_path(&config_path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
