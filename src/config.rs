//! User-supplied keep/delete lists and optional configuration file.
//!
//! List values arrive on the command line as comma separated strings
//! without spaces. The same lists, plus a default output directory, may
//! also come from a TOML file:
//!
//! ```toml
//! [strings]
//! also_keep = ["desc-aseg"]
//! also_delete = ["desc-aparcaseg"]
//!
//! [output]
//! out_path = "/scratch/cleanup"
//! ```
//!
//! The file is only ever read. Nothing from a run is written back to it.

use crate::error::{CleanupError, CleanupResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_NAME: &str = ".fmriprep-cleanup.toml";

/// Splits a comma separated list value and validates every entry.
///
/// Values containing whitespace are rejected outright, as are empty
/// entries: every filename contains the empty string, so an empty keep or
/// delete string would silently match everything.
pub fn parse_string_list(flag: &str, value: &str) -> CleanupResult<Vec<String>> {
    if value.chars().any(char::is_whitespace) {
        return Err(CleanupError::InvalidListValue {
            flag: flag.to_string(),
            value: value.to_string(),
        });
    }

    value
        .split(',')
        .map(|entry| {
            if entry.is_empty() {
                Err(CleanupError::EmptyListEntry {
                    flag: flag.to_string(),
                })
            } else {
                Ok(entry.to_string())
            }
        })
        .collect()
}

/// Validates list entries that did not come through [`parse_string_list`].
fn validate_entries(flag: &str, entries: &[String]) -> CleanupResult<()> {
    for entry in entries {
        if entry.trim().is_empty() {
            return Err(CleanupError::EmptyListEntry {
                flag: flag.to_string(),
            });
        }
        if entry.chars().any(char::is_whitespace) {
            return Err(CleanupError::InvalidListValue {
                flag: flag.to_string(),
                value: entry.clone(),
            });
        }
    }
    Ok(())
}

/// Configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupConfig {
    #[serde(default)]
    pub strings: StringRules,

    #[serde(default)]
    pub output: OutputRules,
}

/// Extra keep and delete strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StringRules {
    /// Substrings of filenames that are always kept.
    #[serde(default)]
    pub also_keep: Vec<String>,

    /// Substrings of filenames that are always deleted.
    #[serde(default)]
    pub also_delete: Vec<String>,
}

/// Where simulation output goes when `--out-path` is not given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputRules {
    #[serde(default)]
    pub out_path: Option<PathBuf>,
}

impl CleanupConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, when given (it must exist)
    /// 2. `.fmriprep-cleanup.toml` in the current directory
    /// 3. `~/.config/fmriprep-cleanup/config.toml`
    /// 4. Built-in defaults (no extra strings)
    pub fn load(config_path: Option<&Path>) -> CleanupResult<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_NAME);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("fmriprep-cleanup")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file and validate its lists.
    pub fn load_from_file(path: &Path) -> CleanupResult<Self> {
        if !path.exists() {
            return Err(CleanupError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| CleanupError::io(path, e))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| CleanupError::ConfigInvalid(e.to_string()))?;

        validate_entries("also_keep", &config.strings.also_keep)?;
        validate_entries("also_delete", &config.strings.also_delete)?;
        log::debug!("loaded configuration from {}", path.display());

        Ok(config)
    }
}
