//! Configuration file support.
//!
//! Settings are read from a TOML file. All sections are optional:
//!
//! ```toml
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["*.tmp", "node_modules/**"]
//! extensions = ["bak", "tmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//!
//! [organize]
//! result_dir_name = "sorted"
//! recursive = false
//! keep_structure = false
//! include_packages = false
//! include_app = false
//! unclassified = "move"
//!
//! [rename]
//! extensions = ["jpg", "png"]
//! recursive = false
//! time_source = "auto"
//! format = "datetime-ms"
//! folder_prefix = true
//! ```
//!
//! Hidden entries are never scanned, whatever the filters say.

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_NAME: &str = ".tidyuprc.toml";

/// Default name of the organizer's result directory.
pub const DEFAULT_RESULT_DIR_NAME: &str = "sorted";

/// Image suffixes the renamer picks up when none are configured.
pub const DEFAULT_RENAME_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "heic", "heif", "webp", "tif", "tiff", "bmp",
];

/// Errors that can occur during configuration loading and filtering.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{0}': expected *.ext or dir/**")]
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub filters: FilterRules,
    pub organize: OrganizeSettings,
    pub rename: RenameSettings,
}

/// Exclusion and inclusion rules applied to scanned candidates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    /// Rules for excluding files.
    pub exclude: ExcludeRules,
    /// Rules for including files (whitelist, overrides exclude rules).
    pub include: IncludeRules,
}

/// Rules for excluding files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., "Thumbs.db").
    pub filenames: Vec<String>,
    /// Glob patterns matched against the path relative to the root.
    pub patterns: Vec<String>,
    /// File extensions to exclude (e.g., "bak", "tmp", "log").
    pub extensions: Vec<String>,
    /// Regex patterns matched against the file name.
    pub regex: Vec<String>,
}

/// Rules for including files, overriding exclude rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IncludeRules {
    /// Glob patterns that override exclude rules.
    pub patterns: Vec<String>,
}

/// Defaults for `tidyup organize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizeSettings {
    pub result_dir_name: String,
    pub recursive: bool,
    pub keep_structure: bool,
    pub include_packages: bool,
    pub include_app: bool,
    /// `move` or `report`.
    pub unclassified: String,
}

impl Default for OrganizeSettings {
    fn default() -> Self {
        Self {
            result_dir_name: DEFAULT_RESULT_DIR_NAME.to_string(),
            recursive: false,
            keep_structure: false,
            include_packages: false,
            include_app: false,
            unclassified: "move".to_string(),
        }
    }
}

/// Defaults for `tidyup rename`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameSettings {
    pub extensions: Vec<String>,
    pub recursive: bool,
    /// `auto`, `date-added`, `birthtime` or `mtime`.
    pub time_source: String,
    /// `datetime-ms` or `epoch-ms`.
    pub format: String,
    pub folder_prefix: bool,
}

impl Default for RenameSettings {
    fn default() -> Self {
        Self {
            extensions: Vec::new(),
            recursive: false,
            time_source: "auto".to_string(),
            format: "datetime-ms".to_string(),
            folder_prefix: true,
        }
    }
}

impl Config {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.tidyuprc.toml` in the current directory
    /// 3. Look for `~/.config/tidyup/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
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
                .join("tidyup")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }
}

impl FilterRules {
    /// Compile rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self)
    }
}

/// Pre-compiled filter rules.
#[derive(Debug, Default)]
pub struct CompiledFilters {
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns: compile_globs(&rules.exclude.patterns)?,
            exclude_regexes,
            include_patterns: compile_globs(&rules.include.patterns)?,
        })
    }

    /// Check if a candidate should be kept.
    ///
    /// `relative_path` is the candidate's path relative to the scanned root.
    /// Checks are performed in this order, with early termination:
    /// 1. Include patterns (whitelist) - if matched, always include
    /// 2. Exact filename match - if matched, exclude
    /// 3. File extension match - if matched, exclude
    /// 4. Glob pattern match - if matched, exclude
    /// 5. Regex pattern match - if matched, exclude
    /// 6. Default: include
    pub fn should_include(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return true;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = relative_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}
