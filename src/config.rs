//! Run configuration and per-directory control files.
//!
//! Organizer settings are read from a TOML file. Lookup order:
//! 1. An explicit `--config` path
//! 2. `.desksortrc.toml` inside the directory being organized
//! 3. `~/.config/desksort/config.toml`
//! 4. Built-in defaults
//!
//! ```toml
//! model = "gpt-4"
//! endpoint = "https://api.openai.com/v1/chat/completions"
//! max_retries = 3
//! retry_delay_secs = 5
//!
//! [pdf]
//! max_pages = 10
//! policy = "pages"
//!
//! [ocr]
//! command = "tesseract"
//! ```
//!
//! Two optional control files live inside the base directory and are read once
//! per run: `.files_to_organize` restricts processing to the listed names and
//! `.excluded_dirs` removes directories from category candidacy. Both hold one
//! entry per line; entries may be literal names, relative paths or glob patterns.

use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Name of the inclusion control file.
pub const FILES_TO_ORGANIZE: &str = ".files_to_organize";
/// Name of the exclusion control file.
pub const EXCLUDED_DIRS: &str = ".excluded_dirs";
/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG: &str = ".desksortrc.toml";

/// Errors raised while loading configuration. All of them are fatal and are
/// reported before any file is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration in {}: {reason}", .path.display())]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("API key not found. Set {0} in a .env file or environment variable.")]
    MissingApiKey(String),

    #[error("Base directory is not a directory: {}", .0.display())]
    InvalidBaseDir(PathBuf),
}

/// How PDF text is split before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfPolicy {
    /// One chunk per page.
    Pages,
    /// Pages joined, capped at `max_chars`, then cut into `chunk_chars` pieces.
    Truncate,
}

/// PDF extraction limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    pub max_pages: usize,
    pub policy: PdfPolicy,
    pub max_chars: usize,
    pub chunk_chars: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            max_pages: 10,
            policy: PdfPolicy::Pages,
            max_chars: 6000,
            chunk_chars: 2000,
        }
    }
}

/// OCR settings. The command is invoked as `<command> <image> stdout`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub command: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: "tesseract".to_string(),
        }
    }
}

/// Settings for one organizer run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizerConfig {
    /// Model identifier sent with every request.
    pub model: String,
    /// Chat completion endpoint.
    pub endpoint: String,
    /// Environment variable holding the bearer token.
    pub api_key_env: String,
    pub request_timeout_secs: u64,
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    pub retry_delay_secs: u64,
    /// Longest text sent in a single request, in characters.
    pub max_request_chars: usize,
    /// Offer nested directories as categories, not only immediate children.
    pub recursive_categories: bool,
    pub pdf: PdfConfig,
    pub ocr: OcrConfig,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            request_timeout_secs: 20,
            max_retries: 3,
            retry_delay_secs: 5,
            max_request_chars: 4000,
            recursive_categories: true,
            pdf: PdfConfig::default(),
            ocr: OcrConfig::default(),
        }
    }
}

impl OrganizerConfig {
    /// Loads configuration, falling back to defaults when no file is found.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file is missing, or if any
    /// discovered file cannot be read or parsed.
    pub fn load(config_path: Option<&Path>, base_path: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = base_path.join(LOCAL_CONFIG);
        if local_config.is_file() {
            return Self::load_from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("desksort").join("config.toml");
            if user_config.is_file() {
                return Self::load_from_file(&user_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!("Loaded configuration from {}", path.display());
        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Reads the bearer token from the environment.
    ///
    /// Callers load `.env` beforehand; see `main`.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(ConfigError::MissingApiKey(self.api_key_env.clone())),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// A list of names, relative paths or glob patterns read from a control file.
#[derive(Debug, Clone, Default)]
pub struct NameSet {
    entries: Vec<String>,
    patterns: Vec<Pattern>,
}

impl NameSet {
    /// Builds a set from raw entries. Entries that are not valid globs are
    /// still matched literally.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries: Vec<String> = entries
            .into_iter()
            .map(Into::into)
            .map(|entry| normalize_entry(&entry))
            .filter(|entry| !entry.is_empty())
            .collect();
        let patterns = entries
            .iter()
            .filter_map(|entry| Pattern::new(entry).ok())
            .collect();
        Self { entries, patterns }
    }

    /// Parses a control file. A missing file yields an empty set.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let lines = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'));
        Ok(Self::new(lines))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if `candidate` (a name or `/`-separated relative path) matches an
    /// entry literally or as a glob.
    pub fn matches(&self, candidate: &str) -> bool {
        self.entries.iter().any(|entry| entry == candidate)
            || self.patterns.iter().any(|pattern| pattern.matches(candidate))
    }
}

fn normalize_entry(entry: &str) -> String {
    let entry = entry.trim().replace('\\', "/");
    let entry = entry.strip_prefix("./").unwrap_or(&entry);
    entry.trim_end_matches('/').to_string()
}

/// Inclusion and exclusion sets for one run. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct ControlSets {
    /// When non-empty, only these files are processed.
    pub include_files: NameSet,
    /// Directories never offered as categories nor descended into.
    pub excluded_dirs: NameSet,
}

impl ControlSets {
    /// Loads both control files from the base directory.
    pub fn load(base_path: &Path) -> Result<Self, ConfigError> {
        let include_files = NameSet::from_file(&base_path.join(FILES_TO_ORGANIZE))?;
        let excluded_dirs = NameSet::from_file(&base_path.join(EXCLUDED_DIRS))?;

        if !include_files.is_empty() {
            tracing::info!("Restricting run to {} listed file(s)", include_files.len());
        }
        if !excluded_dirs.is_empty() {
            tracing::info!("Excluding {} directory entr(ies)", excluded_dirs.len());
        }

        Ok(Self {
            include_files,
            excluded_dirs,
        })
    }
}
