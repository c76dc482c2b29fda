//! Application configuration for the exam archive toolkit.
//!
//! User config lives at `~/.examarchive/examarchive.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ExamArchiveError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "examarchive.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".examarchive";

// ---------------------------------------------------------------------------
// Config structs (matching examarchive.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Archive API connection settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Browsing defaults.
    #[serde(default)]
    pub browse: BrowseConfig,

    /// Question-frequency analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Local session/cache database.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// `[api]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the archive API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:1739".into()
}
fn default_timeout_secs() -> u64 {
    10
}

/// `[browse]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseConfig {
    /// Study year preselected when entering the subject step.
    #[serde(default = "default_year")]
    pub default_year: u8,

    /// Test text longer than this is shown truncated until expanded.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            default_year: default_year(),
            preview_chars: default_preview_chars(),
        }
    }
}

fn default_year() -> u8 {
    1
}
fn default_preview_chars() -> usize {
    300
}

/// `[analysis]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Questions at or above this similarity ratio are grouped together.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

fn default_similarity_threshold() -> f64 {
    0.85
}

/// `[cache]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Database file name, relative to the config directory unless absolute.
    #[serde(default = "default_db_file")]
    pub db_file: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            db_file: default_db_file(),
        }
    }
}

fn default_db_file() -> String {
    "archive.db".into()
}

impl AppConfig {
    /// Check values that serde cannot constrain on its own.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.api.base_url).map_err(|e| {
            ExamArchiveError::config(format!("invalid api.base_url '{}': {e}", self.api.base_url))
        })?;

        if !(1..=4).contains(&self.browse.default_year) {
            return Err(ExamArchiveError::config(format!(
                "browse.default_year must be between 1 and 4, got {}",
                self.browse.default_year
            )));
        }

        if !(0.0..=1.0).contains(&self.analysis.similarity_threshold) {
            return Err(ExamArchiveError::config(format!(
                "analysis.similarity_threshold must be within 0.0..=1.0, got {}",
                self.analysis.similarity_threshold
            )));
        }

        Ok(())
    }

    /// Resolve the cache database path against the config directory.
    pub fn db_path(&self) -> Result<PathBuf> {
        let file = PathBuf::from(&self.cache.db_file);
        if file.is_absolute() {
            return Ok(file);
        }
        Ok(config_dir()?.join(file))
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.examarchive/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ExamArchiveError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.examarchive/examarchive.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ExamArchiveError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        ExamArchiveError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ExamArchiveError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ExamArchiveError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ExamArchiveError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("127.0.0.1:1739"));
        assert!(toml_str.contains("similarity_threshold"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[api]
base_url = "https://exams.example.edu"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.api.base_url, "https://exams.example.edu");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.browse.default_year, 1);
        assert_eq!(config.browse.preview_chars, 300);
        assert_eq!(config.cache.db_file, "archive.db");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.api.base_url = "not a url".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.browse.default_year = 5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("default_year"));

        let mut config = AppConfig::default();
        config.analysis.similarity_threshold = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("similarity_threshold"));
    }

    #[test]
    fn load_config_from_file() {
        let path = std::env::temp_dir().join(format!(
            "examarchive_cfg_{}_{}.toml",
            std::process::id(),
            "load"
        ));
        std::fs::write(&path, "[analysis]\nsimilarity_threshold = 0.9\n").expect("write");
        let config = load_config_from(&path).expect("load");
        assert!((config.analysis.similarity_threshold - 0.9).abs() < f64::EPSILON);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn absolute_db_file_is_kept() {
        let mut config = AppConfig::default();
        let abs = std::env::temp_dir().join("archive-test.db");
        config.cache.db_file = abs.to_string_lossy().to_string();
        assert_eq!(config.db_path().expect("db path"), abs);
    }
}
