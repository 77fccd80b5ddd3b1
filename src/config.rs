//! Configuration file for the federator CLI.

use std::path::{Path, PathBuf};
use std::time::Duration;

use federated_search::{ContentPolicy, SearchConfig, DEFAULT_FIELDS};
use serde::{Deserialize, Serialize};

use crate::error::{FederatorError, Result};

/// On-disk configuration, loaded from TOML.
///
/// ```toml
/// urls = [
///     "https://a.example/search?q=rust&format=json",
///     "https://b.example/opensearch?q=rust",
/// ]
/// timeout_seconds = 5.0
/// unsupported_content = "lenient"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FederatorConfig {
    /// Source URLs, each already carrying its query.
    pub urls: Vec<String>,
    /// Per-request timeout in seconds. Unset waits indefinitely.
    pub timeout_seconds: Option<f64>,
    /// Atom entry fields to extract.
    pub fields: Vec<String>,
    /// Maximum concurrent requests. Unset uses the number of CPUs.
    pub max_concurrency: Option<usize>,
    /// `"strict"` fails on unrecognised content types, `"lenient"` skips them.
    pub unsupported_content: ContentPolicy,
    /// Custom User-Agent header.
    pub user_agent: Option<String>,
}

impl Default for FederatorConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            timeout_seconds: None,
            fields: DEFAULT_FIELDS.iter().map(|f| (*f).to_owned()).collect(),
            max_concurrency: None,
            unsupported_content: ContentPolicy::Strict,
            user_agent: None,
        }
    }
}

impl FederatorConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| FederatorError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| FederatorError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/federator/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("federator").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("federator")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/federator-config/config.toml")
        }
    }

    /// Converts to the library's [`SearchConfig`] and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`FederatorError::Config`] for a negative or non-finite timeout,
    /// or [`FederatorError::Search`] if the search configuration is invalid.
    pub fn to_search_config(&self) -> Result<SearchConfig> {
        let timeout = match self.timeout_seconds {
            Some(secs) if secs.is_finite() && secs > 0.0 => Some(Duration::from_secs_f64(secs)),
            Some(secs) => {
                return Err(FederatorError::Config(format!(
                    "timeout_seconds must be a positive number, got {secs}"
                )))
            }
            None => None,
        };

        let config = SearchConfig {
            urls: self.urls.clone(),
            timeout,
            fields: self.fields.clone(),
            max_concurrency: self.max_concurrency,
            unsupported_content: self.unsupported_content,
            user_agent: self.user_agent.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}
