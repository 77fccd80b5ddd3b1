//! Command-line arguments and how they layer over the config file.

use std::path::PathBuf;

use clap::Parser;
use federated_search::ContentPolicy;

use crate::config::FederatorConfig;
use crate::error::Result;

/// Federator: run one query across many OpenSearch-style sources.
#[derive(Debug, Parser)]
#[command(name = "federator", version, about)]
pub struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Source URL, already carrying the query. Repeat for each source.
    #[arg(short, long = "url", value_name = "URL")]
    pub urls: Vec<String>,

    /// Per-request timeout in seconds.
    #[arg(short, long, value_name = "SECONDS")]
    pub timeout: Option<f64>,

    /// Atom entry field to extract. Repeat to replace the default list.
    #[arg(short, long = "field", value_name = "NAME")]
    pub fields: Vec<String>,

    /// Maximum number of requests in flight.
    #[arg(long, value_name = "N")]
    pub max_concurrency: Option<usize>,

    /// Skip sources with unrecognised content types instead of failing.
    #[arg(long)]
    pub lenient: bool,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pub pretty: bool,
}

impl Cli {
    /// Loads the config file and applies flag overrides on top of it.
    ///
    /// An explicit `--config` must exist. Without one, the default path is
    /// used when present and built-in defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed.
    pub fn resolve_config(&self) -> Result<FederatorConfig> {
        let mut config = match &self.config {
            Some(path) => FederatorConfig::from_file(path)?,
            None => {
                let path = FederatorConfig::default_config_path();
                if path.is_file() {
                    tracing::debug!(path = %path.display(), "loading default config");
                    FederatorConfig::from_file(&path)?
                } else {
                    FederatorConfig::default()
                }
            }
        };
        self.apply_to(&mut config);
        Ok(config)
    }

    /// Overrides config values with whatever was given on the command line.
    pub fn apply_to(&self, config: &mut FederatorConfig) {
        if !self.urls.is_empty() {
            config.urls.clone_from(&self.urls);
        }
        if let Some(timeout) = self.timeout {
            config.timeout_seconds = Some(timeout);
        }
        if !self.fields.is_empty() {
            config.fields.clone_from(&self.fields);
        }
        if let Some(n) = self.max_concurrency {
            config.max_concurrency = Some(n);
        }
        if self.lenient {
            config.unsupported_content = ContentPolicy::Lenient;
        }
    }
}
