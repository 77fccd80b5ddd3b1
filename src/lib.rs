//! Federator: a command-line front end for federated OpenSearch queries.
//!
//! The fetch, parse and merge pipeline lives in the `federated-search`
//! crate. This crate adds a TOML config file, command-line overrides and
//! JSON output.

pub mod cli;
pub mod config;
pub mod error;

pub use cli::Cli;
pub use config::FederatorConfig;
pub use error::{FederatorError, Result};
