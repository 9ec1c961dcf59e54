//! Configuration module for the harvester
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, plus the environment overrides used by scheduled jobs.
//!
//! # Example
//!
//! ```no_run
//! use sashiko::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sashiko.toml")).unwrap();
//! println!("Harvesting up to page {}", config.catalog.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CatalogConfig, Config, PolitenessConfig, RendererConfig, RendererKind, RunConfig,
    SelectorConfig,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, catalog_fingerprint, load_config, load_runtime_config, ENV_DATA_DIR,
    ENV_MAX_RUNTIME, ENV_MAX_URLS,
};

// Re-export validation
pub use validation::validate;
