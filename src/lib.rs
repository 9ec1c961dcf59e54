//! Sashiko: a patient, resumable catalog harvester
//!
//! This crate implements an incremental harvester for a large, paginated,
//! browser-rendered catalog. Each invocation runs under a wall-clock budget,
//! resumes from a persisted page checkpoint, deduplicates against the
//! already-harvested dataset, and flushes extracted records in bounded
//! batches so that progress survives abrupt termination between runs.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod export;
pub mod render;
pub mod store;

use thiserror::Error;

/// Main error type for harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Render error: {0}")]
    Render(#[from] render::RenderError),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Export error: {0}")]
    Export(#[from] export::ExportError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),
}

/// Result type alias for harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Harvester, RunSummary, StopReason};
pub use render::PageRenderer;
pub use store::{Dataset, Record};
