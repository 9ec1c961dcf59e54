use crate::config::types::{CatalogConfig, Config};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable overriding `run.data-dir`
pub const ENV_DATA_DIR: &str = "SASHIKO_DATA_DIR";
/// Environment variable overriding `run.max-runtime-secs`
pub const ENV_MAX_RUNTIME: &str = "SASHIKO_MAX_RUNTIME_SECS";
/// Environment variable overriding `run.max-urls-per-run`
pub const ENV_MAX_URLS: &str = "SASHIKO_MAX_URLS_PER_RUN";

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sashiko::config::load_config;
///
/// let config = load_config(Path::new("sashiko.toml")).unwrap();
/// println!("Base URL: {}", config.catalog.base_url);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    // Read the configuration file
    let content = std::fs::read_to_string(path)?;

    // Parse TOML
    let config: Config = toml::from_str(&content)?;

    // Validate the configuration
    validate(&config)?;

    Ok(config)
}

/// Builds the effective configuration for a run: the file at `path` if given,
/// built-in defaults otherwise, with environment overrides applied on top.
///
/// Validation happens after the overrides so a bad override is rejected the
/// same way a bad file value is.
pub fn load_runtime_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p)?;
            toml::from_str(&content)?
        }
        None => Config::default(),
    };
    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

/// Applies `SASHIKO_*` environment overrides to an already-parsed config
///
/// Unset variables leave the config untouched; unparseable numeric values
/// are ignored rather than treated as zero.
pub fn apply_env_overrides(config: &mut Config) {
    if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
        if !dir.is_empty() {
            config.run.data_dir = dir.into();
        }
    }
    if let Ok(raw) = std::env::var(ENV_MAX_RUNTIME) {
        if let Ok(secs) = raw.parse::<u64>() {
            config.run.max_runtime_secs = secs;
        }
    }
    if let Ok(raw) = std::env::var(ENV_MAX_URLS) {
        if let Ok(cap) = raw.parse::<usize>() {
            config.run.max_urls_per_run = cap;
        }
    }
}

/// Computes a SHA-256 fingerprint of the catalog identity
///
/// The fingerprint covers only the fields that decide *which* catalog the
/// checkpoint belongs to: the base URL and the detail path prefixes. Tuning
/// selectors or budgets keeps the checkpoint valid; pointing the harvester
/// at a different catalog invalidates it.
///
/// # Returns
///
/// Hex-encoded SHA-256 digest (64 characters)
pub fn catalog_fingerprint(catalog: &CatalogConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(catalog.base_url.as_bytes());
    for prefix in &catalog.path_prefixes {
        hasher.update([0u8]);
        hasher.update(prefix.as_bytes());
    }
    hex::encode(hasher.finalize())
}
