use crate::config::types::{
    CatalogConfig, Config, PolitenessConfig, RendererConfig, RunConfig, SelectorConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Delay fields above this many seconds are treated as configuration mistakes
const MAX_DELAY_SECS: f64 = 3600.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_catalog_config(&config.catalog)?;
    validate_run_config(&config.run)?;
    validate_politeness_config(&config.politeness)?;
    validate_renderer_config(&config.renderer)?;
    Ok(())
}

/// Validates the catalog identity and its selectors
fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(
            "base-url has no host".to_string(),
        ));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.path_prefixes.is_empty() {
        return Err(ConfigError::Validation(
            "path-prefixes must list at least one prefix".to_string(),
        ));
    }

    for prefix in &config.path_prefixes {
        if !prefix.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "path prefix '{}' must start with '/'",
                prefix
            )));
        }
    }

    validate_selectors(&config.selectors)?;

    Ok(())
}

/// Every selector must compile; a typo here would silently harvest nothing
fn validate_selectors(selectors: &SelectorConfig) -> Result<(), ConfigError> {
    let fields = [
        ("list-container", &selectors.list_container),
        ("item-link", &selectors.item_link),
        ("title", &selectors.title),
        ("subtitle", &selectors.subtitle),
        ("body", &selectors.body),
    ];

    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(ConfigError::InvalidSelector(format!(
                "selector '{}' cannot be empty",
                name
            )));
        }
        Selector::parse(value).map_err(|e| {
            ConfigError::InvalidSelector(format!("selector '{}' ('{}') is invalid: {}", name, value, e))
        })?;
    }

    Ok(())
}

/// Validates the per-run budgets
fn validate_run_config(config: &RunConfig) -> Result<(), ConfigError> {
    if config.data_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "data-dir cannot be empty".to_string(),
        ));
    }

    // A budget of zero, or one smaller than the safety margin, is allowed:
    // the run starts, finds the budget already spent, and stops cleanly.

    if config.max_urls_per_run < 1 {
        return Err(ConfigError::Validation(format!(
            "max-urls-per-run must be >= 1, got {}",
            config.max_urls_per_run
        )));
    }

    if config.pages_per_batch < 1 {
        return Err(ConfigError::Validation(format!(
            "pages-per-batch must be >= 1, got {}",
            config.pages_per_batch
        )));
    }

    if config.flush_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "flush-threshold must be >= 1, got {}",
            config.flush_threshold
        )));
    }

    Ok(())
}

/// Validates delays and retry limits
fn validate_politeness_config(config: &PolitenessConfig) -> Result<(), ConfigError> {
    validate_delay("listing-delay-secs", config.listing_delay_secs)?;
    validate_delay("detail-delay-secs", config.detail_delay_secs)?;
    validate_delay("retry-delay-secs", config.retry_delay_secs)?;

    if config.retry_ceiling < 1 {
        return Err(ConfigError::Validation(format!(
            "retry-ceiling must be >= 1, got {}",
            config.retry_ceiling
        )));
    }

    Ok(())
}

/// Validates renderer settings
fn validate_renderer_config(config: &RendererConfig) -> Result<(), ConfigError> {
    validate_delay("settle-secs", config.settle_secs)?;

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Rejects negative, NaN, and absurd delay values
fn validate_delay(name: &str, secs: f64) -> Result<(), ConfigError> {
    if !(0.0..=MAX_DELAY_SECS).contains(&secs) {
        return Err(ConfigError::Validation(format!(
            "{} must be between 0 and {} seconds, got {}",
            name, MAX_DELAY_SECS, secs
        )));
    }
    Ok(())
}
