use crate::config::CatalogConfig;
use crate::ConfigError;
use url::Url;

/// Decides which hrefs on a listing page are detail-page URLs
///
/// A link qualifies when, resolved against the page it appeared on, it is an
/// http(s) URL on the catalog's own host whose path starts with one of the
/// configured prefixes. Everything else (navigation, assets, outbound links)
/// is dropped.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    host: String,
    prefixes: Vec<String>,
}

impl LinkFilter {
    /// Builds a filter from the catalog configuration
    pub fn from_catalog(catalog: &CatalogConfig) -> Result<Self, ConfigError> {
        let base = Url::parse(&catalog.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;
        let host = base
            .host_str()
            .ok_or_else(|| ConfigError::InvalidUrl("base-url has no host".to_string()))?
            .to_string();

        Ok(Self {
            host,
            prefixes: catalog.path_prefixes.clone(),
        })
    }

    /// Resolves `href` against the page it was found on and applies the
    /// filter. Returns the normalized absolute URL if it qualifies.
    ///
    /// Fragments are stripped so `/term#usage` and `/term` dedup together.
    pub fn accept(&self, page: &Url, href: &str) -> Option<String> {
        let mut resolved = page.join(href).ok()?;

        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            return None;
        }

        if resolved.host_str()? != self.host {
            return None;
        }

        let path = resolved.path();
        if !self.prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            return None;
        }

        resolved.set_fragment(None);
        Some(resolved.into())
    }
}
