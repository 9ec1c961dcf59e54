//! Selector diagnostics
//!
//! Catalogs change their markup without notice. Given the source of a
//! listing page, the probe reports what the configured selectors and link
//! filter make of it, so a stale selector can be told apart from a catalog
//! that is genuinely empty.

use crate::catalog::LinkFilter;
use crate::config::CatalogConfig;
use crate::{ConfigError, ConfigResult};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// What the configured selectors found on one listing page
#[derive(Debug, Clone)]
pub struct ProbeReport {
    /// Whether the list container matched at all
    pub container_found: bool,

    /// Anchors matched inside the container
    pub anchors: usize,

    /// Links that passed the filter, deduplicated, in page order
    pub accepted: Vec<String>,

    /// Anchors the filter dropped
    pub rejected: usize,
}

/// Applies the catalog's selectors and link filter to a listing page source
pub fn probe_listing(html: &str, catalog: &CatalogConfig) -> ConfigResult<ProbeReport> {
    let container = Selector::parse(&catalog.selectors.list_container)
        .map_err(|e| ConfigError::InvalidSelector(format!("list-container: {}", e)))?;
    let item_link = Selector::parse(&catalog.selectors.item_link)
        .map_err(|e| ConfigError::InvalidSelector(format!("item-link: {}", e)))?;
    let filter = LinkFilter::from_catalog(catalog)?;
    let base = Url::parse(&catalog.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    let document = Html::parse_document(html);
    let root = match document.select(&container).next() {
        Some(root) => root,
        None => {
            return Ok(ProbeReport {
                container_found: false,
                anchors: 0,
                accepted: Vec::new(),
                rejected: 0,
            });
        }
    };

    let mut accepted = Vec::new();
    let mut seen = HashSet::new();
    let mut anchors = 0;
    let mut rejected = 0;

    for element in root.select(&item_link) {
        anchors += 1;
        match element.value().attr("href") {
            Some(href) => match filter.accept(&base, href) {
                Some(url) => {
                    if seen.insert(url.clone()) {
                        accepted.push(url);
                    }
                }
                None => rejected += 1,
            },
            None => rejected += 1,
        }
    }

    Ok(ProbeReport {
        container_found: true,
        anchors,
        accepted,
        rejected,
    })
}
