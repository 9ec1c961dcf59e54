//! Listing page link collection
//!
//! A listing page either gets enumerated (its links read, possibly zero
//! of them) or it exhausts its attempts. The two cases are kept distinct
//! because they advance the harvest differently: only an enumerated page
//! may move the checkpoint forward.

use crate::catalog::LinkFilter;
use crate::config::{CatalogConfig, PolitenessConfig};
use crate::crawler::{parse_selector, RetryPolicy};
use crate::render::{PageRenderer, RenderError};
use crate::ConfigError;
use scraper::{Html, Selector};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// What link collection produced for one listing page
#[derive(Debug)]
pub enum ListingOutcome {
    /// The page rendered and its links were read
    ///
    /// An empty vector is a real answer: the container was present but
    /// held no qualifying links, which is how the catalog's tail looks.
    Enumerated(Vec<String>),
    /// Every attempt failed; nothing is known about this page
    Exhausted { attempts: u32 },
}

/// Error of a single enumeration attempt
#[derive(Debug, Error)]
enum AttemptError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("listing container not found in rendered page")]
    ContainerMissing,
}

/// Collects detail-page links from listing pages
pub struct ListingExtractor {
    container: Selector,
    item_link: Selector,
    filter: LinkFilter,
    retry: RetryPolicy,
}

impl ListingExtractor {
    /// Compiles the listing selectors and link filter from configuration
    pub fn from_config(
        catalog: &CatalogConfig,
        politeness: &PolitenessConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            container: parse_selector("list-container", &catalog.selectors.list_container)?,
            item_link: parse_selector("item-link", &catalog.selectors.item_link)?,
            filter: LinkFilter::from_catalog(catalog)?,
            retry: RetryPolicy::from(politeness),
        })
    }

    /// Enumerates one listing page, retrying transient failures
    ///
    /// A page that renders without the expected container counts as a
    /// failed attempt: on this kind of catalog the container is present
    /// even when empty, so its absence means the page did not load.
    pub async fn extract<R: PageRenderer>(
        &self,
        renderer: &mut R,
        page_url: &Url,
    ) -> ListingOutcome {
        for attempt in 1..=self.retry.ceiling {
            match self.attempt(renderer, page_url).await {
                Ok(links) => {
                    debug!("{}: {} qualifying links", page_url, links.len());
                    return ListingOutcome::Enumerated(links);
                }
                Err(e) => {
                    warn!(
                        "Attempt {}/{} failed for {}: {}",
                        attempt, self.retry.ceiling, page_url, e
                    );
                    if attempt < self.retry.ceiling {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
            }
        }

        ListingOutcome::Exhausted {
            attempts: self.retry.ceiling,
        }
    }

    async fn attempt<R: PageRenderer>(
        &self,
        renderer: &mut R,
        page_url: &Url,
    ) -> Result<Vec<String>, AttemptError> {
        let html = renderer.render(page_url.as_str()).await?;
        self.links_in(page_url, &html)
            .ok_or(AttemptError::ContainerMissing)
    }

    /// Reads the page's qualifying links; None when the container is absent
    ///
    /// Links are deduplicated within the page but otherwise kept in
    /// document order.
    fn links_in(&self, page_url: &Url, html: &str) -> Option<Vec<String>> {
        let document = Html::parse_document(html);
        let container = document.select(&self.container).next()?;

        let mut links = Vec::new();
        let mut seen = HashSet::new();
        for anchor in container.select(&self.item_link) {
            if let Some(href) = anchor.value().attr("href") {
                if let Some(url) = self.filter.accept(page_url, href) {
                    if seen.insert(url.clone()) {
                        links.push(url);
                    }
                }
            }
        }
        Some(links)
    }
}
