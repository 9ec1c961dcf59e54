use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the harvester
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub politeness: PolitenessConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
}

/// Identity and shape of the catalog being harvested
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Listing index URL; page N is reached by appending a `page` query parameter
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Upper bound on listing page numbers worth visiting
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Path prefixes a link must carry to count as a detail page
    #[serde(rename = "path-prefixes")]
    pub path_prefixes: Vec<String>,

    /// CSS selectors locating listing links and detail fields
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// CSS selectors for the listing and detail pages
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Container that holds the listing's item links
    #[serde(rename = "list-container")]
    pub list_container: String,

    /// Anchor elements inside the container, one per catalog entry
    #[serde(rename = "item-link")]
    pub item_link: String,

    /// Detail page title element
    pub title: String,

    /// Detail page subtitle element
    pub subtitle: String,

    /// Detail page body element
    pub body: String,
}

/// Per-run budgets and persistence locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Directory holding the dataset and the page checkpoint
    #[serde(rename = "data-dir")]
    pub data_dir: PathBuf,

    /// Wall-clock budget for one invocation, in seconds
    #[serde(rename = "max-runtime-secs")]
    pub max_runtime_secs: u64,

    /// Slice of the budget reserved for winding down cleanly
    #[serde(rename = "safety-margin-secs")]
    pub safety_margin_secs: u64,

    /// Stop collecting once this many new URLs have been found this run
    #[serde(rename = "max-urls-per-run")]
    pub max_urls_per_run: usize,

    /// Listing pages to enumerate before switching to detail extraction
    #[serde(rename = "pages-per-batch")]
    pub pages_per_batch: u32,

    /// Buffered records that trigger a flush to the dataset
    #[serde(rename = "flush-threshold")]
    pub flush_threshold: usize,
}

/// Delays and retry limits that keep the harvester polite
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolitenessConfig {
    /// Pause after each listing page, in seconds
    #[serde(rename = "listing-delay-secs")]
    pub listing_delay_secs: f64,

    /// Pause after each detail page, in seconds
    #[serde(rename = "detail-delay-secs")]
    pub detail_delay_secs: f64,

    /// Attempts per page before giving up on it
    #[serde(rename = "retry-ceiling")]
    pub retry_ceiling: u32,

    /// Pause between attempts at the same page, in seconds
    #[serde(rename = "retry-delay-secs")]
    pub retry_delay_secs: f64,
}

/// How page source is obtained
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// `browser` drives a headless browser; `http` fetches raw source
    pub kind: RendererKind,

    /// Wait after navigation for scripts to populate the page, in seconds
    #[serde(rename = "settle-secs")]
    pub settle_secs: f64,

    /// Per-request timeout, in seconds
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    Browser,
    Http,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://fmit.vn/en/glossary".to_string(),
            max_pages: 6729,
            path_prefixes: vec![
                "/en/glossary/".to_string(),
                "/tu-dien-quan-ly/".to_string(),
            ],
            selectors: SelectorConfig::default(),
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            list_container: "div.dictionary-items".to_string(),
            item_link: "li.item a[href]".to_string(),
            title: "h1.dictionary-detail-title".to_string(),
            subtitle: "h2.dictionary-detail-title".to_string(),
            body: "div.dictionary-details".to_string(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            max_runtime_secs: 19_800,
            safety_margin_secs: 30,
            max_urls_per_run: 500,
            pages_per_batch: 20,
            flush_threshold: 50,
        }
    }
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            listing_delay_secs: 1.5,
            detail_delay_secs: 1.0,
            retry_ceiling: 3,
            retry_delay_secs: 5.0,
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            kind: RendererKind::Browser,
            settle_secs: 2.0,
            request_timeout_secs: 30,
        }
    }
}

impl RunConfig {
    /// Budget available for actual work once the safety margin is set aside
    pub fn effective_budget(&self) -> Duration {
        Duration::from_secs(self.max_runtime_secs.saturating_sub(self.safety_margin_secs))
    }
}

impl PolitenessConfig {
    pub fn listing_delay(&self) -> Duration {
        Duration::from_secs_f64(self.listing_delay_secs.max(0.0))
    }

    pub fn detail_delay(&self) -> Duration {
        Duration::from_secs_f64(self.detail_delay_secs.max(0.0))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs_f64(self.retry_delay_secs.max(0.0))
    }
}

impl RendererConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs_f64(self.settle_secs.max(0.0))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
