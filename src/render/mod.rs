//! Page rendering
//!
//! The orchestrator needs exactly one capability from the outside world:
//! given a URL, produce that page's HTML source. Element location happens
//! afterwards, on the returned source, so the renderer stays swappable.
//!
//! Two implementations are provided:
//!
//! - [`BrowserRenderer`] drives a headless browser over the DevTools
//!   protocol, for catalogs that assemble their listings client-side
//! - [`HttpRenderer`] fetches raw source over plain HTTP, for catalogs
//!   that ship server-rendered pages and for exercising the pipeline
//!   in tests

mod browser;
mod http;
#[cfg(test)]
pub(crate) mod scripted;

pub use browser::BrowserRenderer;
pub use http::HttpRenderer;

use crate::config::{RendererConfig, RendererKind};
use async_trait::async_trait;
use thiserror::Error;

/// User agent sent by the HTTP renderer
pub const USER_AGENT: &str = concat!("sashiko/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while rendering a page
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Request failed for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Navigation failed for {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Produces page source for a URL
///
/// Renderers are acquired once per run and released once at the end;
/// every page fetched during the run goes through the same instance.
#[async_trait]
pub trait PageRenderer: Send {
    /// Navigates to `url` and returns the page's HTML source
    async fn render(&mut self, url: &str) -> Result<String, RenderError>;

    /// Releases whatever the renderer holds. Default: nothing to do.
    async fn close(&mut self) {}
}

#[async_trait]
impl PageRenderer for Box<dyn PageRenderer> {
    async fn render(&mut self, url: &str) -> Result<String, RenderError> {
        (**self).render(url).await
    }

    async fn close(&mut self) {
        (**self).close().await
    }
}

/// Builds the renderer selected by the configuration
pub async fn acquire(config: &RendererConfig) -> Result<Box<dyn PageRenderer>, RenderError> {
    match config.kind {
        RendererKind::Browser => Ok(Box::new(BrowserRenderer::launch(config).await?)),
        RendererKind::Http => Ok(Box::new(HttpRenderer::new(config)?)),
    }
}
