//! Headless browser rendering over the Chrome DevTools Protocol
//!
//! One browser process and one tab serve the whole run. After navigation
//! the renderer waits a settle delay so client-side scripts can populate
//! the page before its source is read.

use crate::config::RendererConfig;
use crate::render::{PageRenderer, RenderError};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Renders pages in a headless browser
pub struct BrowserRenderer {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    settle: Duration,
}

impl BrowserRenderer {
    /// Launches a headless browser and opens the tab used for the run
    ///
    /// # Arguments
    ///
    /// * `config` - Renderer settings (settle delay, request timeout)
    pub async fn launch(config: &RendererConfig) -> Result<Self, RenderError> {
        let browser_config = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1920, 1080)
            .request_timeout(config.request_timeout())
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--disable-extensions")
            .arg("--blink-settings=imagesEnabled=false")
            .build()
            .map_err(RenderError::Launch)?;

        info!("Launching headless browser");
        let (browser, mut handler) = Browser::launch(browser_config).await?;

        // The handler stream must be drained for the CDP connection to
        // make progress; it ends when the browser goes away.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            page,
            handler_task,
            settle: config.settle_delay(),
        })
    }
}

#[async_trait]
impl PageRenderer for BrowserRenderer {
    async fn render(&mut self, url: &str) -> Result<String, RenderError> {
        debug!("Rendering {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| RenderError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| RenderError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        // Listings are assembled client-side; give scripts time to run
        tokio::time::sleep(self.settle).await;

        let html = self.page.content().await?;
        Ok(html)
    }

    async fn close(&mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Browser did not close cleanly: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }
}
