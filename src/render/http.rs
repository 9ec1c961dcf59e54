//! Plain HTTP rendering
//!
//! Fetches raw page source without a browser. No settle delay applies;
//! whatever the server sends is what gets parsed.

use crate::config::RendererConfig;
use crate::render::{PageRenderer, RenderError, USER_AGENT};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Renders pages by fetching their source over HTTP
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    /// Builds the HTTP client used for the whole run
    pub fn new(config: &RendererConfig) -> Result<Self, RenderError> {
        let connect_timeout = config.request_timeout().min(Duration::from_secs(10));
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout())
            .connect_timeout(connect_timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(RenderError::Client)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&mut self, url: &str) -> Result<String, RenderError> {
        debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RenderError::Http {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(|e| RenderError::Http {
            url: url.to_string(),
            source: e,
        })
    }
}
