//! Detail page field extraction
//!
//! Each detail page yields exactly one record. Missing elements become
//! empty fields rather than errors, and a page whose every attempt fails
//! still yields a record (URL only), so the URL is never fetched again
//! on later runs.

use crate::config::{CatalogConfig, PolitenessConfig};
use crate::crawler::{parse_selector, RetryPolicy};
use crate::render::PageRenderer;
use crate::store::Record;
use crate::ConfigError;
use scraper::{Html, Selector};
use tracing::{debug, warn};

/// How completely a detail page yielded its fields
///
/// The tag travels with the record inside the run for logging and
/// counters; the stored row stays the same flat shape either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailOutcome {
    /// Every configured field produced text
    Complete,
    /// The page rendered but at least one field came back empty
    Partial,
    /// No attempt produced a page
    Failed,
}

/// A record plus how it was obtained
#[derive(Debug)]
pub struct DetailExtraction {
    pub record: Record,
    pub outcome: DetailOutcome,
}

/// Extracts title, subtitle, and body from detail pages
pub struct DetailExtractor {
    title: Selector,
    subtitle: Selector,
    body: Selector,
    retry: RetryPolicy,
}

impl DetailExtractor {
    /// Compiles the detail selectors from configuration
    pub fn from_config(
        catalog: &CatalogConfig,
        politeness: &PolitenessConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            title: parse_selector("title", &catalog.selectors.title)?,
            subtitle: parse_selector("subtitle", &catalog.selectors.subtitle)?,
            body: parse_selector("body", &catalog.selectors.body)?,
            retry: RetryPolicy::from(politeness),
        })
    }

    /// Fetches one detail page and reads its fields, retrying transient
    /// render failures up to the ceiling
    pub async fn extract<R: PageRenderer>(&self, renderer: &mut R, url: &str) -> DetailExtraction {
        for attempt in 1..=self.retry.ceiling {
            match renderer.render(url).await {
                Ok(html) => return self.fields_from(url, &html),
                Err(e) => {
                    warn!(
                        "Attempt {}/{} failed for {}: {}",
                        attempt, self.retry.ceiling, url, e
                    );
                    if attempt < self.retry.ceiling {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
            }
        }

        DetailExtraction {
            record: Record::blank(url),
            outcome: DetailOutcome::Failed,
        }
    }

    fn fields_from(&self, url: &str, html: &str) -> DetailExtraction {
        let document = Html::parse_document(html);
        let title = first_text(&document, &self.title);
        let subtitle = first_text(&document, &self.subtitle);
        let body = first_text(&document, &self.body);

        let outcome = if title.is_empty() || subtitle.is_empty() || body.is_empty() {
            DetailOutcome::Partial
        } else {
            DetailOutcome::Complete
        };
        debug!("{}: {:?}", url, outcome);

        DetailExtraction {
            record: Record {
                url: url.to_string(),
                title,
                subtitle,
                body,
            },
            outcome,
        }
    }
}

/// Trimmed text of the first element matching `selector`, or empty
fn first_text(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::scripted::ScriptedRenderer;

    const URL: &str = "https://example.com/en/glossary/kaizen";

    fn extractor() -> DetailExtractor {
        let politeness = PolitenessConfig {
            retry_delay_secs: 0.0,
            ..PolitenessConfig::default()
        };
        DetailExtractor::from_config(&CatalogConfig::default(), &politeness).unwrap()
    }

    fn detail_html(title: &str, subtitle: &str, body: &str) -> String {
        format!(
            r#"<html><body>
            <h1 class="dictionary-detail-title">{}</h1>
            <h2 class="dictionary-detail-title">{}</h2>
            <div class="dictionary-details">{}</div>
            </body></html>"#,
            title, subtitle, body
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_extraction() {
        let html = detail_html("Kaizen", "Continuous improvement", "A philosophy of small steps.");
        let mut renderer = ScriptedRenderer::new().on(URL, &html);

        let extraction = extractor().extract(&mut renderer, URL).await;
        assert_eq!(extraction.outcome, DetailOutcome::Complete);
        assert_eq!(extraction.record.url, URL);
        assert_eq!(extraction.record.title, "Kaizen");
        assert_eq!(extraction.record.subtitle, "Continuous improvement");
        assert_eq!(extraction.record.body, "A philosophy of small steps.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_element_yields_partial() {
        let html = r#"<html><body>
            <h1 class="dictionary-detail-title">Kaizen</h1>
            <div class="dictionary-details">Body text</div>
            </body></html>"#;
        let mut renderer = ScriptedRenderer::new().on(URL, html);

        let extraction = extractor().extract(&mut renderer, URL).await;
        assert_eq!(extraction.outcome, DetailOutcome::Partial);
        assert_eq!(extraction.record.title, "Kaizen");
        assert_eq!(extraction.record.subtitle, "");
        assert_eq!(extraction.record.body, "Body text");
    }

    #[tokio::test(start_paused = true)]
    async fn test_whitespace_is_trimmed() {
        let html = detail_html("  Kaizen \n", " sub ", " body ");
        let mut renderer = ScriptedRenderer::new().on(URL, &html);

        let extraction = extractor().extract(&mut renderer, URL).await;
        assert_eq!(extraction.record.title, "Kaizen");
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_match_wins() {
        let html = r#"<html><body>
            <h1 class="dictionary-detail-title">First</h1>
            <h1 class="dictionary-detail-title">Second</h1>
            <h2 class="dictionary-detail-title">s</h2>
            <div class="dictionary-details">b</div>
            </body></html>"#;
        let mut renderer = ScriptedRenderer::new().on(URL, html);

        let extraction = extractor().extract(&mut renderer, URL).await;
        assert_eq!(extraction.record.title, "First");
    }

    #[tokio::test(start_paused = true)]
    async fn test_nested_markup_flattens_to_text() {
        let html = detail_html("Kaizen", "sub", "Improvement in <b>small</b> steps");
        let mut renderer = ScriptedRenderer::new().on(URL, &html);

        let extraction = extractor().extract(&mut renderer, URL).await;
        assert_eq!(extraction.record.body, "Improvement in small steps");
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_attempts_failing_yields_blank_record() {
        let mut renderer = ScriptedRenderer::new().on_failing(URL, "connection refused");
        let log = renderer.log.clone();

        let extraction = extractor().extract(&mut renderer, URL).await;
        assert_eq!(extraction.outcome, DetailOutcome::Failed);
        assert!(extraction.record.is_blank());
        assert_eq!(extraction.record.url, URL);
        assert_eq!(log.count(URL), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_then_success() {
        let html = detail_html("Kaizen", "sub", "body");
        let mut renderer = ScriptedRenderer::new()
            .on_sequence(URL, vec![Err("timeout".to_string()), Ok(html)]);
        let log = renderer.log.clone();

        let extraction = extractor().extract(&mut renderer, URL).await;
        assert_eq!(extraction.outcome, DetailOutcome::Complete);
        assert_eq!(log.count(URL), 2);
    }
}
