//! Run coordination
//!
//! One `Harvester` owns everything a run needs: the renderer, the dataset,
//! the checkpoint, and the two extractors. A run alternates between
//! collecting links from a bounded batch of listing pages and extracting
//! details for the links just collected, flushing buffered records along
//! the way. Stop conditions are checked only between pages; a page that
//! has started is always finished.

use crate::catalog::listing_url;
use crate::config::{catalog_fingerprint, Config};
use crate::crawler::context::{RunContext, RunSummary, StopReason};
use crate::crawler::detail::{DetailExtractor, DetailOutcome};
use crate::crawler::listing::{ListingExtractor, ListingOutcome};
use crate::render::PageRenderer;
use crate::store::{CheckpointStore, Dataset};
use crate::Result;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{info, warn};
use url::Url;

/// Orchestrates harvest runs
pub struct Harvester<R: PageRenderer, D: Dataset> {
    config: Config,
    base: Url,
    renderer: R,
    dataset: D,
    checkpoint: CheckpointStore,
    listing: ListingExtractor,
    detail: DetailExtractor,
    shutdown: Arc<AtomicBool>,
}

impl<R: PageRenderer, D: Dataset> Harvester<R, D> {
    /// Wires a harvester together from a validated configuration
    pub fn new(config: Config, renderer: R, dataset: D) -> Result<Self> {
        let base = Url::parse(&config.catalog.base_url)?;
        let listing = ListingExtractor::from_config(&config.catalog, &config.politeness)?;
        let detail = DetailExtractor::from_config(&config.catalog, &config.politeness)?;
        let fingerprint = catalog_fingerprint(&config.catalog);
        let checkpoint = CheckpointStore::new(&config.run.data_dir, &fingerprint);

        Ok(Self {
            config,
            base,
            renderer,
            dataset,
            checkpoint,
            listing,
            detail,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Flag that asks the run to stop at the next phase boundary
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Clears the page checkpoint; the dataset is left alone
    pub fn reset_checkpoint(&self) -> Result<()> {
        self.checkpoint.reset()?;
        Ok(())
    }

    /// Releases the renderer
    pub async fn close(mut self) {
        self.renderer.close().await;
    }

    /// Executes one harvest run
    ///
    /// Returns the run summary; the dataset and checkpoint on disk hold
    /// whatever was flushed, regardless of why the run stopped.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let max_pages = self.config.catalog.max_pages;
        let max_urls = self.config.run.max_urls_per_run;

        info!(
            "Harvest run starting: budget {}s (margin {}s), up to {} new URLs, data dir {}",
            self.config.run.max_runtime_secs,
            self.config.run.safety_margin_secs,
            max_urls,
            self.config.run.data_dir.display()
        );

        let existing = self.dataset.existing_keys()?;
        info!("{} URLs already in the dataset", existing.len());

        let mut ctx = RunContext::new(
            self.config.run.effective_budget(),
            existing,
            Arc::clone(&self.shutdown),
        );

        let last_page = self.checkpoint.load();
        let mut cursor = last_page + 1;
        info!("Resuming from page {} (checkpoint {})", cursor, last_page);

        let stop = loop {
            if ctx.interrupted() {
                break StopReason::Interrupted;
            }
            if ctx.deadline_expired() {
                break StopReason::DeadlineReached;
            }
            if cursor > max_pages {
                break StopReason::CatalogExhausted;
            }
            if ctx.urls_collected >= max_urls {
                break StopReason::UrlBudgetSpent;
            }

            let pending = self.collect_links(&mut ctx, &mut cursor).await?;
            if !pending.is_empty() {
                self.extract_details(&mut ctx, pending).await?;
            }
            if ctx.collection_stalled {
                break StopReason::ListingStalled;
            }
        };

        self.flush(&mut ctx)?;

        let summary = ctx.finish(stop);
        info!(
            "Run stopped ({}): {} pages, {} new URLs, {} details ({} complete, {} partial, {} failed), {} records inserted, elapsed {:?}",
            summary.stop,
            summary.pages_visited,
            summary.urls_collected,
            summary.details_fetched,
            summary.complete,
            summary.partial,
            summary.failed,
            summary.records_inserted,
            summary.elapsed
        );
        Ok(summary)
    }

    /// Collection phase: enumerate up to one batch of listing pages
    ///
    /// The checkpoint advances to a page's number the moment that page is
    /// enumerated, including pages that turn out to hold nothing new. An
    /// exhausted page halts collection for the whole run instead, leaving
    /// the checkpoint pointing before it so the next run retries it.
    async fn collect_links(
        &mut self,
        ctx: &mut RunContext,
        cursor: &mut u32,
    ) -> Result<Vec<String>> {
        let max_pages = self.config.catalog.max_pages;
        let max_urls = self.config.run.max_urls_per_run;
        let batch_limit = self.config.run.pages_per_batch;

        let mut pending = Vec::new();
        let mut pages_in_batch = 0u32;

        while *cursor <= max_pages
            && pages_in_batch < batch_limit
            && ctx.urls_collected < max_urls
            && !ctx.should_stop()
        {
            let page_url = listing_url(&self.base, *cursor);
            match self.listing.extract(&mut self.renderer, &page_url).await {
                ListingOutcome::Enumerated(links) => {
                    let found = links.len();
                    let before = pending.len();
                    for link in links {
                        if ctx.mark_new(&link) {
                            pending.push(link);
                        }
                    }
                    ctx.pages_visited += 1;
                    self.checkpoint.save(*cursor)?;
                    info!(
                        "Page {}: {} links, {} new ({} collected this run)",
                        cursor,
                        found,
                        pending.len() - before,
                        ctx.urls_collected
                    );
                    *cursor += 1;
                    pages_in_batch += 1;
                    sleep(self.config.politeness.listing_delay()).await;
                }
                ListingOutcome::Exhausted { attempts } => {
                    warn!(
                        "Page {} failed {} attempts; halting collection until the next run",
                        cursor, attempts
                    );
                    ctx.collection_stalled = true;
                    break;
                }
            }
        }

        Ok(pending)
    }

    /// Extraction phase: fetch detail pages for freshly collected URLs
    async fn extract_details(&mut self, ctx: &mut RunContext, pending: Vec<String>) -> Result<()> {
        info!("Extracting {} detail pages", pending.len());
        let flush_threshold = self.config.run.flush_threshold;
        let total = pending.len();

        for (index, url) in pending.into_iter().enumerate() {
            if ctx.should_stop() {
                warn!(
                    "Stopping mid-batch; {} detail pages were not fetched",
                    total - index
                );
                break;
            }

            let extraction = self.detail.extract(&mut self.renderer, &url).await;
            match extraction.outcome {
                DetailOutcome::Complete => ctx.complete += 1,
                DetailOutcome::Partial => ctx.partial += 1,
                DetailOutcome::Failed => {
                    ctx.failed += 1;
                    warn!("Keeping blank record for {}", url);
                }
            }
            ctx.buffer.push(extraction.record);
            ctx.details_fetched += 1;

            if ctx.buffer.len() >= flush_threshold {
                self.flush(ctx)?;
            }
            sleep(self.config.politeness.detail_delay()).await;
        }
        Ok(())
    }

    /// Writes buffered records to the dataset
    fn flush(&mut self, ctx: &mut RunContext) -> Result<()> {
        if ctx.buffer.is_empty() {
            return Ok(());
        }

        let batch = ctx.buffer.len();
        let inserted = self.dataset.append(&ctx.buffer)?;
        ctx.records_flushed += batch;
        ctx.records_inserted += inserted;
        ctx.buffer.clear();
        info!(
            "Flushed {} records ({} new rows, {} inserted this run)",
            batch, inserted, ctx.records_inserted
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::scripted::{CallLog, ScriptedRenderer};
    use crate::store::{Record, SqliteDataset};
    use std::path::Path;
    use std::sync::atomic::Ordering;
    use tempfile::tempdir;

    const BASE: &str = "https://example.com/en/glossary";
    const PAGE_2: &str = "https://example.com/en/glossary?page=2";

    fn test_config(data_dir: &Path) -> Config {
        let mut config = Config::default();
        config.catalog.base_url = BASE.to_string();
        config.catalog.max_pages = 2;
        config.catalog.path_prefixes = vec!["/en/glossary/".to_string()];
        config.run.data_dir = data_dir.to_path_buf();
        config.run.max_runtime_secs = 300;
        config.run.safety_margin_secs = 0;
        config.politeness.listing_delay_secs = 0.0;
        config.politeness.detail_delay_secs = 0.0;
        config.politeness.retry_delay_secs = 0.0;
        config
    }

    fn listing_html(hrefs: &[&str]) -> String {
        let items: String = hrefs
            .iter()
            .map(|href| format!(r#"<li class="item"><a href="{}">term</a></li>"#, href))
            .collect();
        format!(
            r#"<html><body><div class="dictionary-items"><ul>{}</ul></div></body></html>"#,
            items
        )
    }

    fn detail_html(title: &str) -> String {
        format!(
            r#"<html><body>
            <h1 class="dictionary-detail-title">{}</h1>
            <h2 class="dictionary-detail-title">{} subtitle</h2>
            <div class="dictionary-details">{} body</div>
            </body></html>"#,
            title, title, title
        )
    }

    fn term(slug: &str) -> String {
        format!("https://example.com/en/glossary/{}", slug)
    }

    /// Two listing pages, two terms on the first, none on the second
    fn small_catalog() -> (ScriptedRenderer, CallLog) {
        let renderer = ScriptedRenderer::new()
            .on(
                BASE,
                &listing_html(&["/en/glossary/kaizen", "/en/glossary/muda"]),
            )
            .on(PAGE_2, &listing_html(&[]))
            .on(&term("kaizen"), &detail_html("Kaizen"))
            .on(&term("muda"), &detail_html("Muda"));
        let log = renderer.log.clone();
        (renderer, log)
    }

    fn checkpoint_for(config: &Config) -> CheckpointStore {
        CheckpointStore::new(&config.run.data_dir, &catalog_fingerprint(&config.catalog))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_run_harvests_whole_catalog() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let (renderer, log) = small_catalog();
        let dataset = SqliteDataset::new_in_memory().unwrap();

        let mut harvester = Harvester::new(config.clone(), renderer, dataset).unwrap();
        let summary = harvester.run().await.unwrap();

        assert_eq!(summary.stop, StopReason::CatalogExhausted);
        assert_eq!(summary.pages_visited, 2);
        assert_eq!(summary.urls_collected, 2);
        assert_eq!(summary.details_fetched, 2);
        assert_eq!(summary.complete, 2);
        assert_eq!(summary.records_inserted, 2);
        assert_eq!(checkpoint_for(&config).load(), 2);
        assert_eq!(log.count(BASE), 1);
        assert_eq!(log.count(PAGE_2), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_harvested_urls_are_not_refetched() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let (renderer, log) = small_catalog();

        let mut dataset = SqliteDataset::new_in_memory().unwrap();
        dataset
            .append(&[Record {
                url: term("kaizen"),
                title: "Kaizen".to_string(),
                subtitle: "old".to_string(),
                body: "old".to_string(),
            }])
            .unwrap();

        let mut harvester = Harvester::new(config, renderer, dataset).unwrap();
        let summary = harvester.run().await.unwrap();

        // Only the unseen term was fetched and inserted
        assert_eq!(summary.urls_collected, 1);
        assert_eq!(summary.details_fetched, 1);
        assert_eq!(summary.records_inserted, 1);
        assert_eq!(log.count(&term("kaizen")), 0);
        assert_eq!(log.count(&term("muda")), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_starts_after_the_checkpoint() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        checkpoint_for(&config).save(1).unwrap();

        let (renderer, log) = small_catalog();
        let dataset = SqliteDataset::new_in_memory().unwrap();
        let mut harvester = Harvester::new(config.clone(), renderer, dataset).unwrap();
        let summary = harvester.run().await.unwrap();

        // Page 1 is never revisited
        assert_eq!(log.count(BASE), 0);
        assert_eq!(log.count(PAGE_2), 1);
        assert_eq!(summary.pages_visited, 1);
        assert_eq!(summary.stop, StopReason::CatalogExhausted);
        assert_eq!(checkpoint_for(&config).load(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkpoint_past_the_catalog_stops_immediately() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        checkpoint_for(&config).save(2).unwrap();

        let (renderer, log) = small_catalog();
        let dataset = SqliteDataset::new_in_memory().unwrap();
        let mut harvester = Harvester::new(config.clone(), renderer, dataset).unwrap();
        let summary = harvester.run().await.unwrap();

        assert_eq!(summary.stop, StopReason::CatalogExhausted);
        assert_eq!(log.total(), 0);
        assert_eq!(checkpoint_for(&config).load(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_detail_is_stored_blank_and_run_continues() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let renderer = ScriptedRenderer::new()
            .on(
                BASE,
                &listing_html(&["/en/glossary/kaizen", "/en/glossary/muda"]),
            )
            .on(PAGE_2, &listing_html(&[]))
            .on_failing(&term("kaizen"), "connection refused")
            .on(&term("muda"), &detail_html("Muda"));
        let log = renderer.log.clone();
        let dataset = SqliteDataset::new_in_memory().unwrap();

        let mut harvester = Harvester::new(config, renderer, dataset).unwrap();
        let summary = harvester.run().await.unwrap();

        assert_eq!(summary.stop, StopReason::CatalogExhausted);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.complete, 1);
        assert_eq!(summary.records_inserted, 2);
        // The failing page was attempted exactly retry-ceiling times
        assert_eq!(log.count(&term("kaizen")), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_listing_leaves_checkpoint_for_next_run() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let renderer = ScriptedRenderer::new()
            .on(BASE, &listing_html(&["/en/glossary/kaizen"]))
            .on_failing(PAGE_2, "gateway timeout")
            .on(&term("kaizen"), &detail_html("Kaizen"));
        let dataset = SqliteDataset::new_in_memory().unwrap();

        let mut harvester = Harvester::new(config.clone(), renderer, dataset).unwrap();
        let summary = harvester.run().await.unwrap();

        assert_eq!(summary.stop, StopReason::ListingStalled);
        // Page 1's links were still extracted and flushed
        assert_eq!(summary.records_inserted, 1);
        // The checkpoint stays before the failing page
        assert_eq!(checkpoint_for(&config).load(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_url_budget_stops_collection() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.run.max_urls_per_run = 1;

        let (renderer, log) = small_catalog();
        let dataset = SqliteDataset::new_in_memory().unwrap();
        let mut harvester = Harvester::new(config.clone(), renderer, dataset).unwrap();
        let summary = harvester.run().await.unwrap();

        assert_eq!(summary.stop, StopReason::UrlBudgetSpent);
        // The page that crossed the cap is still finished whole
        assert_eq!(summary.urls_collected, 2);
        assert_eq!(summary.records_inserted, 2);
        assert_eq!(summary.pages_visited, 1);
        assert_eq!(log.count(PAGE_2), 0);
        assert_eq!(checkpoint_for(&config).load(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spent_budget_means_zero_fetches() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.run.max_runtime_secs = 10;
        config.run.safety_margin_secs = 30;

        let (renderer, log) = small_catalog();
        let dataset = SqliteDataset::new_in_memory().unwrap();
        let mut harvester = Harvester::new(config.clone(), renderer, dataset).unwrap();
        let summary = harvester.run().await.unwrap();

        assert_eq!(summary.stop, StopReason::DeadlineReached);
        assert_eq!(log.total(), 0);
        assert_eq!(summary.pages_visited, 0);
        assert_eq!(summary.records_flushed, 0);
        assert_eq!(checkpoint_for(&config).load(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_mid_extraction_flushes_buffer() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.run.max_runtime_secs = 15;
        // Each detail costs 10s of politeness delay, so the deadline
        // trips after the second fetch
        config.politeness.detail_delay_secs = 10.0;

        let renderer = ScriptedRenderer::new()
            .on(
                BASE,
                &listing_html(&[
                    "/en/glossary/kaizen",
                    "/en/glossary/muda",
                    "/en/glossary/mura",
                ]),
            )
            .on(PAGE_2, &listing_html(&[]))
            .on(&term("kaizen"), &detail_html("Kaizen"))
            .on(&term("muda"), &detail_html("Muda"))
            .on(&term("mura"), &detail_html("Mura"));
        let log = renderer.log.clone();
        let dataset = SqliteDataset::new_in_memory().unwrap();

        let mut harvester = Harvester::new(config, renderer, dataset).unwrap();
        let summary = harvester.run().await.unwrap();

        assert_eq!(summary.stop, StopReason::DeadlineReached);
        assert_eq!(summary.details_fetched, 2);
        // Buffered records were flushed on the way out
        assert_eq!(summary.records_flushed, 2);
        assert_eq!(summary.records_inserted, 2);
        assert_eq!(log.count(&term("mura")), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_threshold_bounds_the_buffer() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.run.flush_threshold = 2;

        let renderer = ScriptedRenderer::new()
            .on(
                BASE,
                &listing_html(&[
                    "/en/glossary/kaizen",
                    "/en/glossary/muda",
                    "/en/glossary/mura",
                ]),
            )
            .on(PAGE_2, &listing_html(&[]))
            .on(&term("kaizen"), &detail_html("Kaizen"))
            .on(&term("muda"), &detail_html("Muda"))
            .on(&term("mura"), &detail_html("Mura"));
        let dataset = SqliteDataset::new_in_memory().unwrap();

        let mut harvester = Harvester::new(config, renderer, dataset).unwrap();
        let summary = harvester.run().await.unwrap();

        assert_eq!(summary.records_flushed, 3);
        assert_eq!(summary.records_inserted, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_stops_before_any_fetch() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let (renderer, log) = small_catalog();
        let dataset = SqliteDataset::new_in_memory().unwrap();

        let mut harvester = Harvester::new(config, renderer, dataset).unwrap();
        harvester.shutdown_flag().store(true, Ordering::Relaxed);
        let summary = harvester.run().await.unwrap();

        assert_eq!(summary.stop, StopReason::Interrupted);
        assert_eq!(log.total(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_checkpoint_clears_resume_point() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        checkpoint_for(&config).save(7).unwrap();

        let (renderer, _log) = small_catalog();
        let dataset = SqliteDataset::new_in_memory().unwrap();
        let harvester = Harvester::new(config.clone(), renderer, dataset).unwrap();
        harvester.reset_checkpoint().unwrap();

        assert_eq!(checkpoint_for(&config).load(), 0);
    }
}
