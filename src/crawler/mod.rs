//! Harvest orchestration
//!
//! This module contains the core harvesting logic, including:
//! - Listing page link collection with retry
//! - Detail page field extraction
//! - Per-run state (deadline, seen-set, buffer, counters)
//! - Overall run coordination in alternating phases

mod context;
mod coordinator;
mod detail;
mod listing;

pub use context::{Deadline, RunContext, RunSummary, StopReason};
pub use coordinator::Harvester;
pub use detail::{DetailExtraction, DetailExtractor, DetailOutcome};
pub use listing::{ListingExtractor, ListingOutcome};

use crate::config::PolitenessConfig;
use crate::ConfigError;
use scraper::Selector;
use std::time::Duration;

/// Attempt ceiling and inter-attempt delay shared by both extractors
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub ceiling: u32,
    pub delay: Duration,
}

impl From<&PolitenessConfig> for RetryPolicy {
    fn from(config: &PolitenessConfig) -> Self {
        Self {
            ceiling: config.retry_ceiling.max(1),
            delay: config.retry_delay(),
        }
    }
}

/// Compiles a configured CSS selector, naming the field in the error
pub(crate) fn parse_selector(name: &str, value: &str) -> Result<Selector, ConfigError> {
    Selector::parse(value).map_err(|e| {
        ConfigError::InvalidSelector(format!("selector '{}' ('{}') is invalid: {}", name, value, e))
    })
}
