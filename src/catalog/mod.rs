//! Catalog addressing and link recognition
//!
//! A catalog is a paginated listing index plus the detail pages it links to.
//! This module knows how to name a listing page by number, how to decide
//! whether an href found on a listing page points at a detail page, and how
//! to report what the configured selectors find on a page.

mod filter;
mod pages;
mod probe;

pub use filter::LinkFilter;
pub use pages::listing_url;
pub use probe::{probe_listing, ProbeReport};
