//! Feed fetching and entry normalization.
//!
//! # Submodules
//!
//! - [`http`]: [`HttpFetcher`], the real network fetcher (`reqwest` + `feed-rs`)
//! - [`entry`]: the flattened entry model, date extraction, the
//!   [`EntryFilter`] record builder, and opt-in dedup
//!
//! The [`FeedFetcher`] trait is the seam between the pipeline and the
//! network. The pipeline only ever asks for "the parsed feed at this URL",
//! which lets tests drive it with in-memory feeds.

pub mod entry;
pub mod http;

pub use entry::{EntryFilter, ParsedFeed, dedup_by_title_link};
pub use http::HttpFetcher;

use crate::error::Error;

/// Something that can turn a source URL into a parsed feed.
///
/// Implementations report every failure as an error scoped to that one
/// source ([`Error::Fetch`], [`Error::HttpStatus`], [`Error::BodyTooLarge`] or
/// [`Error::FeedParse`]); the pipeline logs it and moves on.
pub trait FeedFetcher {
    async fn fetch(&self, url: &str) -> Result<ParsedFeed, Error>;
}

impl<T: FeedFetcher> FeedFetcher for &T {
    async fn fetch(&self, url: &str) -> Result<ParsedFeed, Error> {
        (**self).fetch(url).await
    }
}
