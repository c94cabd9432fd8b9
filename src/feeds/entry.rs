//! Feed entries, date extraction, and the record builder.
//!
//! [`ParsedFeed`] and [`RawEntry`] are a flattened view of what `feed-rs`
//! produces for RSS, Atom, and JSON Feed alike. Dialect differences stop at
//! [`RawEntry::from`]: the publish timestamp is the library's normalized
//! `published` field, falling back to `updated` (Atom feeds often carry only
//! the latter). Everything downstream sees a single optional UTC timestamp.

use crate::models::{DateBasis, NormalizedRecord, TargetDate};
use crate::text::{clean, truncate};
use chrono::{DateTime, NaiveDate, Utc};
use feed_rs::model::{Entry, Feed, Link};
use itertools::Itertools;

/// One feed item as delivered, before any filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    /// Summary or description, possibly HTML.
    pub summary: Option<String>,
    /// Full content body, used when the summary has no visible text.
    pub content: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

impl From<Entry> for RawEntry {
    fn from(entry: Entry) -> Self {
        RawEntry {
            title: entry.title.map(|t| t.content),
            link: primary_link(&entry.links),
            summary: entry.summary.map(|t| t.content),
            content: entry.content.and_then(|c| c.body),
            published: entry.published.or(entry.updated),
        }
    }
}

/// A parsed feed: its declared title and its entries in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<RawEntry>,
}

impl From<Feed> for ParsedFeed {
    fn from(feed: Feed) -> Self {
        ParsedFeed {
            title: feed.title.map(|t| t.content),
            entries: feed.entries.into_iter().map(RawEntry::from).collect(),
        }
    }
}

/// Prefer the `alternate` (or unqualified) link; otherwise take the first.
fn primary_link(links: &[Link]) -> Option<String> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
        .map(|l| l.href.clone())
}

/// The calendar day an entry was published, if it can be determined.
///
/// Entries without a timestamp return `None` and never match any date.
pub fn entry_date(entry: &RawEntry, basis: DateBasis) -> Option<NaiveDate> {
    entry.published.map(|ts| basis.day_of(ts))
}

/// Selects the entries published on the target date and turns them into
/// [`NormalizedRecord`]s.
#[derive(Debug, Clone, Copy)]
pub struct EntryFilter {
    pub target: TargetDate,
    pub basis: DateBasis,
    /// Summary length cap, in characters.
    pub max_cell: usize,
}

impl EntryFilter {
    pub fn new(target: TargetDate, basis: DateBasis, max_cell: usize) -> Self {
        EntryFilter {
            target,
            basis,
            max_cell,
        }
    }

    pub fn matches(&self, entry: &RawEntry) -> bool {
        entry_date(entry, self.basis).is_some_and(|day| self.target.matches(day))
    }

    /// Build a record for `entry` if it was published on the target date.
    pub fn build(&self, entry: &RawEntry, source: &str) -> Option<NormalizedRecord> {
        if !self.matches(entry) {
            return None;
        }
        // A summary that cleans down to nothing (an image teaser, say) falls
        // back to the content body.
        let summary = [entry.summary.as_deref(), entry.content.as_deref()]
            .into_iter()
            .flatten()
            .map(clean)
            .find(|text| !text.is_empty())
            .unwrap_or_default();

        Some(NormalizedRecord {
            title: entry.title.clone().unwrap_or_default(),
            link: entry.link.clone().unwrap_or_default(),
            summary: truncate(&summary, self.max_cell),
            published_date: self.target.to_string(),
            source: source.to_string(),
        })
    }

    /// All matching records of a feed, in feed order.
    pub fn select(&self, feed: &ParsedFeed) -> Vec<NormalizedRecord> {
        let source = feed.title.as_deref().unwrap_or_default();
        feed.entries
            .iter()
            .filter_map(|entry| self.build(entry, source))
            .collect()
    }
}

/// Drop records that repeat an earlier `(title, link)` pair.
///
/// Off by default: the same story syndicated by two independent feeds is
/// normally kept twice. Returns the surviving records and how many were
/// removed.
pub fn dedup_by_title_link(records: Vec<NormalizedRecord>) -> (Vec<NormalizedRecord>, usize) {
    let before = records.len();
    let kept: Vec<NormalizedRecord> = records
        .into_iter()
        .unique_by(|r| (r.title.clone(), r.link.clone()))
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}
