//! Data models shared by the fetcher, the filter and the sinks.
//!
//! - [`TargetDate`]: the single calendar day a run collects
//! - [`NormalizedRecord`]: one matched feed item, ready for a sink
//! - [`RunResult`]: what one pass over the source list produced
//! - [`RunReport`]: the run result plus where the sinks put it
//!
//! The record's serde names are the column headers of the sheet and of the
//! CSV export, so both sinks share one row shape.

use crate::error::Error;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Column headers, in row order.
pub const HEADER: [&str; 5] = ["Title", "Link", "Summary", "Published Date", "Source"];

/// The calendar day a run is collecting, rendered as `YYYY-MM-DD`.
///
/// Computed once per run and never changed afterwards. It drives both
/// the entry filter and the name of the sheet the records land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetDate(NaiveDate);

impl TargetDate {
    pub const FORMAT: &'static str = "%Y-%m-%d";

    /// The day before `today`. Saturates at the earliest representable date.
    pub fn yesterday_of(today: NaiveDate) -> Self {
        TargetDate(today.pred_opt().unwrap_or(today))
    }

    pub fn matches(&self, day: NaiveDate) -> bool {
        self.0 == day
    }
}

impl FromStr for TargetDate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), Self::FORMAT)
            .map(TargetDate)
            .map_err(|source| Error::DateParse {
                input: s.to_string(),
                source,
            })
    }
}

impl fmt::Display for TargetDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

/// Which clock turns a feed timestamp into a calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DateBasis {
    /// The machine's local time zone.
    #[default]
    Local,
    /// UTC, i.e. the timestamp exactly as the feed library normalized it.
    Utc,
}

impl DateBasis {
    pub fn day_of(self, ts: DateTime<Utc>) -> NaiveDate {
        match self {
            DateBasis::Local => ts.with_timezone(&Local).date_naive(),
            DateBasis::Utc => ts.date_naive(),
        }
    }
}

/// One feed item that matched the target date.
///
/// Every field is always populated; absent feed values become `""`.
/// `summary` is already stripped of markup and capped at the sink's cell
/// limit, so sinks write it as-is.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NormalizedRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Link")]
    pub link: String,
    #[serde(rename = "Summary")]
    pub summary: String,
    /// Always equal to the run's [`TargetDate`].
    #[serde(rename = "Published Date")]
    pub published_date: String,
    /// The feed's own title.
    #[serde(rename = "Source")]
    pub source: String,
}

impl NormalizedRecord {
    /// The record as a row in [`HEADER`] order.
    pub fn to_row(&self) -> [String; 5] {
        [
            self.title.clone(),
            self.link.clone(),
            self.summary.clone(),
            self.published_date.clone(),
            self.source.clone(),
        ]
    }
}

/// Outcome of one pass over the source list.
#[derive(Debug, Default, Clone)]
pub struct RunResult {
    /// Matched records. Order across sources is not significant; order within
    /// a source follows the feed.
    pub records: Vec<NormalizedRecord>,
    /// Sources whose fetch was started.
    pub sources_attempted: usize,
    /// Sources that failed to fetch or parse.
    pub sources_failed: usize,
    /// Records removed by the opt-in `(title, link)` dedup.
    pub duplicates_removed: usize,
    /// The run was cut short by its deadline or by Ctrl-C.
    pub cancelled: bool,
}

/// Final summary of a run, including where the sinks wrote.
#[derive(Debug)]
pub struct RunReport {
    pub target_date: TargetDate,
    pub result: RunResult,
    /// Sheet the records were written to, if any.
    pub sheet: Option<String>,
    /// Path of the flat export, if any.
    pub export_path: Option<PathBuf>,
}

impl RunReport {
    pub fn record_count(&self) -> usize {
        self.result.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_target_date_parse_and_display() {
        let d: TargetDate = "2024-03-15".parse().unwrap();
        assert_eq!(d.to_string(), "2024-03-15");
        assert!(d.matches(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()));
        assert_eq!(d, TargetDate::yesterday_of(NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()));
    }

    #[test]
    fn test_target_date_rejects_day_first() {
        let err = "15-03-2024".parse::<TargetDate>().unwrap_err();
        assert!(matches!(err, Error::DateParse { ref input, .. } if input == "15-03-2024"));
    }

    #[test]
    fn test_yesterday_crosses_month_boundary() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(TargetDate::yesterday_of(today).to_string(), "2024-02-29");
    }

    #[test]
    fn test_utc_basis_uses_utc_day() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 15, 23, 30, 0).unwrap();
        assert_eq!(
            DateBasis::Utc.day_of(ts),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        assert_eq!(
            DateBasis::Local.day_of(ts),
            ts.with_timezone(&Local).date_naive()
        );
    }

    #[test]
    fn test_record_serializes_with_column_headers() {
        let record = NormalizedRecord {
            title: "T".into(),
            link: "L".into(),
            summary: "S".into(),
            published_date: "2024-03-15".into(),
            source: "Feed".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        for column in HEADER {
            assert!(json.get(column).is_some(), "missing column {column}");
        }
        assert_eq!(record.to_row()[3], "2024-03-15");
    }
}
