//! Tabular store: a workbook of dated sheets.
//!
//! Each run writes one sheet named `{workbook}_{YYYY-MM-DD}`. An existing
//! sheet for the same date is reused and its rows replaced; otherwise the
//! sheet is created. [`LocalWorkbook`] keeps a workbook as a directory and a
//! sheet as a JSON document with a header row and data rows.

use crate::error::Error;
use crate::models::{HEADER, NormalizedRecord, TargetDate};
use crate::utils::write_atomically;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// A store that accepts a target date's records.
pub trait TabularSink {
    /// Write `records` to the sheet for `date` in `workbook`, replacing any
    /// rows already there. Returns the sheet name.
    async fn write_records(
        &self,
        workbook: &str,
        date: &TargetDate,
        records: &[NormalizedRecord],
    ) -> Result<String, Error>;
}

/// Sheet name for a target date.
pub fn sheet_name(workbook: &str, date: &TargetDate) -> String {
    format!("{workbook}_{date}")
}

/// On-disk sheet document.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Sheet {
    pub title: String,
    pub header: Vec<String>,
    pub rows: Vec<[String; 5]>,
}

/// Workbooks stored as directories under `root`.
#[derive(Debug, Clone)]
pub struct LocalWorkbook {
    root: PathBuf,
}

impl LocalWorkbook {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalWorkbook { root: root.into() }
    }

    pub fn workbook_dir(&self, workbook: &str) -> PathBuf {
        self.root.join(workbook)
    }

    pub fn sheet_path(&self, workbook: &str, date: &TargetDate) -> PathBuf {
        self.workbook_dir(workbook)
            .join(format!("{}.json", sheet_name(workbook, date)))
    }

    async fn ensure_workbook(&self, workbook: &str) -> Result<PathBuf, Error> {
        let dir = self.workbook_dir(workbook);
        if !is_dir(&dir).await {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| Error::sink(dir.display().to_string(), e))?;
            info!(workbook, path = %dir.display(), "Created workbook");
        }
        Ok(dir)
    }
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

impl TabularSink for LocalWorkbook {
    #[instrument(level = "info", skip_all, fields(%workbook, %date, rows = records.len()))]
    async fn write_records(
        &self,
        workbook: &str,
        date: &TargetDate,
        records: &[NormalizedRecord],
    ) -> Result<String, Error> {
        self.ensure_workbook(workbook).await?;

        let title = sheet_name(workbook, date);
        let path = self.sheet_path(workbook, date);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            info!(sheet = %title, "Using existing sheet");
        } else {
            info!(sheet = %title, "Created sheet");
        }

        let sheet = Sheet {
            title: title.clone(),
            header: HEADER.iter().map(|h| h.to_string()).collect(),
            rows: records.iter().map(NormalizedRecord::to_row).collect(),
        };
        let target = path.display().to_string();
        let json = serde_json::to_vec_pretty(&sheet).map_err(|e| Error::sink(target.clone(), e))?;
        write_atomically(&path, &json)
            .await
            .map_err(|e| Error::sink(target, e))?;

        info!(sheet = %title, rows = sheet.rows.len(), "Wrote rows to sheet");
        Ok(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn read_sheet(book: &LocalWorkbook, workbook: &str, date: &TargetDate) -> Sheet {
        let bytes = tokio::fs::read(book.sheet_path(workbook, date)).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn record(title: &str) -> NormalizedRecord {
        NormalizedRecord {
            title: title.into(),
            link: format!("https://example.com/{title}"),
            summary: "summary".into(),
            published_date: "2024-03-15".into(),
            source: "Example".into(),
        }
    }

    #[tokio::test]
    async fn test_writes_dated_sheet_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let book = LocalWorkbook::new(dir.path());
        let date: TargetDate = "2024-03-15".parse().unwrap();

        let name = book
            .write_records("rss_feed_parser", &date, &[record("a"), record("b")])
            .await
            .unwrap();
        assert_eq!(name, "rss_feed_parser_2024-03-15");

        let sheet = read_sheet(&book, "rss_feed_parser", &date).await;
        assert_eq!(sheet.title, name);
        assert_eq!(sheet.header, HEADER);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[1][0], "b");
    }

    #[tokio::test]
    async fn test_rewrite_replaces_rows_and_keeps_other_dates() {
        let dir = tempfile::tempdir().unwrap();
        let book = LocalWorkbook::new(dir.path());
        let d14: TargetDate = "2024-03-14".parse().unwrap();
        let d15: TargetDate = "2024-03-15".parse().unwrap();

        book.write_records("wb", &d14, &[record("old")]).await.unwrap();
        book.write_records("wb", &d15, &[record("x"), record("y")]).await.unwrap();
        book.write_records("wb", &d15, &[record("z")]).await.unwrap();

        let s15 = read_sheet(&book, "wb", &d15).await;
        assert_eq!(s15.rows.len(), 1);
        assert_eq!(s15.rows[0][0], "z");
        let s14 = read_sheet(&book, "wb", &d14).await;
        assert_eq!(s14.rows[0][0], "old");
    }

    #[tokio::test]
    async fn test_unwritable_root_is_sink_error() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the workbook directory should go.
        let blocker = dir.path().join("wb");
        tokio::fs::write(&blocker, b"not a dir").await.unwrap();

        let book = LocalWorkbook::new(dir.path());
        let date: TargetDate = "2024-03-15".parse().unwrap();
        let err = book.write_records("wb", &date, &[record("a")]).await.unwrap_err();
        assert!(matches!(err, Error::SinkWrite { .. }));
    }
}
