//! Flat CSV export.
//!
//! Writes the header row and one row per record. When no filename is given
//! the file is named after the moment of export, not the moment of fetch:
//! `rss_feed_2024-03-16_07-00-02.csv`.

use crate::error::Error;
use crate::models::NormalizedRecord;
use crate::utils::write_atomically;
use chrono::Local;
use std::path::PathBuf;
use tracing::{info, instrument};

/// A sink that writes records to a single file.
pub trait FlatExporter {
    /// Export `records`, optionally to `filename`, and return the path written.
    async fn export_records(
        &self,
        records: &[NormalizedRecord],
        filename: Option<&str>,
    ) -> Result<PathBuf, Error>;
}

/// Timestamped default export name.
pub fn default_filename() -> String {
    format!("rss_feed_{}.csv", Local::now().format("%Y-%m-%d_%H-%M-%S"))
}

/// Render records as CSV with a header row.
pub fn to_csv(records: &[NormalizedRecord]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if records.is_empty() {
        writer.write_record(crate::models::HEADER)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// CSV files written into `dir`.
#[derive(Debug, Clone)]
pub struct CsvExport {
    dir: PathBuf,
}

impl CsvExport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CsvExport { dir: dir.into() }
    }
}

impl FlatExporter for CsvExport {
    #[instrument(level = "info", skip_all, fields(rows = records.len()))]
    async fn export_records(
        &self,
        records: &[NormalizedRecord],
        filename: Option<&str>,
    ) -> Result<PathBuf, Error> {
        let name = filename
            .filter(|f| !f.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(default_filename);
        let path = self.dir.join(name);
        let target = path.display().to_string();

        let bytes = to_csv(records).map_err(|e| Error::sink(target.clone(), e))?;
        write_atomically(&path, &bytes)
            .await
            .map_err(|e| Error::sink(target, e))?;

        info!(path = %path.display(), "CSV saved");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, summary: &str) -> NormalizedRecord {
        NormalizedRecord {
            title: title.into(),
            link: "https://example.com/x".into(),
            summary: summary.into(),
            published_date: "2024-03-15".into(),
            source: "Example".into(),
        }
    }

    #[test]
    fn test_csv_has_header_and_quotes_fields() {
        let bytes = to_csv(&[record("Hello, \"world\"", "line one\nline two")]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("Title,Link,Summary,Published Date,Source\n"));
        assert!(text.contains("\"Hello, \"\"world\"\"\""));
        assert!(text.contains("\"line one\nline two\""));
    }

    #[test]
    fn test_empty_export_still_has_header() {
        let text = String::from_utf8(to_csv(&[]).unwrap()).unwrap();
        assert_eq!(text, "Title,Link,Summary,Published Date,Source\n");
    }

    #[test]
    fn test_default_filename_shape() {
        let name = default_filename();
        assert!(name.starts_with("rss_feed_"));
        assert!(name.ends_with(".csv"));
        // rss_feed_ + YYYY-MM-DD_HH-MM-SS + .csv
        assert_eq!(name.len(), "rss_feed_".len() + 19 + ".csv".len());
    }

    #[tokio::test]
    async fn test_export_round_trips_through_csv_reader() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExport::new(dir.path());
        let records = vec![record("a", "first"), record("b", "second")];

        let path = exporter.export_records(&records, Some("out.csv")).await.unwrap();
        assert_eq!(path, dir.path().join("out.csv"));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let read: Vec<NormalizedRecord> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(read, records);
    }

    #[tokio::test]
    async fn test_export_uses_timestamped_name_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExport::new(dir.path());
        let path = exporter.export_records(&[record("a", "s")], None).await.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("rss_feed_"));
        assert!(path.exists());
    }
}
