//! Loading the feed source list.
//!
//! The list is a plain text file with one feed URL per line. Blank lines are
//! skipped and surrounding whitespace is trimmed; the order and any repeats
//! are kept exactly as written.

use crate::error::Error;
use std::path::Path;
use tracing::{error, info, instrument};

/// Split line-delimited text into source URLs.
pub fn parse_sources(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read the source list at `path`.
///
/// # Errors
///
/// Returns [`Error::SourceListLoad`] if the file cannot be read.
pub async fn try_load_sources(path: &Path) -> Result<Vec<String>, Error> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| Error::SourceListLoad {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(parse_sources(&text))
}

/// Read the source list at `path`, degrading to an empty list on failure.
///
/// A missing or unreadable list is logged and the run continues with zero
/// sources, which ends in a clean zero-record result.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_sources(path: &Path) -> Vec<String> {
    match try_load_sources(path).await {
        Ok(feeds) => {
            info!(count = feeds.len(), "Loaded feed list");
            feeds
        }
        Err(e) => {
            error!(error = %e, "Can't read feed list; continuing with no sources");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sources_skips_blank_lines() {
        let text = "https://a.example/rss\n\n   \n  https://b.example/atom.xml  \r\nhttps://a.example/rss\n";
        assert_eq!(
            parse_sources(text),
            vec![
                "https://a.example/rss",
                "https://b.example/atom.xml",
                "https://a.example/rss",
            ]
        );
    }

    #[tokio::test]
    async fn test_load_sources_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feeds.txt");
        tokio::fs::write(&path, "https://one.example/feed\n\nhttps://two.example/feed\n")
            .await
            .unwrap();

        let feeds = load_sources(&path).await;
        assert_eq!(feeds.len(), 2);
        assert_eq!(feeds[1], "https://two.example/feed");
    }

    #[tokio::test]
    async fn test_missing_list_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.txt");

        assert!(load_sources(&path).await.is_empty());
        let err = try_load_sources(&path).await.unwrap_err();
        assert!(matches!(err, Error::SourceListLoad { .. }));
    }
}
