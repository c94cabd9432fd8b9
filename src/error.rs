//! Error taxonomy for the feed digest.
//!
//! Most of these errors are recovered where they happen: a broken source list
//! becomes an empty list, a malformed date becomes "yesterday", and a failed
//! fetch or parse removes one source from the run. Only configuration errors
//! raised at start-up and [`Error::SinkWrite`] make the process exit non-zero.

use std::path::PathBuf;
use thiserror::Error;

/// Every failure the digest can produce.
#[derive(Debug, Error)]
pub enum Error {
    /// The line-delimited source list could not be read.
    #[error("cannot read source list {}: {source}", path.display())]
    SourceListLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A date candidate was not `YYYY-MM-DD`.
    #[error("invalid date '{input}', expected YYYY-MM-DD: {source}")]
    DateParse {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Network failure, DNS failure or timeout while talking to one source.
    #[error("request to {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The source answered, but not with a 2xx status.
    #[error("{url} answered with HTTP {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The body exceeded the fetcher's byte cap.
    #[error("{url} sent more than {limit} bytes")]
    BodyTooLarge { url: String, limit: usize },

    /// The payload was not a feed `feed-rs` understands.
    #[error("cannot parse feed from {url}: {source}")]
    FeedParse {
        url: String,
        #[source]
        source: feed_rs::parser::ParseFeedError,
    },

    /// A sink failed to persist the run's records.
    #[error("failed writing {target}: {source}")]
    SinkWrite {
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("cannot read config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("cannot build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("invalid setting `{key}`: {reason}")]
    InvalidSetting { key: &'static str, reason: String },
}

impl Error {
    /// Wrap any error raised while persisting `target` as a [`Error::SinkWrite`].
    pub fn sink<E>(target: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::SinkWrite {
            target: target.into(),
            source: source.into(),
        }
    }

    /// `true` for errors that only remove a single source from the run.
    pub fn is_source_scoped(&self) -> bool {
        matches!(
            self,
            Error::Fetch { .. }
                | Error::HttpStatus { .. }
                | Error::BodyTooLarge { .. }
                | Error::FeedParse { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_error_keeps_target_in_message() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = Error::sink("output/book/book_2024-03-15.json", io);
        let msg = err.to_string();
        assert!(msg.contains("output/book/book_2024-03-15.json"));
        assert!(msg.contains("read-only"));
        assert!(!err.is_source_scoped());
    }

    #[test]
    fn test_http_status_is_source_scoped() {
        let err = Error::HttpStatus {
            url: "https://example.com/rss".into(),
            status: reqwest::StatusCode::NOT_FOUND,
        };
        assert!(err.is_source_scoped());
        assert!(err.to_string().contains("404"));
    }
}
