//! HTTP feed fetcher.
//!
//! One GET per source, with a fixed `User-Agent` and a per-request timeout,
//! followed by a `feed-rs` parse of the body. RSS 0.9x/1.0/2.0, Atom and
//! JSON Feed are all handled by the parser; character encodings declared in
//! the XML prolog are honoured by it too. Bodies larger than the fetcher's
//! byte cap are rejected before they are parsed.

use super::{FeedFetcher, ParsedFeed};
use crate::error::Error;
use crate::utils::source_tag;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Client identity sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "MyRSSReader/1.0";

/// Largest feed body accepted when none is configured (16 MiB).
pub const DEFAULT_MAX_BODY: usize = 16 * 1024 * 1024;

/// Fetches and parses feeds over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_body: usize,
}

impl HttpFetcher {
    /// Build a fetcher that identifies as `user_agent` and gives up on any
    /// single request after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClientBuild`] if the TLS backend cannot be initialised.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(Error::ClientBuild)?;
        Ok(HttpFetcher {
            client,
            max_body: DEFAULT_MAX_BODY,
        })
    }

    /// Reject feed bodies longer than `bytes`.
    pub fn with_max_body(mut self, bytes: usize) -> Self {
        self.max_body = bytes;
        self
    }
}

impl FeedFetcher for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url, host = %source_tag(url)))]
    async fn fetch(&self, url: &str) -> Result<ParsedFeed, Error> {
        let t0 = Instant::now();
        let fetch_err = |source| Error::Fetch {
            url: url.to_string(),
            source,
        };

        let too_large = || Error::BodyTooLarge {
            url: url.to_string(),
            limit: self.max_body,
        };

        let mut response = self.client.get(url).send().await.map_err(fetch_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        if response
            .content_length()
            .is_some_and(|n| n > self.max_body as u64)
        {
            return Err(too_large());
        }
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(fetch_err)? {
            if body.len() + chunk.len() > self.max_body {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        let feed = feed_rs::parser::parse(body.as_slice()).map_err(|source| Error::FeedParse {
            url: url.to_string(),
            source,
        })?;

        let parsed = ParsedFeed::from(feed);
        debug!(
            bytes = body.len(),
            entries = parsed.entries.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched feed"
        );
        Ok(parsed)
    }
}
