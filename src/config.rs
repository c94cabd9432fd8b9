//! Run configuration.
//!
//! [`Settings`] starts from built-in defaults, is overlaid by an optional
//! YAML file, and finally by whatever the command line (or its environment
//! variables) set explicitly.
//!
//! ```yaml
//! feeds: /data/feed_list.txt
//! auto_yesterday: false
//! concurrency: 24
//! timeout_secs: 15
//! max_feed_bytes: 8388608
//! deadline_secs: 600
//! date_basis: utc
//! workbook: rss_feed_parser
//! output_dir: /data/out
//! ```

use crate::cli::Cli;
use crate::dates::{DATE_ENV, DateResolver};
use crate::error::Error;
use crate::feeds::http::{DEFAULT_MAX_BODY, DEFAULT_USER_AGENT};
use crate::models::DateBasis;
use crate::pipeline::PipelineOptions;
use crate::text::MAX_CELL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Fully merged configuration for one run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub date: Option<String>,
    pub auto_yesterday: bool,
    pub interactive: bool,
    pub max_cell: usize,
    pub feeds: PathBuf,
    pub user_agent: String,
    pub concurrency: usize,
    pub timeout_secs: u64,
    /// Feed bodies above this size fail their source.
    pub max_feed_bytes: usize,
    pub deadline_secs: Option<u64>,
    /// Pause after each source when `concurrency` is 1.
    pub sequential_delay_ms: u64,
    pub dedup: bool,
    pub date_basis: DateBasis,
    pub workbook: String,
    pub output_dir: PathBuf,
    pub export_file: Option<String>,
    pub skip_export: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            date: None,
            auto_yesterday: true,
            interactive: true,
            max_cell: MAX_CELL,
            feeds: PathBuf::from("feeds.txt"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            concurrency: 16,
            timeout_secs: 20,
            max_feed_bytes: DEFAULT_MAX_BODY,
            deadline_secs: None,
            sequential_delay_ms: 200,
            dedup: false,
            date_basis: DateBasis::Local,
            workbook: "rss_feed_parser".to_string(),
            output_dir: PathBuf::from("output"),
            export_file: None,
            skip_export: false,
        }
    }
}

impl Settings {
    /// Parse settings from YAML text. Missing keys keep their defaults.
    pub fn from_yaml(path: &Path, text: &str) -> Result<Self, Error> {
        serde_yaml::from_str(text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults, overlaid by the YAML file at `path` if one is given.
    #[instrument(level = "info", skip_all)]
    pub async fn load(path: Option<&Path>) -> Result<Self, Error> {
        let Some(path) = path else {
            debug!("No config file given; using defaults");
            return Ok(Settings::default());
        };
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::ConfigRead {
                path: path.to_path_buf(),
                source,
            })?;
        let settings = Self::from_yaml(path, &text)?;
        info!(path = %path.display(), "Loaded config file");
        Ok(settings)
    }

    /// Overlay every option the command line set explicitly.
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if cli.date.is_some() {
            self.date = cli.date.clone();
        }
        if let Some(v) = cli.auto_yesterday {
            self.auto_yesterday = v;
        }
        if let Some(v) = cli.interactive {
            self.interactive = v;
        }
        if let Some(v) = cli.max_cell {
            self.max_cell = v;
        }
        if let Some(v) = &cli.feeds {
            self.feeds = v.clone();
        }
        if let Some(v) = &cli.user_agent {
            self.user_agent = v.clone();
        }
        if let Some(v) = cli.concurrency {
            self.concurrency = v;
        }
        if let Some(v) = cli.timeout_secs {
            self.timeout_secs = v;
        }
        if let Some(v) = cli.max_feed_bytes {
            self.max_feed_bytes = v;
        }
        if cli.deadline_secs.is_some() {
            self.deadline_secs = cli.deadline_secs;
        }
        if let Some(v) = cli.date_basis {
            self.date_basis = v;
        }
        if let Some(v) = &cli.workbook {
            self.workbook = v.clone();
        }
        if let Some(v) = &cli.output_dir {
            self.output_dir = v.clone();
        }
        if cli.export_file.is_some() {
            self.export_file = cli.export_file.clone();
        }
        if let Some(v) = cli.dedup {
            self.dedup = v;
        }
        if let Some(v) = cli.no_export {
            self.skip_export = v;
        }
        self
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |key, reason: &str| {
            Err(Error::InvalidSetting {
                key,
                reason: reason.to_string(),
            })
        };
        if self.concurrency == 0 {
            return invalid("concurrency", "must be at least 1");
        }
        if self.max_cell == 0 {
            return invalid("max_cell", "must be at least 1");
        }
        if self.timeout_secs == 0 {
            return invalid("timeout_secs", "must be at least 1");
        }
        if self.max_feed_bytes == 0 {
            return invalid("max_feed_bytes", "must be at least 1");
        }
        if self.workbook.trim().is_empty() {
            return invalid("workbook", "must not be empty");
        }
        if self.user_agent.trim().is_empty() {
            return invalid("user_agent", "must not be empty");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }

    /// The date resolver for this run; `env_value` is normally `$DATE`.
    pub fn date_resolver(&self, env_value: Option<String>) -> DateResolver {
        DateResolver {
            explicit: self.date.clone(),
            env_value,
            auto_yesterday: self.auto_yesterday,
            interactive: self.interactive,
        }
    }

    /// [`Self::date_resolver`] fed from the process environment.
    pub fn date_resolver_from_env(&self) -> DateResolver {
        self.date_resolver(std::env::var(DATE_ENV).ok())
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            concurrency: self.concurrency,
            sequential_delay: Duration::from_millis(self.sequential_delay_ms),
            max_cell: self.max_cell,
            date_basis: self.date_basis,
            dedup: self.dedup,
            workbook: self.workbook.clone(),
            export_file: self.export_file.clone(),
            skip_export: self.skip_export,
        }
    }
}
