//! Command-line interface definitions for Awful Feed Digest.
//!
//! Every option can come from a flag, most also from an environment
//! variable, and all of them from the YAML file given with `--config`.
//! Flags win over the file; the file wins over built-in defaults. See
//! [`crate::config::Settings`] for the merged view.

use crate::models::DateBasis;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Awful Feed Digest application.
///
/// # Examples
///
/// ```sh
/// # Yesterday's items from feeds.txt into ./output
/// awful_feed_digest
///
/// # A specific day, 32 concurrent fetches, give up after five minutes
/// awful_feed_digest --date 2024-03-15 --concurrency 32 --deadline-secs 300
///
/// # Everything from a config file, dedup on
/// awful_feed_digest -c digest.yaml --dedup
/// ```
#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Target date (YYYY-MM-DD); overrides every other date source
    #[arg(short, long, env = "FEED_DATE")]
    pub date: Option<String>,

    /// Always use yesterday unless --date is given (skips $DATE and the prompt)
    #[arg(long, env = "AUTO_YESTERDAY")]
    pub auto_yesterday: Option<bool>,

    /// Ask for a date on the terminal when one is attached
    #[arg(long)]
    pub interactive: Option<bool>,

    /// Line-delimited list of feed URLs
    #[arg(short, long, env = "FEED_LIST")]
    pub feeds: Option<PathBuf>,

    /// User-Agent header sent with every fetch
    #[arg(long, env = "FEED_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Maximum fetches in flight (1 = sequential with a short pause between sources)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Largest feed body accepted, in bytes
    #[arg(long)]
    pub max_feed_bytes: Option<usize>,

    /// Stop dispatching new fetches after this many seconds and keep what was collected
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    /// Maximum summary length in characters
    #[arg(long, env = "MAX_CELL")]
    pub max_cell: Option<usize>,

    /// Drop repeated items by (title, link) across sources (`--dedup false` to turn off)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub dedup: Option<bool>,

    /// Clock used to turn feed timestamps into calendar days
    #[arg(long, value_enum)]
    pub date_basis: Option<DateBasis>,

    /// Workbook name; sheets are named {workbook}_{date}
    #[arg(short, long)]
    pub workbook: Option<String>,

    /// Directory for the workbook and the CSV export
    #[arg(short, long, env = "FEED_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// CSV export filename (default: timestamped)
    #[arg(long)]
    pub export_file: Option<String>,

    /// Skip the CSV export (`--no-export false` to turn it back on)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub no_export: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "awful_feed_digest",
            "--date",
            "2024-03-15",
            "--auto-yesterday",
            "false",
            "--concurrency",
            "32",
            "--date-basis",
            "utc",
            "--dedup",
        ]);

        assert_eq!(cli.date.as_deref(), Some("2024-03-15"));
        assert_eq!(cli.auto_yesterday, Some(false));
        assert_eq!(cli.concurrency, Some(32));
        assert_eq!(cli.date_basis, Some(DateBasis::Utc));
        assert_eq!(cli.dedup, Some(true));
        assert_eq!(cli.no_export, None);
    }

    #[test]
    fn test_cli_switches_take_an_optional_value() {
        let cli = Cli::parse_from([
            "awful_feed_digest",
            "--dedup",
            "false",
            "--no-export",
            "--max-feed-bytes",
            "1024",
        ]);

        assert_eq!(cli.dedup, Some(false));
        assert_eq!(cli.no_export, Some(true));
        assert_eq!(cli.max_feed_bytes, Some(1024));
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "awful_feed_digest",
            "-f",
            "/tmp/feeds.txt",
            "-o",
            "/tmp/out",
            "-w",
            "book",
        ]);

        assert_eq!(cli.feeds, Some(PathBuf::from("/tmp/feeds.txt")));
        assert_eq!(cli.output_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(cli.workbook.as_deref(), Some("book"));
    }
}
