//! # Awful Feed Digest
//!
//! Collects one day's worth of items from a long list of RSS, Atom and JSON
//! feeds, normalizes them into a single record shape, and writes them to a
//! dated sheet of a workbook plus a flat CSV export.
//!
//! ## Features
//!
//! - Hundreds of sources fetched through a bounded pool of concurrent requests
//! - Per-source failure isolation: an unreachable or broken feed is logged
//!   and skipped, never fatal
//! - One timestamp rule for every feed dialect (RSS `pubDate`, Atom
//!   `published`/`updated`, JSON Feed `date_published`)
//! - HTML summaries reduced to plain text and capped to the sheet's cell size
//! - A run-wide deadline and Ctrl-C both end the run with a partial result
//!
//! ## Usage
//!
//! ```sh
//! awful_feed_digest --feeds feeds.txt --output-dir ./output
//! ```
//!
//! ## Architecture
//!
//! 1. **Date**: resolve the single target day (override, `$DATE`, prompt, or yesterday)
//! 2. **Fetch**: download and parse every feed, `--concurrency` at a time
//! 3. **Filter**: keep entries published on the target day, build records
//! 4. **Output**: write the `{workbook}_{date}` sheet and the CSV export

use chrono::Local;
use clap::Parser;
use std::error::Error as StdError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, info_span, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod dates;
mod error;
mod feeds;
mod models;
mod outputs;
mod pipeline;
mod sources;
mod text;
mod utils;

use cli::Cli;
use config::Settings;
use dates::StdinPrompt;
use feeds::HttpFetcher;
use outputs::{CsvExport, LocalWorkbook};
use pipeline::{Pipeline, RunContext, Sinks};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn StdError>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let today = Local::now().date_naive();
    info!("feed digest starting up");

    // ---- Configuration ----
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");
    let settings = Settings::load(args.config.as_deref()).await?.apply_cli(&args);
    settings.validate()?;
    debug!(?settings, "Effective settings");

    // Fail before fetching anything if the results could not be written.
    if let Err(e) = ensure_writable_dir(&settings.output_dir).await {
        error!(
            path = %settings.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Collect and deliver ----
    let sources = sources::load_sources(&settings.feeds).await;
    let fetcher = HttpFetcher::new(&settings.user_agent, settings.request_timeout())?
        .with_max_body(settings.max_feed_bytes);
    let resolver = settings.date_resolver_from_env();
    let sinks = Sinks {
        tabular: LocalWorkbook::new(&settings.output_dir),
        exporter: CsvExport::new(&settings.output_dir),
    };
    let ctx = RunContext::new(info_span!("run", workbook = %settings.workbook));
    let pipeline = Pipeline::new(fetcher, settings.pipeline_options(), ctx);

    let report = pipeline
        .run(
            &resolver,
            today,
            &mut StdinPrompt,
            &sources,
            &sinks,
            cancel_signal(settings.deadline()),
        )
        .await;

    let report = match report {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Run failed to persist its results");
            return Err(e.into());
        }
    };

    println!("Date: {}", report.target_date);
    if report.record_count() == 0 {
        println!("No articles");
    }
    println!(
        "Done: {} records ({} of {} sources failed{})",
        report.record_count(),
        report.result.sources_failed,
        report.result.sources_attempted,
        if report.result.cancelled { ", cancelled" } else { "" }
    );

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        date = %report.target_date,
        records = report.record_count(),
        failed_sources = report.result.sources_failed,
        duplicates_removed = report.result.duplicates_removed,
        sheet = ?report.sheet,
        export = ?report.export_path,
        "Execution complete"
    );

    Ok(())
}

/// Resolves when the run should stop dispatching: at the deadline, if one is
/// configured, or on Ctrl-C.
fn cancel_signal(deadline: Option<Duration>) -> impl Future<Output = ()> {
    async move {
        let deadline = async {
            match deadline {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending::<()>().await,
            }
        };
        let interrupt = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                // Without a signal handler only the deadline can end the run.
                warn!(error = %e, "Cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };
        tokio::select! {
            _ = deadline => warn!("Run deadline reached"),
            _ = interrupt => warn!("Interrupted"),
        }
    }
}
