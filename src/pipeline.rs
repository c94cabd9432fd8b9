//! The pipeline driver.
//!
//! A run moves through `Init -> ResolveDate -> FetchAll -> FilterAndBuild -> Done`
//! once, with no retries and no way back:
//!
//! 1. **ResolveDate**: pick the single [`TargetDate`] (see [`crate::dates`])
//! 2. **FetchAll**: fetch every source through a bounded pool of concurrent
//!    requests; each feed is filtered down to matching records as soon as it
//!    arrives, so raw entries never outlive their fetch
//! 3. **FilterAndBuild**: assemble the collected records (and dedup them,
//!    if asked to)
//! 4. **Done**: reached even with zero records
//!
//! The driver then hands a non-empty record set to the two sinks.
//!
//! # Failure isolation
//!
//! A source that times out, refuses the connection, answers with an error
//! status or serves something that is not a feed is logged, counted, and
//! skipped. Nothing a single source does can end the run early.
//!
//! # Cancellation
//!
//! [`Pipeline::collect`] takes a cancellation future (a deadline, Ctrl-C, or
//! both). Once it resolves no further sources are dispatched, fetches still
//! in flight are dropped, and the run proceeds to `Done` with whatever was
//! collected so far.

use crate::dates::{DatePrompt, DateResolver};
use crate::error::Error;
use crate::feeds::{EntryFilter, FeedFetcher, dedup_by_title_link};
use crate::models::{DateBasis, RunReport, RunResult, TargetDate};
use crate::outputs::{FlatExporter, TabularSink};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use std::cell::Cell;
use std::fmt;
use std::future::Future;
use std::pin::pin;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

/// Stages of a run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    ResolveDate,
    FetchAll,
    FilterAndBuild,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::ResolveDate => "resolve_date",
            Stage::FetchAll => "fetch_all",
            Stage::FilterAndBuild => "filter_and_build",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Logging context for one run.
///
/// Every event the pipeline emits, and every per-source span it opens, hangs
/// off `span`. The caller decides what that span is; tests use the
/// [`Default`] context, which is [`Span::none`].
#[derive(Debug, Clone)]
pub struct RunContext {
    pub span: Span,
}

impl RunContext {
    pub fn new(span: Span) -> Self {
        RunContext { span }
    }
}

impl Default for RunContext {
    /// A context whose events go nowhere in particular.
    fn default() -> Self {
        RunContext { span: Span::none() }
    }
}

/// Knobs for one run of the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Maximum fetches in flight.
    pub concurrency: usize,
    /// Pause after each source, applied only when `concurrency` is 1.
    pub sequential_delay: Duration,
    pub max_cell: usize,
    pub date_basis: DateBasis,
    pub dedup: bool,
    pub workbook: String,
    pub export_file: Option<String>,
    pub skip_export: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            concurrency: 16,
            sequential_delay: Duration::from_millis(200),
            max_cell: crate::text::MAX_CELL,
            date_basis: DateBasis::Local,
            dedup: false,
            workbook: "rss_feed_parser".to_string(),
            export_file: None,
            skip_export: false,
        }
    }
}

/// The two downstream collaborators.
#[derive(Debug)]
pub struct Sinks<T, E> {
    pub tabular: T,
    pub exporter: E,
}

/// Drives a run over a source list with a given fetcher.
#[derive(Debug)]
pub struct Pipeline<F> {
    fetcher: F,
    options: PipelineOptions,
    ctx: RunContext,
}

impl<F: FeedFetcher> Pipeline<F> {
    pub fn new(fetcher: F, options: PipelineOptions, ctx: RunContext) -> Self {
        Pipeline {
            fetcher,
            options,
            ctx,
        }
    }

    fn enter(&self, stage: Stage) {
        debug!(parent: &self.ctx.span, %stage, "Pipeline stage");
    }

    /// Resolve the date, collect, and deliver to the sinks.
    ///
    /// # Errors
    ///
    /// Only [`Error::SinkWrite`] is returned. Per-source failures and bad
    /// date input are recovered inside the run.
    pub async fn run<T, E, P, C>(
        &self,
        resolver: &DateResolver,
        today: NaiveDate,
        prompt: &mut P,
        sources: &[String],
        sinks: &Sinks<T, E>,
        cancel: C,
    ) -> Result<RunReport, Error>
    where
        T: TabularSink,
        E: FlatExporter,
        P: DatePrompt,
        C: Future<Output = ()>,
    {
        self.enter(Stage::Init);
        let t0 = Instant::now();

        self.enter(Stage::ResolveDate);
        let target = resolver.resolve(today, prompt);

        let result = self.collect(sources, target, cancel).await;
        info!(
            parent: &self.ctx.span,
            %target,
            records = result.records.len(),
            attempted = result.sources_attempted,
            failed = result.sources_failed,
            cancelled = result.cancelled,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Collection finished"
        );

        self.deliver(target, result, sinks).await
    }

    /// Fetch and filter every source for `target`.
    ///
    /// At most `concurrency` fetches are in flight at once. Records from one
    /// source keep the feed's order; sources interleave in completion order.
    pub async fn collect<C>(&self, sources: &[String], target: TargetDate, cancel: C) -> RunResult
    where
        C: Future<Output = ()>,
    {
        self.enter(Stage::FetchAll);
        let filter = EntryFilter::new(target, self.options.date_basis, self.options.max_cell);
        let limit = self.options.concurrency.max(1);
        let pause = if limit == 1 {
            self.options.sequential_delay
        } else {
            Duration::ZERO
        };
        info!(
            parent: &self.ctx.span,
            sources = sources.len(),
            concurrency = limit,
            %target,
            "Fetching feeds"
        );

        let cancel = pin!(cancel);
        let dispatched = Cell::new(0usize);
        let fetches = stream::iter(sources.iter().enumerate())
            .map(|(index, url)| {
                dispatched.set(dispatched.get() + 1);
                let span = info_span!(parent: &self.ctx.span, "source", index, %url);
                async move {
                    debug!("Fetching");
                    let outcome = self
                        .fetcher
                        .fetch(url)
                        .await
                        .map(|feed| filter.select(&feed));
                    if !pause.is_zero() {
                        sleep(pause).await;
                    }
                    (url, outcome)
                }
                .instrument(span)
            })
            .buffer_unordered(limit)
            .take_until(cancel);
        let mut fetches = pin!(fetches);

        let mut result = RunResult::default();
        while let Some((url, outcome)) = fetches.next().await {
            match outcome {
                Ok(records) => {
                    debug!(parent: &self.ctx.span, %url, matched = records.len(), "Source done");
                    result.records.extend(records);
                }
                Err(e) if e.is_source_scoped() => {
                    result.sources_failed += 1;
                    warn!(parent: &self.ctx.span, %url, error = %e, "Source failed; skipping");
                }
                Err(e) => {
                    result.sources_failed += 1;
                    error!(
                        parent: &self.ctx.span,
                        %url,
                        error = %e,
                        "Unexpected failure fetching source; skipping"
                    );
                }
            }
        }
        // Holds a value only if `cancel` fired; a stream that simply ran out
        // of sources leaves it empty.
        result.cancelled = fetches.as_mut().take_result().is_some();
        result.sources_attempted = dispatched.get();
        if result.cancelled {
            warn!(
                parent: &self.ctx.span,
                attempted = result.sources_attempted,
                remaining = sources.len() - result.sources_attempted,
                "Run cancelled; keeping records collected so far"
            );
        }

        self.enter(Stage::FilterAndBuild);
        if self.options.dedup {
            let (kept, removed) = dedup_by_title_link(std::mem::take(&mut result.records));
            result.records = kept;
            result.duplicates_removed = removed;
            debug!(parent: &self.ctx.span, removed, "Deduplicated by (title, link)");
        }
        info!(parent: &self.ctx.span, total = result.records.len(), "Total collected");

        self.enter(Stage::Done);
        result
    }

    /// Hand a finished run to the sinks.
    ///
    /// An empty record set is a normal outcome: nothing is written and the
    /// report says zero records. Both sinks are attempted even if the first
    /// one fails, and the first failure is returned.
    pub async fn deliver<T, E>(
        &self,
        target: TargetDate,
        result: RunResult,
        sinks: &Sinks<T, E>,
    ) -> Result<RunReport, Error>
    where
        T: TabularSink,
        E: FlatExporter,
    {
        let mut report = RunReport {
            target_date: target,
            result,
            sheet: None,
            export_path: None,
        };
        if report.result.records.is_empty() {
            info!(parent: &self.ctx.span, %target, "No articles; nothing to write");
            return Ok(report);
        }

        let records = &report.result.records;
        let sheet = sinks
            .tabular
            .write_records(&self.options.workbook, &target, records)
            .instrument(self.ctx.span.clone())
            .await;
        let export = if self.options.skip_export {
            Ok(None)
        } else {
            sinks
                .exporter
                .export_records(records, self.options.export_file.as_deref())
                .instrument(self.ctx.span.clone())
                .await
                .map(Some)
        };

        match (sheet, export) {
            (Ok(sheet), Ok(path)) => {
                report.sheet = Some(sheet);
                report.export_path = path;
                Ok(report)
            }
            (sheet, export) => {
                let mut first = None;
                for e in [sheet.err(), export.err()].into_iter().flatten() {
                    error!(parent: &self.ctx.span, error = %e, "Sink write failed");
                    first.get_or_insert(e);
                }
                Err(first.unwrap_or_else(|| Error::sink("sinks", "unknown sink failure")))
            }
        }
    }
}
