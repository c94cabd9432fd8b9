//! Sinks for a run's records.
//!
//! # Submodules
//!
//! - [`workbook`]: the tabular store, one sheet per target date
//! - [`export`]: the flat CSV export
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── rss_feed_parser/                        # workbook
//! │   ├── rss_feed_parser_2024-03-14.json     # one sheet per date
//! │   └── rss_feed_parser_2024-03-15.json
//! └── rss_feed_2024-03-16_07-00-02.csv        # flat export
//! ```
//!
//! Both sinks receive records that are already fully normalized and write
//! them verbatim. Each write replaces its target file atomically, so a
//! failed run never leaves a half-written sheet for a date.

pub mod export;
pub mod workbook;

pub use export::{CsvExport, FlatExporter};
pub use workbook::{LocalWorkbook, TabularSink};
