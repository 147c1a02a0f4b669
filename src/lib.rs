//! # Financial Statement Consolidator
//!
//! A library for merging heterogeneous financial documents (spreadsheets, CSV,
//! PDF, Word, text) into one consolidated, tiered set of statements, with
//! chronologically ordered period columns and spreadsheet export.
//!
//! ## Core Concepts
//!
//! - **Record**: one account row with a statement code, a hierarchy level and a
//!   map of period label to amount
//! - **Period Key**: the sort key derived from a free-form period label
//!   (`2024`, `2025.1Q`, `2025.3Q(Cum)`); undated labels sort last
//! - **Display Unit**: won, thousand, million or hundred million; rescaling
//!   never touches the loaded record set
//! - **Partition**: the rows of one statement, in source order, rendered as one
//!   table or worksheet
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_statement_consolidator::*;
//!
//! let raw = r#"[{"Statement": "IS", "Level": 1, "Account_Name": "매출액", "2024": 1500000000}]"#;
//! let view = consolidate_response(raw, DisplayUnit::HundredMillion, ReportLocale::Korean)?;
//! println!("{}", render_text(&view));
//! export_to_path(&view, std::path::Path::new(&default_file_name(&view)))?;
//! ```

pub mod columns;
pub mod config;
pub mod error;
pub mod export;
pub mod extraction;
pub mod locale;
pub mod partition;
pub mod payload;
pub mod period;
pub mod render;
pub mod report;
pub mod scaling;
pub mod schema;
pub mod session;

#[cfg(feature = "gemini")]
pub mod llm;

pub use columns::{sequence_columns, sequence_periods};
pub use config::ConsolidatorConfig;
pub use error::{ConsolidatorError, Result};
pub use export::{default_file_name, export_to_buffer, export_to_path};
pub use extraction::{build_context, extract_document, DocumentKind, SourceDocument};
pub use locale::ReportLocale;
pub use partition::{partition_statements, StatementPartition};
pub use payload::parse_records;
pub use period::{compare_periods, PeriodKey};
pub use render::{format_amount, render_html, render_text, view_to_csv};
pub use report::{build_view, ReportView, RowStyle, StatementTable, TableRow};
pub use scaling::{drop_zero_rows, rescale, DisplayUnit};
pub use schema::*;
pub use session::{LoadedReport, RecordSource, ReportSession, SessionState};

use log::info;

/// Parses a raw record payload and lays it out at `unit`.
pub fn consolidate_response(
    raw: &str,
    unit: DisplayUnit,
    locale: ReportLocale,
) -> Result<ReportView> {
    let records = parse_records(raw)?;
    info!("Consolidating {} records", records.len());
    Ok(build_view(&records, unit, locale))
}

/// Extracts `documents`, fetches records from `source` and lays them out.
pub async fn consolidate_documents<S>(
    source: &S,
    documents: &[SourceDocument],
    config: &ConsolidatorConfig,
) -> Result<ReportView>
where
    S: RecordSource + ?Sized,
{
    let mut session = ReportSession::new(config);
    session.generate(source, documents).await?;
    session.require_view()
}
