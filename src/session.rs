//! Report session: the loaded record set plus the current display settings.
//!
//! ```text
//! Empty --(generate / load)--> Loaded --(set_unit)--> Loaded
//!   ^                             |
//!   +-------(reset)---------------+
//! ```
//!
//! A failed generation keeps whatever was loaded before and records the
//! failure message.

use crate::config::ConsolidatorConfig;
use crate::error::{ConsolidatorError, Result};
use crate::export::{default_file_name, export_to_buffer};
use crate::extraction::{build_context, SourceDocument};
use crate::locale::ReportLocale;
use crate::payload::parse_records;
use crate::report::{build_view, ReportView};
use crate::scaling::DisplayUnit;
use crate::schema::Record;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use log::{debug, info, warn};

/// Anything that turns flattened document text into a raw record payload.
pub trait RecordSource {
    fn fetch<'a>(&'a self, context: &'a str) -> BoxFuture<'a, Result<String>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedReport {
    pub records: Vec<Record>,
    /// Response text the records were parsed from, if any.
    pub raw_response: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Empty,
    Loaded(LoadedReport),
}

#[derive(Debug, Clone)]
pub struct ReportSession {
    state: SessionState,
    unit: DisplayUnit,
    locale: ReportLocale,
    max_context_chars: usize,
    last_error: Option<String>,
}

impl ReportSession {
    pub fn new(config: &ConsolidatorConfig) -> Self {
        Self::with_settings(config.default_unit, config.locale, config.max_context_chars)
    }

    pub fn with_settings(unit: DisplayUnit, locale: ReportLocale, max_context_chars: usize) -> Self {
        Self {
            state: SessionState::Empty,
            unit,
            locale,
            max_context_chars,
            last_error: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, SessionState::Loaded(_))
    }

    pub fn records(&self) -> Option<&[Record]> {
        match &self.state {
            SessionState::Loaded(report) => Some(&report.records),
            SessionState::Empty => None,
        }
    }

    pub fn raw_response(&self) -> Option<&str> {
        match &self.state {
            SessionState::Loaded(report) => report.raw_response.as_deref(),
            SessionState::Empty => None,
        }
    }

    pub fn unit(&self) -> DisplayUnit {
        self.unit
    }

    pub fn locale(&self) -> ReportLocale {
        self.locale
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Replaces the record set directly.
    pub fn load(&mut self, records: Vec<Record>, raw_response: Option<String>) {
        info!("Session loaded with {} records", records.len());
        self.state = SessionState::Loaded(LoadedReport {
            records,
            raw_response,
            loaded_at: Utc::now(),
        });
        self.last_error = None;
    }

    /// Parses a raw response and loads it. On failure the current state is kept.
    pub fn load_response(&mut self, raw: &str) -> Result<usize> {
        match parse_records(raw) {
            Ok(records) => {
                let count = records.len();
                self.load(records, Some(raw.to_string()));
                Ok(count)
            }
            Err(e) => {
                self.record_failure(&e);
                Err(e)
            }
        }
    }

    /// Extracts `documents`, asks `source` for records and loads them.
    pub async fn generate<S>(&mut self, source: &S, documents: &[SourceDocument]) -> Result<usize>
    where
        S: RecordSource + ?Sized,
    {
        let context = build_context(documents, self.max_context_chars);
        debug!(
            "Generating from {} documents ({} chars of context)",
            documents.len(),
            context.chars().count()
        );

        let raw = match source.fetch(&context).await {
            Ok(raw) => raw,
            Err(e) => {
                self.record_failure(&e);
                return Err(e);
            }
        };

        self.load_response(&raw)
    }

    /// Changes the display unit. The record set is untouched.
    pub fn set_unit(&mut self, unit: DisplayUnit) {
        debug!("Display unit changed {:?} -> {:?}", self.unit, unit);
        self.unit = unit;
    }

    pub fn set_locale(&mut self, locale: ReportLocale) {
        self.locale = locale;
    }

    /// View at the current unit, or `None` while empty.
    pub fn view(&self) -> Option<ReportView> {
        self.records()
            .map(|records| build_view(records, self.unit, self.locale))
    }

    pub fn require_view(&self) -> Result<ReportView> {
        self.view().ok_or(ConsolidatorError::NoReport)
    }

    /// Workbook bytes and the suggested file name.
    pub fn export_xlsx(&self) -> Result<(String, Vec<u8>)> {
        let view = self.require_view()?;
        let bytes = export_to_buffer(&view)?;
        Ok((default_file_name(&view), bytes))
    }

    pub fn reset(&mut self) {
        info!("Session reset");
        self.state = SessionState::Empty;
        self.last_error = None;
    }

    fn record_failure(&mut self, error: &ConsolidatorError) {
        warn!("Generation failed: {}", error);
        self.last_error = Some(match error.raw_response() {
            Some(raw) => format!("{}\n--- raw response ---\n{}", error, raw),
            None => error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::HierarchyLevel;
    use std::sync::Mutex;

    struct StubSource {
        responses: Mutex<Vec<Result<String>>>,
        seen: Mutex<Vec<String>>,
    }

    impl StubSource {
        fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl RecordSource for StubSource {
        fn fetch<'a>(&'a self, context: &'a str) -> BoxFuture<'a, Result<String>> {
            self.seen.lock().unwrap().push(context.to_string());
            let next = self.responses.lock().unwrap().remove(0);
            Box::pin(async move { next })
        }
    }

    const PAYLOAD: &str = r#"```json
[
  {"Statement": "IS", "Level": 1, "Account_Name": "Revenue", "2023": 1000000, "2024": 2000000},
  {"Statement": "IS", "Level": 3, "Account_Name": "Misc", "2023": 0, "2024": 0}
]
```"#;

    fn session() -> ReportSession {
        ReportSession::with_settings(DisplayUnit::Won, ReportLocale::English, 1_000)
    }

    #[tokio::test]
    async fn test_generate_loads_records() {
        let source = StubSource::new(vec![Ok(PAYLOAD.to_string())]);
        let docs = vec![SourceDocument::new("notes.txt", "Revenue 1,000,000")];
        let mut session = session();

        let count = session.generate(&source, &docs).await.unwrap();
        assert_eq!(count, 2);
        assert!(session.is_loaded());
        assert_eq!(session.raw_response(), Some(PAYLOAD));
        assert!(source.seen.lock().unwrap()[0].contains("Revenue 1,000,000"));

        let view = session.view().unwrap();
        assert_eq!(view.row_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_generation_keeps_prior_state() {
        let source = StubSource::new(vec![
            Ok(PAYLOAD.to_string()),
            Err(ConsolidatorError::ExternalSource("quota exceeded".to_string())),
            Ok("I could not find any tables.".to_string()),
        ]);
        let mut session = session();
        session.generate(&source, &[]).await.unwrap();
        let before = session.state().clone();

        let err = session.generate(&source, &[]).await.unwrap_err();
        assert!(!err.is_parse_failure());
        assert_eq!(session.state(), &before);
        assert!(session.last_error().unwrap().contains("quota exceeded"));

        let err = session.generate(&source, &[]).await.unwrap_err();
        assert!(err.is_parse_failure());
        assert_eq!(session.state(), &before);
        assert!(session
            .last_error()
            .unwrap()
            .contains("I could not find any tables."));
    }

    #[test]
    fn test_unit_change_rerenders_without_touching_records() {
        let mut session = session();
        session.load(
            vec![Record::new("BS", HierarchyLevel::Detail, "Cash").with_value("2024", 150_000_000.0)],
            None,
        );

        session.set_unit(DisplayUnit::HundredMillion);
        let view = session.view().unwrap();
        assert_eq!(view.tables[0].rows[0].values, vec![1.5]);
        assert_eq!(session.records().unwrap()[0].value("2024"), 150_000_000.0);

        session.set_unit(DisplayUnit::Won);
        assert_eq!(session.view().unwrap().tables[0].rows[0].values, vec![150_000_000.0]);
    }

    #[test]
    fn test_empty_session_has_no_report() {
        let mut session = session();
        assert!(session.view().is_none());
        assert!(matches!(session.export_xlsx(), Err(ConsolidatorError::NoReport)));

        session.load_response(PAYLOAD).unwrap();
        let (name, bytes) = session.export_xlsx().unwrap();
        assert_eq!(name, "Financial_Report_KRW.xlsx");
        assert!(!bytes.is_empty());

        session.reset();
        assert_eq!(session.state(), &SessionState::Empty);
        assert!(session.last_error().is_none());
    }
}
