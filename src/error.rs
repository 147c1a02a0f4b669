use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsolidatorError {
    #[error("Error reading {document}: {reason}")]
    Extraction { document: String, reason: String },

    #[error("Unsupported document type: {0}")]
    UnsupportedDocument(String),

    #[error("External record source failed: {0}")]
    ExternalSource(String),

    /// The response could not be turned into a record array. `raw` keeps the
    /// untouched response text for manual recovery.
    #[error("Could not parse record payload: {message}")]
    Parse { message: String, raw: String },

    #[error("Record #{index} is invalid: {details}")]
    InvalidRecord { index: usize, details: String },

    #[error("Invalid display unit '{value}': expected one of {expected}")]
    InvalidUnit { value: String, expected: String },

    #[error("Invalid locale '{0}': expected korean or english")]
    InvalidLocale(String),

    #[error("No report is loaded in this session")]
    NoReport,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Spreadsheet export error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("Workbook read error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ConsolidatorError {
    /// True for data-format failures, as opposed to transport or I/O failures.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            ConsolidatorError::Parse { .. } | ConsolidatorError::InvalidRecord { .. }
        )
    }

    /// Raw response text attached to a parse failure.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            ConsolidatorError::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsolidatorError>;
