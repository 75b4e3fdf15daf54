use thiserror::Error;

/// zaptec-reporter error types
#[derive(Error, Debug)]
pub enum ReporterError {
    /// Date expression could not be resolved to any calendar date
    #[error("invalid date: {0:?} is not a valid date")]
    InvalidDate(String),

    /// Token endpoint rejected the credentials
    #[error("authorization failed ({status}): {body}")]
    Auth { status: u16, body: String },

    /// Any other non-2xx API response
    #[error("api error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Transport-level HTTP failure (connect, timeout, decode)
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// API payload did not have the expected shape
    #[error("parse error: {0}")]
    Parse(String),

    /// Aggregation was asked to merge zero installation reports
    #[error("no installation reports to aggregate")]
    EmptyReportSet,

    /// Email configuration is malformed or invalid
    #[error("config error: {0}")]
    ConfigValidation(String),

    /// Template failed to parse or evaluate
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Spreadsheet serialization failed
    #[error("render error: {0}")]
    Render(#[from] rust_xlsxwriter::XlsxError),

    /// Mail transport failed
    #[error("delivery error: {0}")]
    Delivery(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for zaptec-reporter
pub type Result<T> = std::result::Result<T, ReporterError>;
