//! Error and warning types for the composition engine

use thiserror::Error;

/// Errors that can occur while reading or writing DOCX packages
#[derive(Error, Debug)]
pub enum DocxError {
    /// Error reading or writing the ZIP archive
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing XML content
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Required file not found in archive
    #[error("Required file not found: {0}")]
    MissingFile(String),

    /// Invalid document structure
    #[error("Invalid document structure: {0}")]
    InvalidStructure(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

/// Result type for composition operations
pub type Result<T> = std::result::Result<T, DocxError>;

/// Non-fatal degradations observed during one composition.
///
/// The engine never hard-fails on a malformed or evolved template; every
/// recoverable problem is recorded here so callers and tests can see what
/// was skipped instead of it being implicit in logs.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// A named template file does not exist; the fragment was skipped
    TemplateMissing(String),
    /// A labelled value cell could not be located; the field was not written
    LabelNotFound(String),
    /// No table with a pricing header row; population was skipped
    PricingTableNotFound,
    /// A summary row label was not found in the pricing table
    SummaryRowNotFound(&'static str),
    /// A quantity or price could not be parsed; zero was substituted
    MalformedNumeric { field: String, value: String },
    /// The external PDF converter failed; the DOCX was returned instead
    ConversionFailed(String),
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::TemplateMissing(path) => write!(f, "template missing: {path}"),
            Warning::LabelNotFound(label) => write!(f, "label not found: {label}"),
            Warning::PricingTableNotFound => write!(f, "pricing table not found"),
            Warning::SummaryRowNotFound(label) => write!(f, "summary row not found: {label}"),
            Warning::MalformedNumeric { field, value } => {
                write!(f, "malformed numeric in {field}: {value:?}")
            }
            Warning::ConversionFailed(reason) => write!(f, "pdf conversion failed: {reason}"),
        }
    }
}
