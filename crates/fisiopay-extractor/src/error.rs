//! Error types for the financial-field extractor

use thiserror::Error;

/// Errors that can occur during field extraction
///
/// "Label not found" is never an error - real invoices vary in layout, so
/// missing fields come back as `None` in the result instead.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Input text is empty or blank
    #[error("Input text is empty")]
    EmptyInput,

    /// Configuration error (bad rule table or label regex)
    #[error("Configuration error: {0}")]
    Config(String),
}
