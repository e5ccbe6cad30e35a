use thiserror::Error;

/// Errors raised by the validating `run_*` entry points. The engine
/// functions themselves never fail; missing data degrades to zeros.
#[derive(Debug, Error)]
pub enum ProformaError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for ProformaError {
    fn from(e: serde_json::Error) -> Self {
        ProformaError::SerializationError(e.to_string())
    }
}
