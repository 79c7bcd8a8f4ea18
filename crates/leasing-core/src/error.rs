use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeasingError {
    #[error("Invalid terms: {field}: {reason}")]
    InvalidTerms { field: String, reason: String },

    #[error("Invalid period: {period} is outside the schedule of {term} periods")]
    InvalidPeriod { period: u32, term: u32 },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl LeasingError {
    pub(crate) fn invalid_terms(field: &str, reason: impl Into<String>) -> Self {
        LeasingError::InvalidTerms {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for LeasingError {
    fn from(e: serde_json::Error) -> Self {
        LeasingError::SerializationError(e.to_string())
    }
}
