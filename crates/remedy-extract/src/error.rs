use crate::record::KeyField;
use thiserror::Error;

/// A single field could not be extracted.
///
/// Carried into the record's issue list; the record itself still completes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("could not extract {field}: {reason}")]
pub struct ExtractionFieldError {
    pub field: KeyField,
    pub reason: String,
}

impl ExtractionFieldError {
    pub fn new(field: KeyField, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}
