//! Error types for the record store.

use thiserror::Error;

use crate::model::RecordId;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{table}: row {id} not found")]
    NotFound { table: &'static str, id: RecordId },

    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether retrying the same request later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}
