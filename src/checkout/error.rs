//! Error types for checkout submission.

use thiserror::Error;

use crate::store::StoreError;
use crate::validate::FieldErrors;

/// Why a submit attempt did not produce an order.
///
/// Every variant is recoverable: the form keeps what the customer typed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("form has errors: {0}")]
    Invalid(FieldErrors),

    #[error("order could not be placed: {0}")]
    Submission(#[from] StoreError),

    #[error("a submission is already in progress")]
    InProgress,

    #[error("order already submitted")]
    AlreadySubmitted,

    #[error("no submission in progress")]
    NotSubmitting,
}
