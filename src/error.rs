// In: src/error.rs

//! This module defines the single, unified error type for the variant query library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! The variants are grouped by how the query pipeline treats them: row-level
//! failures degrade a single output row to null, while setup failures abort the
//! whole evaluation before any row is touched.

use thiserror::Error;

use crate::types::VariantType;

/// A malformed path expression, annotated with the byte offset where scanning stopped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at position {position}")]
pub struct PathParseError {
    pub position: usize,
    pub message: String,
}

impl PathParseError {
    pub fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum VariantError {
    // =========================================================================
    // === Row-Level Errors (recoverable: the affected row becomes null)
    // =========================================================================
    #[error("Invalid path expression: {0}")]
    PathParse(#[from] PathParseError),

    #[error("Malformed variant data: {0}")]
    Decode(String),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Variant type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: VariantType,
    },

    #[error("Unsupported cast: {0}")]
    UnsupportedCast(String),

    // =========================================================================
    // === Setup Errors (fatal to the whole evaluation)
    // =========================================================================
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the Arrow library.
    #[error("Arrow operation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// An error from the Serde JSON library, typically while loading configuration.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// The logging backend could not be installed or its sink opened.
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl VariantError {
    /// Returns `true` for the documented per-row failure modes. Anything else
    /// is a setup fault or a defect and must not be folded into a null row.
    pub fn is_row_recoverable(&self) -> bool {
        matches!(
            self,
            VariantError::PathParse(_)
                | VariantError::Decode(_)
                | VariantError::NotFound(_)
                | VariantError::TypeMismatch { .. }
                | VariantError::UnsupportedCast(_)
        )
    }

    /// Returns `true` when the failure came from coercing a resolved value into
    /// the requested output type. Only these are surfaced under the strict policy.
    pub fn is_cast_failure(&self) -> bool {
        matches!(
            self,
            VariantError::TypeMismatch { .. } | VariantError::UnsupportedCast(_)
        )
    }

    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        VariantError::Decode(msg.into())
    }
}
