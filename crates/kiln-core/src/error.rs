//! Error types for the kiln core crate.
//!
//! Everything below the handler boundary communicates failure through
//! `Result` values. The one exception is the handler invocation itself,
//! whose unexpected faults travel as a [`BoxError`] and are caught at a
//! single boundary in the dispatch pipeline.

use thiserror::Error;

/// A type-erased error for the handler fault channel.
///
/// Handlers report *expected* failures through
/// [`CommandOutcome`](crate::CommandOutcome) with `success: false`; a
/// `BoxError` coming out of a handler is an unexpected fault and is
/// converted into a generic failure reply by the pipeline.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced by [`parse_arguments`](crate::args::parse_arguments).
///
/// The `Display` text of every variant is user-caused and safe to surface
/// verbatim in a chat reply; it never carries internal state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseArgumentsError {
    /// A `--` token named a flag that is not declared in the schema.
    ///
    /// A bare `--` token is reported as an unknown flag with an empty name.
    #[error("Invalid argument: {0}")]
    UnknownFlag(String),

    /// A declared flag was used with a value it cannot carry.
    #[error("Invalid value for argument: {flag} (expected {expected})")]
    InvalidValue {
        /// The offending flag name.
        flag: String,
        /// Human-readable description of what the flag accepts.
        expected: &'static str,
    },
}

impl ParseArgumentsError {
    /// Returns the name of the flag that caused the failure.
    pub fn flag(&self) -> &str {
        match self {
            Self::UnknownFlag(name) => name,
            Self::InvalidValue { flag, .. } => flag,
        }
    }
}

/// Result type for argument parsing.
pub type ParseResult<T> = Result<T, ParseArgumentsError>;
