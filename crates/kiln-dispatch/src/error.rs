//! Error types for registration and dispatch.

use thiserror::Error;

/// Errors raised while populating the command registry.
///
/// Registration happens during process initialization; callers treat these
/// as fatal startup errors rather than recoverable conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A command's name collides with an already registered name or alias.
    #[error("command '{name}' is already registered")]
    DuplicateName {
        /// The colliding name.
        name: String,
    },

    /// A command's alias collides with an already registered name or alias.
    #[error("alias '{alias}' of command '{command}' is already registered")]
    DuplicateAlias {
        /// The command whose alias collided.
        command: String,
        /// The colliding alias.
        alias: String,
    },
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
