//! # Kiln Core
//!
//! Foundation types for the kiln chat-command dispatch engine.
//!
//! This crate defines the vocabulary shared by every layer of kiln:
//!
//! - **Permission ladder**: the ordered [`PermissionLevel`] enum the
//!   pipeline's permission gate compares against.
//! - **Argument/flag parser**: [`parse_arguments`] turns whitespace tokens
//!   into positional input plus typed flag values, failing atomically on
//!   anything outside a command's declared schema.
//! - **Command definitions**: the immutable [`Command`] record (built via
//!   [`Command::builder`]) holding policy metadata, the flag schema,
//!   pre-handlers, and the handler closure.
//! - **Invocation context**: the per-message [`CommandContext`] carrying
//!   parsed input and injected service handles, replacing any ambient
//!   global state.
//!
//! Expected failures travel as `Result` values end to end; only the handler
//! fault channel ([`BoxError`]) is caught, once, in the dispatch pipeline.

pub mod args;
pub mod command;
pub mod context;
pub mod error;
pub mod permission;

pub use args::{ArgSpec, ArgType, ArgValue, ParsedArguments, parse_arguments};
pub use command::{
    Command, CommandBuilder, CommandFlag, CommandOutcome, HandlerFn, HandlerResult, PreHandlerFn,
};
pub use context::{ChatUser, CommandContext, Scope, ServiceMap};
pub use error::{BoxError, ParseArgumentsError, ParseResult};
pub use permission::PermissionLevel;

/// Re-export of the boxed future type used by handler signatures.
pub use futures::future::BoxFuture;

/// Prelude for common imports.
pub mod prelude {
    pub use super::args::{ArgSpec, ArgType, ArgValue, parse_arguments};
    pub use super::command::{Command, CommandFlag, CommandOutcome, HandlerResult};
    pub use super::context::{ChatUser, CommandContext, Scope};
    pub use super::permission::PermissionLevel;
}
