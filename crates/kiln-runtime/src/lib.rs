//! # Kiln Runtime
//!
//! Runtime orchestration for the kiln chat-command dispatch engine:
//!
//! - **Configuration**: figment-layered [`KilnConfig`] (defaults, TOML
//!   file, `KILN_` environment overrides).
//! - **Logging**: `tracing-subscriber` setup via [`LoggingBuilder`] or
//!   [`logging::init_from_config`].
//! - **Serve loop**: [`KilnRuntime`] pulls [`IncomingMessage`]s off a
//!   channel, dispatches each on its own task, and delivers replies
//!   through a [`ChatTransport`].
//!
//! The runtime owns no chat-network code; a transport implementation
//! adapts whatever client library the bot uses.

pub mod config;
pub mod logging;
pub mod runtime;

pub use config::{
    ConfigError, ConfigLoader, ConfigResult, KilnConfig, LogFormat, LogLevel, LoggingConfig,
};
pub use logging::LoggingBuilder;
pub use runtime::{ChatTransport, IncomingMessage, KilnRuntime};
