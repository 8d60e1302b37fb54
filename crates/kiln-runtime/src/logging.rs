//! Logging setup over `tracing` and `tracing-subscriber`.
//!
//! # Configuration-based initialization
//!
//! ```rust,ignore
//! let config = KilnConfig::load()?;
//! logging::init_from_config(&config.logging);
//! ```
//!
//! # Manual initialization
//!
//! ```rust,ignore
//! LoggingBuilder::new()
//!     .level(tracing::Level::DEBUG)
//!     .directive("kiln_dispatch=trace")
//!     .init();
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogFormat, LoggingConfig};

/// Initializes logging from the config's logging section.
///
/// Safe to call when a subscriber is already installed; the call is then a
/// no-op.
pub fn init_from_config(config: &LoggingConfig) {
    LoggingBuilder::from_config(config).init();
}

/// A builder for the global tracing subscriber.
///
/// An explicit `RUST_LOG` environment variable always wins over the
/// configured level and directives.
#[derive(Debug, Default)]
pub struct LoggingBuilder {
    level: Option<tracing::Level>,
    directives: Vec<String>,
    format: LogFormat,
    with_target: bool,
}

impl LoggingBuilder {
    /// Creates a builder with info-level compact output.
    pub fn new() -> Self {
        Self {
            with_target: true,
            ..Default::default()
        }
    }

    /// Creates a builder mirroring a [`LoggingConfig`].
    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut builder = Self::new();
        builder.level = Some(config.level.to_tracing_level());
        builder.format = config.format;
        builder
    }

    /// Sets the default level.
    pub fn level(mut self, level: tracing::Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Adds a filter directive such as `kiln_dispatch=trace`.
    ///
    /// Directives that fail to parse are ignored.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Sets the output format.
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Shows or hides the event target (module path).
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Installs the subscriber, ignoring an already installed one.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Installs the subscriber, failing if one is already installed.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let default_level = self.level.unwrap_or(tracing::Level::INFO);
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));
        for directive in &self.directives {
            if let Ok(parsed) = directive.parse() {
                filter = filter.add_directive(parsed);
            }
        }

        let registry = tracing_subscriber::registry().with(filter);
        match self.format {
            LogFormat::Compact => registry
                .with(fmt::layer().compact().with_target(self.with_target))
                .try_init(),
            LogFormat::Pretty => registry
                .with(fmt::layer().pretty().with_target(self.with_target))
                .try_init(),
        }
    }
}
