//! Configuration loading for kiln bots.
//!
//! Configuration is layered with figment, lowest to highest priority:
//!
//! 1. Built-in defaults
//! 2. `kiln.toml` (or a path given to [`ConfigLoader::file`])
//! 3. Environment variables prefixed `KILN_`, nested with `__`
//!    (`KILN_LOGGING__LEVEL=debug` → `logging.level = "debug"`)

use std::path::PathBuf;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use kiln_dispatch::DispatcherBuilder;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source failed to read or the merged data did not fit the schema.
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration for a kiln bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KilnConfig {
    /// The command prefix the dispatcher strips (default `!`).
    pub prefix: String,
    /// Reply to unknown command tokens instead of staying silent.
    pub reply_unknown: bool,
    /// Scope cooldowns per (command, scope, user) instead of
    /// (command, scope).
    pub per_user_cooldown: bool,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            reply_unknown: false,
            per_user_cooldown: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl KilnConfig {
    /// Loads configuration from the default sources.
    pub fn load() -> ConfigResult<Self> {
        ConfigLoader::new().load()
    }

    /// Applies the dispatcher-facing settings to a builder.
    pub fn apply(&self, builder: DispatcherBuilder) -> DispatcherBuilder {
        builder
            .prefix(self.prefix.clone())
            .reply_unknown(self.reply_unknown)
            .per_user_cooldown(self.per_user_cooldown)
    }
}

/// Logging section of [`KilnConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level to emit.
    pub level: LogLevel,
    /// Console output format.
    pub format: LogFormat,
}

/// Log level names accepted in config files and `KILN_LOGGING__LEVEL`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level (default).
    #[default]
    Info,
    /// Warn level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Converts to the corresponding `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

/// Console log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line compact output (default).
    #[default]
    Compact,
    /// Multi-line human-readable output.
    Pretty,
}

/// Figment-backed configuration loader.
///
/// ```rust,ignore
/// let config = ConfigLoader::new()
///     .file("./config/kiln.toml")
///     .load()?;
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
}

impl ConfigLoader {
    /// Creates a loader reading from the default sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the config file path (default `kiln.toml`; a missing file
    /// is not an error, the layer is simply skipped).
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Merges all sources and extracts a [`KilnConfig`].
    pub fn load(self) -> ConfigResult<KilnConfig> {
        let path = self.file.unwrap_or_else(|| PathBuf::from("kiln.toml"));
        debug!(path = %path.display(), "Loading configuration");

        let config = Figment::from(Serialized::defaults(KilnConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("KILN_").split("__"))
            .extract()?;
        Ok(config)
    }
}
