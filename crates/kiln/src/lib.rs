//! # Kiln
//!
//! A chat-command dispatch engine for chat-driven bots.
//!
//! Kiln turns a raw line of user text into a validated, permissioned,
//! rate-limited invocation of a registered handler, and converts the
//! handler's outcome into a user-facing reply.
//!
//! ## Layers
//!
//! - [`kiln_core`]: permission ladder, argument/flag parser, command
//!   definitions, invocation context.
//! - [`kiln_dispatch`]: command registry, cooldown tracking, the
//!   policy-gated execution pipeline.
//! - [`kiln_runtime`]: configuration, logging, and the serve loop that
//!   connects a message source to a transport.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kiln::prelude::*;
//! use kiln::{CommandRegistry, Dispatcher, KilnConfig, KilnRuntime};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = KilnConfig::load()?;
//!     kiln::logging::init_from_config(&config.logging);
//!
//!     let mut registry = CommandRegistry::new();
//!     registry.register(
//!         Command::builder("ping")
//!             .description("Replies with pong.")
//!             .handler(|_ctx| async { Ok(CommandOutcome::ok("Pong!")) }),
//!     )?;
//!
//!     let dispatcher = config.apply(Dispatcher::builder(registry)).build();
//!     let runtime = KilnRuntime::new(dispatcher, my_transport);
//!     runtime.run(my_message_channel).await;
//!     Ok(())
//! }
//! ```

pub use kiln_core::{
    ArgSpec, ArgType, ArgValue, BoxError, BoxFuture, ChatUser, Command, CommandBuilder,
    CommandContext, CommandFlag, CommandOutcome, HandlerFn, HandlerResult, ParseArgumentsError,
    ParseResult, ParsedArguments, PermissionLevel, PreHandlerFn, Scope, ServiceMap,
    parse_arguments,
};

pub use kiln_dispatch::{
    AlwaysOffline, CommandRegistry, CooldownTracker, Dispatcher, DispatcherBuilder, FixedLevel,
    LivenessProbe, PermissionResolver, RegistryError, RegistryResult, Reply,
};

pub use kiln_runtime::{
    ChatTransport, ConfigError, ConfigLoader, ConfigResult, IncomingMessage, KilnConfig,
    KilnRuntime, LogFormat, LogLevel, LoggingBuilder, LoggingConfig,
};

/// Re-export of the logging setup module.
pub use kiln_runtime::logging;

/// Prelude for common imports.
pub mod prelude {
    pub use kiln_core::prelude::*;
    pub use kiln_dispatch::{CommandRegistry, Dispatcher, Reply};
    pub use kiln_runtime::{ChatTransport, IncomingMessage, KilnRuntime};
}
