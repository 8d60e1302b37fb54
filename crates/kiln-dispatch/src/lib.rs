//! # Kiln Dispatch
//!
//! Command registry and execution pipeline for the kiln chat-command
//! dispatch engine.
//!
//! This crate turns a raw line of chat text into a validated, permissioned,
//! rate-limited handler invocation, and normalizes the handler's outcome
//! into a transport-facing [`Reply`]:
//!
//! ```text
//! raw text ──▶ tokenize ──▶ registry resolve ──▶ policy gates ──▶ parse ──▶ handler ──▶ Reply
//!                               │                (permission,
//!                               └─ miss: silent   liveness,
//!                                  or "unknown"   cooldown,
//!                                  reply          pre-handlers)
//! ```
//!
//! - [`CommandRegistry`]: name/alias lookup, populated once at startup,
//!   read-only afterwards.
//! - [`CooldownTracker`]: the pipeline's only mutable shared state, with an
//!   atomic check-and-set per (command, scope[, user]) key.
//! - [`Dispatcher`]: the pipeline itself, built over the registry plus the
//!   [`PermissionResolver`] and [`LivenessProbe`] collaborators.
//!
//! ## Example
//!
//! ```rust,ignore
//! use kiln_core::{Command, CommandOutcome};
//! use kiln_dispatch::{CommandRegistry, Dispatcher};
//!
//! let mut registry = CommandRegistry::new();
//! registry.register(
//!     Command::builder("ping")
//!         .description("Replies with pong.")
//!         .handler(|_ctx| async { Ok(CommandOutcome::ok("Pong!")) }),
//! )?;
//!
//! let dispatcher = Dispatcher::builder(registry).prefix("!").build();
//! let reply = dispatcher.dispatch("!ping", &user, &scope).await;
//! ```

pub mod cooldown;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod traits;

pub use cooldown::CooldownTracker;
pub use error::{RegistryError, RegistryResult};
pub use pipeline::{Dispatcher, DispatcherBuilder, Reply};
pub use registry::CommandRegistry;
pub use traits::{AlwaysOffline, FixedLevel, LivenessProbe, PermissionResolver};
