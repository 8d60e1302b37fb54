//! Command definitions and the handler invocation contract.
//!
//! A [`Command`] is an immutable record created once at startup and held by
//! the registry for the life of the process. Handlers are plain async
//! closures conforming to one invocation signature; there is no handler
//! trait hierarchy, just structural conformance to [`HandlerFn`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

use crate::args::ArgSpec;
use crate::context::CommandContext;
use crate::error::BoxError;
use crate::permission::PermissionLevel;

/// The outward-facing outcome of a handler.
///
/// Unlike a `Result`, both arms carry a user-facing message: a handler can
/// report a *failed but explained* outcome ("No timer named X") without that
/// being a fault. Faults travel separately, as the `Err` arm of
/// [`HandlerResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Whether the command did what was asked.
    pub success: bool,
    /// The reply text shown to the user.
    pub message: String,
}

impl CommandOutcome {
    /// A successful outcome with the given reply text.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// An explained failure with the given reply text.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// What a handler invocation produces.
///
/// `Err` is the unexpected-fault channel; it is caught at a single boundary
/// in the pipeline and never reaches the transport verbatim.
pub type HandlerResult = Result<CommandOutcome, BoxError>;

/// The single invocation signature every handler conforms to.
pub type HandlerFn = Arc<dyn Fn(CommandContext) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// A gating function run after the policy gates and before parameter
/// parsing. An `Err` aborts the pipeline and its message is surfaced to the
/// user as the reply.
pub type PreHandlerFn =
    Arc<dyn for<'a> Fn(&'a CommandContext) -> BoxFuture<'a, Result<(), String>> + Send + Sync>;

/// Behavioral modifiers consumed by the pipeline after handler execution.
///
/// Flags shape how the reply is delivered; they never change the outcome's
/// success or text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandFlag {
    /// Deliver the reply as a direct reply to the invoking message.
    ReplyToInvoker,
}

/// An immutable command definition.
///
/// Built with [`Command::builder`], registered once, and never mutated
/// afterwards. Cheap to share: the registry hands out `Arc<Command>`.
pub struct Command {
    name: String,
    aliases: Vec<String>,
    description: String,
    long_description: Option<String>,
    permission: PermissionLevel,
    only_offline: bool,
    cooldown: Duration,
    params: Vec<ArgSpec>,
    flags: Vec<CommandFlag>,
    pre_handlers: Vec<PreHandlerFn>,
    code: HandlerFn,
}

impl Command {
    /// Starts building a command with the given name.
    ///
    /// ```rust,ignore
    /// let ping = Command::builder("ping")
    ///     .description("Replies with bot status.")
    ///     .cooldown(Duration::from_secs(20))
    ///     .flag(CommandFlag::ReplyToInvoker)
    ///     .handler(|_ctx| async move { Ok(CommandOutcome::ok("Pong!")) });
    /// ```
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            name: name.into(),
            aliases: Vec::new(),
            description: String::new(),
            long_description: None,
            permission: PermissionLevel::Viewer,
            only_offline: false,
            cooldown: Duration::ZERO,
            params: Vec::new(),
            flags: Vec::new(),
            pre_handlers: Vec::new(),
        }
    }

    /// The unique, case-sensitive command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alternate names resolving to this command.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// One-line documentation.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Extended documentation, if any.
    pub fn long_description(&self) -> Option<&str> {
        self.long_description.as_deref()
    }

    /// The minimum level required to invoke this command.
    pub fn permission(&self) -> PermissionLevel {
        self.permission
    }

    /// Whether the command is gated to offline scopes.
    pub fn only_offline(&self) -> bool {
        self.only_offline
    }

    /// Minimum spacing between invocations.
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// The flag schema handed to the argument parser.
    pub fn params(&self) -> &[ArgSpec] {
        &self.params
    }

    /// Behavioral modifiers applied after handler execution.
    pub fn flags(&self) -> &[CommandFlag] {
        &self.flags
    }

    /// Returns whether the given flag is set on this command.
    pub fn has_flag(&self, flag: CommandFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// The ordered gating functions run before parameter parsing.
    pub fn pre_handlers(&self) -> &[PreHandlerFn] {
        &self.pre_handlers
    }

    /// Invokes the handler with a fully built context.
    pub fn invoke(&self, ctx: CommandContext) -> BoxFuture<'static, HandlerResult> {
        (self.code)(ctx)
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("permission", &self.permission)
            .field("only_offline", &self.only_offline)
            .field("cooldown", &self.cooldown)
            .field("params", &self.params)
            .field("flags", &self.flags)
            .field("pre_handlers", &self.pre_handlers.len())
            .finish()
    }
}

/// Builder for [`Command`]; finalized by [`CommandBuilder::handler`].
pub struct CommandBuilder {
    name: String,
    aliases: Vec<String>,
    description: String,
    long_description: Option<String>,
    permission: PermissionLevel,
    only_offline: bool,
    cooldown: Duration,
    params: Vec<ArgSpec>,
    flags: Vec<CommandFlag>,
    pre_handlers: Vec<PreHandlerFn>,
}

impl CommandBuilder {
    /// Adds an alternate name for the command.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Sets the one-line documentation.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the extended documentation.
    pub fn long_description(mut self, text: impl Into<String>) -> Self {
        self.long_description = Some(text.into());
        self
    }

    /// Sets the minimum permission level (default: viewer).
    pub fn permission(mut self, level: PermissionLevel) -> Self {
        self.permission = level;
        self
    }

    /// Restricts the command to offline scopes.
    pub fn only_offline(mut self, only_offline: bool) -> Self {
        self.only_offline = only_offline;
        self
    }

    /// Sets the cooldown window (default: none).
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Declares a flag in the command's parameter schema.
    pub fn param(mut self, spec: ArgSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Adds a behavioral modifier.
    pub fn flag(mut self, flag: CommandFlag) -> Self {
        self.flags.push(flag);
        self
    }

    /// Appends a gating function; pre-handlers run in the order added.
    pub fn pre_handler<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a CommandContext) -> BoxFuture<'a, Result<(), String>>
            + Send
            + Sync
            + 'static,
    {
        self.pre_handlers.push(Arc::new(f));
        self
    }

    /// Sets the handler and finalizes the definition.
    pub fn handler<F, Fut>(self, f: F) -> Command
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Command {
            name: self.name,
            aliases: self.aliases,
            description: self.description,
            long_description: self.long_description,
            permission: self.permission,
            only_offline: self.only_offline,
            cooldown: self.cooldown,
            params: self.params,
            flags: self.flags,
            pre_handlers: self.pre_handlers,
            code: Arc::new(move |ctx| Box::pin(f(ctx))),
        }
    }
}
