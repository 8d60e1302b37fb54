//! The execution pipeline.
//!
//! [`Dispatcher::dispatch`] drives one raw chat line through a fixed gate
//! order: tokenize, resolve, permission, liveness, cooldown, pre-handlers,
//! parameter parse, handler, flag post-processing. The first failing gate
//! terminates the run; gates 3-5 fail closed with fixed denial replies and
//! nothing is ever retried.
//!
//! The handler call is the single fault boundary: a panicking or
//! `Err`-returning handler is logged with full context and converted into a
//! generic failure reply. Everything below that boundary communicates
//! failure through plain `Result` values.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{Instrument, Level, debug, error, span, warn};

use kiln_core::{
    ChatUser, Command, CommandContext, CommandFlag, CommandOutcome, Scope, ServiceMap,
    parse_arguments,
};

use crate::cooldown::CooldownTracker;
use crate::registry::CommandRegistry;
use crate::traits::{AlwaysOffline, FixedLevel, LivenessProbe, PermissionResolver};

/// Reply shown when a handler faults. Deliberately free of internal detail.
const FAULT_REPLY: &str = "Something went wrong while running that command.";

/// The transport-facing product of a dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Whether the command (or gate) reported success.
    pub success: bool,
    /// The text to deliver.
    pub text: String,
    /// Deliver as a direct reply to the invoking message
    /// ([`CommandFlag::ReplyToInvoker`]).
    pub reply_to_invoker: bool,
}

impl Reply {
    fn failure(text: impl Into<String>) -> Self {
        Self {
            success: false,
            text: text.into(),
            reply_to_invoker: false,
        }
    }
}

/// The policy gate that denied an invocation.
///
/// Denials are distinguishable in logs; their user-facing wording is fixed
/// per gate and intentionally carries no internal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Denial {
    Permission,
    Liveness,
    Cooldown,
}

impl Denial {
    fn as_str(self) -> &'static str {
        match self {
            Self::Permission => "permission",
            Self::Liveness => "liveness",
            Self::Cooldown => "cooldown",
        }
    }

    fn user_text(self) -> &'static str {
        match self {
            Self::Permission => "You do not have permission to use this command.",
            Self::Liveness => "That command can only be used while the channel is offline.",
            Self::Cooldown => "That command is on cooldown.",
        }
    }
}

/// The command dispatcher.
///
/// Holds the read-only registry, the cooldown tracker, and the policy
/// collaborators. `Dispatcher` is `Send + Sync`; wrap it in an `Arc` and
/// call [`dispatch`](Self::dispatch) from as many tasks as the transport
/// produces messages on.
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    cooldowns: CooldownTracker,
    permissions: Arc<dyn PermissionResolver>,
    liveness: Arc<dyn LivenessProbe>,
    services: Arc<ServiceMap>,
    prefix: String,
    reply_unknown: bool,
    per_user_cooldown: bool,
}

impl Dispatcher {
    /// Starts building a dispatcher over an already populated registry.
    pub fn builder(registry: CommandRegistry) -> DispatcherBuilder {
        DispatcherBuilder {
            registry,
            permissions: Arc::new(FixedLevel(kiln_core::PermissionLevel::Viewer)),
            liveness: Arc::new(AlwaysOffline),
            services: ServiceMap::new(),
            prefix: "!".to_string(),
            reply_unknown: false,
            per_user_cooldown: false,
        }
    }

    /// The command prefix this dispatcher strips.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The registry backing this dispatcher.
    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Dispatches one raw chat line.
    ///
    /// Returns `None` when nothing should be said back: the line does not
    /// carry the command prefix, is empty after it, or names no registered
    /// command (unless unknown-command replies are enabled). Every other
    /// path produces a [`Reply`].
    pub async fn dispatch(&self, raw: &str, invoker: &ChatUser, scope: &Scope) -> Option<Reply> {
        let body = raw.trim().strip_prefix(&self.prefix)?;
        let mut tokens = body.split_whitespace();
        let command_token = tokens.next()?;
        let rest: Vec<String> = tokens.map(str::to_string).collect();

        let Some(command) = self.registry.resolve(command_token) else {
            debug!(token = %command_token, "Unknown command token");
            return self
                .reply_unknown
                .then(|| Reply::failure(format!("Unknown command: {command_token}")));
        };

        let span = span!(
            Level::DEBUG,
            "dispatch",
            command = %command.name(),
            scope = %scope.name,
            invoker = %invoker.login,
        );
        let reply = self
            .run_gates(&command, rest, invoker, scope)
            .instrument(span)
            .await;
        Some(reply)
    }

    /// Gates 3-9, in order, terminal at the first denial.
    async fn run_gates(
        &self,
        command: &Arc<Command>,
        rest: Vec<String>,
        invoker: &ChatUser,
        scope: &Scope,
    ) -> Reply {
        // Gate: permission. Denied invocations consume no cooldown and
        // never reach the parser or handler.
        let level = self.permissions.resolve(invoker, scope).await;
        if level < command.permission() {
            return self.deny(command, Denial::Permission);
        }

        // Gate: liveness.
        if command.only_offline() && self.liveness.is_live(scope).await {
            return self.deny(command, Denial::Liveness);
        }

        // Gate: cooldown. The slot is reserved before the handler runs, so
        // a slow handler still blocks re-invocation inside the window.
        let user = self.per_user_cooldown.then(|| invoker.id.as_str());
        if let Err(remaining) =
            self.cooldowns
                .try_acquire(command.name(), &scope.id, user, command.cooldown())
        {
            debug!(remaining_ms = remaining.as_millis() as u64, "Cooldown hit");
            return self.deny(command, Denial::Cooldown);
        }

        let mut ctx = CommandContext::new(
            invoker.clone(),
            scope.clone(),
            level,
            rest,
            Arc::clone(&self.services),
        );

        // Pre-handlers observe the raw remaining tokens, before parsing.
        for pre in command.pre_handlers() {
            if let Err(message) = pre(&ctx).await {
                debug!(command = %command.name(), %message, "Pre-handler aborted dispatch");
                return Reply::failure(message);
            }
        }

        // Parse failures are user-caused and safe to echo back verbatim.
        let parsed = match parse_arguments(&ctx.input, command.params()) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(command = %command.name(), flag = %err.flag(), "Argument parse failed");
                return Reply::failure(err.to_string());
            }
        };
        ctx.input = parsed.input;
        ctx.values = parsed.values;

        let outcome = self.invoke(command, ctx).await;
        debug!(success = outcome.success, "Command completed");

        Reply {
            success: outcome.success,
            text: outcome.message,
            reply_to_invoker: command.has_flag(CommandFlag::ReplyToInvoker),
        }
    }

    fn deny(&self, command: &Command, denial: Denial) -> Reply {
        warn!(
            command = %command.name(),
            denial = denial.as_str(),
            "Invocation denied"
        );
        Reply::failure(denial.user_text())
    }

    /// The single fault boundary around handler execution.
    async fn invoke(&self, command: &Command, ctx: CommandContext) -> CommandOutcome {
        match AssertUnwindSafe(command.invoke(ctx)).catch_unwind().await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(fault)) => {
                error!(command = %command.name(), error = %fault, "Command handler failed");
                CommandOutcome::fail(FAULT_REPLY)
            }
            Err(panic) => {
                let payload = panic
                    .downcast_ref::<&str>()
                    .copied()
                    .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
                    .unwrap_or("<non-string panic payload>");
                error!(command = %command.name(), payload, "Command handler panicked");
                CommandOutcome::fail(FAULT_REPLY)
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("prefix", &self.prefix)
            .field("commands", &self.registry.len())
            .field("reply_unknown", &self.reply_unknown)
            .field("per_user_cooldown", &self.per_user_cooldown)
            .finish()
    }
}

/// Builder for [`Dispatcher`].
///
/// Defaults: prefix `!`, every user resolved as viewer, every scope
/// offline, unknown commands silent, cooldowns scoped per (command, scope).
pub struct DispatcherBuilder {
    registry: CommandRegistry,
    permissions: Arc<dyn PermissionResolver>,
    liveness: Arc<dyn LivenessProbe>,
    services: ServiceMap,
    prefix: String,
    reply_unknown: bool,
    per_user_cooldown: bool,
}

impl DispatcherBuilder {
    /// Sets the command prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Wires in the permission resolution collaborator.
    pub fn permissions(mut self, resolver: Arc<dyn PermissionResolver>) -> Self {
        self.permissions = resolver;
        self
    }

    /// Wires in the liveness collaborator.
    pub fn liveness(mut self, probe: Arc<dyn LivenessProbe>) -> Self {
        self.liveness = probe;
        self
    }

    /// Registers a shared service handle for handlers to look up by type.
    pub fn service<T: Send + Sync + 'static>(mut self, service: Arc<T>) -> Self {
        self.services.insert(service);
        self
    }

    /// Replies "Unknown command" instead of staying silent on a registry
    /// miss.
    pub fn reply_unknown(mut self, enabled: bool) -> Self {
        self.reply_unknown = enabled;
        self
    }

    /// Narrows cooldown slots from (command, scope) to
    /// (command, scope, user).
    pub fn per_user_cooldown(mut self, enabled: bool) -> Self {
        self.per_user_cooldown = enabled;
        self
    }

    /// Finalizes the dispatcher.
    pub fn build(self) -> Dispatcher {
        Dispatcher {
            registry: Arc::new(self.registry),
            cooldowns: CooldownTracker::new(),
            permissions: self.permissions,
            liveness: self.liveness,
            services: Arc::new(self.services),
            prefix: self.prefix,
            reply_unknown: self.reply_unknown,
            per_user_cooldown: self.per_user_cooldown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use kiln_core::{ArgSpec, PermissionLevel};

    struct MapResolver(HashMap<String, PermissionLevel>);

    #[async_trait]
    impl PermissionResolver for MapResolver {
        async fn resolve(&self, user: &ChatUser, _scope: &Scope) -> PermissionLevel {
            self.0.get(&user.id).copied().unwrap_or_default()
        }
    }

    struct LiveProbe(bool);

    #[async_trait]
    impl LivenessProbe for LiveProbe {
        async fn is_live(&self, _scope: &Scope) -> bool {
            self.0
        }
    }

    fn alice() -> ChatUser {
        ChatUser::new("1", "alice")
    }

    fn bob() -> ChatUser {
        ChatUser::new("2", "bob")
    }

    fn chan() -> Scope {
        Scope::new("10", "somechannel")
    }

    fn echo_command() -> Command {
        Command::builder("echo")
            .handler(|ctx| async move { Ok(CommandOutcome::ok(ctx.input.join(" "))) })
    }

    fn dispatcher(commands: Vec<Command>) -> Dispatcher {
        let mut registry = CommandRegistry::new();
        for command in commands {
            registry.register(command).unwrap();
        }
        Dispatcher::builder(registry).build()
    }

    #[tokio::test]
    async fn test_non_prefixed_text_is_silent() {
        let dispatcher = dispatcher(vec![echo_command()]);
        assert!(
            dispatcher
                .dispatch("just chatting", &alice(), &chan())
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_bare_prefix_is_silent() {
        let dispatcher = dispatcher(vec![echo_command()]);
        assert!(dispatcher.dispatch("!", &alice(), &chan()).await.is_none());
        assert!(dispatcher.dispatch("!   ", &alice(), &chan()).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_command_silent_by_default() {
        let dispatcher = dispatcher(vec![echo_command()]);
        assert!(
            dispatcher
                .dispatch("!nothere", &alice(), &chan())
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_unknown_command_reply_when_configured() {
        let mut registry = CommandRegistry::new();
        registry.register(echo_command()).unwrap();
        let dispatcher = Dispatcher::builder(registry).reply_unknown(true).build();

        let reply = dispatcher
            .dispatch("!nothere", &alice(), &chan())
            .await
            .unwrap();
        assert!(!reply.success);
        assert_eq!(reply.text, "Unknown command: nothere");
    }

    #[tokio::test]
    async fn test_happy_path_echoes_positional_input() {
        let dispatcher = dispatcher(vec![echo_command()]);
        let reply = dispatcher
            .dispatch("!echo hello world", &alice(), &chan())
            .await
            .unwrap();
        assert!(reply.success);
        assert_eq!(reply.text, "hello world");
        assert!(!reply.reply_to_invoker);
    }

    #[tokio::test]
    async fn test_resolves_by_alias() {
        let command = Command::builder("timer")
            .alias("timers")
            .handler(|_ctx| async { Ok(CommandOutcome::ok("resolved")) });
        let dispatcher = dispatcher(vec![command]);

        let reply = dispatcher
            .dispatch("!timers", &alice(), &chan())
            .await
            .unwrap();
        assert_eq!(reply.text, "resolved");
    }

    #[tokio::test]
    async fn test_permission_denial_runs_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_handler = Arc::clone(&calls);

        // The bad flag would also fail the parser; the reply proves the
        // permission gate fired first.
        let command = Command::builder("mods")
            .permission(PermissionLevel::Moderator)
            .handler(move |_ctx| {
                let calls = Arc::clone(&calls_in_handler);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(CommandOutcome::ok("ran"))
                }
            });

        let mut registry = CommandRegistry::new();
        registry.register(command).unwrap();
        let dispatcher = Dispatcher::builder(registry)
            .permissions(Arc::new(MapResolver(HashMap::from([(
                "2".to_string(),
                PermissionLevel::Moderator,
            )]))))
            .build();

        let denied = dispatcher
            .dispatch("!mods --bogus", &alice(), &chan())
            .await
            .unwrap();
        assert!(!denied.success);
        assert_eq!(denied.text, "You do not have permission to use this command.");
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let allowed = dispatcher
            .dispatch("!mods", &bob(), &chan())
            .await
            .unwrap();
        assert!(allowed.success);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_only_offline_command_blocked_while_live() {
        let command = Command::builder("setup")
            .only_offline(true)
            .handler(|_ctx| async { Ok(CommandOutcome::ok("ran")) });

        let mut registry = CommandRegistry::new();
        registry.register(command).unwrap();
        let dispatcher = Dispatcher::builder(registry)
            .liveness(Arc::new(LiveProbe(true)))
            .build();

        let reply = dispatcher
            .dispatch("!setup", &alice(), &chan())
            .await
            .unwrap();
        assert!(!reply.success);
        assert_eq!(
            reply.text,
            "That command can only be used while the channel is offline."
        );
    }

    #[tokio::test]
    async fn test_cooldown_denies_second_call_and_allows_after_window() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_handler = Arc::clone(&calls);

        let command = Command::builder("ping")
            .cooldown(Duration::from_millis(50))
            .handler(move |_ctx| {
                let calls = Arc::clone(&calls_in_handler);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(CommandOutcome::ok("pong"))
                }
            });
        let dispatcher = dispatcher(vec![command]);

        let first = dispatcher.dispatch("!ping", &alice(), &chan()).await.unwrap();
        assert!(first.success);

        let second = dispatcher
            .dispatch("!ping", &alice(), &chan())
            .await
            .unwrap();
        assert!(!second.success);
        assert_eq!(second.text, "That command is on cooldown.");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(60)).await;
        let third = dispatcher.dispatch("!ping", &alice(), &chan()).await.unwrap();
        assert!(third.success);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_per_user_cooldown_does_not_block_other_users() {
        let command = Command::builder("ping")
            .cooldown(Duration::from_secs(60))
            .handler(|_ctx| async { Ok(CommandOutcome::ok("pong")) });

        let mut registry = CommandRegistry::new();
        registry.register(command).unwrap();
        let dispatcher = Dispatcher::builder(registry).per_user_cooldown(true).build();

        assert!(
            dispatcher
                .dispatch("!ping", &alice(), &chan())
                .await
                .unwrap()
                .success
        );
        assert!(
            dispatcher
                .dispatch("!ping", &bob(), &chan())
                .await
                .unwrap()
                .success
        );
        assert!(
            !dispatcher
                .dispatch("!ping", &alice(), &chan())
                .await
                .unwrap()
                .success
        );
    }

    #[tokio::test]
    async fn test_pre_handlers_run_in_order_and_short_circuit() {
        let second_ran = Arc::new(AtomicUsize::new(0));
        let second_ran_in_pre = Arc::clone(&second_ran);

        let command = Command::builder("gated")
            .pre_handler(|_ctx| Box::pin(async { Err("Not in this channel.".to_string()) }))
            .pre_handler(move |_ctx| {
                let ran = Arc::clone(&second_ran_in_pre);
                Box::pin(async move {
                    ran.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            })
            .handler(|_ctx| async { Ok(CommandOutcome::ok("ran")) });
        let dispatcher = dispatcher(vec![command]);

        let reply = dispatcher
            .dispatch("!gated", &alice(), &chan())
            .await
            .unwrap();
        assert!(!reply.success);
        assert_eq!(reply.text, "Not in this channel.");
        assert_eq!(second_ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pre_handler_sees_raw_tokens() {
        let command = Command::builder("gated")
            .param(ArgSpec::boolean("force"))
            .pre_handler(|ctx| {
                Box::pin(async move {
                    // Parsing has not happened yet: the flag token is still
                    // part of the raw input and no value is recorded.
                    assert_eq!(ctx.input, ["a", "--force"]);
                    assert!(ctx.values.is_empty());
                    Ok(())
                })
            })
            .handler(|ctx| async move {
                assert_eq!(ctx.input, ["a"]);
                assert!(ctx.param_flag("force"));
                Ok(CommandOutcome::ok("ran"))
            });
        let dispatcher = dispatcher(vec![command]);

        let reply = dispatcher
            .dispatch("!gated a --force", &alice(), &chan())
            .await
            .unwrap();
        assert!(reply.success);
    }

    #[tokio::test]
    async fn test_parse_failure_names_the_flag() {
        let command = Command::builder("timer")
            .param(ArgSpec::string("interval"))
            .handler(|_ctx| async { Ok(CommandOutcome::ok("ran")) });
        let dispatcher = dispatcher(vec![command]);

        let reply = dispatcher
            .dispatch("!timer create x --quux", &alice(), &chan())
            .await
            .unwrap();
        assert!(!reply.success);
        assert_eq!(reply.text, "Invalid argument: quux");
    }

    #[tokio::test]
    async fn test_handler_error_becomes_generic_reply() {
        let command = Command::builder("boom")
            .handler(|_ctx| async { Err("database exploded: secret dsn".into()) });
        let dispatcher = dispatcher(vec![command]);

        let reply = dispatcher.dispatch("!boom", &alice(), &chan()).await.unwrap();
        assert!(!reply.success);
        assert_eq!(reply.text, FAULT_REPLY);
    }

    #[tokio::test]
    async fn test_handler_panic_is_caught_and_loop_survives() {
        let commands = vec![
            Command::builder("panic").handler(|_ctx| async { panic!("handler bug") }),
            echo_command(),
        ];
        let dispatcher = dispatcher(commands);

        let reply = dispatcher
            .dispatch("!panic", &alice(), &chan())
            .await
            .unwrap();
        assert!(!reply.success);
        assert_eq!(reply.text, FAULT_REPLY);

        // The dispatcher keeps serving after a fault.
        let after = dispatcher
            .dispatch("!echo still alive", &alice(), &chan())
            .await
            .unwrap();
        assert!(after.success);
        assert_eq!(after.text, "still alive");
    }

    #[tokio::test]
    async fn test_reply_to_invoker_flag_marks_the_reply() {
        let command = Command::builder("ping")
            .flag(CommandFlag::ReplyToInvoker)
            .handler(|_ctx| async { Ok(CommandOutcome::ok("pong")) });
        let dispatcher = dispatcher(vec![command]);

        let reply = dispatcher.dispatch("!ping", &alice(), &chan()).await.unwrap();
        assert!(reply.success);
        assert!(reply.reply_to_invoker);
    }

    #[tokio::test]
    async fn test_explained_failure_is_not_a_fault() {
        let command = Command::builder("timer")
            .handler(|_ctx| async { Ok(CommandOutcome::fail("No timer named x")) });
        let dispatcher = dispatcher(vec![command]);

        let reply = dispatcher
            .dispatch("!timer delete x", &alice(), &chan())
            .await
            .unwrap();
        assert!(!reply.success);
        assert_eq!(reply.text, "No timer named x");
    }

    #[tokio::test]
    async fn test_services_reach_the_handler() {
        struct Greeting(&'static str);

        let command = Command::builder("greet").handler(|ctx| async move {
            let greeting = ctx
                .service::<Greeting>()
                .ok_or("greeting service missing")?;
            Ok(CommandOutcome::ok(greeting.0))
        });

        let mut registry = CommandRegistry::new();
        registry.register(command).unwrap();
        let dispatcher = Dispatcher::builder(registry)
            .service(Arc::new(Greeting("hi there")))
            .build();

        let reply = dispatcher.dispatch("!greet", &alice(), &chan()).await.unwrap();
        assert!(reply.success);
        assert_eq!(reply.text, "hi there");
    }

    #[tokio::test]
    async fn test_custom_prefix() {
        let mut registry = CommandRegistry::new();
        registry.register(echo_command()).unwrap();
        let dispatcher = Dispatcher::builder(registry).prefix("??").build();

        assert!(dispatcher.dispatch("!echo hi", &alice(), &chan()).await.is_none());
        let reply = dispatcher
            .dispatch("??echo hi", &alice(), &chan())
            .await
            .unwrap();
        assert_eq!(reply.text, "hi");
    }
}
