//! The per-invocation context handed to command handlers.
//!
//! A [`CommandContext`] is built once per dispatched message and discarded
//! after the reply is produced. It carries the parsed input, the identity of
//! the invoker, the scope the command runs in, and read-only handles to
//! shared services injected at dispatcher construction. There is no ambient
//! global state; everything a handler may touch arrives through the context.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::args::ArgValue;
use crate::permission::PermissionLevel;

/// The user who sent the message being dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatUser {
    /// Stable platform identifier.
    pub id: String,
    /// Display/login name.
    pub login: String,
}

impl ChatUser {
    /// Creates a user from its platform id and login name.
    pub fn new(id: impl Into<String>, login: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            login: login.into(),
        }
    }
}

/// The channel (or equivalent context) a command executes within.
///
/// Cooldowns and liveness are evaluated per scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    /// Stable platform identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
}

impl Scope {
    /// Creates a scope from its platform id and name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A read-only, type-keyed map of shared service handles.
///
/// Services (timer stores, repositories, API clients) are registered once
/// when the dispatcher is built and looked up by concrete type from handler
/// code. The map stores `Arc`s, so lookups are cheap clones and the map
/// itself never owns the collaborators' state exclusively.
#[derive(Default, Clone)]
pub struct ServiceMap {
    entries: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ServiceMap {
    /// Creates an empty service map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service handle, replacing any previous handle of the
    /// same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, service: Arc<T>) {
        self.entries.insert(TypeId::of::<T>(), service);
    }

    /// Looks up a service handle by type.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| Arc::clone(entry).downcast::<T>().ok())
    }

    /// Returns the number of registered services.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ServiceMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceMap")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// The ephemeral invocation context, one per command execution.
///
/// Pre-handlers observe the context with the raw remaining tokens in
/// `input` and an empty `values`; by the time the handler runs, `input`
/// holds the positional leftovers and `values` the typed flag values
/// produced by the argument parser.
pub struct CommandContext {
    /// The invoking user.
    pub invoker: ChatUser,
    /// The scope the command runs in.
    pub scope: Scope,
    /// The invoker's resolved permission level.
    pub level: PermissionLevel,
    /// Positional input tokens.
    pub input: Vec<String>,
    /// Typed flag values keyed by flag name.
    pub values: HashMap<String, ArgValue>,
    services: Arc<ServiceMap>,
}

impl CommandContext {
    /// Builds a context for one invocation.
    pub fn new(
        invoker: ChatUser,
        scope: Scope,
        level: PermissionLevel,
        input: Vec<String>,
        services: Arc<ServiceMap>,
    ) -> Self {
        Self {
            invoker,
            scope,
            level,
            input,
            values: HashMap::new(),
            services,
        }
    }

    /// Looks up a shared service handle by type.
    pub fn service<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.services.get::<T>()
    }

    /// Returns the parsed value of a flag, if it was present.
    pub fn param(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    /// Returns a string flag's value, if present.
    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.param(name).and_then(ArgValue::as_str)
    }

    /// Returns whether a presence flag was given.
    pub fn param_flag(&self, name: &str) -> bool {
        self.param(name).and_then(ArgValue::as_bool).unwrap_or(false)
    }

    /// Returns a number flag's value, if present.
    pub fn param_number(&self, name: &str) -> Option<i64> {
        self.param(name).and_then(ArgValue::as_number)
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("invoker", &self.invoker)
            .field("scope", &self.scope)
            .field("level", &self.level)
            .field("input", &self.input)
            .field("values", &self.values)
            .field("services", &self.services)
            .finish()
    }
}
