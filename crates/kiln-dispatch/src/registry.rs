//! The command registry.
//!
//! A [`CommandRegistry`] maps command names and aliases to their
//! definitions. It is populated entirely during process initialization,
//! one [`register`](CommandRegistry::register) call per command module,
//! and is read-only afterwards; lookups from any number of concurrent
//! dispatch tasks need no synchronization beyond the `Arc` the dispatcher
//! holds.

use std::collections::HashMap;
use std::sync::Arc;

use kiln_core::Command;
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};

/// Maps command names (and aliases) to command definitions.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<Command>>,
    // alias -> primary name; kept separate so resolve can prefer exact
    // name matches and so collisions are detectable across both maps.
    aliases: HashMap<String, String>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command definition.
    ///
    /// Fails if the command's name or any of its aliases is already taken
    /// by another definition's name or alias. Matching is exact and
    /// case-sensitive.
    pub fn register(&mut self, command: Command) -> RegistryResult<()> {
        let name = command.name().to_string();
        if self.is_taken(&name) {
            return Err(RegistryError::DuplicateName { name });
        }
        for alias in command.aliases() {
            if self.is_taken(alias) {
                return Err(RegistryError::DuplicateAlias {
                    command: name,
                    alias: alias.clone(),
                });
            }
        }

        debug!(
            command = %name,
            aliases = ?command.aliases(),
            "Registered command"
        );
        for alias in command.aliases() {
            self.aliases.insert(alias.clone(), name.clone());
        }
        self.commands.insert(name, Arc::new(command));
        Ok(())
    }

    /// Resolves a token to a command definition.
    ///
    /// Exact, case-sensitive match against names first, then aliases.
    pub fn resolve(&self, token: &str) -> Option<Arc<Command>> {
        if let Some(command) = self.commands.get(token) {
            return Some(Arc::clone(command));
        }
        self.aliases
            .get(token)
            .and_then(|name| self.commands.get(name))
            .map(Arc::clone)
    }

    /// Returns all registered commands, for help output and diagnostics.
    pub fn commands(&self) -> impl Iterator<Item = &Arc<Command>> {
        self.commands.values()
    }

    /// Returns the number of registered commands (aliases not counted).
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns whether no command is registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn is_taken(&self, token: &str) -> bool {
        self.commands.contains_key(token) || self.aliases.contains_key(token)
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.commands.len())
            .field("aliases", &self.aliases.len())
            .finish()
    }
}
