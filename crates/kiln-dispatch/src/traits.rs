//! Collaborator traits consumed by the pipeline's policy gates.
//!
//! Identity/authorization and channel liveness live outside this crate; the
//! pipeline only depends on these narrow capabilities. Implementations may
//! suspend (a database lookup, an API call) and must be shareable across
//! concurrent dispatch tasks.

use async_trait::async_trait;
use kiln_core::{ChatUser, PermissionLevel, Scope};

/// Resolves the permission level a user holds within a scope.
#[async_trait]
pub trait PermissionResolver: Send + Sync {
    /// Returns the user's level in the given scope.
    async fn resolve(&self, user: &ChatUser, scope: &Scope) -> PermissionLevel;
}

/// Reports whether a scope is currently live.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// Returns `true` if the scope is live right now.
    async fn is_live(&self, scope: &Scope) -> bool;
}

/// A [`PermissionResolver`] granting every user the same fixed level.
///
/// The dispatcher's default (at [`PermissionLevel::Viewer`], least
/// privilege); also handy in tests and single-tenant bots.
#[derive(Debug, Clone, Copy)]
pub struct FixedLevel(pub PermissionLevel);

#[async_trait]
impl PermissionResolver for FixedLevel {
    async fn resolve(&self, _user: &ChatUser, _scope: &Scope) -> PermissionLevel {
        self.0
    }
}

/// A [`LivenessProbe`] that reports every scope as offline.
///
/// The dispatcher's default: with no probe wired in, `only_offline`
/// commands are never blocked.
#[derive(Debug, Clone, Copy)]
pub struct AlwaysOffline;

#[async_trait]
impl LivenessProbe for AlwaysOffline {
    async fn is_live(&self, _scope: &Scope) -> bool {
        false
    }
}
