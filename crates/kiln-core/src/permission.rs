//! The ordered permission ladder for command access control.

/// The minimum permission level a user must hold to invoke a command.
///
/// Levels form a strict ladder; the pipeline's permission gate compares the
/// invoker's resolved level against the command's required level with plain
/// `>=`, so the derived [`Ord`] is load-bearing: variants must stay declared
/// from least to most privileged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PermissionLevel {
    /// Any chatter. The default for unrecognized users.
    #[default]
    Viewer,
    /// A VIP of the scope.
    Vip,
    /// A moderator of the scope.
    Moderator,
    /// The owner of the scope.
    Broadcaster,
    /// Bot operators, unrestricted.
    Admin,
}

impl PermissionLevel {
    /// Returns the level's lowercase name, as used in logs and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Vip => "vip",
            Self::Moderator => "moderator",
            Self::Broadcaster => "broadcaster",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
