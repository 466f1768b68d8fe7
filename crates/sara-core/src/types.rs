use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Enums
// =============================================================================

/// Risk tier attached to every action.
///
/// Tiers are ordered `Observe < Low < Medium < High`. The ordering is used both
/// to gate execution against the active security policy and to decide whether
/// a plan needs explicit human confirmation.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    /// Read-only queries, no system changes.
    Observe,
    /// Cosmetic controls (volume, brightness, opening a browser search).
    #[default]
    Low,
    /// State-changing but reversible operations (apps, files, folders, lock).
    Medium,
    /// Destructive or irreversible operations (shutdown, restart, deletion).
    High,
}

impl PermissionLevel {
    /// All tiers in ascending order.
    pub const ALL: [PermissionLevel; 4] = [
        PermissionLevel::Observe,
        PermissionLevel::Low,
        PermissionLevel::Medium,
        PermissionLevel::High,
    ];

    /// Whether an action at this tier must be confirmed by a human first.
    pub fn requires_confirmation(self) -> bool {
        self == PermissionLevel::High
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionLevel::Observe => write!(f, "observe"),
            PermissionLevel::Low => write!(f, "low"),
            PermissionLevel::Medium => write!(f, "medium"),
            PermissionLevel::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for PermissionLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "observe" => Ok(PermissionLevel::Observe),
            "low" => Ok(PermissionLevel::Low),
            "medium" => Ok(PermissionLevel::Medium),
            "high" => Ok(PermissionLevel::High),
            _ => Err(format!("Unknown permission level: {}", s)),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
