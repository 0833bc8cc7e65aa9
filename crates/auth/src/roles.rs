use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// The three actor roles of the system.
///
/// Outlet scope is carried next to the role on [`crate::Actor`]; the role
/// alone never grants access to a specific outlet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Business owner: every action on every outlet.
    Owner,
    /// Factory staff: factory-wide actions, no outlet scope.
    FactoryStaff,
    /// Outlet staff: actions on exactly one outlet.
    OutletStaff,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Owner, Role::FactoryStaff, Role::OutletStaff];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::FactoryStaff => "factory_staff",
            Role::OutletStaff => "outlet_staff",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
