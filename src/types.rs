/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Privilege tags a user record can carry.
/// Stored and transmitted as lowercase strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Non-privileged default for every new member
    User,
    /// Ordinary administrator
    Admin,
    /// Highest tier; the only one allowed to grant or revoke itself
    Founder,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Admin, Role::Founder];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Founder => "founder",
        }
    }

    /// Admin and founder may use the role administration endpoint
    pub fn is_privileged(&self) -> bool {
        match self {
            Role::Admin | Role::Founder => true,
            Role::User => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
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
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Drop duplicate tags while keeping first-seen order
pub fn dedup_roles(roles: Vec<Role>) -> Vec<Role> {
    let mut out = Vec::with_capacity(roles.len());
    for role in roles {
        if !out.contains(&role) {
            out.push(role);
        }
    }
    out
}
