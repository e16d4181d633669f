//! Who is acting.
//!
//! Tokens and sign-in live outside this crate; callers hand us an [`Actor`]
//! once a session exists.

use crate::ids::UserId;
use crate::CommerceError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Privilege level of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Regular customer.
    #[default]
    Customer,
    /// Back-office administrator.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = CommerceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" | "user" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(CommerceError::Validation(format!("unknown role: {}", other))),
        }
    }
}

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn customer(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Customer,
        }
    }

    pub fn admin(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fail with `Unauthorized` unless this actor is an admin.
    pub fn require_admin(&self, action: &str) -> Result<(), CommerceError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(CommerceError::Unauthorized(format!(
                "{} requires an admin, user {} is a {}",
                action,
                self.user_id,
                self.role.as_str()
            )))
        }
    }
}

/// Contact details copied into an order at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}
