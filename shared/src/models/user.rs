//! Staff roles
//!
//! Authentication and role gating happen in the collaborator layer; the
//! core only carries the caller's identity through its operations.

use serde::{Deserialize, Serialize};

/// Staff role carried in the authenticated-identity context
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Cashier,
    Waiter,
    Cook,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Cashier => "cashier",
            Role::Waiter => "waiter",
            Role::Cook => "cook",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "cashier" => Some(Role::Cashier),
            "waiter" => Some(Role::Waiter),
            "cook" => Some(Role::Cook),
            _ => None,
        }
    }
}
