// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles for authorization.
///
/// ## Role Hierarchy
///
/// - `Admin` - Full access, including restricted data and deletion
/// - `Manager` - Project managers; confidential data, imports and audit review
/// - `Surveyor` - Field staff; internal and public data
/// - `Viewer` - Read-only access to public data
///
/// Which security levels a role may read is decided by the access matrix in
/// [`crate::geo::access`], not by this enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Project manager
    Manager,
    /// Field surveyor
    Surveyor,
    /// Read-only viewer
    Viewer,
}

impl Role {
    /// All roles, most privileged first.
    pub const ALL: [Role; 4] = [Role::Admin, Role::Manager, Role::Surveyor, Role::Viewer];

    /// Parse role from string (case-insensitive).
    /// Used when extracting roles from token claims.
    pub fn from_str(s: &str) -> Option<Role> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "surveyor" => Some(Role::Surveyor),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Surveyor => "surveyor",
            Role::Viewer => "viewer",
        }
    }

    /// Admins and managers may import data and review audit logs.
    pub fn is_data_steward(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

impl Default for Role {
    /// Default role is Viewer (least privilege for authenticated users).
    fn default() -> Self {
        Role::Viewer
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
