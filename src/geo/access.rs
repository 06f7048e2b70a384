// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Static access matrix mapping security levels to the roles allowed to read them.
//!
//! | level        | roles                               |
//! |--------------|-------------------------------------|
//! | public       | admin, manager, surveyor, viewer    |
//! | internal     | admin, manager, surveyor            |
//! | confidential | admin, manager                      |
//! | restricted   | admin                               |

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;

/// Classification of a record. Ordered from least to most restrictive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    Public,
    Internal,
    #[default]
    Confidential,
    Restricted,
}

impl SecurityLevel {
    pub const ALL: [SecurityLevel; 4] = [
        SecurityLevel::Public,
        SecurityLevel::Internal,
        SecurityLevel::Confidential,
        SecurityLevel::Restricted,
    ];

    /// Roles allowed to read records at this level.
    pub fn authorized_roles(self) -> &'static [Role] {
        match self {
            SecurityLevel::Public => &[Role::Admin, Role::Manager, Role::Surveyor, Role::Viewer],
            SecurityLevel::Internal => &[Role::Admin, Role::Manager, Role::Surveyor],
            SecurityLevel::Confidential => &[Role::Admin, Role::Manager],
            SecurityLevel::Restricted => &[Role::Admin],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SecurityLevel::Public => "public",
            SecurityLevel::Internal => "internal",
            SecurityLevel::Confidential => "confidential",
            SecurityLevel::Restricted => "restricted",
        }
    }
}

impl std::fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `role` may read data classified at `level`.
pub fn is_authorized(role: Role, level: SecurityLevel) -> bool {
    level.authorized_roles().contains(&role)
}

/// Every level `role` may read, least restrictive first.
pub fn accessible_levels(role: Role) -> Vec<SecurityLevel> {
    SecurityLevel::ALL
        .into_iter()
        .filter(|level| is_authorized(role, *level))
        .collect()
}
