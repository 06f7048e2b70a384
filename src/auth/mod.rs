// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authentication for the secure geo API. Tokens are issued by
//! the user signup/approval service and carry the approved role.
//!
//! ## Auth Flow
//!
//! 1. Client authenticates against the identity service
//! 2. Client sends `Authorization: Bearer <JWT>`
//! 3. This server:
//!    - Verifies the HS256 signature, expiry and (optionally) issuer
//!    - Extracts `sub` → canonical `user_id`
//!    - Extracts `role` → closed [`Role`] enum (unknown → viewer)
//!
//! ## Security
//!
//! - All non-health endpoints require authentication
//! - Clock skew tolerance is 60 seconds
//! - Unsigned tokens are only accepted by `dev` builds without a secret

pub mod claims;
pub mod error;
pub mod extractor;
pub mod roles;

pub use claims::{AuthenticatedUser, TokenClaims};
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth, ClientInfo, ManagerOrAdmin};
pub use roles::Role;
