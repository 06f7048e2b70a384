// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Secure Geo Server - encrypted geospatial records behind role-based access
//!
//! Project GeoJSON payloads are sealed with AES-256-GCM, stored in a redb
//! database and guarded by a role/security-level matrix. Every access is
//! recorded in a capped per-record trail and mirrored to a daily archive.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Bearer token verification and role extractors
//! - `config` - Environment configuration
//! - `geo` - Records, access matrix, encryption and the service facade
//! - `storage` - Data directory, record database and audit archive

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod geo;
pub mod state;
pub mod storage;
