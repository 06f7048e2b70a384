// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup. Anything the
//! service cannot run safely without is a startup error; there are no silent
//! fallbacks for secrets.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for records, imports and audit logs | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `GEO_ENCRYPTION_KEY` | AES-256 key, 64 hex characters | Required |
//! | `AUTH_JWT_SECRET` | HS256 secret for bearer tokens | Required (except `dev` builds) |
//! | `AUTH_ISSUER` | Expected JWT issuer claim | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM certificate chain and key | Plain HTTP |
//! | `TRUST_PROXY_HEADERS` | Record client IPs from `x-forwarded-for` / `x-real-ip` | `false` |
//! | `RUST_LOG` | Log level filter | `secure_geo_server=info,tower_http=info` |

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::geo::cipher::KEY_LEN;
use crate::state::AuthConfig;
use crate::storage::paths::DATA_ROOT;

/// Root directory of persistent state.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Hex-encoded AES-256 key sealing every geo payload.
///
/// Data written under one key cannot be read under another, so the key must
/// be persisted outside the process.
pub const ENCRYPTION_KEY_ENV: &str = "GEO_ENCRYPTION_KEY";

/// HS256 secret shared with the token issuer.
pub const JWT_SECRET_ENV: &str = "AUTH_JWT_SECRET";

/// Expected `iss` claim. Unset disables issuer validation.
pub const ISSUER_ENV: &str = "AUTH_ISSUER";

/// `json` for machine-readable logs, anything else for pretty output.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";

/// Only enable behind a reverse proxy that overwrites the forwarding headers;
/// otherwise clients choose the address written to the audit trail.
pub const TRUST_PROXY_HEADERS_ENV: &str = "TRUST_PROXY_HEADERS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("GEO_ENCRYPTION_KEY is invalid: {0}")]
    InvalidKey(String),

    #[error("invalid bind address: {0}")]
    InvalidAddress(String),

    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    IncompleteTls,

    #[error("{0} must be true or false, got {1:?}")]
    InvalidFlag(&'static str, String),
}

/// AES-256 key material. Never printed.
#[derive(Clone)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    pub fn from_hex(value: &str) -> Result<Self, ConfigError> {
        let bytes = hex::decode(value.trim())
            .map_err(|e| ConfigError::InvalidKey(format!("not hex ({e})")))?;
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            ConfigError::InvalidKey(format!(
                "expected {} hex characters, got {}",
                KEY_LEN * 2,
                bytes.len() * 2
            ))
        })?;
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey([REDACTED])")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }

    pub fn from_env() -> Self {
        Self::parse(std::env::var(LOG_FORMAT_ENV).ok().as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Validated server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub encryption_key: EncryptionKey,
    pub auth: AuthConfig,
    pub log_format: LogFormat,
    pub tls: Option<TlsPaths>,
    pub trust_proxy_headers: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let data_dir = PathBuf::from(get(DATA_DIR_ENV).unwrap_or_else(|| DATA_ROOT.to_string()));

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(port) => port
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidAddress(format!("bad port {port:?}")))?,
            None => DEFAULT_PORT,
        };
        let bind_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(format!("{host}:{port}")))?;

        let encryption_key = get(ENCRYPTION_KEY_ENV)
            .ok_or(ConfigError::Missing(ENCRYPTION_KEY_ENV))
            .and_then(|value| EncryptionKey::from_hex(&value))?;

        let secret = get(JWT_SECRET_ENV);
        if secret.is_none() && !cfg!(feature = "dev") {
            return Err(ConfigError::Missing(JWT_SECRET_ENV));
        }
        let auth = AuthConfig {
            secret,
            issuer: get(ISSUER_ENV),
        };

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTls),
        };

        let trust_proxy_headers = match get(TRUST_PROXY_HEADERS_ENV) {
            Some(value) => parse_flag(TRUST_PROXY_HEADERS_ENV, &value)?,
            None => false,
        };

        Ok(Self {
            data_dir,
            bind_addr,
            encryption_key,
            auth,
            log_format: LogFormat::parse(get(LOG_FORMAT_ENV).as_deref()),
            tls,
            trust_proxy_headers,
        })
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag(name, value.to_string())),
    }
}
