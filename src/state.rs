// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::config::AppConfig;
use crate::geo::{GeoError, PayloadCipher, SecureGeoService};
use crate::storage::{FileStorage, StoragePaths};

/// Bearer token verification settings.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// HS256 secret. `None` only in `dev` builds.
    pub secret: Option<String>,
    /// Expected `iss` claim, if any.
    pub issuer: Option<String>,
}

impl AuthConfig {
    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("issuer", &self.issuer)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub geo: Arc<SecureGeoService>,
    pub auth_config: AuthConfig,
    /// Take client addresses from `x-forwarded-for` / `x-real-ip`.
    pub trust_proxy_headers: bool,
}

impl AppState {
    pub fn new(geo: SecureGeoService, auth_config: AuthConfig) -> Self {
        Self {
            geo: Arc::new(geo),
            auth_config,
            trust_proxy_headers: false,
        }
    }

    pub fn with_trusted_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    /// Prepare the data directory, key and record database.
    pub fn from_config(config: &AppConfig) -> Result<Self, GeoError> {
        let mut storage = FileStorage::new(StoragePaths::new(&config.data_dir));
        storage.initialize()?;

        let cipher = PayloadCipher::new(config.encryption_key.as_bytes())?;
        let geo = SecureGeoService::open(storage, cipher)?;
        Ok(Self::new(geo, config.auth.clone())
            .with_trusted_proxy_headers(config.trust_proxy_headers))
    }

    pub fn storage(&self) -> &FileStorage {
        self.geo.files()
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use crate::geo::cipher::KEY_LEN;
    use tempfile::TempDir;

    pub const TEST_SECRET: &str = "test-signing-secret";

    /// State over a fresh temp directory, with HS256 auth configured.
    pub fn test_state() -> (AppState, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let mut storage = FileStorage::new(StoragePaths::new(temp.path()));
        storage.initialize().expect("storage init");
        let cipher = PayloadCipher::new(&[5u8; KEY_LEN]).expect("cipher");
        let geo = SecureGeoService::open(storage, cipher).expect("geo service");

        let auth = AuthConfig {
            secret: Some(TEST_SECRET.to_string()),
            issuer: None,
        };
        (AppState::new(geo, auth), temp)
    }
}
