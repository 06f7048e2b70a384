// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;

use axum_server::tls_rustls::RustlsConfig;
use secure_geo_server::{
    api::router,
    config::{AppConfig, LogFormat},
    state::AppState,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "secure_geo_server=info,tower_http=info".into());

    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(LogFormat::from_env());

    let config = AppConfig::from_env()?;
    if !config.auth.is_configured() {
        warn!("No JWT secret configured, bearer tokens are NOT verified (dev build)");
    }

    let state = AppState::from_config(&config)?;
    info!(data_dir = %config.data_dir.display(), "Secure geo storage ready");

    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    let addr = config.bind_addr;

    match &config.tls {
        Some(tls) => {
            // Must happen before any TLS configuration is built.
            rustls::crypto::ring::default_provider()
                .install_default()
                .map_err(|_| "Failed to install rustls crypto provider")?;

            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            info!(%addr, "Secure geo server listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config).serve(app).await?;
        }
        None => {
            info!(%addr, "Secure geo server listening on http (docs at /docs)");
            axum_server::bind(addr).serve(app).await?;
        }
    }

    Ok(())
}
