// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;
use std::time::Duration;

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use drinks_api::{
    api::router,
    auth::{Authorizer, JwksManager, TokenValidator},
    config::{log_format_from_env, AppConfig, LogFormat},
    state::AppState,
    storage::DrinkCatalog,
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing(log_format_from_env());

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Drinks API terminated");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    let catalog = DrinkCatalog::open(&config.database_path)?;
    tracing::info!(
        path = %config.database_path.display(),
        drinks = catalog.count()?,
        "Drink catalog opened"
    );

    let keys = JwksManager::remote(config.auth.jwks_url.as_str())?
        .with_cache_ttl(config.auth.jwks_cache_ttl);
    let validator = TokenValidator::new(keys, &config.auth.issuer, &config.auth.audience)
        .with_algorithms(config.auth.algorithms.clone())
        .with_leeway(config.auth.leeway_secs);
    tracing::info!(
        jwks_url = %config.auth.jwks_url,
        issuer = %config.auth.issuer,
        audience = %config.auth.audience,
        "Token validation configured"
    );

    let warm_keys = validator.keys().clone();
    tokio::spawn(async move {
        match warm_keys.refresh().await {
            Ok(()) => tracing::info!("Signing key set loaded"),
            Err(e) => tracing::warn!(error = %e, "Initial signing key set fetch failed"),
        }
    });

    let app = router(AppState::new(catalog, Authorizer::new(validator)));

    let handle = Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, draining connections");
        shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    let addr = config.bind_addr;
    match &config.tls {
        Some(tls) => {
            if rustls::crypto::ring::default_provider()
                .install_default()
                .is_err()
            {
                tracing::debug!("rustls crypto provider already installed");
            }
            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;

            tracing::info!(%addr, "Drinks API listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            tracing::info!(%addr, "Drinks API listening on http (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    tracing::info!("Drinks API stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
