//! Toolgate server binary.
//!
//! Main application entry point that configures the OAuth 2.0
//! authorization server and starts the HTTP server with graceful shutdown.

use anyhow::Result;
use std::{env, sync::Arc};

use toolgate::{
    config::Config,
    http::{AppState, build_router},
    oauth::{AuthorizationServer, ClientProvisioningService, JwtTokenCodec},
    storage::{create_storage_backend, parse_storage_backend},
    tools::StaticToolDocumentProvider,
};

use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "toolgate=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();

    let version = toolgate::config::version()?;

    env::args().for_each(|arg| {
        if arg == "--version" {
            println!("{version}");
            std::process::exit(0);
        }
    });

    tracing::info!(?version, "Starting toolgate");

    let config = Config::new()?;

    // Parse storage backend configuration
    let storage_backend =
        parse_storage_backend(&config.storage_backend, config.database_url.as_deref())?;
    let oauth_storage = create_storage_backend(storage_backend).await?;

    let token_codec = Arc::new(JwtTokenCodec::new(
        config.token_signing_secret.as_ref().as_bytes(),
    ));

    let auth_server = Arc::new(AuthorizationServer::new(
        oauth_storage.clone(),
        token_codec.clone(),
        *config.access_token_expiration.as_ref(),
        *config.auth_code_expiration.as_ref(),
        config.default_scope.as_ref().to_string(),
    ));

    let provisioning = Arc::new(ClientProvisioningService::new(
        oauth_storage.clone(),
        *config.client_secret_hash_cost.as_ref(),
    ));

    // Every known principal gets a client before the server starts
    // accepting requests
    let created = provisioning.provision_known_principals().await?;
    tracing::info!(created, "client provisioning pass complete");

    let app_context = AppState {
        config: Arc::new(config.clone()),
        oauth_storage,
        auth_server,
        token_codec,
        tool_documents: Arc::new(StaticToolDocumentProvider),
    };

    // Build the router
    let app = build_router(app_context);

    // Setup graceful shutdown
    let tracker = TaskTracker::new();
    let token = CancellationToken::new();

    {
        let tracker = tracker.clone();
        let inner_token = token.clone();

        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::spawn(async move {
            tokio::select! {
                () = inner_token.cancelled() => { },
                _ = terminate => {},
                _ = ctrl_c => {},
            }

            tracker.close();
            inner_token.cancel();
        });
    }

    // Start HTTP server
    {
        let inner_config = config.clone();
        let http_port = *inner_config.http_port.as_ref();
        let inner_token = token.clone();
        tracker.spawn(async move {
            let bind_address = format!("0.0.0.0:{http_port}");
            tracing::info!("Starting server on {bind_address}");
            let listener = match TcpListener::bind(&bind_address).await {
                Ok(listener) => listener,
                Err(err) => {
                    tracing::error!("failed to bind {bind_address}: {err}");
                    inner_token.cancel();
                    return;
                }
            };

            let shutdown_token = inner_token.clone();
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    tokio::select! {
                        () = shutdown_token.cancelled() => { }
                    }
                    tracing::info!("axum graceful shutdown complete");
                })
                .await;
            if let Err(err) = result {
                tracing::error!("axum task failed: {}", err);
            }

            inner_token.cancel();
        });
    }

    tracker.wait().await;

    Ok(())
}
