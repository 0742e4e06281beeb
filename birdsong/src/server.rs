//! Server lifecycle management
//!
//! Runs the upstream supervisor and the HTTP server side by side. Losing the
//! upstream stream never stops the HTTP server; only a shutdown signal does.

use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use birdsong_api::{create_router, AppState};
use birdsong_core::Config;
use birdsong_ingest::{StreamSupervisor, SupervisorExit};
use birdsong_relay::BroadcastRelay;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct BirdsongServer {
    config: Config,
    relay: BroadcastRelay,
    supervisor: StreamSupervisor,
}

impl BirdsongServer {
    pub const fn new(config: Config, relay: BroadcastRelay, supervisor: StreamSupervisor) -> Self {
        Self {
            config,
            relay,
            supervisor,
        }
    }

    /// Start all components and wait for a shutdown signal
    pub async fn start(self) -> anyhow::Result<()> {
        let Self {
            config,
            relay,
            supervisor,
        } = self;
        let shutdown = CancellationToken::new();

        // Bind first so a taken port fails before the upstream is contacted
        let mut http_handle = start_http_server(&config, relay.clone(), shutdown.clone()).await?;
        let ingest_handle = start_ingest(supervisor, shutdown.clone());

        info!("All components started successfully");

        tokio::select! {
            result = &mut http_handle => {
                error!("HTTP server stopped unexpectedly");
                shutdown.cancel();
                let _ = ingest_handle.await;
                return Err(http_exit_error(result));
            }
            () = shutdown_signal() => {
                info!("Shutdown signal received, starting graceful shutdown...");
            }
        }

        shutdown.cancel();

        info!(
            live_sessions = relay.session_count(),
            "Waiting for HTTP server to finish"
        );
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut http_handle)
            .await
            .is_err()
        {
            warn!("HTTP server did not shut down within {:?}", SHUTDOWN_TIMEOUT);
        }
        let _ = ingest_handle.await;

        info!("Birdsong shut down");
        Ok(())
    }
}

/// The HTTP task only ends on its own after a failure, even when it joined cleanly
fn http_exit_error(result: Result<(), JoinError>) -> anyhow::Error {
    match result {
        Ok(()) => anyhow::anyhow!("HTTP server stopped unexpectedly"),
        Err(e) => anyhow::anyhow!("HTTP server task failed: {e}"),
    }
}

fn start_ingest(supervisor: StreamSupervisor, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        match supervisor.run(shutdown).await {
            SupervisorExit::Shutdown => info!("Upstream ingestion stopped"),
            SupervisorExit::GaveUp { attempts } => error!(
                attempts,
                "Upstream stream unavailable; serving viewers without new events"
            ),
        }
    })
}

async fn start_http_server(
    config: &Config,
    relay: BroadcastRelay,
    shutdown: CancellationToken,
) -> anyhow::Result<JoinHandle<()>> {
    let http_address = config.http_address();
    let router = create_router(AppState::new(relay, config.server.clone()));

    let listener = tokio::net::TcpListener::bind(&http_address)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP address {http_address}: {e}"))?;
    info!("HTTP server listening on {}", http_address);

    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
        {
            error!("HTTP server error: {}", e);
        }

        info!("HTTP server shut down gracefully");
    }))
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("Received Ctrl+C"); }
        () = terminate => { info!("Received SIGTERM"); }
    }
}
