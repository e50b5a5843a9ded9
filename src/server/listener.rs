use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{Instrument, info};

use crate::config::Config;
use crate::http::connection::Connection;
use crate::routes::Router;
use crate::store::FileStore;

/// Binds the listening socket. Failure here is fatal for the process.
pub async fn bind(addr: &str) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Accepts connections forever, handling each one on its own task.
///
/// Only returns on an accept error that is not tied to a single peer, such
/// as running out of file descriptors.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    read_timeout: Option<Duration>,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) if is_per_connection_error(&e) => {
                tracing::debug!(error = %e, "Connection dropped before accept");
                continue;
            }
            Err(e) => return Err(e).context("accept failed"),
        };
        info!("Accepted connection from {}", peer);

        let router = router.clone();
        tokio::spawn(
            async move {
                let mut conn = Connection::new(socket, router, read_timeout);
                if let Err(e) = conn.run().await {
                    tracing::warn!("Connection error from {}: {}", peer, e);
                }
            }
            .instrument(tracing::info_span!("conn", %peer)),
        );
    }
}

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    match &cfg.directory {
        Some(dir) => info!("Serving files from {}", dir.display()),
        None => info!("No --directory given, /files/ routes are disabled"),
    }
    let store = Arc::new(FileStore::new(cfg.directory.clone()));

    let listener = bind(&cfg.listen_addr).await?;
    serve(listener, Router::new(store), cfg.read_timeout()).await
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

fn is_per_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
    )
}
