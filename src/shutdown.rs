use snapcal::error::{AppResult, Error};
use tokio::sync::oneshot;
use tracing::{error, info};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
#[cfg(windows)]
use tokio::signal::windows::{ctrl_break, ctrl_c};

/// Wait for a termination signal and notify the main task
pub async fn handle_signals(shutdown_send: oneshot::Sender<()>) {
    if let Err(e) = wait_for_signal().await {
        error!("Signal handling failed, shutting down: {:?}", e);
    }

    // Send shutdown signal to main task
    let _ = shutdown_send.send(());
}

fn handler_error(kind: &str, e: std::io::Error) -> Error {
    Error::Other(format!("Failed to create {} signal handler: {}", kind, e))
}

/// Platform-specific signal handling implementation
#[cfg(unix)]
async fn wait_for_signal() -> AppResult<()> {
    let mut sigterm = signal(SignalKind::terminate()).map_err(|e| handler_error("SIGTERM", e))?;
    let mut sigint = signal(SignalKind::interrupt()).map_err(|e| handler_error("SIGINT", e))?;

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT signal, initiating graceful shutdown");
        }
    }
    Ok(())
}

/// Platform-specific signal handling implementation
#[cfg(windows)]
async fn wait_for_signal() -> AppResult<()> {
    let mut ctrlc = ctrl_c().map_err(|e| handler_error("Ctrl+C", e))?;
    let mut ctrlbreak = ctrl_break().map_err(|e| handler_error("Ctrl+Break", e))?;

    tokio::select! {
        _ = ctrlc.recv() => {
            info!("Received Ctrl+C signal, initiating graceful shutdown");
        }
        _ = ctrlbreak.recv() => {
            info!("Received Ctrl+Break signal, initiating graceful shutdown");
        }
    }
    Ok(())
}
