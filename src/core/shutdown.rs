//! # Termination signals.
//!
//! [`wait_for_shutdown_signal`] completes on the first of:
//! - Unix: `SIGINT`, `SIGTERM` (what the cluster sends on pod eviction), `SIGQUIT`
//! - elsewhere: Ctrl-C

/// Resolves when the process is asked to terminate.
///
/// Listeners are installed per call. Errors only if a listener cannot be installed.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = interrupt.recv() => {},
        _ = terminate.recv() => {},
        _ = quit.recv() => {},
    }
    Ok(())
}

/// Resolves when the process is asked to terminate.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
