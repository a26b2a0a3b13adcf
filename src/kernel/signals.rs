//! Termination-signal handling for the launch sequence.
//!
//! [`wait_for_shutdown_signal`] completes when the process receives a
//! termination signal; the kernel then runs the stop sequence and exits.
//!
//! ## Unix
//! Handled signals:
//! - **SIGINT** (Ctrl-C in a terminal)
//! - **SIGTERM** (default kill signal, used by systemd/Kubernetes)
//! - **SIGQUIT** (hard-stop signal)
//!
//! [`tokio::signal::ctrl_c`] is awaited as a fallback.
//!
//! ## Other platforms
//! Only [`tokio::signal::ctrl_c`] is awaited.

#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
