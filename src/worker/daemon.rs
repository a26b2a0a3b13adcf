//! # Daemon-mode capability.
//!
//! [`Daemon`] is a tiny container-managed service holding two atomic flags:
//!
//! - the plain **daemon** flag, settable and clearable at runtime;
//! - the **webserver** flag, set once by a service offering a long-running
//!   external-facing server; it implies daemon mode and is never cleared.
//!
//! Any service may inject `Dep<Daemon>` and flip the flags before or during
//! its own start; the [`Worker`](crate::Worker) reads [`Daemon::is_daemon`]
//! when its run phase begins to pick between a single drain pass and the
//! continuous background loop. A queued task may clear the daemon flag to
//! request that loop's eventual termination.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::kernel::Service;

/// Shared daemon/webserver mode flags.
#[derive(Debug, Default)]
pub struct Daemon {
    daemon: AtomicBool,
    webserver: AtomicBool,
}

impl Daemon {
    /// Requests continuous background draining.
    pub fn set_daemon(&self) {
        self.daemon.store(true, Ordering::SeqCst);
    }

    /// Withdraws the daemon request; the drain loop exits after its current
    /// pass unless the webserver flag is set.
    pub fn clear_daemon(&self) {
        self.daemon.store(false, Ordering::SeqCst);
    }

    /// True when either the daemon or the webserver flag is set.
    pub fn is_daemon(&self) -> bool {
        self.webserver.load(Ordering::SeqCst) || self.daemon.load(Ordering::SeqCst)
    }

    /// Marks the process as hosting a long-running server; implies daemon
    /// mode.
    pub fn set_webserver(&self) {
        self.webserver.store(true, Ordering::SeqCst);
    }

    /// True when a long-running server declared itself.
    pub fn is_webserver(&self) -> bool {
        self.webserver.load(Ordering::SeqCst)
    }
}

impl Service for Daemon {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daemon_flag_toggles() {
        let d = Daemon::default();
        assert!(!d.is_daemon());
        d.set_daemon();
        assert!(d.is_daemon());
        d.clear_daemon();
        assert!(!d.is_daemon());
    }

    #[test]
    fn test_webserver_implies_daemon() {
        let d = Daemon::default();
        d.set_webserver();
        assert!(d.is_webserver());
        assert!(d.is_daemon());
        // clearing the daemon flag does not override a webserver
        d.clear_daemon();
        assert!(d.is_daemon());
    }
}
