//! Graceful shutdown signal shared by the accept loop and every
//! connection task.
//!
//! The teacher's daemon module tracks shutdown with a process-wide
//! `AtomicBool` plus a re-exec dance for restartable services; this
//! server has no restart-on-reload requirement, so only the flag idea
//! survives, backed by a `watch` channel rather than a poll loop so a
//! late subscriber never misses a shutdown that already happened.

use tokio::sync::watch;

#[derive(Clone)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx, rx }
    }

    pub fn requested(&self) -> bool {
        *self.rx.borrow()
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    /// Resolves once `trigger()` has been called, including if it was
    /// called before this `wait()`.
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        if *rx.borrow() {
            return;
        }
        let _ = rx.changed().await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
