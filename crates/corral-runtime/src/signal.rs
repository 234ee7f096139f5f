//! Cooperative stop signals.
//!
//! A [`StopHandle`] raises the signal once; any number of cloned
//! [`StopSignal`]s observe it. Raising is synchronous so it can be done
//! from a signal handler or from under a lock.

use tokio::sync::watch;

/// Creates a connected handle/signal pair.
#[must_use]
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx })
}

/// Sending half of a stop signal.
#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    /// Raises the signal. Idempotent.
    pub fn request(&self) {
        let _ = self.tx.send_replace(true);
    }

    /// Returns whether the signal was already raised.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        *self.tx.borrow()
    }

    /// Returns a new receiver observing this handle.
    #[must_use]
    pub fn signal(&self) -> StopSignal {
        StopSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// Receiving half of a stop signal.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// Returns whether a stop has been requested.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once a stop has been requested.
    ///
    /// If the handle is dropped without raising the signal this never
    /// resolves, so it is safe to use as a `select!` branch.
    pub async fn requested(&mut self) {
        let closed = self.rx.wait_for(|stop| *stop).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn request_is_visible_to_every_signal() {
        let (handle, signal) = stop_channel();
        let late = handle.signal();
        assert!(!signal.is_requested());

        handle.request();
        handle.request();

        assert!(handle.is_requested());
        assert!(signal.is_requested());
        assert!(late.is_requested());
    }

    #[tokio::test]
    async fn requested_wakes_waiter() {
        let (handle, mut signal) = stop_channel();
        let waiter = tokio::spawn(async move { signal.requested().await });
        handle.request();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter woke")
            .expect("waiter joined");
    }

    #[tokio::test]
    async fn dropped_handle_never_fires() {
        let (handle, mut signal) = stop_channel();
        drop(handle);
        let waited = tokio::time::timeout(Duration::from_millis(20), signal.requested()).await;
        assert!(waited.is_err());
    }
}
