//! Cooperative stop signal shared by the poll loop and the refresh timer.

use tokio::sync::watch;

/// Creates a connected stop handle and signal.
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx })
}

/// Owner side: requests a stop.
#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    /// Requests every listener to stop at its next suspension point.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    /// Creates another listener.
    pub fn signal(&self) -> StopSignal {
        StopSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// Listener side.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// Returns true once a stop was requested.
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when a stop is requested.
    ///
    /// If the handle is dropped without stopping, this never resolves.
    pub async fn stopped(&mut self) {
        if self.rx.wait_for(|stopped| *stopped).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_stop_wakes_listeners() {
        let (handle, signal) = stop_channel();
        let mut first = signal.clone();
        let mut second = handle.signal();

        let waiter = tokio::spawn(async move {
            first.stopped().await;
            second.stopped().await;
        });

        assert!(!signal.is_stopped());
        handle.stop();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(signal.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_never_stops() {
        let (handle, mut signal) = stop_channel();
        drop(handle);

        let result = tokio::time::timeout(Duration::from_secs(5), signal.stopped()).await;
        assert!(result.is_err());
    }
}
