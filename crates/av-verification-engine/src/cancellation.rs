//! Cooperative cancellation for verifications and batches.
//!
//! A [`Cancellation`] wraps a `watch::Receiver<bool>`; the paired
//! [`CancellationHandle`] flips it. Every suspension point (gateway call, retry
//! delay, batch delay) races against the signal and surfaces
//! [`VerificationError::Cancelled`].

use crate::domain::VerificationError;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

/// Sender side of a cancellation signal.
#[derive(Debug)]
pub struct CancellationHandle {
    tx: watch::Sender<bool>,
}

impl CancellationHandle {
    /// Cancel every operation observing the paired signal.
    pub fn cancel(&self) {
        // Receivers may all be gone; nothing left to cancel then.
        let _ = self.tx.send(true);
    }
}

/// Receiver side of a cancellation signal.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    rx: Option<watch::Receiver<bool>>,
}

impl Cancellation {
    /// Create a linked handle and signal.
    pub fn new() -> (CancellationHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (CancellationHandle { tx }, Self { rx: Some(rx) })
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once cancellation is requested. Pending forever otherwise.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending::<()>().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Handle dropped without cancelling.
                return std::future::pending::<()>().await;
            }
        }
    }

    /// Drive `fut` unless cancellation wins first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, VerificationError>
    where
        F: Future<Output = Result<T, VerificationError>>,
    {
        if self.is_cancelled() {
            return Err(VerificationError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(VerificationError::Cancelled),
            result = fut => result,
        }
    }

    /// Sleep for `delay` unless cancelled.
    pub async fn sleep(&self, delay: Duration) -> Result<(), VerificationError> {
        self.run(async {
            tokio::time::sleep(delay).await;
            Ok(())
        })
        .await
    }
}
