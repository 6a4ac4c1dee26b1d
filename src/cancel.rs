//! Cooperative cancellation for in-flight exchanges.
//!
//! One pair per outstanding request: the shell hands the [`CancelToken`]
//! to the network layer and keeps the [`CancelHandle`]. Signalling the
//! handle (stop command, Ctrl-C) makes the pending await resolve with
//! `ChatError::Cancelled` instead of a transport error. There is no
//! implicit timeout; cancellation is always an explicit user action.

use tokio::sync::watch;

/// Sender half. Held by whoever owns the "stop" control.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signal cancellation. Idempotent; safe after the request resolved.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiver half. Passed into the network call.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the paired handle signals. Never resolves if the
    /// handle is dropped without cancelling, so select against the
    /// actual request future.
    pub async fn cancelled(&mut self) {
        if *self.rx.borrow() {
            return;
        }
        loop {
            if self.rx.changed().await.is_err() {
                // Handle dropped uncancelled: park forever, the request
                // future wins the select.
                futures::future::pending::<()>().await;
            }
            if *self.rx.borrow() {
                return;
            }
        }
    }

    /// A token that can never be cancelled, for one-shot CLI calls.
    pub fn detached() -> Self {
        cancel_pair().1
    }
}

/// Create a linked handle/token pair.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

#[cfg(test)]
mod tests {
    use super::cancel_pair;

    #[tokio::test]
    async fn token_observes_cancel() {
        let (handle, mut token) = cancel_pair();
        assert!(!token.is_cancelled());
        handle.cancel();
        token.cancelled().await;
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let (handle, token) = cancel_pair();
        handle.cancel();
        handle.cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn detached_token_never_fires() {
        let mut token = super::CancelToken::detached();
        let raced = tokio::select! {
            _ = token.cancelled() => true,
            _ = tokio::time::sleep(std::time::Duration::from_millis(20)) => false,
        };
        assert!(!raced);
    }
}
