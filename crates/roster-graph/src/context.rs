//! Per-call deadline and cancellation.

use std::future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::client::GraphError;

/// Caller-owned limits threaded through every graph operation.
///
/// The default context never expires and cannot be cancelled.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Handle that cancels every context cloned from the one it was created with.
#[derive(Debug)]
pub struct Canceller {
    tx: watch::Sender<bool>,
}

impl Canceller {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CallContext {
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Keeps the earlier of the existing and the new deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    /// Attach a fresh cancellation signal.
    pub fn cancellable(mut self) -> (Self, Canceller) {
        let (tx, rx) = watch::channel(false);
        self.cancel = Some(rx);
        (self, Canceller { tx })
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fails if the context has already been cancelled or has expired.
    pub fn check(&self) -> Result<(), GraphError> {
        if self.cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Err(GraphError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(GraphError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Resolves with the reason once the context is cancelled or expires.
    /// Never resolves for a background context.
    pub async fn done(&self) -> GraphError {
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => future::pending().await,
            }
        };
        let cancelled = async {
            match &self.cancel {
                Some(rx) => {
                    let mut rx = rx.clone();
                    let fired = rx.wait_for(|cancelled| *cancelled).await.is_ok();
                    // A dropped Canceller can never fire.
                    if !fired {
                        future::pending::<()>().await;
                    }
                }
                None => future::pending().await,
            }
        };

        tokio::select! {
            _ = cancelled => GraphError::Cancelled,
            _ = expired => GraphError::DeadlineExceeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_context_is_live() {
        assert!(CallContext::background().check().is_ok());
    }

    #[test]
    fn earlier_deadline_wins() {
        let now = Instant::now();
        let ctx = CallContext::background()
            .with_deadline(now + Duration::from_secs(5))
            .with_deadline(now + Duration::from_secs(60));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(5)));
    }

    #[test]
    fn cancel_is_visible_to_clones() {
        let (ctx, canceller) = CallContext::background().cancellable();
        let clone = ctx.clone();
        canceller.cancel();
        assert!(matches!(ctx.check(), Err(GraphError::Cancelled)));
        assert!(matches!(clone.check(), Err(GraphError::Cancelled)));
    }

    #[tokio::test]
    async fn done_reports_deadline() {
        let ctx = CallContext::background().with_timeout(Duration::from_millis(50));
        assert!(matches!(ctx.done().await, GraphError::DeadlineExceeded));
        assert!(matches!(ctx.check(), Err(GraphError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn done_reports_cancellation() {
        let (ctx, canceller) = CallContext::background().cancellable();
        let waiter = tokio::spawn(async move { ctx.done().await });
        canceller.cancel();
        assert!(matches!(waiter.await.unwrap(), GraphError::Cancelled));
    }
}
