//! Deferred values: a future settled exactly once from the outside.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use serde_json::Value;
use tokio::sync::oneshot;

use crate::errors::Failure;

/// Result a request future settles with.
pub type SettleResult = Result<Value, Failure>;

/// Create a settler/future pair.
///
/// The settler side is handed to whoever interprets the completion event;
/// the future side is exposed to the caller awaiting the request.
pub fn deferred() -> (Settler, SettledFuture) {
    let (sender, receiver) = oneshot::channel();
    (
        Settler {
            sender: Arc::new(Mutex::new(Some(sender))),
        },
        SettledFuture {
            state: ReceiverState::Waiting(receiver),
        },
    )
}

/// Resolve/reject half of a deferred value.
///
/// Cloneable; the first `resolve` or `reject` across all clones wins and
/// every later call is a no-op.
#[derive(Clone)]
pub struct Settler {
    sender: Arc<Mutex<Option<oneshot::Sender<SettleResult>>>>,
}

impl Settler {
    /// Resolve the deferred value. No-op if already settled.
    pub fn resolve(&self, value: Value) {
        self.settle(Ok(value));
    }

    /// Reject the deferred value. No-op if already settled.
    pub fn reject(&self, failure: Failure) {
        self.settle(Err(failure));
    }

    /// Whether the deferred value has been settled.
    pub fn is_settled(&self) -> bool {
        self.sender
            .lock()
            .map(|sender| sender.is_none())
            .unwrap_or(true)
    }

    fn settle(&self, result: SettleResult) {
        let sender = match self.sender.lock() {
            Ok(mut sender) => sender.take(),
            // A poisoned slot means a settle was already in flight.
            Err(_) => None,
        };
        if let Some(sender) = sender {
            // Send only fails when the future was dropped; the settlement
            // has no observer left in that case.
            let _ = sender.send(result);
        }
    }
}

#[derive(Debug)]
enum ReceiverState {
    /// Settlement still possible.
    Waiting(oneshot::Receiver<SettleResult>),
    /// Every settler was dropped unsettled; the future stays pending.
    Abandoned,
}

/// Future half of a deferred value, yielding the settled result.
///
/// A request whose context never sees a completion leaves this future
/// pending forever; driving timeouts is the transport's responsibility.
#[derive(Debug)]
pub struct SettledFuture {
    state: ReceiverState,
}

impl Future for SettledFuture {
    type Output = SettleResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        let polled = match &mut this.state {
            ReceiverState::Waiting(receiver) => Pin::new(receiver).poll(cx),
            ReceiverState::Abandoned => return Poll::Pending,
        };

        match polled {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_closed)) => {
                this.state = ReceiverState::Abandoned;
                Poll::Pending
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::message_cause;
    use crate::options::NormalizedOptions;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn resolves_with_the_settled_value() {
        let (settler, future) = deferred();
        settler.resolve(json!({"ok": true}));

        let result = future.await;
        assert_eq!(result.expect("resolved"), json!({"ok": true}));
    }

    #[tokio::test]
    async fn rejects_with_the_settled_failure() {
        let (settler, future) = deferred();
        settler.reject(Failure::transport(
            message_cause("connection reset"),
            NormalizedOptions::default(),
            None,
        ));

        let failure = future.await.expect_err("rejected");
        assert_eq!(failure.to_string(), "connection reset");
    }

    #[tokio::test]
    async fn first_settlement_wins() {
        let (settler, future) = deferred();
        settler.resolve(json!("first"));
        settler.reject(Failure::transport(
            message_cause("late"),
            NormalizedOptions::default(),
            None,
        ));
        settler.resolve(json!("third"));

        assert_eq!(future.await.expect("first settlement kept"), json!("first"));
    }

    #[tokio::test]
    async fn clones_share_the_settlement() {
        let (settler, future) = deferred();
        let clone = settler.clone();
        clone.resolve(json!(1));

        assert!(settler.is_settled());
        assert_eq!(future.await.expect("resolved"), json!(1));
    }

    #[tokio::test]
    async fn abandoned_settler_leaves_the_future_pending() {
        let (settler, future) = deferred();
        drop(settler);

        let result = tokio::time::timeout(Duration::from_millis(20), future).await;
        assert!(result.is_err(), "future must stay pending");
    }
}
