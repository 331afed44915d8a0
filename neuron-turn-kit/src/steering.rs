//! Cooperative cancellation for a turn's dispatch loop.
//!
//! The invoker checks this before every tool/model call. Once cancellation
//! is requested, in-flight work gets a grace window to finish; anything that
//! doesn't make it is abandoned and its result discarded — the turn's final
//! response still gets published.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// A cheaply-cloneable cancellation flag shared across a turn's tasks.
#[derive(Clone, Default)]
pub struct SteeringToken {
    cancelled: Arc<AtomicBool>,
}

impl SteeringToken {
    /// Create a fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Run `fut` to completion if cancellation hasn't been requested.
    /// Otherwise, give it `grace` to finish anyway before abandoning it —
    /// an abandoned future's result is discarded, returning `None`.
    pub async fn run_with_grace<F, T>(&self, grace: Duration, fut: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        if !self.is_cancelled() {
            return Some(fut.await);
        }
        timeout(grace, fut).await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn uncancelled_token_runs_to_completion() {
        let token = SteeringToken::new();
        let result = token
            .run_with_grace(Duration::from_millis(10), async { 42 })
            .await;
        assert_eq!(result, Some(42));
    }

    #[tokio::test]
    async fn cancelled_token_abandons_slow_work_after_grace() {
        let token = SteeringToken::new();
        token.cancel();
        let result = token
            .run_with_grace(Duration::from_millis(5), async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                1
            })
            .await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn cancelled_token_still_returns_work_that_finishes_within_grace() {
        let token = SteeringToken::new();
        token.cancel();
        let result = token
            .run_with_grace(Duration::from_millis(50), async { 7 })
            .await;
        assert_eq!(result, Some(7));
    }

    #[test]
    fn cancel_is_idempotent_and_visible_across_clones() {
        let token = SteeringToken::new();
        let clone = token.clone();
        clone.cancel();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
