//! One-shot mutation lifecycle tracking
//!
//! A [`MutationRunner`] wraps a non-cached operation with explicit
//! idle/pending/success/error states for the caller to render. Nothing is
//! cached across invocations; each `invoke` performs exactly one
//! underlying call, and re-invoking from any settled state starts over.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::transport::ApiError;

/// Coarse lifecycle of the most recent invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Idle,
    Pending,
    Success,
    Error,
}

/// Snapshot exposed to the presentation layer
#[derive(Debug, Clone)]
pub struct MutationView<T> {
    pub status: MutationStatus,
    pub data: Option<T>,
    pub error: Option<Arc<ApiError>>,
}

enum State<T> {
    Idle,
    Pending,
    Success(T),
    Error(Arc<ApiError>),
}

struct Inner<T> {
    state: State<T>,
    /// Counts invocations so a superseded call cannot overwrite the
    /// status reported for a newer one
    generation: u64,
}

/// Stateful wrapper around a fire-and-forget operation
///
/// Cloning shares the tracked state, the way a UI holds one runner per
/// widget while handlers run elsewhere.
pub struct MutationRunner<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for MutationRunner<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for MutationRunner<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MutationRunner<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: State::Idle,
                generation: 0,
            })),
        }
    }
}

impl<T: Clone> MutationRunner<T> {
    /// Runs `op`, tracking pending and the settled outcome
    ///
    /// The result is always returned to the caller. If a newer `invoke`
    /// started while this one was in flight, the newer one owns the
    /// reported status and this settlement is not recorded.
    pub async fn invoke<F, Fut>(&self, op: F) -> Result<T, Arc<ApiError>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let generation = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            inner.state = State::Pending;
            inner.generation
        };

        let result = op().await.map_err(Arc::new);

        let mut inner = self.inner.lock();
        if inner.generation == generation {
            inner.state = match &result {
                Ok(value) => State::Success(value.clone()),
                Err(error) => State::Error(error.clone()),
            };
        }
        result
    }

    /// Current lifecycle snapshot
    pub fn snapshot(&self) -> MutationView<T> {
        let inner = self.inner.lock();
        match &inner.state {
            State::Idle => MutationView {
                status: MutationStatus::Idle,
                data: None,
                error: None,
            },
            State::Pending => MutationView {
                status: MutationStatus::Pending,
                data: None,
                error: None,
            },
            State::Success(value) => MutationView {
                status: MutationStatus::Success,
                data: Some(value.clone()),
                error: None,
            },
            State::Error(error) => MutationView {
                status: MutationStatus::Error,
                data: None,
                error: Some(error.clone()),
            },
        }
    }

    pub fn status(&self) -> MutationStatus {
        self.snapshot().status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Duration;

    fn fetch_error() -> ApiError {
        ApiError::Fetch {
            endpoint: "insight",
            reason: "Bad Gateway".to_string(),
        }
    }

    #[test]
    fn test_starts_idle() {
        let runner: MutationRunner<String> = MutationRunner::new();
        assert_eq!(runner.status(), MutationStatus::Idle);
        let view = runner.snapshot();
        assert!(view.data.is_none() && view.error.is_none());
    }

    #[tokio::test]
    async fn test_success_flow() {
        let runner: MutationRunner<String> = MutationRunner::new();

        let result = runner
            .invoke(|| async { Ok("insight text".to_string()) })
            .await;

        assert_eq!(result.expect("invocation succeeds"), "insight text");
        let view = runner.snapshot();
        assert_eq!(view.status, MutationStatus::Success);
        assert_eq!(view.data.as_deref(), Some("insight text"));
    }

    #[tokio::test]
    async fn test_error_flow_keeps_error_visible() {
        let runner: MutationRunner<String> = MutationRunner::new();

        let result = runner.invoke(|| async { Err(fetch_error()) }).await;

        assert!(result.is_err());
        let view = runner.snapshot();
        assert_eq!(view.status, MutationStatus::Error);
        assert!(view.error.expect("error retained").to_string().contains("insight"));
    }

    #[tokio::test]
    async fn test_reinvoke_from_terminal_state_restarts_lifecycle() {
        let runner: MutationRunner<String> = MutationRunner::new();

        runner.invoke(|| async { Err(fetch_error()) }).await.ok();
        assert_eq!(runner.status(), MutationStatus::Error);

        let result = runner.invoke(|| async { Ok("second".to_string()) }).await;
        assert_eq!(result.expect("second invocation succeeds"), "second");
        assert_eq!(runner.status(), MutationStatus::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_while_in_flight() {
        let runner: MutationRunner<String> = MutationRunner::new();

        let task = {
            let runner = runner.clone();
            tokio::spawn(async move {
                runner
                    .invoke(|| async {
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        Ok("done".to_string())
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;

        assert_eq!(runner.status(), MutationStatus::Pending);

        task.await.expect("task completes").expect("invocation succeeds");
        assert_eq!(runner.status(), MutationStatus::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_invocation_does_not_overwrite_newer_status() {
        let runner: MutationRunner<String> = MutationRunner::new();

        // Slow first invocation...
        let slow = {
            let runner = runner.clone();
            tokio::spawn(async move {
                runner
                    .invoke(|| async {
                        tokio::time::sleep(Duration::from_secs(10)).await;
                        Ok("old".to_string())
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;

        // ...superseded by a fast second one.
        let result = runner
            .invoke(|| async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok("new".to_string())
            })
            .await;
        assert_eq!(result.expect("fast invocation succeeds"), "new");

        // The slow call still resolves for its own caller, but the
        // reported state belongs to the newer invocation.
        let old = slow.await.expect("task completes").expect("slow invocation resolves");
        assert_eq!(old, "old");
        let view = runner.snapshot();
        assert_eq!(view.status, MutationStatus::Success);
        assert_eq!(view.data.as_deref(), Some("new"));
    }
}
