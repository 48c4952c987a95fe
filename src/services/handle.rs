//! Future-style handles for submitted operations

use log::error;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;

use crate::models::{CheckResult, ResetResult, UploadResult, UploadStage};

/// Result records that can stand in for an operation that never ran to
/// completion (pool shut down, worker panicked)
pub trait OperationOutcome: Send + 'static {
    fn failed(error: String) -> Self;
}

impl OperationOutcome for CheckResult {
    fn failed(error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new()
        }
    }
}

impl OperationOutcome for ResetResult {
    fn failed(error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new()
        }
    }
}

impl OperationOutcome for UploadResult {
    fn failed(error: String) -> Self {
        Self {
            error: Some(error),
            stage: UploadStage::Error,
            ..Self::new()
        }
    }
}

enum HandleState<T> {
    Ready(Option<T>),
    Running(JoinHandle<T>),
}

/// Resolves exactly once with the operation's result record.
///
/// Dropping the handle does not cancel the operation.
pub struct OperationHandle<T> {
    state: HandleState<T>,
}

impl<T: OperationOutcome> OperationHandle<T> {
    pub(crate) fn ready(result: T) -> Self {
        Self {
            state: HandleState::Ready(Some(result)),
        }
    }

    pub(crate) fn spawned(handle: JoinHandle<T>) -> Self {
        Self {
            state: HandleState::Running(handle),
        }
    }

    pub fn is_finished(&self) -> bool {
        match &self.state {
            HandleState::Ready(_) => true,
            HandleState::Running(handle) => handle.is_finished(),
        }
    }
}

impl<T: OperationOutcome + Unpin> Future for OperationHandle<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let this = self.get_mut();
        match &mut this.state {
            HandleState::Ready(result) => Poll::Ready(
                result
                    .take()
                    .unwrap_or_else(|| T::failed("operation result already taken".to_string())),
            ),
            HandleState::Running(handle) => match Pin::new(handle).poll(cx) {
                Poll::Ready(Ok(result)) => Poll::Ready(result),
                Poll::Ready(Err(e)) => {
                    error!("Operation task failed: {}", e);
                    Poll::Ready(T::failed(format!("operation task failed: {}", e)))
                }
                Poll::Pending => Poll::Pending,
            },
        }
    }
}
