//! Single-resolution deferred values.
//!
//! A [`Resolver`] is handed to push-based code (observer callbacks); the
//! paired [`Deferred`] is awaited by pull-based code. The first `resolve` or
//! `reject` wins, later calls are ignored.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::sync::oneshot;

use crate::stream::SourceError;

/// Why a deferred value did not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeferredError<E> {
    #[error("deferred value rejected: {0}")]
    Rejected(E),

    /// Every resolver was dropped without settling.
    #[error("deferred value abandoned")]
    Abandoned,
}

type Slot<T, E> = Arc<Mutex<Option<oneshot::Sender<Result<T, E>>>>>;

/// Settling side of a deferred value. Cheap to clone.
pub struct Resolver<T, E = SourceError> {
    sender: Slot<T, E>,
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T, E> Resolver<T, E> {
    /// Settle with a value. Returns false if already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settle with an error. Returns false if already settled.
    pub fn reject(&self, error: E) -> bool {
        self.settle(Err(error))
    }

    pub fn is_settled(&self) -> bool {
        self.sender
            .lock()
            .expect("deferred resolver mutex poisoned")
            .is_none()
    }

    fn settle(&self, outcome: Result<T, E>) -> bool {
        let sender = self
            .sender
            .lock()
            .expect("deferred resolver mutex poisoned")
            .take();
        match sender {
            // the waiting side may already be gone; settling still counts
            Some(tx) => {
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }
}

/// Awaitable side of a deferred value.
pub struct Deferred<T, E = SourceError> {
    receiver: oneshot::Receiver<Result<T, E>>,
}

/// Create a connected resolver / deferred pair.
pub fn deferred<T, E>() -> (Resolver<T, E>, Deferred<T, E>) {
    let (tx, rx) = oneshot::channel();
    (
        Resolver {
            sender: Arc::new(Mutex::new(Some(tx))),
        },
        Deferred { receiver: rx },
    )
}

impl<T, E> Future for Deferred<T, E> {
    type Output = Result<T, DeferredError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(Ok(value))) => Poll::Ready(Ok(value)),
            Poll::Ready(Ok(Err(error))) => Poll::Ready(Err(DeferredError::Rejected(error))),
            Poll::Ready(Err(_)) => Poll::Ready(Err(DeferredError::Abandoned)),
            Poll::Pending => Poll::Pending,
        }
    }
}
