//! Reactive stream subsystem.
//!
//! # Data Flow
//! ```text
//! Producer (router state, widget, test)
//!     → subject.rs (multicast: next / error / complete)
//!     → behavior.rs (same, plus replay of the latest value)
//!     → Observer callbacks, synchronously, in subscription order
//!
//! Consumer side:
//!     Source::subscribe(observer) → Subscription (RAII handle)
//!     deferred.rs bridges a single push into an awaitable future
//! ```
//!
//! # Design Decisions
//! - Streams are "current value + listener set", no operator library
//! - Emission snapshots the listener set, so observers may re-enter
//! - A subscriber joins the set before its replay is delivered
//! - Terminal events (error/complete) drop every listener
//! - Source identity is the identity of the shared state, not the value

pub mod behavior;
pub mod deferred;
pub mod subject;
pub mod subscription;

use std::sync::Arc;
use thiserror::Error;

pub use behavior::BehaviorSubject;
pub use deferred::{deferred, Deferred, DeferredError, Resolver};
pub use subject::Subject;
pub use subscription::Subscription;

/// Error carried by a failing source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SourceError(pub String);

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Receives values pushed by a [`Source`].
pub trait Observer<T>: Send + Sync {
    /// Called for every emitted value.
    fn next(&self, value: &T);

    /// Called once if the source fails. No further calls follow.
    fn error(&self, _error: &SourceError) {}

    /// Called once when the source finishes. No further calls follow.
    fn complete(&self) {}
}

impl<T, F> Observer<T> for F
where
    F: Fn(&T) + Send + Sync,
{
    fn next(&self, value: &T) {
        self(value)
    }
}

/// Stable identity of a source, used to detect re-association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(usize);

impl SourceId {
    pub(crate) fn of<T: ?Sized>(shared: &Arc<T>) -> Self {
        Self(Arc::as_ptr(shared) as *const () as usize)
    }
}

/// A push-based source of values.
pub trait Source<T>: Send + Sync {
    /// Attach an observer. The returned handle detaches it when dropped.
    fn subscribe(&self, observer: Arc<dyn Observer<T>>) -> Subscription;

    /// Identity of the underlying stream; clones of a handle share it.
    fn source_id(&self) -> SourceId;
}

type NextFn<T> = Box<dyn Fn(&T) + Send + Sync>;
type ErrorFn = Box<dyn Fn(&SourceError) + Send + Sync>;
type CompleteFn = Box<dyn Fn() + Send + Sync>;

/// Observer assembled from closures.
pub struct CallbackObserver<T> {
    on_next: NextFn<T>,
    on_error: Option<ErrorFn>,
    on_complete: Option<CompleteFn>,
}

impl<T> CallbackObserver<T> {
    pub fn new(on_next: impl Fn(&T) + Send + Sync + 'static) -> Self {
        Self {
            on_next: Box::new(on_next),
            on_error: None,
            on_complete: None,
        }
    }

    pub fn on_error(mut self, f: impl Fn(&SourceError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }
}

impl<T> Observer<T> for CallbackObserver<T> {
    fn next(&self, value: &T) {
        (self.on_next)(value)
    }

    fn error(&self, error: &SourceError) {
        if let Some(f) = &self.on_error {
            f(error);
        }
    }

    fn complete(&self) {
        if let Some(f) = &self.on_complete {
            f();
        }
    }
}

/// Adapt a callback-style event handler into pushes on an observer.
///
/// With a mapper every event is converted before being pushed; without one
/// the event is forwarded as-is (see [`event_forwarder`]).
pub fn event_to_observer<E, T, M>(observer: Arc<dyn Observer<T>>, mapper: M) -> impl Fn(E) + Send + Sync
where
    T: 'static,
    M: Fn(E) -> T + Send + Sync + 'static,
{
    move |event| observer.next(&mapper(event))
}

/// [`event_to_observer`] without a mapper.
pub fn event_forwarder<T: 'static>(observer: Arc<dyn Observer<T>>) -> impl Fn(T) + Send + Sync {
    move |event| observer.next(&event)
}
