//! Async bridge: project a reactive source into a render slot.
//!
//! # Responsibilities
//! - Subscribe to a source the first time it is bound to a slot
//! - Map every emission with `(value, index)` and commit it
//! - Absorb source errors (log, release, keep the last committed value)
//! - Release the subscription on completion or when the slot is detached
//!
//! # Design Decisions
//! - Re-binding the same source instance is a no-op (identity, not value)
//! - Binding a different source releases the previous subscription
//! - Emissions are committed synchronously, in source order

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::observability::metrics;
use crate::render::{RenderSlot, Template};
use crate::stream::{deferred, Deferred, Observer, Resolver, Source, SourceError, SourceId, Subscription};

/// Maps an emission and its sequential index to a template.
pub type Mapper<T> = Arc<dyn Fn(&T, usize) -> Template + Send + Sync>;

/// Lifecycle of a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingStatus {
    /// Never bound.
    Idle,
    /// Subscribed and committing emissions.
    Active,
    /// The source completed.
    Completed,
    /// The source failed; the slot keeps its last value.
    Errored(SourceError),
    /// The slot was detached.
    Detached,
}

struct Bound {
    source: SourceId,
    subscription: Subscription,
    finished: Option<Deferred<(), SourceError>>,
}

/// A render slot driven by a reactive source.
pub struct AsyncBinding {
    slot: RenderSlot,
    status: Arc<Mutex<BindingStatus>>,
    bound: Mutex<Option<Bound>>,
}

impl AsyncBinding {
    pub fn new(slot: RenderSlot) -> Self {
        Self {
            slot,
            status: Arc::new(Mutex::new(BindingStatus::Idle)),
            bound: Mutex::new(None),
        }
    }

    pub fn slot(&self) -> &RenderSlot {
        &self.slot
    }

    pub fn status(&self) -> BindingStatus {
        self.status.lock().expect("binding status mutex poisoned").clone()
    }

    /// Bind a source whose values render as themselves.
    pub fn bind<T, S>(&self, source: &S) -> bool
    where
        T: Clone + Into<Template> + Send + Sync + 'static,
        S: Source<T> + ?Sized,
    {
        self.bind_with(
            source,
            Arc::new(|value: &T, _index: usize| -> Template { value.clone().into() }),
        )
    }

    /// Bind a source through `mapper`.
    ///
    /// Returns false when `source` is the one already bound, in which case
    /// nothing happens.
    pub fn bind_with<T, S>(&self, source: &S, mapper: Mapper<T>) -> bool
    where
        T: Send + Sync + 'static,
        S: Source<T> + ?Sized,
    {
        if self.slot.is_detached() {
            tracing::debug!("bind on detached slot ignored");
            return false;
        }

        let id = source.source_id();
        let mut bound = self.bound.lock().expect("binding mutex poisoned");
        if bound.as_ref().is_some_and(|b| b.source == id) {
            tracing::trace!(source = ?id, "source already bound, skipping resubscription");
            return false;
        }
        // release the previous source before attaching the new one
        bound.take();

        let (resolver, finished) = deferred();
        self.set_status(BindingStatus::Active);
        let observer = Arc::new(BindingObserver {
            slot: self.slot.clone(),
            mapper,
            index: AtomicUsize::new(0),
            status: self.status.clone(),
            resolver,
        });
        let subscription = source.subscribe(observer);

        *bound = Some(Bound {
            source: id,
            subscription,
            finished: Some(finished),
        });
        true
    }

    /// Future that settles when the bound source completes (Ok) or fails
    /// (Err). Can be taken once per binding.
    pub fn finished(&self) -> Option<Deferred<(), SourceError>> {
        self.bound
            .lock()
            .expect("binding mutex poisoned")
            .as_mut()
            .and_then(|b| b.finished.take())
    }

    /// Detach the slot and release the subscription.
    pub fn detach(&self) {
        self.slot.detach();
        if let Some(bound) = self.bound.lock().expect("binding mutex poisoned").take() {
            bound.subscription.unsubscribe();
        }
        self.set_status(BindingStatus::Detached);
    }

    fn set_status(&self, status: BindingStatus) {
        *self.status.lock().expect("binding status mutex poisoned") = status;
    }
}

struct BindingObserver<T> {
    slot: RenderSlot,
    mapper: Mapper<T>,
    index: AtomicUsize,
    status: Arc<Mutex<BindingStatus>>,
    resolver: Resolver<(), SourceError>,
}

impl<T> BindingObserver<T> {
    fn finish(&self, status: BindingStatus) {
        let mut current = self.status.lock().expect("binding status mutex poisoned");
        if *current == BindingStatus::Active {
            *current = status;
        }
    }
}

impl<T: Send + Sync> Observer<T> for BindingObserver<T> {
    fn next(&self, value: &T) {
        let index = self.index.fetch_add(1, Ordering::SeqCst);
        let template = (self.mapper)(value, index);
        self.slot.commit(template.into());
    }

    fn error(&self, error: &SourceError) {
        tracing::error!(error = %error, "async source failed");
        metrics::record_absorbed_error("source");
        self.finish(BindingStatus::Errored(error.clone()));
        self.resolver.reject(error.clone());
    }

    fn complete(&self) {
        tracing::trace!("async source completed");
        self.finish(BindingStatus::Completed);
        self.resolver.resolve(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{BehaviorSubject, DeferredError, Subject};

    #[test]
    fn test_updates_content_when_new_value_arrives() {
        let subject = BehaviorSubject::new("foo".to_string());
        let binding = AsyncBinding::new(RenderSlot::new());
        binding.bind(&subject);

        assert_eq!(binding.slot().current(), Some(Template::text("foo")));
        subject.next("bar".to_string());
        assert_eq!(binding.slot().current(), Some(Template::text("bar")));
    }

    #[test]
    fn test_mapper_receives_sequential_index() {
        let subject = Subject::<&'static str>::new();
        let binding = AsyncBinding::new(RenderSlot::new());
        binding.bind_with(
            &subject,
            Arc::new(|v: &&str, i: usize| Template::text(format!("{i}:{v}"))),
        );

        subject.next("a");
        subject.next("b");
        assert_eq!(binding.slot().current(), Some(Template::text("1:b")));
    }

    #[test]
    fn test_rebinding_same_source_is_noop() {
        let subject = BehaviorSubject::new(1u32);
        let binding = AsyncBinding::new(RenderSlot::new());

        assert!(binding.bind(&subject));
        assert!(!binding.bind(&subject.clone()));
        assert_eq!(subject.observer_count(), 1);
        assert_eq!(binding.slot().commits(), 1);
    }

    #[test]
    fn test_binding_new_source_releases_old() {
        let first = Subject::<u32>::new();
        let second = Subject::<u32>::new();
        let binding = AsyncBinding::new(RenderSlot::new());

        binding.bind(&first);
        binding.bind(&second);

        assert_eq!(first.observer_count(), 0);
        assert_eq!(second.observer_count(), 1);
    }

    #[tokio::test]
    async fn test_error_keeps_last_value() {
        let subject = Subject::<u32>::new();
        let binding = AsyncBinding::new(RenderSlot::new());
        binding.bind(&subject);
        let finished = binding.finished().unwrap();

        subject.next(10);
        subject.error(SourceError::new("boom"));

        assert_eq!(binding.slot().current(), Some(Template::text("10")));
        assert_eq!(binding.status(), BindingStatus::Errored(SourceError::new("boom")));
        assert_eq!(subject.observer_count(), 0);
        assert_eq!(
            finished.await,
            Err(DeferredError::Rejected(SourceError::new("boom")))
        );
    }

    #[tokio::test]
    async fn test_completion_resolves_finished() {
        let subject = Subject::<u32>::new();
        let binding = AsyncBinding::new(RenderSlot::new());
        binding.bind(&subject);
        let finished = binding.finished().unwrap();

        subject.complete();
        assert_eq!(finished.await, Ok(()));
        assert_eq!(binding.status(), BindingStatus::Completed);
    }

    #[test]
    fn test_detach_releases_subscription() {
        let subject = BehaviorSubject::new(1u32);
        let binding = AsyncBinding::new(RenderSlot::new());
        binding.bind(&subject);

        binding.detach();
        subject.next(2);

        assert_eq!(subject.observer_count(), 0);
        assert_eq!(binding.slot().current(), Some(Template::text("1")));
        assert_eq!(binding.status(), BindingStatus::Detached);
    }
}
