//! Replay-latest subject.
//!
//! # Responsibilities
//! - Keep the most recent value
//! - Hand it to every new subscriber before any later value
//! - Multicast subsequent values like a plain subject
//!
//! # Design Decisions
//! - The latest value is updated before listeners run, so an observer that
//!   reads `value()` during emission sees the value being delivered
//! - A completed subject replays only its terminal event, never the value

use std::sync::{Arc, Mutex};

use crate::stream::subject::{Multicast, Terminal};
use crate::stream::{Observer, Source, SourceError, SourceId, Subscription};

struct Inner<T> {
    latest: Mutex<T>,
    listeners: Arc<Multicast<T>>,
}

/// A multicast stream that always holds a current value.
pub struct BehaviorSubject<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for BehaviorSubject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> std::fmt::Debug for BehaviorSubject<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorSubject")
            .field("latest", &*self.inner.latest.lock().expect("latest value mutex poisoned"))
            .finish()
    }
}

impl<T> BehaviorSubject<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a subject seeded with `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                latest: Mutex::new(initial),
                listeners: Multicast::new(),
            }),
        }
    }

    /// The most recent value.
    pub fn value(&self) -> T {
        self.inner
            .latest
            .lock()
            .expect("latest value mutex poisoned")
            .clone()
    }

    /// Store `value` as the latest and push it to every subscriber.
    pub fn next(&self, value: T) {
        if self.inner.listeners.is_terminated() {
            tracing::trace!("value pushed to terminated behavior subject ignored");
            return;
        }
        *self.inner.latest.lock().expect("latest value mutex poisoned") = value.clone();
        self.inner.listeners.emit(&value);
    }

    pub fn error(&self, error: SourceError) {
        self.inner.listeners.terminate(Terminal::Errored(error));
    }

    pub fn complete(&self) {
        self.inner.listeners.terminate(Terminal::Completed);
    }

    pub fn subscribe_fn(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.subscribe(Arc::new(f))
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.listeners.is_terminated()
    }

    pub fn observer_count(&self) -> usize {
        self.inner.listeners.observer_count()
    }
}

impl<T> Source<T> for BehaviorSubject<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn subscribe(&self, observer: Arc<dyn Observer<T>>) -> Subscription {
        let replay = if self.inner.listeners.is_terminated() {
            None
        } else {
            Some(self.value())
        };
        self.inner.listeners.attach(observer, replay)
    }

    fn source_id(&self) -> SourceId {
        SourceId::of(&self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::CallbackObserver;

    #[test]
    fn test_new_subscriber_receives_current_value_first() {
        let subject = BehaviorSubject::new("/".to_string());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = subject.subscribe_fn(move |p: &String| sink.lock().unwrap().push(p.clone()));

        subject.next("/foo".to_string());

        assert_eq!(*seen.lock().unwrap(), vec!["/", "/foo"]);
    }

    #[test]
    fn test_value_pushed_during_replay_reaches_new_subscriber() {
        let subject = BehaviorSubject::new(1u32);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let inner = subject.clone();
        let _sub = subject.subscribe_fn(move |v: &u32| {
            sink.lock().unwrap().push(*v);
            if *v == 1 {
                inner.next(2);
            }
        });

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        assert_eq!(subject.value(), 2);
    }

    #[test]
    fn test_late_subscriber_sees_only_latest() {
        let subject = BehaviorSubject::new(1u32);
        subject.next(2);
        subject.next(3);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = subject.subscribe_fn(move |v: &u32| sink.lock().unwrap().push(*v));

        assert_eq!(*seen.lock().unwrap(), vec![3]);
        assert_eq!(subject.value(), 3);
    }

    #[test]
    fn test_complete_notifies_and_stops_replay() {
        let subject = BehaviorSubject::new(0u32);
        let events = Arc::new(Mutex::new(Vec::new()));

        let sink = events.clone();
        let done = events.clone();
        let _sub = subject.subscribe(Arc::new(
            CallbackObserver::<u32>::new(move |v| sink.lock().unwrap().push(format!("next {v}")))
                .on_complete(move || done.lock().unwrap().push("complete".to_string())),
        ));

        subject.complete();
        subject.next(9);

        assert_eq!(*events.lock().unwrap(), vec!["next 0", "complete"]);
        assert_eq!(subject.value(), 0);
        assert!(subject.is_terminated());
    }

    #[test]
    fn test_clones_share_identity() {
        let a = BehaviorSubject::new(0u8);
        let b = a.clone();
        let c = BehaviorSubject::new(0u8);

        assert_eq!(a.source_id(), b.source_id());
        assert_ne!(a.source_id(), c.source_id());
    }
}
