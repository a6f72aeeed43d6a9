//! Multicast subject.
//!
//! # Responsibilities
//! - Hold the listener set shared by every handle clone
//! - Deliver next / error / complete to listeners in subscription order
//! - Latch the first terminal event and replay it to late subscribers

use std::sync::{Arc, Mutex, Weak};

use crate::stream::subscription::{Detach, Subscription};
use crate::stream::{Observer, Source, SourceError, SourceId};

/// Terminal state of a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Terminal {
    Completed,
    Errored(SourceError),
}

struct Listeners<T> {
    entries: Vec<(u64, Arc<dyn Observer<T>>)>,
    next_id: u64,
    terminal: Option<Terminal>,
}

/// Listener set shared by [`Subject`] and the replaying subject.
pub(crate) struct Multicast<T> {
    listeners: Mutex<Listeners<T>>,
}

impl<T: Send + Sync + 'static> Multicast<T> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            listeners: Mutex::new(Listeners {
                entries: Vec::new(),
                next_id: 0,
                terminal: None,
            }),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Listeners<T>> {
        self.listeners.lock().expect("stream listener mutex poisoned")
    }

    /// Attach an observer, then deliver a replayed value to it.
    ///
    /// The observer joins the set before the replay, so a value emitted
    /// from inside the replay callback reaches it too. Across threads, an
    /// emission racing the subscription may arrive before the replay.
    pub(crate) fn attach(
        self: &Arc<Self>,
        observer: Arc<dyn Observer<T>>,
        replay: Option<T>,
    ) -> Subscription {
        let mut listeners = self.lock();
        if let Some(terminal) = listeners.terminal.clone() {
            drop(listeners);
            deliver_terminal(&observer, &terminal);
            return Subscription::closed();
        }
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, observer.clone()));
        drop(listeners);

        let target: Weak<dyn Detach> = Arc::downgrade(self) as Weak<dyn Detach>;
        let subscription = Subscription::new(target, id);
        if let Some(value) = replay {
            observer.next(&value);
        }
        subscription
    }

    /// Snapshot of live listeners, or `None` once terminated.
    pub(crate) fn snapshot(&self) -> Option<Vec<Arc<dyn Observer<T>>>> {
        let listeners = self.lock();
        if listeners.terminal.is_some() {
            return None;
        }
        Some(listeners.entries.iter().map(|(_, o)| o.clone()).collect())
    }

    pub(crate) fn emit(&self, value: &T) {
        let Some(observers) = self.snapshot() else {
            tracing::trace!("emission on terminated stream ignored");
            return;
        };
        for observer in observers {
            observer.next(value);
        }
    }

    /// Latch a terminal event and drop every listener. Returns false if the
    /// stream had already terminated.
    pub(crate) fn terminate(&self, terminal: Terminal) -> bool {
        let observers = {
            let mut listeners = self.lock();
            if listeners.terminal.is_some() {
                return false;
            }
            listeners.terminal = Some(terminal.clone());
            std::mem::take(&mut listeners.entries)
        };
        for (_, observer) in observers {
            deliver_terminal(&observer, &terminal);
        }
        true
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.lock().terminal.is_some()
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.lock().entries.len()
    }
}

impl<T: Send + Sync + 'static> Detach for Multicast<T> {
    fn detach(&self, listener: u64) {
        self.lock().entries.retain(|(id, _)| *id != listener);
    }
}

fn deliver_terminal<T>(observer: &Arc<dyn Observer<T>>, terminal: &Terminal) {
    match terminal {
        Terminal::Completed => observer.complete(),
        Terminal::Errored(error) => observer.error(error),
    }
}

/// A multicast stream without replay: subscribers only see values emitted
/// after they joined.
pub struct Subject<T> {
    shared: Arc<Multicast<T>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> Subject<T> {
    pub fn new() -> Self {
        Self {
            shared: Multicast::new(),
        }
    }

    /// Push a value to every current subscriber.
    pub fn next(&self, value: T) {
        self.shared.emit(&value);
    }

    /// Fail the stream. Subscribers are notified once and then dropped.
    pub fn error(&self, error: SourceError) {
        self.shared.terminate(Terminal::Errored(error));
    }

    /// Finish the stream. Subscribers are notified once and then dropped.
    pub fn complete(&self) {
        self.shared.terminate(Terminal::Completed);
    }

    /// Subscribe a plain closure.
    pub fn subscribe_fn(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.shared.attach(Arc::new(f), None)
    }

    pub fn is_terminated(&self) -> bool {
        self.shared.is_terminated()
    }

    pub fn observer_count(&self) -> usize {
        self.shared.observer_count()
    }
}

impl<T: Send + Sync + 'static> Source<T> for Subject<T> {
    fn subscribe(&self, observer: Arc<dyn Observer<T>>) -> Subscription {
        self.shared.attach(observer, None)
    }

    fn source_id(&self) -> SourceId {
        SourceId::of(&self.shared)
    }
}
