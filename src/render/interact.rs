//! Mount-time interaction hooks.
//!
//! `interact` commits a template to a slot and then hands its mounted
//! element to an observer: once, if no source is given, or once per source
//! emission otherwise. It lets a widget express a one-shot side effect
//! ("focus this input", "run this on mount") declaratively.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::observability::metrics;
use crate::render::{RenderError, RenderSlot, Template};
use crate::stream::{Observer, Source, SourceError, Subscription};

/// What an interaction observer receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction<V> {
    /// The mounted element.
    pub element: Template,
    /// Sequential index of the emission (0 for the one-shot form).
    pub index: usize,
    /// The emitted value, absent in the one-shot form.
    pub value: Option<V>,
}

/// Commit `template` to `slot` and feed its element to `observer`.
///
/// Without a source the observer's `next` runs exactly once, synchronously,
/// followed by `complete`, and `Ok(None)` is returned. With a source every
/// emission is forwarded and the subscription is returned.
///
/// A template without an element is a malformed mount: the error is logged
/// and nothing is delivered.
pub fn interact<V>(
    slot: &RenderSlot,
    template: Template,
    observer: Arc<dyn Observer<Interaction<V>>>,
    source: Option<&dyn Source<V>>,
) -> Result<Option<Subscription>, RenderError>
where
    V: Clone + Send + Sync + 'static,
{
    slot.commit(template.clone().into());

    let Some(element) = template.first_element().cloned() else {
        let err = RenderError::MalformedMount;
        tracing::error!(error = %err, "interact needs an element to mount");
        metrics::record_absorbed_error("malformed_mount");
        return Err(err);
    };

    match source {
        None => {
            observer.next(&Interaction {
                element,
                index: 0,
                value: None,
            });
            observer.complete();
            Ok(None)
        }
        Some(source) => {
            let forward = Arc::new(InteractionForwarder {
                element,
                index: AtomicUsize::new(0),
                observer,
            });
            Ok(Some(source.subscribe(forward)))
        }
    }
}

struct InteractionForwarder<V> {
    element: Template,
    index: AtomicUsize,
    observer: Arc<dyn Observer<Interaction<V>>>,
}

impl<V: Clone + Send + Sync> Observer<V> for InteractionForwarder<V> {
    fn next(&self, value: &V) {
        let index = self.index.fetch_add(1, Ordering::SeqCst);
        self.observer.next(&Interaction {
            element: self.element.clone(),
            index,
            value: Some(value.clone()),
        });
    }

    fn error(&self, error: &SourceError) {
        self.observer.error(error);
    }

    fn complete(&self) {
        self.observer.complete();
    }
}
