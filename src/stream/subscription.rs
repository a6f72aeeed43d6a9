//! Subscription handles.

use std::sync::Weak;

/// Implemented by stream state that can drop a listener by id.
pub(crate) trait Detach: Send + Sync {
    fn detach(&self, listener: u64);
}

/// RAII handle for an attached observer.
///
/// Dropping the handle detaches the observer. Use [`Subscription::forget`]
/// to keep the observer attached until the source terminates.
#[must_use = "dropping a Subscription detaches the observer immediately"]
pub struct Subscription {
    target: Option<(Weak<dyn Detach>, u64)>,
}

impl Subscription {
    pub(crate) fn new(target: Weak<dyn Detach>, listener: u64) -> Self {
        Self {
            target: Some((target, listener)),
        }
    }

    /// A handle that is not attached to anything (terminated sources).
    pub fn closed() -> Self {
        Self { target: None }
    }

    /// Detach the observer now.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Leave the observer attached for the lifetime of the source.
    pub fn forget(mut self) {
        self.target = None;
    }

    /// True once the handle no longer refers to a live stream.
    pub fn is_closed(&self) -> bool {
        match &self.target {
            Some((target, _)) => target.strong_count() == 0,
            None => true,
        }
    }

    fn release(&mut self) {
        if let Some((target, listener)) = self.target.take() {
            if let Some(state) = target.upgrade() {
                state.detach(listener);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("listener", &self.target.as_ref().map(|(_, id)| *id))
            .finish()
    }
}
