//! Render slot: the live output a template is committed to.
//!
//! # Responsibilities
//! - Hold the last committed template
//! - Treat `Render::NoChange` as "keep what is there"
//! - Let async callers wait for a commit
//! - Refuse commits once detached

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use crate::render::{Render, Template};

/// Observable state of a slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotSnapshot {
    /// Last committed template, if any.
    pub template: Option<Template>,
    /// Number of commits that changed the output.
    pub commits: u64,
}

#[derive(Debug)]
struct SlotInner {
    state: watch::Sender<SlotSnapshot>,
    detached: AtomicBool,
}

/// Shared handle to one output position. Clones refer to the same slot.
#[derive(Debug, Clone)]
pub struct RenderSlot {
    inner: Arc<SlotInner>,
}

impl Default for RenderSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSlot {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SlotSnapshot::default());
        Self {
            inner: Arc::new(SlotInner {
                state,
                detached: AtomicBool::new(false),
            }),
        }
    }

    /// Commit a render. Returns true if the output changed.
    pub fn commit(&self, render: Render) -> bool {
        if self.is_detached() {
            tracing::trace!("commit to detached slot ignored");
            return false;
        }
        match render {
            Render::NoChange => false,
            Render::Template(template) => {
                self.inner.state.send_modify(|snapshot| {
                    snapshot.template = Some(template);
                    snapshot.commits += 1;
                });
                true
            }
        }
    }

    /// The currently displayed template.
    pub fn current(&self) -> Option<Template> {
        self.inner.state.borrow().template.clone()
    }

    pub fn commits(&self) -> u64 {
        self.inner.state.borrow().commits
    }

    pub fn snapshot(&self) -> SlotSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every change of the slot.
    pub fn watch(&self) -> watch::Receiver<SlotSnapshot> {
        self.inner.state.subscribe()
    }

    /// Wait until the slot satisfies `predicate`.
    pub async fn wait_for(&self, mut predicate: impl FnMut(&SlotSnapshot) -> bool) -> SlotSnapshot {
        let mut rx = self.watch();
        let snapshot = match rx.wait_for(|snapshot| predicate(snapshot)).await {
            Ok(snapshot) => snapshot.clone(),
            // the sender lives as long as `self`, so this is unreachable in practice
            Err(_) => self.snapshot(),
        };
        snapshot
    }

    /// Detach the slot from the output. Later commits are ignored.
    pub fn detach(&self) {
        self.inner.detached.store(true, Ordering::SeqCst);
    }

    pub fn is_detached(&self) -> bool {
        self.inner.detached.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_change_leaves_output_untouched() {
        let slot = RenderSlot::new();
        assert!(slot.commit(Render::Template(Template::text("a"))));
        assert!(!slot.commit(Render::NoChange));

        assert_eq!(slot.current(), Some(Template::text("a")));
        assert_eq!(slot.commits(), 1);
    }

    #[test]
    fn test_detached_slot_ignores_commits() {
        let slot = RenderSlot::new();
        slot.commit(Template::text("kept").into());
        slot.detach();

        assert!(!slot.commit(Template::text("dropped").into()));
        assert_eq!(slot.current(), Some(Template::text("kept")));
    }

    #[tokio::test]
    async fn test_wait_for_commit() {
        let slot = RenderSlot::new();
        let writer = slot.clone();
        tokio::spawn(async move {
            writer.commit(Template::text("late").into());
        });

        let snapshot = slot.wait_for(|s| s.commits == 1).await;
        assert_eq!(snapshot.template, Some(Template::text("late")));
    }
}
