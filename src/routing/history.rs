//! Host navigation seam.
//!
//! # Responsibilities
//! - Abstract the host's session history (`location`, `push`, `replace`,
//!   `back`) behind the [`History`] trait
//! - Notify listeners of navigation the application did not initiate
//! - Provide an in-memory host for the CLI and for tests
//!
//! # Design Decisions
//! - `back()` is asynchronous on real hosts: the location only changes when
//!   the host later reports it. [`MemoryHistory`] mirrors that by queueing
//!   the traversal until [`MemoryHistory::settle`] runs
//! - `push` / `replace` never notify listeners; the caller updates its own
//!   state synchronously

use std::sync::{Arc, Mutex};

/// Callback fired when the host changes location on its own.
pub type NavigateListener = Box<dyn Fn() + Send + Sync>;

/// Host session history.
pub trait History: Send + Sync {
    /// The current path.
    fn location(&self) -> String;

    /// Add a new entry on top of the current one.
    fn push(&self, path: &str);

    /// Overwrite the current entry.
    fn replace(&self, path: &str);

    /// Ask the host to go back one entry. The change is reported later
    /// through the navigate listeners.
    fn back(&self);

    /// Register a listener for host-driven navigation.
    fn on_navigate(&self, listener: NavigateListener);
}

#[derive(Default)]
struct Stack {
    entries: Vec<String>,
    index: usize,
    pending: Vec<isize>,
}

/// In-memory history with a browser-like stack.
pub struct MemoryHistory {
    stack: Mutex<Stack>,
    listeners: Mutex<Vec<Arc<dyn Fn() + Send + Sync>>>,
}

impl MemoryHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            stack: Mutex::new(Stack {
                entries: vec![initial.into()],
                index: 0,
                pending: Vec::new(),
            }),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Apply every queued traversal, notifying listeners once per applied
    /// step. Returns how many traversals moved the location.
    pub fn settle(&self) -> usize {
        let pending = std::mem::take(&mut self.lock().pending);
        pending.into_iter().filter(|delta| self.traverse(*delta)).count()
    }

    /// Move `delta` entries through the stack right away, as a user pressing
    /// the browser buttons would. Out-of-range moves are ignored.
    pub fn traverse(&self, delta: isize) -> bool {
        let moved = {
            let mut stack = self.lock();
            let target = stack.index as isize + delta;
            if delta != 0 && target >= 0 && (target as usize) < stack.entries.len() {
                stack.index = target as usize;
                true
            } else {
                false
            }
        };
        if moved {
            tracing::trace!(delta, location = %self.location(), "history traversed");
            self.notify();
        } else {
            tracing::debug!(delta, "history traversal out of range ignored");
        }
        moved
    }

    /// Simulate the user typing a new location: push and notify.
    pub fn visit(&self, path: &str) {
        self.push(path);
        self.notify();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.lock().index
    }

    pub fn entries(&self) -> Vec<String> {
        self.lock().entries.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Stack> {
        self.stack.lock().expect("history stack mutex poisoned")
    }

    fn notify(&self) {
        // listeners may call back into the history
        let listeners = self
            .listeners
            .lock()
            .expect("history listeners mutex poisoned")
            .clone();
        for listener in listeners {
            listener();
        }
    }
}

impl History for MemoryHistory {
    fn location(&self) -> String {
        let stack = self.lock();
        stack.entries[stack.index].clone()
    }

    fn push(&self, path: &str) {
        let mut stack = self.lock();
        let keep = stack.index + 1;
        stack.entries.truncate(keep);
        stack.entries.push(path.to_string());
        stack.index = keep;
    }

    fn replace(&self, path: &str) {
        let mut stack = self.lock();
        let index = stack.index;
        stack.entries[index] = path.to_string();
    }

    fn back(&self) {
        self.lock().pending.push(-1);
    }

    fn on_navigate(&self, listener: NavigateListener) {
        self.listeners
            .lock()
            .expect("history listeners mutex poisoned")
            .push(Arc::from(listener));
    }
}
