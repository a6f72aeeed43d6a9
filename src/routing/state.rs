//! Router state: the current path as a replayable stream.
//!
//! # Responsibilities
//! - Track the current path and notify subscribers on every change
//! - Translate navigation intents (`navigate`, `replace`, `back`,
//!   `paginate_by`) into host history operations
//! - Pick up navigation the host performs on its own
//!
//! # Data Flow
//! ```text
//! navigate / replace / paginate_by
//!     → History::push / History::replace
//!     → route.next(path)            (synchronous, subscription order)
//!
//! back
//!     → History::back               (nothing emitted yet)
//!     → host reports navigation     → route.next(history.location())
//! ```

use std::sync::{Arc, Weak};

use crate::observability::metrics;
use crate::routing::history::{History, MemoryHistory};
use crate::routing::pattern::{parse_page, split_page_number};
use crate::routing::RouterError;
use crate::stream::{BehaviorSubject, Observer, Source, Subscription};

/// Shared navigation state. Usually registered in the service registry so
/// widgets can navigate.
pub struct RouterState {
    history: Arc<dyn History>,
    route: BehaviorSubject<String>,
}

impl RouterState {
    /// Seed the state from the host's location and listen for host-driven
    /// navigation for as long as the host lives.
    pub fn new(history: Arc<dyn History>) -> Self {
        let route = BehaviorSubject::new(history.location());

        let weak: Weak<dyn History> = Arc::downgrade(&history);
        let stream = route.clone();
        history.on_navigate(Box::new(move || {
            if let Some(host) = weak.upgrade() {
                let path = host.location();
                tracing::debug!(path = %path, "host navigation");
                stream.next(path);
            }
        }));

        Self { history, route }
    }

    /// State over a fresh in-memory host starting at `initial`.
    pub fn in_memory(initial: impl Into<String>) -> (Self, Arc<MemoryHistory>) {
        let history = Arc::new(MemoryHistory::new(initial));
        (Self::new(history.clone()), history)
    }

    pub fn current(&self) -> String {
        self.route.value()
    }

    /// Observe the path: the current value first, then every change.
    pub fn subscribe(&self, observer: Arc<dyn Observer<String>>) -> Subscription {
        self.route.subscribe(observer)
    }

    /// A handle on the path stream, suitable as a router's route stream.
    pub fn route_stream(&self) -> BehaviorSubject<String> {
        self.route.clone()
    }

    /// Push a new history entry and emit it.
    pub fn navigate(&self, path: impl Into<String>) {
        let path = path.into();
        tracing::debug!(path = %path, "navigate");
        metrics::record_navigation("navigate");
        self.history.push(&path);
        self.route.next(path);
    }

    /// Overwrite the current history entry and emit it.
    pub fn replace(&self, path: impl Into<String>) {
        let path = path.into();
        tracing::debug!(path = %path, "replace");
        metrics::record_navigation("replace");
        self.history.replace(&path);
        self.route.next(path);
    }

    /// Ask the host to go back. The new path is emitted once the host
    /// reports it.
    pub fn back(&self) {
        tracing::debug!("back");
        metrics::record_navigation("back");
        self.history.back();
    }

    /// Shift the trailing page number of the current path by `delta`.
    ///
    /// `/a/b/23` with `-3` navigates to `/a/b/20`. On a path without a page
    /// number the error is logged and nothing happens.
    pub fn paginate_by(&self, delta: i64) {
        if let Err(err) = self.try_paginate_by(delta) {
            tracing::error!(error = %err, "pagination ignored");
            metrics::record_absorbed_error("pagination");
        }
    }

    /// [`paginate_by`](Self::paginate_by), returning the target path or the
    /// reason nothing happened.
    pub fn try_paginate_by(&self, delta: i64) -> Result<String, RouterError> {
        let current = self.current();
        let (prefix, digits) = split_page_number(&current)
            .ok_or_else(|| RouterError::NonPaginatedPath(current.clone()))?;
        let page = parse_page(digits)
            .and_then(|page| page.checked_add(delta))
            .ok_or_else(|| RouterError::PageOverflow(current.clone()))?;

        let target = format!("{prefix}{page}");
        metrics::record_navigation("paginate");
        tracing::debug!(from = %current, to = %target, delta, "paginate");
        self.history.push(&target);
        self.route.next(target.clone());
        Ok(target)
    }
}
