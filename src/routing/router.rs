//! Router view: path stream in, rendered output out.
//!
//! # Responsibilities
//! - Subscribe to a route stream and resolve every path it emits
//! - Try matchers in order, then the routes table, then not-found
//! - Keep only the newest path's result (switch-latest)
//! - Publish each finished resolution so callers can await it
//!
//! # Data Flow
//! ```text
//! route stream ──(generation, path)──► mpsc ──► driver task
//!                                                  │
//!     matcher[0] → matcher[1] → … → routes table → not-found
//!                                                  │
//!                          RenderSlot::commit ◄────┤
//!                          watch<Resolution>  ◄────┘
//! ```
//!
//! # Design Decisions
//! - A newer path drops the in-flight resolution future, but only once it
//!   is pending; every queued path runs the chain at least up to its
//!   first await, and work already done is not undone
//! - `previous` only advances when a resolution finishes, so a stateful
//!   matcher never sees a path it did not get to resolve
//! - The routes table sits behind `ArcSwap`; a reload is picked up by the
//!   next resolution

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::observability::metrics;
use crate::render::{Render, RenderSlot, Template};
use crate::routing::matcher::PathMatcher;
use crate::routing::routes::RouteTable;
use crate::routing::RouterError;
use crate::stream::{Source, Subscription};

/// Which branch of the chain produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Matcher at this position in the chain.
    Matcher(usize),
    Route,
    NotFound,
}

impl Outcome {
    fn label(self) -> &'static str {
        match self {
            Outcome::Matcher(_) => "matcher",
            Outcome::Route => "route",
            Outcome::NotFound => "not_found",
        }
    }
}

/// A finished resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub path: String,
    /// Position of the path in the route stream, starting at 1.
    pub generation: u64,
    pub outcome: Outcome,
    /// False when the result was `NoChange` (or the slot was detached).
    pub committed: bool,
}

/// Placeholder shown when nothing matches and no not-found template was
/// configured.
pub fn default_not_found() -> Template {
    Template::fragment([
        Template::text("404 not found "),
        Template::element("br", []),
        Template::text("you should probably pass a not-found template to the router"),
    ])
}

/// Collects router configuration.
#[derive(Default)]
pub struct RouterBuilder {
    route_stream: Option<Arc<dyn Source<String>>>,
    matchers: Vec<Arc<dyn PathMatcher>>,
    routes: RouteTable,
    not_found: Option<Template>,
    slot: Option<RenderSlot>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stream of paths to resolve. Required.
    pub fn route_stream<S>(mut self, stream: S) -> Self
    where
        S: Source<String> + 'static,
    {
        self.route_stream = Some(Arc::new(stream));
        self
    }

    pub fn matcher(mut self, matcher: Arc<dyn PathMatcher>) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn matchers(mut self, matchers: impl IntoIterator<Item = Arc<dyn PathMatcher>>) -> Self {
        self.matchers.extend(matchers);
        self
    }

    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    pub fn not_found(mut self, template: Template) -> Self {
        self.not_found = Some(template);
        self
    }

    /// Render into an existing slot instead of a fresh one.
    pub fn slot(mut self, slot: RenderSlot) -> Self {
        self.slot = Some(slot);
        self
    }

    pub fn build(self) -> Result<RouterView, RouterError> {
        let route_stream = self.route_stream.ok_or(RouterError::MissingRouteStream)?;
        Ok(RouterView {
            route_stream,
            chain: Arc::new(Chain {
                matchers: self.matchers,
                routes: Arc::new(ArcSwap::from_pointee(self.routes)),
                not_found: self.not_found.unwrap_or_else(default_not_found),
            }),
            slot: self.slot.unwrap_or_default(),
        })
    }
}

struct Chain {
    matchers: Vec<Arc<dyn PathMatcher>>,
    routes: Arc<ArcSwap<RouteTable>>,
    not_found: Template,
}

impl Chain {
    async fn resolve(&self, path: &str, previous: &str) -> (Render, Outcome) {
        for (index, matcher) in self.matchers.iter().enumerate() {
            if let Some(render) = matcher.resolve(path, previous).await {
                return (render, Outcome::Matcher(index));
            }
        }
        let routes = self.routes.load_full();
        if let Some(entry) = routes.get(path) {
            return (entry.render().await.into(), Outcome::Route);
        }
        (self.not_found.clone().into(), Outcome::NotFound)
    }
}

/// A configured, not yet running router.
pub struct RouterView {
    route_stream: Arc<dyn Source<String>>,
    chain: Arc<Chain>,
    slot: RenderSlot,
}

impl RouterView {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    pub fn slot(&self) -> &RenderSlot {
        &self.slot
    }

    /// Start resolving paths on the current tokio runtime.
    pub fn spawn(self) -> RouterHandle {
        let (path_tx, path_rx) = mpsc::unbounded_channel();
        let (resolution_tx, resolution_rx) = watch::channel(None);
        let emitted = Arc::new(AtomicU64::new(0));

        let task = tokio::spawn(drive(self.chain.clone(), self.slot.clone(), path_rx, resolution_tx));

        let counter = emitted.clone();
        let subscription = self.route_stream.subscribe(Arc::new(move |path: &String| {
            let generation = counter.fetch_add(1, Ordering::SeqCst) + 1;
            // the driver only goes away with the handle
            let _ = path_tx.send((generation, path.clone()));
        }));

        RouterHandle {
            slot: self.slot,
            emitted,
            resolutions: resolution_rx,
            routes: self.chain.routes.clone(),
            _subscription: subscription,
            task,
        }
    }
}

enum Step {
    Resolved(Render, Outcome),
    Superseded(u64, String),
    Closed(Render, Outcome),
}

async fn drive(
    chain: Arc<Chain>,
    slot: RenderSlot,
    mut paths: mpsc::UnboundedReceiver<(u64, String)>,
    published: watch::Sender<Option<Resolution>>,
) {
    let mut previous = String::new();
    let mut queued: Option<(u64, String)> = None;
    let mut closed = false;

    loop {
        let (generation, path) = match queued.take() {
            Some(next) => next,
            None if closed => break,
            None => match paths.recv().await {
                Some(next) => next,
                None => break,
            },
        };
        tracing::debug!(path = %path, generation, previous = %previous, "resolving path");

        let step = {
            let resolution = chain.resolve(&path, &previous);
            tokio::pin!(resolution);
            if closed {
                let (render, outcome) = resolution.await;
                Step::Closed(render, outcome)
            } else {
                // only a resolution that is still pending gets abandoned
                tokio::select! {
                    biased;
                    (render, outcome) = &mut resolution => Step::Resolved(render, outcome),
                    newer = paths.recv() => match newer {
                        Some((generation, path)) => Step::Superseded(generation, path),
                        None => {
                            let (render, outcome) = (&mut resolution).await;
                            Step::Closed(render, outcome)
                        }
                    },
                }
            }
        };

        let (render, outcome) = match step {
            Step::Superseded(next_generation, next_path) => {
                tracing::debug!(abandoned = %path, next = %next_path, "resolution superseded");
                metrics::record_abandoned();
                queued = Some((next_generation, next_path));
                continue;
            }
            Step::Closed(render, outcome) => {
                closed = true;
                (render, outcome)
            }
            Step::Resolved(render, outcome) => (render, outcome),
        };

        let committed = slot.commit(render);
        metrics::record_resolution(outcome.label());
        tracing::debug!(path = %path, generation, ?outcome, committed, "path resolved");

        previous = path.clone();
        published.send_replace(Some(Resolution {
            path,
            generation,
            outcome,
            committed,
        }));
    }
    tracing::debug!("route stream closed, router stopped");
}

/// A running router. Dropping it stops the driver and unsubscribes.
pub struct RouterHandle {
    slot: RenderSlot,
    emitted: Arc<AtomicU64>,
    resolutions: watch::Receiver<Option<Resolution>>,
    routes: Arc<ArcSwap<RouteTable>>,
    _subscription: Subscription,
    task: JoinHandle<()>,
}

impl RouterHandle {
    pub fn slot(&self) -> &RenderSlot {
        &self.slot
    }

    /// What the router currently displays.
    pub fn current(&self) -> Option<Template> {
        self.slot.current()
    }

    /// Number of paths received so far.
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::SeqCst)
    }

    pub fn last_resolution(&self) -> Option<Resolution> {
        self.resolutions.borrow().clone()
    }

    /// Wait until the newest path received so far has been resolved.
    ///
    /// Returns `None` if nothing was received yet or the router stopped.
    pub async fn settled(&self) -> Option<Resolution> {
        let target = self.emitted();
        if target == 0 {
            return None;
        }
        let mut rx = self.resolutions.clone();
        let resolution = rx
            .wait_for(|r| r.as_ref().is_some_and(|r| r.generation >= target))
            .await
            .ok()?
            .clone();
        resolution
    }

    /// Swap in a new routes table. The next resolution uses it.
    pub fn reload_routes(&self, routes: RouteTable) {
        tracing::info!(routes = routes.len(), "routes table reloaded");
        self.routes.store(Arc::new(routes));
    }

    /// Shared handle on the live routes table.
    pub fn routes_handle(&self) -> Arc<ArcSwap<RouteTable>> {
        self.routes.clone()
    }
}

impl Drop for RouterHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
