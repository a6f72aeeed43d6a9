//! Path matchers.
//!
//! # Responsibilities
//! - Define the [`PathMatcher`] seam the router chain is made of
//! - Adapt plain closures (sync or async) into matchers
//! - Provide the paginated route matcher: `/prefix/<page>` → widget
//!
//! # Design Decisions
//! - A matcher sees the path being resolved and the last resolved path,
//!   so stateful matchers can tell "entering" from "staying"
//! - `None` means "not mine", `Some(Render::NoChange)` means "mine, leave
//!   the output as it is"
//! - The paginated matcher re-runs a widget factory on every hit

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::registry::AppContext;
use crate::render::Render;
use crate::routing::pattern::{parse_page, split_route};
use crate::routing::widget::WidgetSource;

/// One link of the router's matcher chain.
pub trait PathMatcher: Send + Sync {
    fn resolve<'a>(&'a self, path: &'a str, previous: &'a str) -> BoxFuture<'a, Option<Render>>;
}

struct FnMatcher<F>(F);

impl<F> PathMatcher for FnMatcher<F>
where
    F: Fn(&str, &str) -> Option<Render> + Send + Sync,
{
    fn resolve<'a>(&'a self, path: &'a str, previous: &'a str) -> BoxFuture<'a, Option<Render>> {
        let result = (self.0)(path, previous);
        async move { result }.boxed()
    }
}

struct AsyncFnMatcher<F>(F);

impl<F, Fut> PathMatcher for AsyncFnMatcher<F>
where
    F: Fn(String, String) -> Fut + Send + Sync,
    Fut: Future<Output = Option<Render>> + Send + 'static,
{
    fn resolve<'a>(&'a self, path: &'a str, previous: &'a str) -> BoxFuture<'a, Option<Render>> {
        (self.0)(path.to_string(), previous.to_string()).boxed()
    }
}

/// A matcher from a synchronous closure.
pub fn matcher_fn<F>(f: F) -> Arc<dyn PathMatcher>
where
    F: Fn(&str, &str) -> Option<Render> + Send + Sync + 'static,
{
    Arc::new(FnMatcher(f))
}

/// A matcher from a closure returning a future. The future owns its
/// arguments, so it may outlive the call.
pub fn async_matcher_fn<F, Fut>(f: F) -> Arc<dyn PathMatcher>
where
    F: Fn(String, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<Render>> + Send + 'static,
{
    Arc::new(AsyncFnMatcher(f))
}

/// Props of a paginated page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProps {
    /// Parsed page number; `None` when the path tail is not a number.
    pub page: Option<i64>,
}

/// Maps `/prefix/<page>` to the widget registered for `/prefix`.
pub struct PaginatedRouteMatcher {
    context: Arc<AppContext>,
    routes: HashMap<String, WidgetSource<PageProps>>,
}

impl PaginatedRouteMatcher {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self {
            context,
            routes: HashMap::new(),
        }
    }

    /// Register a widget (or factory) for `prefix`, e.g. `/posts`.
    pub fn route(mut self, prefix: impl Into<String>, widget: impl Into<WidgetSource<PageProps>>) -> Self {
        self.routes.insert(prefix.into(), widget.into());
        self
    }

    pub fn into_matcher(self) -> Arc<dyn PathMatcher> {
        Arc::new(self)
    }
}

impl PathMatcher for PaginatedRouteMatcher {
    fn resolve<'a>(&'a self, path: &'a str, _previous: &'a str) -> BoxFuture<'a, Option<Render>> {
        async move {
            let (prefix, remainder) = split_route(path)?;
            let source = self.routes.get(prefix)?;
            let widget = source.resolve().await;
            let page = parse_page(remainder);
            tracing::trace!(prefix, ?page, "paginated route matched");
            Some(widget(&self.context, PageProps { page }).into())
        }
        .boxed()
    }
}
