//! Static routes table: exact path → template.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::render::Template;

/// Zero-argument template producer, possibly async.
pub type TemplateFactory = Arc<dyn Fn() -> BoxFuture<'static, Template> + Send + Sync>;

#[derive(Clone)]
pub enum RouteEntry {
    Ready(Template),
    Factory(TemplateFactory),
}

impl RouteEntry {
    /// Entry produced by a synchronous closure on every hit.
    pub fn lazy<F>(f: F) -> Self
    where
        F: Fn() -> Template + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        RouteEntry::Factory(Arc::new(move || {
            let f = f.clone();
            async move { f() }.boxed()
        }))
    }

    /// Entry produced by an async closure on every hit.
    pub fn factory<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Template> + Send + 'static,
    {
        RouteEntry::Factory(Arc::new(move || f().boxed()))
    }

    pub async fn render(&self) -> Template {
        match self {
            RouteEntry::Ready(template) => template.clone(),
            RouteEntry::Factory(factory) => factory().await,
        }
    }
}

impl From<Template> for RouteEntry {
    fn from(template: Template) -> Self {
        RouteEntry::Ready(template)
    }
}

impl std::fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteEntry::Ready(template) => f.debug_tuple("Ready").field(template).finish(),
            RouteEntry::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Exact-path lookup table. Immutable once handed to a router; replace
/// the whole table to change it.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: HashMap<String, RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, path: impl Into<String>, entry: impl Into<RouteEntry>) -> Self {
        self.insert(path, entry);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, entry: impl Into<RouteEntry>) {
        self.entries.insert(path.into(), entry.into());
    }

    pub fn get(&self, path: &str) -> Option<&RouteEntry> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
