//! In-place pagination.
//!
//! A family of paths (say `/feed/<n>`) keeps one widget mounted while the
//! user moves between pages. The widget receives a page stream instead of
//! a page number, and the router is told to leave the output alone.
//!
//! # State Machine
//! ```text
//!             enter (prev ∉ family, path ∈ family)
//! Unmounted ─────────────────────────────────────► Mounted(stream)
//!     ▲          render widget once with stream        │
//!     │                                                │ stay: stream.next(match)
//!     │                                                │       → NoChange
//!     └────────────────────────────────────────────────┘
//!             leave (path ∉ family): stream.complete()
//! ```
//!
//! # Design Decisions
//! - The widget factory runs at most once per matcher
//! - A "stay" transition with no live stream (an earlier mount was
//!   abandoned) mounts again rather than emitting into nothing

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::OnceCell;

use crate::registry::AppContext;
use crate::render::Render;
use crate::routing::matcher::PathMatcher;
use crate::routing::pattern::{parse_page, split_route};
use crate::routing::widget::{Widget, WidgetSource};
use crate::stream::BehaviorSubject;

/// Props of an in-place widget.
pub struct InPlaceProps<T> {
    /// Current page first, then every page change while mounted.
    pub page_stream: BehaviorSubject<T>,
}

/// Decides whether a path belongs to the family, and extracts its value.
pub type Extractor<T> = Arc<dyn Fn(&str) -> Option<T> + Send + Sync>;

/// Stateful matcher keeping one widget mounted across a path family.
pub struct InPlaceMatcher<T> {
    context: Arc<AppContext>,
    extract: Extractor<T>,
    source: WidgetSource<InPlaceProps<T>>,
    widget: OnceCell<Widget<InPlaceProps<T>>>,
    stream: Mutex<Option<BehaviorSubject<T>>>,
}

impl<T> InPlaceMatcher<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(
        context: Arc<AppContext>,
        extract: Extractor<T>,
        widget: impl Into<WidgetSource<InPlaceProps<T>>>,
    ) -> Self {
        Self {
            context,
            extract,
            source: widget.into(),
            widget: OnceCell::new(),
            stream: Mutex::new(None),
        }
    }

    pub fn into_matcher(self) -> Arc<dyn PathMatcher> {
        Arc::new(self)
    }

    /// Whether a page stream is currently live.
    pub fn is_mounted(&self) -> bool {
        self.lock().is_some()
    }

    async fn mount(&self, value: T) -> Render {
        let widget = self
            .widget
            .get_or_init(|| async { self.source.resolve().await })
            .await;
        // stored only after the last await; a dropped mount leaves no stream
        let stream = BehaviorSubject::new(value);
        let stale = self.lock().replace(stream.clone());
        if let Some(stale) = stale {
            stale.complete();
        }
        tracing::debug!("in-place widget mounted");
        widget(
            &self.context,
            InPlaceProps {
                page_stream: stream,
            },
        )
        .into()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<BehaviorSubject<T>>> {
        self.stream.lock().expect("in-place stream mutex poisoned")
    }
}

impl<T> PathMatcher for InPlaceMatcher<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn resolve<'a>(&'a self, path: &'a str, previous: &'a str) -> BoxFuture<'a, Option<Render>> {
        async move {
            let current = (self.extract)(path);
            let was_member = (self.extract)(previous).is_some();

            match current {
                None => {
                    let live = self.lock().take();
                    if let Some(stream) = live {
                        tracing::debug!(path, was_member, "leaving in-place family");
                        stream.complete();
                    }
                    None
                }
                Some(value) if was_member => {
                    let live = self.lock().clone();
                    match live {
                        Some(stream) => {
                            stream.next(value);
                            Some(Render::NoChange)
                        }
                        None => Some(self.mount(value).await),
                    }
                }
                Some(value) => Some(self.mount(value).await),
            }
        }
        .boxed()
    }
}

/// A page within an in-place family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMatch {
    /// The family prefix, e.g. `/feed`.
    pub path: String,
    pub page: Option<i64>,
}

/// One prefix or several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixSet(BTreeSet<String>);

impl PrefixSet {
    pub fn contains(&self, prefix: &str) -> bool {
        self.0.contains(prefix)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<&str> for PrefixSet {
    fn from(prefix: &str) -> Self {
        PrefixSet(BTreeSet::from([prefix.to_string()]))
    }
}

impl From<String> for PrefixSet {
    fn from(prefix: String) -> Self {
        PrefixSet(BTreeSet::from([prefix]))
    }
}

impl<S: Into<String>> FromIterator<S> for PrefixSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        PrefixSet(iter.into_iter().map(Into::into).collect())
    }
}

impl<const N: usize> From<[&str; N]> for PrefixSet {
    fn from(prefixes: [&str; N]) -> Self {
        prefixes.into_iter().collect()
    }
}

impl From<Vec<String>> for PrefixSet {
    fn from(prefixes: Vec<String>) -> Self {
        prefixes.into_iter().collect()
    }
}

/// Family predicate for `/prefix/<page>` paths whose prefix is in
/// `prefixes`.
pub fn pagination_extractor(prefixes: impl Into<PrefixSet>) -> Extractor<PageMatch> {
    let prefixes = prefixes.into();
    Arc::new(move |path: &str| {
        let (prefix, remainder) = split_route(path)?;
        prefixes.contains(prefix).then(|| PageMatch {
            path: prefix.to_string(),
            page: parse_page(remainder),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Template;
    use crate::routing::widget::widget;
    use crate::stream::CallbackObserver;
    use crate::stream::Source;

    #[test]
    fn test_extractor_single_prefix() {
        let extract = pagination_extractor("/foo");

        assert_eq!(
            extract("/foo/3"),
            Some(PageMatch {
                path: "/foo".to_string(),
                page: Some(3)
            })
        );
        assert_eq!(extract("/bar/3"), None);
        assert_eq!(extract("/foo"), None);
    }

    #[test]
    fn test_extractor_prefix_set() {
        let extract = pagination_extractor(["/foo", "/news"]);

        assert!(extract("/news/1").is_some());
        assert!(extract("/foo/x").is_some_and(|m| m.page.is_none()));
        assert!(extract("/other/1").is_none());
    }

    #[tokio::test]
    async fn test_mount_stay_leave() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mounts = Arc::new(Mutex::new(0usize));

        let sink = events.clone();
        let mount_count = mounts.clone();
        let w = widget(move |_: &AppContext, props: InPlaceProps<PageMatch>| {
            *mount_count.lock().unwrap() += 1;
            let next = sink.clone();
            let done = sink.clone();
            props
                .page_stream
                .subscribe(Arc::new(
                    CallbackObserver::<PageMatch>::new(move |m| {
                        next.lock().unwrap().push(format!("{:?}", m.page))
                    })
                    .on_complete(move || done.lock().unwrap().push("complete".to_string())),
                ))
                .forget();
            Template::text("feed")
        });
        let matcher = InPlaceMatcher::new(Arc::new(AppContext::new()), pagination_extractor("/foo"), w);

        assert_eq!(
            matcher.resolve("/foo/1", "").await,
            Some(Render::Template(Template::text("feed")))
        );
        assert_eq!(matcher.resolve("/foo/2", "/foo/1").await, Some(Render::NoChange));
        assert_eq!(matcher.resolve("/foo/3", "/foo/2").await, Some(Render::NoChange));
        assert_eq!(matcher.resolve("/bar", "/foo/3").await, None);

        assert_eq!(*mounts.lock().unwrap(), 1);
        assert_eq!(
            *events.lock().unwrap(),
            vec!["Some(1)", "Some(2)", "Some(3)", "complete"]
        );
        assert!(!matcher.is_mounted());
    }

    #[tokio::test]
    async fn test_factory_resolved_once_across_mounts() {
        let hits = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = hits.clone();
        let source = WidgetSource::factory(move || {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async { widget(|_: &AppContext, _: InPlaceProps<PageMatch>| Template::text("feed")) }
        });
        let matcher = InPlaceMatcher::new(Arc::new(AppContext::new()), pagination_extractor("/foo"), source);

        matcher.resolve("/foo/1", "/").await;
        matcher.resolve("/", "/foo/1").await;
        matcher.resolve("/foo/1", "/").await;

        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stay_without_live_stream_mounts() {
        let matcher = InPlaceMatcher::new(
            Arc::new(AppContext::new()),
            pagination_extractor("/foo"),
            widget(|_: &AppContext, _: InPlaceProps<PageMatch>| Template::text("feed")),
        );

        assert_eq!(
            matcher.resolve("/foo/2", "/foo/1").await,
            Some(Render::Template(Template::text("feed")))
        );
        assert!(matcher.is_mounted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_mount_leaves_nothing_mounted() {
        let source = WidgetSource::factory(|| async {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            widget(|_: &AppContext, _: InPlaceProps<PageMatch>| Template::text("feed"))
        });
        let matcher = InPlaceMatcher::new(Arc::new(AppContext::new()), pagination_extractor("/foo"), source);

        let dropped = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            matcher.resolve("/foo/1", "/"),
        )
        .await;
        assert!(dropped.is_err());
        assert!(!matcher.is_mounted());

        assert_eq!(matcher.resolve("/bar", "/").await, None);
        assert!(!matcher.is_mounted());
    }
}
