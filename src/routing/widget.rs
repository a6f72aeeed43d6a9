//! Widgets and lazily loaded widgets.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::registry::AppContext;
use crate::render::Template;
use crate::routing::state::RouterState;

/// A render function over the application context and some props.
pub type Widget<P> = Arc<dyn Fn(&AppContext, P) -> Template + Send + Sync>;

/// Produces a widget, possibly after loading something.
pub type WidgetFactory<P> = Arc<dyn Fn() -> BoxFuture<'static, Widget<P>> + Send + Sync>;

/// Wrap a closure as a [`Widget`].
pub fn widget<P, F>(f: F) -> Widget<P>
where
    F: Fn(&AppContext, P) -> Template + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A widget that is either at hand or has to be produced first.
pub enum WidgetSource<P> {
    Ready(Widget<P>),
    Factory(WidgetFactory<P>),
}

impl<P> Clone for WidgetSource<P> {
    fn clone(&self) -> Self {
        match self {
            WidgetSource::Ready(w) => WidgetSource::Ready(w.clone()),
            WidgetSource::Factory(f) => WidgetSource::Factory(f.clone()),
        }
    }
}

impl<P: 'static> WidgetSource<P> {
    pub fn ready(w: Widget<P>) -> Self {
        WidgetSource::Ready(w)
    }

    /// A factory from an async closure.
    pub fn factory<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Widget<P>> + Send + 'static,
    {
        WidgetSource::Factory(Arc::new(move || f().boxed()))
    }

    /// Get the widget, running the factory if there is one.
    pub async fn resolve(&self) -> Widget<P> {
        match self {
            WidgetSource::Ready(w) => w.clone(),
            WidgetSource::Factory(f) => f().await,
        }
    }
}

impl<P> From<Widget<P>> for WidgetSource<P> {
    fn from(w: Widget<P>) -> Self {
        WidgetSource::Ready(w)
    }
}

/// A widget that, when rendered, replaces the current history entry with
/// `path` through the registered [`RouterState`].
pub fn make_redirecter(path: impl Into<String>) -> Widget<()> {
    let path = path.into();
    widget(move |ctx: &AppContext, _: ()| {
        match ctx.blocs().of::<RouterState>() {
            Ok(state) => state.replace(path.clone()),
            Err(err) => tracing::error!(error = %err, target_path = %path, "redirect skipped"),
        }
        Template::empty()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_factory_runs_on_every_resolve() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = calls.clone();
        let source = WidgetSource::<()>::factory(move || {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async { widget(|_: &AppContext, _: ()| Template::text("lazy")) }
        });

        let ctx = AppContext::new();
        let w = source.resolve().await;
        source.resolve().await;

        assert_eq!(w(&ctx, ()), Template::text("lazy"));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn test_redirecter_replaces_through_registered_state() {
        let ctx = AppContext::new();
        let (state, history) = RouterState::in_memory("/old");
        ctx.blocs().register(state);

        let redirect = make_redirecter("/new");
        redirect(&ctx, ());

        assert_eq!(history.entries(), vec!["/new"]);
        assert_eq!(ctx.blocs().of::<RouterState>().unwrap().current(), "/new");
    }

    #[test]
    fn test_redirecter_without_state_renders_nothing() {
        let ctx = AppContext::new();
        let redirect = make_redirecter("/new");

        assert_eq!(redirect(&ctx, ()), Template::empty());
    }
}
