//! Helpers for tests of widgets and routers.

use std::sync::Arc;

use crate::registry::AppContext;
use crate::render::Template;
use crate::routing::{widget, Widget};
use crate::stream::{Observer, Source, SourceId, Subscription};

/// A widget that calls `callback` every time it is rendered.
pub fn widget_rendered_spy<F>(callback: F) -> Widget<()>
where
    F: Fn() + Send + Sync + 'static,
{
    widget(move |_: &AppContext, _: ()| {
        callback();
        Template::empty()
    })
}

/// Source that hands every subscriber one value, then completes.
pub struct Just<T> {
    value: Arc<T>,
}

impl<T> Clone for Just<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
        }
    }
}

pub fn just<T>(value: T) -> Just<T> {
    Just {
        value: Arc::new(value),
    }
}

impl<T: Send + Sync + 'static> Source<T> for Just<T> {
    fn subscribe(&self, observer: Arc<dyn Observer<T>>) -> Subscription {
        observer.next(&self.value);
        observer.complete();
        Subscription::closed()
    }

    fn source_id(&self) -> SourceId {
        SourceId::of(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{AsyncBinding, BindingStatus, RenderSlot};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_spy_counts_renders() {
        let renders = Arc::new(AtomicUsize::new(0));
        let counter = renders.clone();
        let spy = widget_rendered_spy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let ctx = AppContext::new();
        spy(&ctx, ());
        spy(&ctx, ());
        assert_eq!(renders.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_just_emits_then_completes() {
        let binding = AsyncBinding::new(RenderSlot::new());
        binding.bind(&just(7u32));

        assert_eq!(binding.slot().current(), Some(Template::text("7")));
        assert_eq!(binding.status(), BindingStatus::Completed);
    }
}
