//! End-to-end router behaviour: state → router view → render slot.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use valv::app::{App, Command};
use valv::config::{load_config, ValvConfig};
use valv::render::{Render, Template};
use valv::routing::{
    matcher_fn, pagination_extractor, widget, InPlaceMatcher, InPlaceProps, Outcome, PageMatch,
    PageProps, PaginatedRouteMatcher, RouteEntry, RouteTable, RouterView,
};
use valv::stream::{CallbackObserver, Source};
use valv::testing::widget_rendered_spy;
use valv::{AppContext, RouterState};

mod common;

fn state_at(path: &str) -> (Arc<AppContext>, Arc<RouterState>) {
    let ctx = Arc::new(AppContext::new());
    let (state, _history) = RouterState::in_memory(path);
    let state = ctx.blocs().register(state);
    (ctx, state)
}

#[tokio::test]
async fn test_routes_table_then_not_found() {
    let (_ctx, state) = state_at("/x");
    let router = RouterView::builder()
        .route_stream(state.route_stream())
        .routes(RouteTable::new().route("/x", Template::text("A")))
        .build()
        .unwrap()
        .spawn();

    router.settled().await;
    assert_eq!(router.current(), Some(Template::text("A")));

    state.navigate("/y");
    let resolution = router.settled().await.unwrap();
    assert_eq!(resolution.outcome, Outcome::NotFound);
    assert!(router.current().unwrap().text_content().starts_with("404 not found"));
}

#[tokio::test]
async fn test_matched_matcher_short_circuits_rest_of_chain() {
    let (ctx, state) = state_at("/anything");
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let route = Arc::new(AtomicUsize::new(0));

    let spy_first = widget_rendered_spy({
        let first = first.clone();
        move || {
            first.fetch_add(1, Ordering::SeqCst);
        }
    });
    let spy_second = widget_rendered_spy({
        let second = second.clone();
        move || {
            second.fetch_add(1, Ordering::SeqCst);
        }
    });
    let route_counter = route.clone();
    let (c1, c2) = (ctx.clone(), ctx.clone());

    let router = RouterView::builder()
        .route_stream(state.route_stream())
        .matcher(matcher_fn(move |_, _| Some(spy_first(&c1, ()).into())))
        .matcher(matcher_fn(move |_, _| Some(spy_second(&c2, ()).into())))
        .routes(RouteTable::new().route(
            "/anything",
            RouteEntry::lazy(move || {
                route_counter.fetch_add(1, Ordering::SeqCst);
                Template::text("route")
            }),
        ))
        .build()
        .unwrap()
        .spawn();

    router.settled().await;

    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 0);
    assert_eq!(route.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_in_place_family_mounts_once_and_streams_pages() {
    let (ctx, state) = state_at("/foo/1");
    let mounts = Arc::new(AtomicUsize::new(0));
    let pages = Arc::new(Mutex::new(Vec::new()));

    let feed = {
        let mounts = mounts.clone();
        let pages = pages.clone();
        widget(move |_: &AppContext, props: InPlaceProps<PageMatch>| {
            mounts.fetch_add(1, Ordering::SeqCst);
            let next = pages.clone();
            let done = pages.clone();
            props
                .page_stream
                .subscribe(Arc::new(
                    CallbackObserver::<PageMatch>::new(move |m| {
                        next.lock().unwrap().push(format!("{}", m.page.unwrap_or(-1)))
                    })
                    .on_complete(move || done.lock().unwrap().push("complete".to_string())),
                ))
                .forget();
            Template::element("feed", [])
        })
    };

    let router = RouterView::builder()
        .route_stream(state.route_stream())
        .matcher(InPlaceMatcher::new(ctx.clone(), pagination_extractor("/foo"), feed).into_matcher())
        .routes(RouteTable::new().route("/bar", Template::text("bar")))
        .build()
        .unwrap()
        .spawn();

    let first = router.settled().await.unwrap();
    assert!(first.committed);
    assert_eq!(router.current(), Some(Template::element("feed", [])));

    for path in ["/foo/2", "/foo/3"] {
        state.navigate(path);
        let resolution = router.settled().await.unwrap();
        assert_eq!(resolution.outcome, Outcome::Matcher(0));
        assert!(!resolution.committed);
        assert_eq!(router.current(), Some(Template::element("feed", [])));
    }

    state.navigate("/bar");
    let left = router.settled().await.unwrap();
    assert_eq!(left.outcome, Outcome::Route);

    assert_eq!(mounts.load(Ordering::SeqCst), 1);
    assert_eq!(*pages.lock().unwrap(), vec!["1", "2", "3", "complete"]);
    assert_eq!(router.current(), Some(Template::text("bar")));
    assert_eq!(router.slot().commits(), 2);
}

#[tokio::test]
async fn test_back_to_back_page_changes_all_reach_page_stream() {
    let (ctx, state) = state_at("/foo/1");
    let pages = Arc::new(Mutex::new(Vec::new()));

    let feed = {
        let pages = pages.clone();
        widget(move |_: &AppContext, props: InPlaceProps<PageMatch>| {
            let sink = pages.clone();
            props
                .page_stream
                .subscribe(Arc::new(move |m: &PageMatch| sink.lock().unwrap().push(m.page)))
                .forget();
            Template::element("feed", [])
        })
    };

    let router = RouterView::builder()
        .route_stream(state.route_stream())
        .matcher(InPlaceMatcher::new(ctx.clone(), pagination_extractor("/foo"), feed).into_matcher())
        .build()
        .unwrap()
        .spawn();
    router.settled().await;

    state.navigate("/foo/2");
    state.navigate("/foo/3");
    let resolution = router.settled().await.unwrap();

    assert_eq!(resolution.path, "/foo/3");
    assert_eq!(*pages.lock().unwrap(), vec![Some(1), Some(2), Some(3)]);
    assert_eq!(router.slot().commits(), 1);
}

#[tokio::test]
async fn test_paginate_by_drives_paginated_matcher() {
    let (ctx, state) = state_at("/a/b/23");
    let router = RouterView::builder()
        .route_stream(state.route_stream())
        .matcher(
            PaginatedRouteMatcher::new(ctx.clone())
                .route(
                    "/a/b",
                    widget(|_: &AppContext, props: PageProps| {
                        Template::text(format!("page {}", props.page.unwrap_or_default()))
                    }),
                )
                .into_matcher(),
        )
        .build()
        .unwrap()
        .spawn();

    router.settled().await;
    assert_eq!(router.current(), Some(Template::text("page 23")));

    state.paginate_by(-3);
    router.settled().await;
    assert_eq!(state.current(), "/a/b/20");
    assert_eq!(router.current(), Some(Template::text("page 20")));
}

#[tokio::test]
async fn test_paginate_on_plain_path_logs_and_does_nothing() {
    let (logs, _guard) = common::capture_logs();
    let (_ctx, state) = state_at("/a/b");
    let (seen, _sub) = common::record_paths(&state);

    state.paginate_by(-3);

    assert_eq!(*seen.lock().unwrap(), vec!["/a/b"]);
    assert_eq!(logs.count("pagination ignored"), 1);
    assert!(logs.contents().contains("does not end in a page number"));
}

#[tokio::test]
async fn test_subscribe_replays_current_path() {
    let (_ctx, state) = state_at("/");
    state.navigate("/later");

    let (seen, _sub) = common::record_paths(&state);
    assert_eq!(*seen.lock().unwrap(), vec!["/later"]);
}

#[test]
fn test_registry_last_write_wins() {
    let ctx = AppContext::new();
    let (first, _) = RouterState::in_memory("/first");
    let (second, _) = RouterState::in_memory("/second");
    ctx.blocs().register(first);
    ctx.blocs().register(second);

    assert_eq!(ctx.blocs().of::<RouterState>().unwrap().current(), "/second");
}

#[tokio::test]
async fn test_matcher_result_no_change_keeps_output() {
    let (_ctx, state) = state_at("/one");
    let router = RouterView::builder()
        .route_stream(state.route_stream())
        .matcher(matcher_fn(|path, _| {
            if path == "/one" {
                Some(Template::text("one").into())
            } else {
                Some(Render::NoChange)
            }
        }))
        .build()
        .unwrap()
        .spawn();

    router.settled().await;
    state.navigate("/two");
    router.settled().await;

    assert_eq!(router.current(), Some(Template::text("one")));
}

#[tokio::test]
async fn test_app_redirect_back_and_reload() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        initial_path = "/"
        not_found = "nope"

        [[routes]]
        path = "/"
        template = "Home"

        [[routes]]
        path = "/about"
        template = "About"

        [[paginated]]
        prefix = "/posts"
        template = "Posts {{page}}"

        [[redirects]]
        from = "/start"
        to = "/about"
        "#
    )
    .unwrap();
    let config = load_config(file.path()).unwrap();
    let app = App::start(&config).unwrap();
    app.settle().await;
    assert_eq!(app.router().current(), Some(Template::text("Home")));

    let resolution = app.apply(Command::Navigate("/start".into())).await.unwrap();
    assert_eq!(resolution.path, "/about");
    assert_eq!(app.router().current(), Some(Template::text("About")));
    assert_eq!(app.history().entries(), vec!["/", "/about"]);

    app.apply(Command::parse("/posts/4")).await;
    assert_eq!(app.router().current(), Some(Template::text("Posts 4")));
    app.apply(Command::parse("+1")).await;
    assert_eq!(app.router().current(), Some(Template::text("Posts 5")));

    app.apply(Command::Back).await;
    assert_eq!(app.state().current(), "/posts/4");
    assert_eq!(app.router().current(), Some(Template::text("Posts 4")));

    let mut reloaded: ValvConfig = config.clone();
    reloaded.routes[1].template = "About us".to_string();
    app.reload(&reloaded);
    app.apply(Command::Navigate("/about".into())).await;
    assert_eq!(app.router().current(), Some(Template::text("About us")));

    app.apply(Command::Navigate("/missing".into())).await;
    assert_eq!(app.router().current(), Some(Template::text("nope")));
}
