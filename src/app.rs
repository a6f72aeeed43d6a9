//! Application assembly.
//!
//! # Responsibilities
//! - Build the context, host history and registered router state
//! - Turn a [`ValvConfig`] into matchers, a routes table and a router
//! - Apply navigation commands and report what got rendered
//! - Swap in reloaded routes while running
//!
//! # Data Flow
//! ```text
//! ValvConfig
//!     → paginated[]  → PaginatedRouteMatcher   ┐
//!     → in_place[]   → InPlaceMatcher (each)   ├→ RouterView → RouterHandle
//!     → routes[] + redirects[] → RouteTable    ┘
//!
//! Command (path | back | ±N)
//!     → RouterState → route stream → router → RenderSlot
//! ```

use std::sync::Arc;

use crate::config::schema::{InPlaceConfig, ValvConfig};
use crate::registry::AppContext;
use crate::render::Template;
use crate::routing::{
    make_redirecter, pagination_extractor, widget, InPlaceMatcher, InPlaceProps, MemoryHistory,
    PageMatch, PageProps, PaginatedRouteMatcher, PathMatcher, Resolution, RouteEntry, RouteTable,
    RouterError, RouterHandle, RouterState, RouterView,
};
use crate::stream::Source;

/// One navigation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Navigate(String),
    Back,
    Paginate(i64),
}

impl Command {
    /// `back`, `+N` / `-N`, or anything else as a path.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line == "back" {
            return Command::Back;
        }
        if line.starts_with('+') || line.starts_with('-') {
            if let Ok(delta) = line.parse::<i64>() {
                return Command::Paginate(delta);
            }
        }
        Command::Navigate(line.to_string())
    }
}

/// A running router built from configuration.
pub struct App {
    context: Arc<AppContext>,
    state: Arc<RouterState>,
    history: Arc<MemoryHistory>,
    router: RouterHandle,
}

impl App {
    /// Build everything and start the router. Needs a tokio runtime.
    pub fn start(config: &ValvConfig) -> Result<Self, RouterError> {
        let context = Arc::new(AppContext::new());
        let (state, history) = RouterState::in_memory(config.initial_path.clone());
        let route_stream = state.route_stream();
        let state = context.blocs().register(state);

        let mut builder = RouterView::builder()
            .route_stream(route_stream)
            .matchers(build_matchers(&context, config))
            .routes(build_routes(&context, config));
        if let Some(text) = &config.not_found {
            builder = builder.not_found(Template::text(text.clone()));
        }

        let router = builder.build()?.spawn();

        tracing::info!(
            initial_path = %config.initial_path,
            routes = config.routes.len(),
            paginated = config.paginated.len(),
            in_place = config.in_place.len(),
            redirects = config.redirects.len(),
            "router started"
        );

        Ok(Self {
            context,
            state,
            history,
            router,
        })
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.context
    }

    pub fn state(&self) -> &Arc<RouterState> {
        &self.state
    }

    pub fn history(&self) -> &Arc<MemoryHistory> {
        &self.history
    }

    pub fn router(&self) -> &RouterHandle {
        &self.router
    }

    /// Apply a command and wait for the router to settle.
    pub async fn apply(&self, command: Command) -> Option<Resolution> {
        match command {
            Command::Navigate(path) => self.state.navigate(path),
            Command::Back => {
                self.state.back();
                self.history.settle();
            }
            Command::Paginate(delta) => self.state.paginate_by(delta),
        }
        self.settle().await
    }

    /// Wait until every emitted path, including redirect targets, has been
    /// resolved.
    pub async fn settle(&self) -> Option<Resolution> {
        let mut last = self.router.settled().await;
        while last.as_ref().is_some_and(|r| r.generation < self.router.emitted()) {
            last = self.router.settled().await;
        }
        last
    }

    /// Swap in the routes and redirects of a reloaded configuration.
    /// Matchers are kept as they are.
    pub fn reload(&self, config: &ValvConfig) {
        self.router.reload_routes(build_routes(&self.context, config));
    }
}

fn build_matchers(context: &Arc<AppContext>, config: &ValvConfig) -> Vec<Arc<dyn PathMatcher>> {
    let mut matchers = Vec::new();

    if !config.paginated.is_empty() {
        let mut paginated = PaginatedRouteMatcher::new(context.clone());
        for entry in &config.paginated {
            let template = entry.template.clone();
            paginated = paginated.route(
                entry.prefix.clone(),
                widget(move |_: &AppContext, props: PageProps| page_template(&template, props.page)),
            );
        }
        matchers.push(paginated.into_matcher());
    }

    for entry in &config.in_place {
        matchers.push(in_place_matcher(context, entry));
    }

    matchers
}

fn in_place_matcher(context: &Arc<AppContext>, entry: &InPlaceConfig) -> Arc<dyn PathMatcher> {
    let template = entry.template.clone();
    let mounted = widget(move |_: &AppContext, props: InPlaceProps<PageMatch>| {
        let first = props.page_stream.value();
        props
            .page_stream
            .subscribe(Arc::new(|m: &PageMatch| {
                tracing::info!(prefix = %m.path, page = ?m.page, "in-place page");
            }))
            .forget();
        page_template(&template, first.page)
    });
    InPlaceMatcher::new(context.clone(), pagination_extractor(entry.prefixes.clone()), mounted)
        .into_matcher()
}

fn build_routes(context: &Arc<AppContext>, config: &ValvConfig) -> RouteTable {
    let mut table = RouteTable::new();
    for route in &config.routes {
        table.insert(route.path.clone(), Template::text(route.template.clone()));
    }
    for redirect in &config.redirects {
        let ctx = context.clone();
        let redirecter = make_redirecter(redirect.to.clone());
        table.insert(
            redirect.from.clone(),
            RouteEntry::lazy(move || redirecter(&ctx, ())),
        );
    }
    table
}

fn page_template(template: &str, page: Option<i64>) -> Template {
    let page = page.map_or_else(|| "NaN".to_string(), |p| p.to_string());
    Template::text(template.replace("{page}", &page))
}
