//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Navigation intent (widget, CLI, host)
//!     → state.rs (RouterState: history + replayable path stream)
//!     → router.rs (RouterView driver, switch-latest)
//!         → matcher.rs / in_place.rs (PathMatcher chain, in order)
//!         → routes.rs (exact path table, hot-swappable)
//!         → not-found template
//!     → RenderSlot
//! ```
//!
//! # Design Decisions
//! - First matching matcher wins; matchers are awaited one at a time
//! - Prefix grammars live in pattern.rs and are shared by every matcher
//! - Host interaction goes through the `History` trait only

pub mod history;
pub mod in_place;
pub mod matcher;
pub mod pattern;
pub mod router;
pub mod routes;
pub mod state;
pub mod widget;

use thiserror::Error;

pub use history::{History, MemoryHistory};
pub use in_place::{pagination_extractor, Extractor, InPlaceMatcher, InPlaceProps, PageMatch, PrefixSet};
pub use matcher::{async_matcher_fn, matcher_fn, PageProps, PaginatedRouteMatcher, PathMatcher};
pub use router::{Outcome, Resolution, RouterBuilder, RouterHandle, RouterView};
pub use routes::{RouteEntry, RouteTable, TemplateFactory};
pub use state::RouterState;
pub use widget::{make_redirecter, widget, Widget, WidgetFactory, WidgetSource};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// A router cannot run without a stream of paths.
    #[error("router needs a route stream")]
    MissingRouteStream,

    #[error("path {0:?} does not end in a page number")]
    NonPaginatedPath(String),

    #[error("page number of {0:?} out of range")]
    PageOverflow(String),
}
