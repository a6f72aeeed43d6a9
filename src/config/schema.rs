//! Configuration schema definitions.
//!
//! Describes a router: which paths render what, which prefixes paginate,
//! which redirect. All types derive Serde traits for deserialization from
//! TOML.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ValvConfig {
    /// Path the in-memory host starts at.
    pub initial_path: String,

    /// Text rendered when nothing matches. Built-in placeholder if absent.
    pub not_found: Option<String>,

    /// Exact-path routes.
    pub routes: Vec<RouteConfig>,

    /// `/prefix/<page>` routes re-rendered on every page.
    pub paginated: Vec<PaginatedConfig>,

    /// `/prefix/<page>` families rendered once and fed a page stream.
    pub in_place: Vec<InPlaceConfig>,

    /// Paths that replace themselves with another path.
    pub redirects: Vec<RedirectConfig>,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

impl Default for ValvConfig {
    fn default() -> Self {
        Self {
            initial_path: "/".to_string(),
            not_found: None,
            routes: Vec::new(),
            paginated: Vec::new(),
            in_place: Vec::new(),
            redirects: Vec::new(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Exact path → text template.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RouteConfig {
    pub path: String,
    pub template: String,
}

/// Paginated prefix. `{page}` in the template is replaced by the page
/// number, or `NaN` when the tail is not numeric.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PaginatedConfig {
    pub prefix: String,
    pub template: String,
}

/// In-place family over one or more prefixes. The template is rendered
/// once on entry; later pages only show up in the logs.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct InPlaceConfig {
    pub prefixes: Vec<String>,
    pub template: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RedirectConfig {
    pub from: String,
    pub to: String,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
