//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ValvConfig (validated, immutable)
//!     → app.rs builds matchers and the routes table from it
//!
//! On file change (--watch):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → routes table swapped atomically in the running router
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Only the routes table and redirects hot-reload; matchers are fixed at
//!   startup because they may hold mounted state

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{InPlaceConfig, ObservabilityConfig, PaginatedConfig, RedirectConfig, RouteConfig, ValvConfig};
pub use validation::ValidationError;
pub use watcher::ConfigWatcher;
