//! valv: a small toolkit for client-side routing.
//!
//! - `registry`: type-keyed service registry and the application context
//! - `stream`: replayable multicast streams and deferred values
//! - `render`: templates, render slots and the async bridge
//! - `routing`: router state, matcher chain, pagination matchers
//! - `config` / `app`: build a router from TOML and drive it

pub mod app;
pub mod config;
pub mod observability;
pub mod registry;
pub mod render;
pub mod routing;
pub mod stream;
pub mod testing;

pub use app::App;
pub use config::ValvConfig;
pub use registry::{AppContext, ServiceRegistry};
pub use routing::{RouterState, RouterView};
