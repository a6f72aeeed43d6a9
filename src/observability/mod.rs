//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (navigation / resolution counters)
//!
//! Consumers:
//!     → stderr (pretty or JSON lines)
//!     → whatever `metrics` recorder the host installs
//! ```
//!
//! # Design Decisions
//! - Absorbed failures (async source errors, malformed mounts, invalid
//!   pagination) are logged at error level and counted, never propagated
//! - Metrics are cheap; with no recorder installed they are no-ops

pub mod logging;
pub mod metrics;
