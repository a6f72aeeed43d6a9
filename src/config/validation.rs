//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Paths are absolute, prefixes are usable by the prefix grammar
//! - Detect duplicate routes and self-redirects
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ValvConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::ValvConfig;
use crate::routing::pattern::split_route;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: path {path:?} must start with '/'")]
    RelativePath { field: &'static str, path: String },

    #[error("route {0:?} is defined more than once")]
    DuplicateRoute(String),

    #[error("{field}: prefix {prefix:?} must be '/'-separated word segments")]
    InvalidPrefix { field: &'static str, prefix: String },

    #[error("in_place entry {0} has no prefixes")]
    EmptyPrefixSet(usize),

    #[error("redirect from {0:?} points at itself")]
    SelfRedirect(String),

    #[error("unknown log level {0:?}")]
    UnknownLogLevel(String),
}

/// Check every semantic rule, collecting all violations.
pub fn validate_config(config: &ValvConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_absolute(&mut errors, "initial_path", &config.initial_path);

    let mut seen = HashSet::new();
    for route in &config.routes {
        check_absolute(&mut errors, "routes", &route.path);
        if !seen.insert(route.path.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.path.clone()));
        }
    }

    for redirect in &config.redirects {
        check_absolute(&mut errors, "redirects", &redirect.from);
        check_absolute(&mut errors, "redirects", &redirect.to);
        if redirect.from == redirect.to {
            errors.push(ValidationError::SelfRedirect(redirect.from.clone()));
        }
        if !seen.insert(redirect.from.as_str()) {
            errors.push(ValidationError::DuplicateRoute(redirect.from.clone()));
        }
    }

    for paginated in &config.paginated {
        check_prefix(&mut errors, "paginated", &paginated.prefix);
    }

    for (index, in_place) in config.in_place.iter().enumerate() {
        if in_place.prefixes.is_empty() {
            errors.push(ValidationError::EmptyPrefixSet(index));
        }
        for prefix in &in_place.prefixes {
            check_prefix(&mut errors, "in_place", prefix);
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_absolute(errors: &mut Vec<ValidationError>, field: &'static str, path: &str) {
    if !path.starts_with('/') {
        errors.push(ValidationError::RelativePath {
            field,
            path: path.to_string(),
        });
    }
}

// a prefix is usable if `<prefix>/1` splits back into exactly that prefix
fn check_prefix(errors: &mut Vec<ValidationError>, field: &'static str, prefix: &str) {
    let probe = format!("{prefix}/1");
    if split_route(&probe).map(|(p, _)| p) != Some(prefix) {
        errors.push(ValidationError::InvalidPrefix {
            field,
            prefix: prefix.to_string(),
        });
    }
}
