//! Path grammars.
//!
//! Two patterns are in play and they are deliberately not the same:
//! - route pattern `^((?:/\w+)+)/(.+)$` splits a path into a prefix and an
//!   arbitrary remainder (`/posts/abc` matches, remainder `abc`)
//! - pagination pattern `^((?:/\w+)+/)(\d+)$` requires a trailing run of
//!   digits and keeps the slash in the prefix
//!
//! `\w` is the ASCII word class in both.

use std::sync::LazyLock;

use regex::Regex;

static ROUTE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^((?:/[A-Za-z0-9_]+)+)/(.+)$").expect("route pattern is valid"));

static PAGINATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:/[A-Za-z0-9_]+)+/)([0-9]+)$").expect("pagination pattern is valid")
});

/// Split `/a/b/rest` into (`/a/b`, `rest`). The prefix is greedy, so the
/// remainder is the last segment unless it contains non-word characters.
pub fn split_route(path: &str) -> Option<(&str, &str)> {
    let caps = ROUTE_PATTERN.captures(path)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// Split `/a/b/23` into (`/a/b/`, `23`).
pub fn split_page_number(path: &str) -> Option<(&str, &str)> {
    let caps = PAGINATION_PATTERN.captures(path)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// Lenient integer parse: skips leading whitespace, accepts an optional
/// sign, then reads as many decimal digits as it can. `None` means the
/// input does not start with a number (or does not fit in an `i64`).
pub fn parse_page(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let magnitude: i64 = rest[..digits].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
