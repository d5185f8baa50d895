//! Utility functions and helpers.

pub mod http;

/// Join a base URL and a relative path with exactly one slash between them.
pub fn join_path(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
