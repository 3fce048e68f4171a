//! URL helpers for building provider endpoints.
//!
//! Base URLs come from user configuration and frequently carry trailing
//! slashes; these helpers keep endpoint construction free of doubled
//! separators.

/// Strip trailing slashes from a configured base URL.
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path with exactly one separator.
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}
