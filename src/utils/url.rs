//! URL utilities for building provider endpoints

/// Normalize a base URL by removing trailing slashes
///
/// ```
/// use gotcha::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://api.openai.com/"), "https://api.openai.com");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path with exactly one slash between them
///
/// ```
/// use gotcha::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://api.openai.com/", "/v1/responses"),
///     "https://api.openai.com/v1/responses"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}
