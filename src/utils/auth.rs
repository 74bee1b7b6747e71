//! Authentication utilities for API requests

/// Add bearer authentication to an HTTP request
///
/// The Responses endpoint expects `Authorization: Bearer <key>`. The key is
/// trimmed so stray whitespace from `.env` files does not end up in the
/// header.
pub fn add_bearer_auth(request: reqwest::RequestBuilder, api_key: &str) -> reqwest::RequestBuilder {
    request.header("Authorization", format!("Bearer {}", api_key.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_is_set() {
        let client = reqwest::Client::new();
        let request = add_bearer_auth(client.post("https://example.com"), " test-key\n")
            .build()
            .unwrap();

        assert_eq!(
            request
                .headers()
                .get("Authorization")
                .and_then(|value| value.to_str().ok()),
            Some("Bearer test-key")
        );
    }
}
