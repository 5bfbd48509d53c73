use http::HeaderMap;

/// Check the caller's API key against the configured public key.
///
/// The key may arrive either in the `X-API-Key` header or as the `api_key`
/// query parameter; plain equality is the whole scheme.
pub fn api_key_matches(headers: &HeaderMap, query_key: Option<&str>, expected: &str) -> bool {
    let header_key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok());

    match header_key.or(query_key) {
        Some(presented) => presented == expected,
        None => false,
    }
}
