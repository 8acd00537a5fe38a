//! Shared proxy response handling

use axum::response::{IntoResponse, Response};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};

use pkgbridge_proxy::DEFAULT_USER_AGENT;

/// Upstream response headers echoed to the caller on a successful probe.
const FORWARDED_HEADERS: [HeaderName; 7] = [
    HeaderName::from_static("x-checksum-sha1"),
    HeaderName::from_static("x-checksum-sha512"),
    HeaderName::from_static("x-checksum-md5"),
    HeaderName::from_static("x-content-type-options"),
    HeaderName::from_static("x-frame-options"),
    HeaderName::from_static("x-gitlab-meta"),
    HeaderName::from_static("cf-cache-status"),
];

/// The caller's user agent, or the default when absent or malformed.
pub fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_USER_AGENT)
        .to_string()
}

/// Redirect the caller to the URL a winning probe resolved to, carrying
/// over the allow-listed upstream headers. The body is never streamed
/// through the gateway.
pub fn redirect_to_upstream(upstream: &reqwest::Response) -> Response {
    let mut response = StatusCode::MOVED_PERMANENTLY.into_response();
    let headers = response.headers_mut();

    if let Ok(location) = HeaderValue::from_str(upstream.url().as_str()) {
        headers.insert(header::LOCATION, location);
    }
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));

    for name in &FORWARDED_HEADERS {
        if let Some(value) = upstream.headers().get(name) {
            headers.insert(name.clone(), value.clone());
        }
    }

    response
}
