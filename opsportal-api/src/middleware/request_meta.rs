/// Request network metadata capture
///
/// Runs before routing and stashes the client IP and User-Agent in the
/// request extensions so audit writers can attach them to their events.
/// The IP comes from the `X-Forwarded-For` chain (first hop) or
/// `X-Real-IP`; without a proxy in front both are absent and the fields
/// stay empty.

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

/// Network metadata of the current request
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    /// Client IP, if a proxy header carried one
    pub ip: Option<String>,

    /// User-Agent header value
    pub user_agent: Option<String>,
}

impl RequestMeta {
    /// Extracts metadata from request headers
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ip = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| {
                headers
                    .get("x-real-ip")
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            });

        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        Self { ip, user_agent }
    }
}

/// Middleware inserting [`RequestMeta`] into the request extensions
pub async fn capture_request_meta(mut req: Request, next: Next) -> Response {
    let meta = RequestMeta::from_headers(req.headers());
    req.extensions_mut().insert(meta);

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_for_first_hop_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.1"));

        let meta = RequestMeta::from_headers(&headers);
        assert_eq!(meta.ip.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn test_real_ip_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));

        let meta = RequestMeta::from_headers(&headers);
        assert_eq!(meta.ip.as_deref(), Some("198.51.100.4"));
    }

    #[test]
    fn test_empty_headers_yield_nothing() {
        let meta = RequestMeta::from_headers(&HeaderMap::new());
        assert!(meta.ip.is_none());
        assert!(meta.user_agent.is_none());
    }

    #[test]
    fn test_user_agent_captured() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8.5.0"));

        let meta = RequestMeta::from_headers(&headers);
        assert_eq!(meta.user_agent.as_deref(), Some("curl/8.5.0"));
    }
}
