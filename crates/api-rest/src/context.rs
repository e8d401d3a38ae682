//! Per-request context built once at the transport boundary.
//!
//! Handlers never reach into headers or socket state themselves: the
//! context is populated from the request here and passed down into core
//! services as plain values (the submitter IP recorded on uploads and
//! drawings).

use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Context extracted from one incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Best-effort client address; empty when nothing identifies the peer.
    pub client_ip: String,
}

impl RequestContext {
    /// Builds the context from request headers and the connected peer.
    ///
    /// Precedence: `Client-IP` header, then the first (client-most) entry
    /// of `X-Forwarded-For`, then the socket peer address.
    pub fn from_request(headers: &HeaderMap, remote_addr: Option<SocketAddr>) -> Self {
        let client_ip = header_value(headers, "client-ip")
            .or_else(|| {
                header_value(headers, "x-forwarded-for")
                    .and_then(|list| list.split(',').next().map(|ip| ip.trim().to_string()))
            })
            .filter(|ip| !ip.is_empty())
            .or_else(|| remote_addr.map(|addr| addr.ip().to_string()))
            .unwrap_or_default();

        Self { client_ip }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn addr() -> SocketAddr {
        "192.0.2.10:4444".parse().unwrap()
    }

    #[test]
    fn test_client_ip_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("client-ip", HeaderValue::from_static("203.0.113.1"));
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.2, 10.0.0.1"),
        );

        let ctx = RequestContext::from_request(&headers, Some(addr()));
        assert_eq!(ctx.client_ip, "203.0.113.1");
    }

    #[test]
    fn test_forwarded_for_takes_first_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.2, 10.0.0.1, 10.0.0.2"),
        );

        let ctx = RequestContext::from_request(&headers, Some(addr()));
        assert_eq!(ctx.client_ip, "203.0.113.2");
    }

    #[test]
    fn test_falls_back_to_socket_address() {
        let ctx = RequestContext::from_request(&HeaderMap::new(), Some(addr()));
        assert_eq!(ctx.client_ip, "192.0.2.10");
    }

    #[test]
    fn test_empty_when_nothing_known() {
        let ctx = RequestContext::from_request(&HeaderMap::new(), None);
        assert_eq!(ctx.client_ip, "");
    }
}
