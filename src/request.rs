//! Incoming request type.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use bytes::Bytes;
use http::request::Parts;
use http::{Extensions, HeaderMap, Method, Uri};

use crate::responder::Responder;

/// An incoming HTTP request with its body fully read.
pub struct Request {
    pub(crate) parts: Parts,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
    pub(crate) responder: Responder,
    pub(crate) forwarded_by_client_ip: bool,
}

impl Request {
    pub(crate) fn new(parts: Parts, body: Bytes, responder: Responder) -> Self {
        Self {
            parts,
            body,
            params: HashMap::new(),
            responder,
            forwarded_by_client_ip: true,
        }
    }

    pub fn method(&self) -> &Method { &self.parts.method }
    pub fn uri(&self) -> &Uri { &self.parts.uri }
    pub fn path(&self) -> &str { self.parts.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.parts.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn extensions(&self) -> &Extensions { &self.parts.extensions }
    pub fn extensions_mut(&mut self) -> &mut Extensions { &mut self.parts.extensions }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    /// Global middlewares run before routing and see no parameters.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Enveloped-response builders bound to the configured encoder.
    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    /// Peer address as seen by the listener, if the request came from one.
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.parts.extensions.get::<SocketAddr>().copied()
    }

    /// Best guess at the client's address.
    ///
    /// Honors `x-forwarded-for` (first entry) and `x-real-ip` unless
    /// forwarded-IP resolution is disabled in the settings.
    pub fn client_ip(&self) -> Option<IpAddr> {
        if self.forwarded_by_client_ip {
            let forwarded = self.header("x-forwarded-for")
                .and_then(|v| v.split(',').next())
                .and_then(|v| v.trim().parse().ok());
            if forwarded.is_some() {
                return forwarded;
            }
            if let Some(ip) = self.header("x-real-ip").and_then(|v| v.trim().parse().ok()) {
                return Some(ip);
            }
        }
        self.remote_addr().map(|a| a.ip())
    }

    /// Snapshot handed to resolvers after the request itself is consumed.
    pub fn info(&self) -> RequestInfo {
        RequestInfo {
            method: self.parts.method.clone(),
            path: self.path().to_owned(),
            responder: self.responder.clone(),
        }
    }
}

/// What resolvers know about a request: enough to log it and to build an
/// enveloped response for it.
#[derive(Clone)]
pub struct RequestInfo {
    pub method: Method,
    pub path: String,
    pub responder: Responder,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub(crate) fn request(builder: http::request::Builder) -> Request {
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        Request::new(parts, Bytes::new(), Responder::default())
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::request;

    #[test]
    fn client_ip_prefers_forwarded_headers() {
        let mut req = request(
            http::Request::builder()
                .uri("/")
                .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
                .header("x-real-ip", "198.51.100.4"),
        );
        req.extensions_mut().insert("127.0.0.1:9000".parse::<std::net::SocketAddr>().unwrap());
        assert_eq!(req.client_ip(), Some("203.0.113.9".parse().unwrap()));

        req.forwarded_by_client_ip = false;
        assert_eq!(req.client_ip(), Some("127.0.0.1".parse().unwrap()));
    }

    #[test]
    fn info_snapshot() {
        let req = request(http::Request::builder().method("PUT").uri("/users/1?x=y"));
        let info = req.info();
        assert_eq!(info.method, http::Method::PUT);
        assert_eq!(info.path, "/users/1");
    }
}
