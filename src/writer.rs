//! The engine's response-writer capability.
//!
//! Everything that produces output, whether a handler response, a middleware
//! short-circuit or a resolver, talks to a [`ResponseWriter`]. The engine
//! hands out an [`HttpWriter`]; the bad-status pipeline wraps it in a
//! [`DeferredWriter`](crate::DeferredWriter).

use bytes::{Bytes, BytesMut};
use http::header::{HeaderName, HeaderValue, SET_COOKIE};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use tracing::{trace, warn};

use crate::response::Cookie;

/// Write side of one HTTP exchange.
///
/// The status is *committed* by the first `write_status` (or implicitly by
/// the first `write_body`). After that, status and header changes are
/// ignored; only body bytes still go through.
pub trait ResponseWriter: Send {
    fn write_status(&mut self, code: u16);

    fn write_body(&mut self, body: &[u8]);

    /// Sets `name`, replacing earlier values. An empty `value` clears it.
    fn set_header(&mut self, name: &str, value: &str);

    /// Appends a `set-cookie` header. Emission order is call order.
    fn set_cookie(&mut self, cookie: &Cookie);

    fn is_committed(&self) -> bool;

    /// Status that is (or would be) on the wire.
    fn status(&self) -> u16;
}

/// In-memory writer that becomes an `http::Response` once the request is done.
#[derive(Debug, Default)]
pub struct HttpWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl HttpWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Finishes the exchange. An uncommitted writer defaults to `200 OK`.
    pub fn into_response(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body.freeze()));
        *res.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *res.headers_mut() = self.headers;
        res
    }
}

impl ResponseWriter for HttpWriter {
    fn write_status(&mut self, code: u16) {
        if let Some(current) = self.status {
            warn!(current = current.as_u16(), ignored = code, "status already committed");
            return;
        }
        let status = StatusCode::from_u16(code).unwrap_or_else(|_| {
            warn!(code, "invalid status code, committing 500");
            StatusCode::INTERNAL_SERVER_ERROR
        });
        self.status = Some(status);
    }

    fn write_body(&mut self, body: &[u8]) {
        if self.status.is_none() {
            self.write_status(StatusCode::OK.as_u16());
        }
        self.body.extend_from_slice(body);
    }

    fn set_header(&mut self, name: &str, value: &str) {
        if self.is_committed() {
            trace!(name, "header ignored, status already committed");
            return;
        }
        let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
            warn!(name, "invalid header name");
            return;
        };
        if value.is_empty() {
            self.headers.remove(&name);
            return;
        }
        match HeaderValue::from_str(value) {
            Ok(value) => { self.headers.insert(name, value); }
            Err(_)    => warn!(%name, "invalid header value"),
        }
    }

    fn set_cookie(&mut self, cookie: &Cookie) {
        if self.is_committed() {
            trace!(name = %cookie.name, "cookie ignored, status already committed");
            return;
        }
        match HeaderValue::from_str(&cookie.to_header_value()) {
            Ok(value) => { self.headers.append(SET_COOKIE, value); }
            Err(_)    => warn!(name = %cookie.name, "invalid cookie"),
        }
    }

    fn is_committed(&self) -> bool {
        self.status.is_some()
    }

    fn status(&self) -> u16 {
        self.status.map_or(200, |s| s.as_u16())
    }
}
