//! Outgoing response model and the [`IntoResponse`] conversion trait.
//!
//! A [`Response`] is one of two things:
//!
//! - **Structured**: a [`ResponseData`] record (body bytes, content type,
//!   status, headers, cookies) that rampart applies to the writer for you.
//!   Enveloped responses from the [`Responder`](crate::Responder) are
//!   structured.
//! - **Raw**: a callback that writes against the engine's
//!   [`ResponseWriter`] itself. Redirects, bare status codes and the
//!   `json`/`xml`/`yaml`/`toml`/`text` shortcuts are raw.
//!
//! ```rust
//! use rampart::{ContentType, Response};
//!
//! Response::text("hello");
//! Response::redirect("/login");
//! Response::http_status_code(204);
//!
//! Response::builder()
//!     .status(201)
//!     .header("location", "/users/42")
//!     .bytes(ContentType::Csv, b"id\n42\n".to_vec());
//! ```

use serde::Serialize;
use tracing::{trace, warn};

use crate::error::Error;
use crate::writer::ResponseWriter;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`RawBuilder::bytes`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Csv,          // text/csv
    EventStream,  // text/event-stream  (SSE)
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream  (binary / file download)
    Text,         // text/plain; charset=utf-8
    Toml,         // application/toml; charset=utf-8
    Xml,          // application/xml; charset=utf-8
    Yaml,         // application/yaml; charset=utf-8
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv         => "text/csv",
            Self::EventStream => "text/event-stream",
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Toml        => "application/toml; charset=utf-8",
            Self::Xml         => "application/xml; charset=utf-8",
            Self::Yaml        => "application/yaml; charset=utf-8",
        }
    }
}

// ── Header / Cookie ───────────────────────────────────────────────────────────

/// A response header. An empty `value` clears any header of the same name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// A `set-cookie` entry.
///
/// `max_age` follows the usual convention: positive sets `Max-Age`, negative
/// expires the cookie immediately (`Max-Age=0`), zero leaves it a session
/// cookie. An empty `path` becomes `/`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub max_age: i64,
    pub path: String,
    pub domain: String,
    pub secure: bool,
    pub http_only: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            max_age: 0,
            path: String::new(),
            domain: String::new(),
            secure: false,
            http_only: false,
        }
    }

    pub fn max_age(mut self, seconds: i64) -> Self { self.max_age = seconds; self }
    pub fn path(mut self, path: impl Into<String>) -> Self { self.path = path.into(); self }
    pub fn domain(mut self, domain: impl Into<String>) -> Self { self.domain = domain.into(); self }
    pub fn secure(mut self, secure: bool) -> Self { self.secure = secure; self }
    pub fn http_only(mut self, http_only: bool) -> Self { self.http_only = http_only; self }

    pub(crate) fn to_header_value(&self) -> String {
        let path = if self.path.is_empty() { "/" } else { self.path.as_str() };
        let mut out = format!("{}={}; Path={path}", self.name, self.value);
        if !self.domain.is_empty() {
            out.push_str("; Domain=");
            out.push_str(&self.domain);
        }
        if self.max_age > 0 {
            out.push_str(&format!("; Max-Age={}", self.max_age));
        } else if self.max_age < 0 {
            out.push_str("; Max-Age=0");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        out
    }
}

// ── ResponseData ──────────────────────────────────────────────────────────────

/// Everything a structured response puts on the wire.
///
/// `status == 0` means unset and is written as `200`. A missing content type
/// becomes `application/json`. With an empty `body` nothing is written to
/// the body at all; cookies, headers and status still apply.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResponseData {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    pub status: u16,
    pub headers: Vec<Header>,
    pub cookies: Vec<Cookie>,
}

impl ResponseData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(Header::new(name, value));
        self
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = Header>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn with_cookies(mut self, cookies: impl IntoIterator<Item = Cookie>) -> Self {
        self.cookies.extend(cookies);
        self
    }

    /// Applies cookies, then headers, then status and body.
    pub(crate) fn write_to(self, writer: &mut dyn ResponseWriter) {
        for cookie in &self.cookies {
            writer.set_cookie(cookie);
        }
        for header in &self.headers {
            writer.set_header(&header.name, &header.value);
        }

        let status = if self.status == 0 { 200 } else { self.status };
        if self.body.is_empty() {
            writer.write_status(status);
            return;
        }

        let content_type = match self.content_type.as_deref() {
            Some(ct) if !ct.is_empty() => ct,
            _ => {
                trace!("content type not set, using {}", ContentType::Json.as_str());
                ContentType::Json.as_str()
            }
        };
        writer.set_header("content-type", content_type);
        writer.write_status(status);
        writer.write_body(&self.body);
    }
}

// ── Response ──────────────────────────────────────────────────────────────────

/// Callback behind a raw response.
pub type WriteFn = Box<dyn FnOnce(&mut dyn ResponseWriter) -> Result<(), Error> + Send + 'static>;

/// Raw response: a write callback plus optional data declared for
/// introspection. The declared data is never written.
pub struct RawResponse {
    write: WriteFn,
    declared: Option<ResponseData>,
}

/// What a handler, middleware or resolver sends back.
pub enum Response {
    Structured(ResponseData),
    Raw(RawResponse),
}

impl Response {
    /// Structured response from prepared data.
    pub fn structured(data: ResponseData) -> Self {
        Self::Structured(data)
    }

    /// Raw response that writes against the engine writer directly.
    pub fn raw<F>(write: F) -> Self
    where
        F: FnOnce(&mut dyn ResponseWriter) -> Result<(), Error> + Send + 'static,
    {
        Self::Raw(RawResponse { write: Box::new(write), declared: None })
    }

    /// Attaches introspection data to a raw response. No effect on
    /// structured responses.
    pub fn declare(self, data: ResponseData) -> Self {
        match self {
            Self::Raw(raw) => Self::Raw(RawResponse { write: raw.write, declared: Some(data) }),
            structured => structured,
        }
    }

    /// The response's data. `None` for raw responses that declared nothing:
    /// they handle status and body themselves.
    pub fn data(&self) -> Option<&ResponseData> {
        match self {
            Self::Structured(data) => Some(data),
            Self::Raw(raw) => raw.declared.as_ref(),
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }

    /// `200 OK`, body serialized with `serde_json`.
    pub fn json<T: Serialize + Send + 'static>(value: T) -> Self {
        Self::builder().json(value)
    }

    /// `200 OK`, body serialized with `serde-xml-rs`.
    pub fn xml<T: Serialize + Send + 'static>(value: T) -> Self {
        Self::builder().xml(value)
    }

    /// `200 OK`, body serialized with `serde_yaml`.
    pub fn yaml<T: Serialize + Send + 'static>(value: T) -> Self {
        Self::builder().yaml(value)
    }

    /// `200 OK`, body serialized with `toml`.
    pub fn toml<T: Serialize + Send + 'static>(value: T) -> Self {
        Self::builder().toml(value)
    }

    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// `301 Moved Permanently` to `url`.
    pub fn redirect(url: impl Into<String>) -> Self {
        Self::builder().redirect(url)
    }

    /// Bare status, no body.
    pub fn http_status_code(code: u16) -> Self {
        Self::raw(move |w| {
            w.write_status(code);
            Ok(())
        })
    }

    /// Builder for raw responses that need a custom status or extra headers.
    pub fn builder() -> RawBuilder {
        RawBuilder { headers: Vec::new(), status: None }
    }

    pub(crate) fn write_to(self, writer: &mut dyn ResponseWriter) -> Result<(), Error> {
        match self {
            Self::Raw(raw) => (raw.write)(writer),
            Self::Structured(data) => {
                data.write_to(writer);
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structured(data) => f.debug_tuple("Structured").field(data).finish(),
            Self::Raw(raw) => f.debug_struct("Raw").field("declared", &raw.declared).finish_non_exhaustive(),
        }
    }
}

// ── RawBuilder ────────────────────────────────────────────────────────────────

/// Fluent builder for raw responses.
///
/// Obtain via [`Response::builder()`]. Terminated by a typed body method.
/// Serialization happens when the response is written; a failure there is a
/// fault handled by the panic resolver.
pub struct RawBuilder {
    headers: Vec<Header>,
    status: Option<u16>,
}

impl RawBuilder {
    pub fn status(mut self, code: u16) -> Self {
        self.status = Some(code);
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push(Header::new(name, value));
        self
    }

    pub fn json<T: Serialize + Send + 'static>(self, value: T) -> Response {
        self.serialized(ContentType::Json, move || serde_json::to_vec(&value).map_err(Error::encode))
    }

    pub fn xml<T: Serialize + Send + 'static>(self, value: T) -> Response {
        self.serialized(ContentType::Xml, move || {
            serde_xml_rs::to_string(&value).map(String::into_bytes).map_err(Error::encode)
        })
    }

    pub fn yaml<T: Serialize + Send + 'static>(self, value: T) -> Response {
        self.serialized(ContentType::Yaml, move || {
            serde_yaml::to_string(&value).map(String::into_bytes).map_err(Error::encode)
        })
    }

    pub fn toml<T: Serialize + Send + 'static>(self, value: T) -> Response {
        self.serialized(ContentType::Toml, move || {
            toml::to_string(&value).map(String::into_bytes).map_err(Error::encode)
        })
    }

    pub fn text(self, body: impl Into<String>) -> Response {
        self.bytes(ContentType::Text, body.into().into_bytes())
    }

    /// Terminate with a typed body. Use this for HTML, CSV, binary, SSE, etc.
    pub fn bytes(self, content_type: ContentType, body: Vec<u8>) -> Response {
        self.serialized(content_type, move || Ok(body))
    }

    /// Redirect to `url`. Defaults to `301`.
    pub fn redirect(self, url: impl Into<String>) -> Response {
        let url = url.into();
        let status = self.status.unwrap_or(301);
        if !(300..=308).contains(&status) {
            warn!(status, "bad redirect status code, redirect may not work");
        }
        let headers = self.headers;
        Response::raw(move |w| {
            for h in &headers {
                w.set_header(&h.name, &h.value);
            }
            w.set_header("location", &url);
            w.write_status(status);
            Ok(())
        })
    }

    fn serialized<F>(self, content_type: ContentType, body: F) -> Response
    where
        F: FnOnce() -> Result<Vec<u8>, Error> + Send + 'static,
    {
        let status = self.status.unwrap_or(200);
        let headers = self.headers;
        Response::raw(move |w| {
            let body = body()?;
            for h in &headers {
                w.set_header(&h.name, &h.value);
            }
            w.set_header("content-type", content_type.as_str());
            w.write_status(status);
            w.write_body(&body);
            Ok(())
        })
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into what a handler sends back.
///
/// `None` means "no response": the request ends as a bare `200` with an
/// empty body.
pub trait IntoResponse {
    fn into_response(self) -> Option<Response>;
}

impl IntoResponse for Response {
    fn into_response(self) -> Option<Response> { Some(self) }
}

impl IntoResponse for Option<Response> {
    fn into_response(self) -> Option<Response> { self }
}

impl IntoResponse for () {
    fn into_response(self) -> Option<Response> { None }
}

impl IntoResponse for ResponseData {
    fn into_response(self) -> Option<Response> { Some(Response::Structured(self)) }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Option<Response> { Some(Response::text(self)) }
}

impl IntoResponse for String {
    fn into_response(self) -> Option<Response> { Some(Response::text(self)) }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;
    use crate::writer::HttpWriter;

    #[derive(Serialize)]
    struct User {
        id: u32,
        name: String,
    }

    fn alice() -> User {
        User { id: 7, name: "alice".into() }
    }

    fn write(response: Response) -> HttpWriter {
        let mut w = HttpWriter::new();
        response.write_to(&mut w).unwrap();
        w
    }

    #[test]
    fn structured_defaults() {
        let w = write(Response::structured(ResponseData::new().with_body(b"{}".to_vec())));
        assert_eq!(w.status(), 200);
        assert_eq!(w.headers()["content-type"], "application/json");
        assert_eq!(w.body(), b"{}");
    }

    #[test]
    fn empty_body_skips_body_write_but_keeps_the_rest() {
        let data = ResponseData::new()
            .with_status(202)
            .with_content_type("text/csv")
            .with_header("x-request-id", "r1")
            .with_cookie(Cookie::new("sid", "abc"));
        let w = write(Response::structured(data));
        assert_eq!(w.status(), 202);
        assert!(w.body().is_empty());
        assert!(w.headers().get("content-type").is_none());
        assert_eq!(w.headers()["x-request-id"], "r1");
        assert_eq!(w.headers()["set-cookie"], "sid=abc; Path=/");
    }

    #[test]
    fn empty_header_value_clears_previous() {
        let data = ResponseData::new()
            .with_header("x-cache", "hit")
            .with_header("x-cache", "")
            .with_body(b"ok".to_vec());
        let w = write(Response::structured(data));
        assert!(w.headers().get("x-cache").is_none());
    }

    #[test]
    fn cookies_keep_their_order() {
        let data = ResponseData::new()
            .with_cookie(Cookie::new("a", "1"))
            .with_cookies([Cookie::new("b", "2"), Cookie::new("c", "3")]);
        let w = write(Response::structured(data));
        let cookies: Vec<_> = w.headers().get_all("set-cookie").iter()
            .map(|v| v.to_str().unwrap().to_owned())
            .collect();
        assert_eq!(cookies, ["a=1; Path=/", "b=2; Path=/", "c=3; Path=/"]);
    }

    #[test]
    fn cookie_attributes() {
        let cookie = Cookie::new("sid", "abc")
            .max_age(3600)
            .path("/api")
            .domain("example.com")
            .secure(true)
            .http_only(true);
        assert_eq!(
            cookie.to_header_value(),
            "sid=abc; Path=/api; Domain=example.com; Max-Age=3600; HttpOnly; Secure",
        );
        assert_eq!(Cookie::new("sid", "").max_age(-1).to_header_value(), "sid=; Path=/; Max-Age=0");
    }

    #[test]
    fn raw_json() {
        let w = write(Response::builder().status(201).header("x-id", "7").json(alice()));
        assert_eq!(w.status(), 201);
        assert_eq!(w.headers()["content-type"], "application/json");
        assert_eq!(w.headers()["x-id"], "7");
        assert_eq!(w.body(), br#"{"id":7,"name":"alice"}"#);
    }

    #[test]
    fn raw_text_formats() {
        let w = write(Response::yaml(alice()));
        assert_eq!(w.headers()["content-type"], "application/yaml; charset=utf-8");
        assert!(String::from_utf8_lossy(w.body()).contains("name: alice"));

        let w = write(Response::toml(alice()));
        assert_eq!(w.headers()["content-type"], "application/toml; charset=utf-8");
        assert!(String::from_utf8_lossy(w.body()).contains(r#"name = "alice""#));

        let w = write(Response::xml(alice()));
        assert_eq!(w.headers()["content-type"], "application/xml; charset=utf-8");
        assert!(String::from_utf8_lossy(w.body()).contains("alice"));

        let w = write(Response::text("hello"));
        assert_eq!(w.headers()["content-type"], "text/plain; charset=utf-8");
        assert_eq!(w.body(), b"hello");
    }

    #[test]
    fn redirect_and_bare_status() {
        let w = write(Response::redirect("/login"));
        assert_eq!(w.status(), 301);
        assert_eq!(w.headers()["location"], "/login");

        let w = write(Response::builder().status(307).redirect("/elsewhere"));
        assert_eq!(w.status(), 307);

        let w = write(Response::http_status_code(204));
        assert_eq!(w.status(), 204);
        assert!(w.body().is_empty());
    }

    #[test]
    fn raw_ignores_declared_data() {
        let response = Response::http_status_code(418)
            .declare(ResponseData::new().with_body(b"declared".to_vec()));
        assert!(response.is_raw());
        assert_eq!(response.data().unwrap().body, b"declared");

        let w = write(response);
        assert_eq!(w.status(), 418);
        assert!(w.body().is_empty());
    }

    #[test]
    fn raw_without_declaration_has_no_data() {
        assert!(Response::redirect("/").data().is_none());
    }

    #[test]
    fn serialize_failure_surfaces_at_write() {
        let mut map = std::collections::HashMap::new();
        map.insert((1, 2), "tuple keys are not valid json keys");
        let mut w = HttpWriter::new();
        let err = Response::json(map).write_to(&mut w).unwrap_err();
        assert!(matches!(err, Error::Encode(_)));
        assert!(!w.is_committed());
    }
}
