//! Application configuration.
//!
//! Plain knobs live in [`Settings`], which deserializes from TOML. The
//! injectable pieces (encoder, panic resolver, global middlewares) are set
//! on [`Config`]. Both are consumed by [`App::new`](crate::App::new) and are
//! immutable from then on.
//!
//! ```toml
//! listen_address = "0.0.0.0:3000"
//! ignore_http_codes = [404]
//! max_body_size = 1048576
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::envelope::{BodyEncoder, JsonEncoder};
use crate::error::{Error, Fault};
use crate::middleware::{BoxedMiddleware, Middleware};
use crate::recovery::{PanicResolver, default_panic_resolver};
use crate::request::RequestInfo;
use crate::response::Response;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// `host:port` the server binds to.
    pub listen_address: String,

    /// Transport codes the bad-status resolver leaves alone, on top of the
    /// built-in set.
    pub ignore_http_codes: Vec<u16>,

    /// Turns the whole bad-status pipeline off: engine statuses reach the
    /// client as they are.
    pub disable_bad_status_resolver: bool,

    /// Drops the built-in ignore set; only `ignore_http_codes` apply.
    pub disable_default_ignore_codes: bool,

    /// Report a method mismatch as `404` instead of `405`.
    pub disable_method_not_allowed: bool,

    /// Ignore `x-forwarded-for` / `x-real-ip` when resolving the client IP.
    pub disable_forwarded_by_client_ip: bool,

    /// Answer a panic with a bare `500` instead of calling the panic
    /// resolver. Handler errors and write failures still reach the resolver.
    pub hide_panic_error_details: bool,

    /// Echo a trace id in an `x-trace-id` response header and record it on
    /// the request span.
    pub enable_trace_id_response: bool,

    /// Largest request body accepted; larger ones get `413`.
    pub max_body_size: Option<usize>,

    /// How long shutdown waits for in-flight requests.
    pub shutdown_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:8080".to_owned(),
            ignore_http_codes: Vec::new(),
            disable_bad_status_resolver: false,
            disable_default_ignore_codes: false,
            disable_method_not_allowed: false,
            disable_forwarded_by_client_ip: false,
            hide_panic_error_details: false,
            enable_trace_id_response: false,
            max_body_size: None,
            shutdown_timeout_secs: 30,
        }
    }
}

impl Settings {
    pub fn from_toml(s: &str) -> Result<Self, Error> {
        Ok(toml::from_str(s)?)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Everything the request pipeline needs, built once at startup.
pub struct Config {
    pub(crate) settings: Settings,
    pub(crate) encoder: Arc<dyn BodyEncoder>,
    pub(crate) panic_resolver: PanicResolver,
    pub(crate) middlewares: Vec<BoxedMiddleware>,
}

impl Config {
    pub fn new() -> Self {
        Self::from_settings(Settings::default())
    }

    pub fn from_settings(settings: Settings) -> Self {
        Self {
            settings,
            encoder: Arc::new(JsonEncoder),
            panic_resolver: Arc::new(default_panic_resolver),
            middlewares: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Encoder for enveloped responses. Defaults to [`JsonEncoder`].
    pub fn encoder(mut self, encoder: impl BodyEncoder) -> Self {
        self.encoder = Arc::new(encoder);
        self
    }

    /// Replaces the panic resolver. Returning `None` leaves the client with
    /// a bare `500`.
    pub fn panic_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&RequestInfo, &Fault) -> Option<Response> + Send + Sync + 'static,
    {
        self.panic_resolver = Arc::new(resolver);
        self
    }

    /// Appends a global middleware. Order of calls is execution order.
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn ignore_http_code(mut self, code: u16) -> Self {
        self.settings.ignore_http_codes.push(code);
        self
    }

    pub fn disable_bad_status_resolver(mut self) -> Self {
        self.settings.disable_bad_status_resolver = true;
        self
    }

    pub fn disable_default_ignore_codes(mut self) -> Self {
        self.settings.disable_default_ignore_codes = true;
        self
    }

    pub fn disable_method_not_allowed(mut self) -> Self {
        self.settings.disable_method_not_allowed = true;
        self
    }

    pub fn disable_forwarded_by_client_ip(mut self) -> Self {
        self.settings.disable_forwarded_by_client_ip = true;
        self
    }

    pub fn hide_panic_error_details(mut self) -> Self {
        self.settings.hide_panic_error_details = true;
        self
    }

    pub fn enable_trace_id_response(mut self) -> Self {
        self.settings.enable_trace_id_response = true;
        self
    }

    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.settings.max_body_size = Some(bytes);
        self
    }
}

impl Default for Config {
    fn default() -> Self { Self::new() }
}
