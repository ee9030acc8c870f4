//! The per-request pipeline.
//!
//! ```text
//! engine ─▶ recovery guard ─▶ global middlewares ─▶ routing ─▶ group middlewares ─▶ handler
//!                 │                      (status writes buffered by DeferredWriter)
//!                 └─▶ bad-status resolver ─▶ commit
//! ```
//!
//! Everything shared here is built in [`App::new`] and only read afterwards,
//! so one `App` behind an `Arc` serves every connection without locking.

use std::time::Instant;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use http::HeaderMap;
use http::header::HeaderValue;
use hyper::body::Body;
use tracing::field::Empty;
use tracing::{Instrument, debug, error, info_span, warn};
use uuid::Uuid;

use crate::chain::Chain;
use crate::config::Config;
use crate::deferred::DeferredWriter;
use crate::error::{BoxError, Fault};
use crate::recovery;
use crate::request::{Request, RequestInfo};
use crate::resolver::BadStatusResolver;
use crate::responder::Responder;
use crate::router::Router;
use crate::writer::{HttpWriter, ResponseWriter};

/// Response header carrying the request's trace id.
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Router plus configuration, ready to serve requests.
pub struct App {
    config: Config,
    router: Router,
    responder: Responder,
    bad_status: Option<BadStatusResolver>,
}

impl App {
    pub fn new(config: Config, router: Router) -> Self {
        let settings = &config.settings;
        let bad_status = (!settings.disable_bad_status_resolver).then(|| {
            BadStatusResolver::new(
                settings.ignore_http_codes.iter().copied(),
                !settings.disable_default_ignore_codes,
            )
        });
        let responder = Responder::new(config.encoder.clone());
        Self { config, router, responder, bad_status }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs one request through the pipeline. Never fails: every outcome is
    /// some response.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<Full<Bytes>>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<BoxError>,
    {
        let span = info_span!("request", method = %req.method(), path = %req.uri().path(), trace_id = Empty);
        let trace_id = self.config.settings.enable_trace_id_response.then(|| resolve_trace_id(req.headers()));
        if let Some(id) = &trace_id {
            span.record("trace_id", id.as_str());
        }

        let mut response = self.handle_inner(req).instrument(span).await;
        if let Some(id) = trace_id {
            match HeaderValue::from_str(&id) {
                Ok(value) => { response.headers_mut().insert(TRACE_ID_HEADER, value); }
                Err(_)    => warn!("trace id is not a valid header value"),
            }
        }
        response
    }

    async fn handle_inner<B>(&self, req: http::Request<B>) -> http::Response<Full<Bytes>>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<BoxError>,
    {
        let started = Instant::now();
        let (parts, body) = req.into_parts();
        let body = self.read_body(body).await;

        let mut req = Request::new(parts, Bytes::new(), self.responder.clone());
        req.forwarded_by_client_ip = !self.config.settings.disable_forwarded_by_client_ip;
        let info = req.info();

        let response = match &self.bad_status {
            Some(resolver) => {
                let mut writer = DeferredWriter::new(HttpWriter::new());
                self.run(&info, req, body, Some(resolver), &mut writer).await;
                writer.finish().into_response()
            }
            None => {
                let mut writer = HttpWriter::new();
                self.run(&info, req, body, None, &mut writer).await;
                writer.into_response()
            }
        };

        debug!(status = response.status().as_u16(), latency = ?started.elapsed(), "request finished");
        response
    }

    async fn run(
        &self,
        info: &RequestInfo,
        mut req: Request,
        body: Result<Bytes, u16>,
        bad_status: Option<&BadStatusResolver>,
        writer: &mut dyn ResponseWriter,
    ) {
        let chain = Chain {
            global: &self.config.middlewares,
            router: &self.router,
            method_not_allowed: !self.config.settings.disable_method_not_allowed,
        };

        let outcome = recovery::guard(async {
            match body {
                Ok(body) => {
                    req.body = body;
                    chain.execute(req, &mut *writer).await?;
                }
                // The engine refuses the request before any middleware runs.
                Err(status) => writer.write_status(status),
            }
            if let Some(resolver) = bad_status {
                resolver.resolve(info, &mut *writer)?;
            }
            Ok::<(), Fault>(())
        })
        .await;

        match outcome {
            Ok(()) => {}
            Err(fault @ Fault::Panic(_)) if self.config.settings.hide_panic_error_details => {
                error!(method = %info.method, path = %info.path, %fault, "request panicked, details hidden");
                if !writer.is_committed() {
                    writer.write_status(500);
                }
            }
            Err(fault) => recovery::recover(&self.config.panic_resolver, info, fault, writer),
        }
    }

    /// Collects the body, enforcing `max_body_size`. `Err` is the status the
    /// engine answers with: `413` for too large, `400` for unreadable.
    async fn read_body<B>(&self, body: B) -> Result<Bytes, u16>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<BoxError>,
    {
        let limit = self.config.settings.max_body_size.unwrap_or(usize::MAX);
        match Limited::new(body, limit).collect().await {
            Ok(collected) => Ok(collected.to_bytes()),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                debug!(limit, "request body too large");
                Err(413)
            }
            Err(e) => {
                debug!(error = %e, "request body unreadable");
                Err(400)
            }
        }
    }
}

/// Trace id for a request: the caller's own `x-trace-id` if it sent one,
/// otherwise a fresh v4 UUID.
fn resolve_trace_id(headers: &HeaderMap) -> String {
    headers.get(TRACE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned)
}
