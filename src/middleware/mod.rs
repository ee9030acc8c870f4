//! Middleware layer.
//!
//! A middleware sees the request before the route handler and decides
//! whether processing goes on. Global middlewares (from
//! [`Config::middleware`](crate::Config::middleware)) run for every request,
//! matched or not, in registration order. Group middlewares (from
//! [`RouterInfo`](crate::RouterInfo)) run after them, only for that group's
//! routes.
//!
//! ```rust
//! use rampart::middleware::Flow;
//! use rampart::{Config, Request, Response};
//!
//! let config = Config::new().middleware(|req: &mut Request| {
//!     if req.header("x-api-key").is_some() {
//!         Flow::Continue
//!     } else {
//!         Flow::Halt(Some(Response::http_status_code(401)))
//!     }
//! });
//! ```

mod basic_auth;

use std::sync::Arc;

pub use basic_auth::{BasicAuth, BasicAuthAccount};

use crate::request::Request;
use crate::response::Response;

/// A middleware's decision.
#[derive(Debug)]
pub enum Flow {
    /// Hand the request to the next middleware, or the handler.
    Continue,
    /// Stop here. The response, if any, is written as is; nothing later in
    /// the chain runs.
    Halt(Option<Response>),
}

pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: &mut Request) -> Flow;
}

impl<F> Middleware for F
where
    F: Fn(&mut Request) -> Flow + Send + Sync + 'static,
{
    fn handle(&self, req: &mut Request) -> Flow {
        self(req)
    }
}

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;
