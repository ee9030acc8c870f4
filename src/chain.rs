//! Middleware chain executor.
//!
//! Order per request: global middlewares, routing, group middlewares, handler.
//! A middleware that halts writes its response (if any) and ends the chain.
//! An unmatched request ends with the engine's `404`/`405`, which the
//! bad-status resolver sees afterwards.

use tracing::debug;

use crate::error::Fault;
use crate::middleware::{BoxedMiddleware, Flow};
use crate::request::Request;
use crate::router::{Lookup, Router};
use crate::writer::ResponseWriter;

pub(crate) struct Chain<'a> {
    pub(crate) global: &'a [BoxedMiddleware],
    pub(crate) router: &'a Router,
    pub(crate) method_not_allowed: bool,
}

impl Chain<'_> {
    pub(crate) async fn execute(&self, mut req: Request, writer: &mut dyn ResponseWriter) -> Result<(), Fault> {
        if halted(self.global, &mut req, writer)? {
            return Ok(());
        }

        let route = match self.router.lookup(req.method(), req.path(), self.method_not_allowed) {
            Lookup::Found(route, params) => {
                req.params = params;
                route
            }
            Lookup::MethodNotAllowed => {
                writer.write_status(405);
                return Ok(());
            }
            Lookup::NotFound => {
                writer.write_status(404);
                return Ok(());
            }
        };

        if halted(&route.middlewares, &mut req, writer)? {
            return Ok(());
        }

        match route.handler.call(req).await {
            Ok(Some(response)) => response.write_to(writer).map_err(Fault::Write),
            Ok(None) => {
                writer.write_status(200);
                Ok(())
            }
            Err(e) => Err(Fault::Handler(e)),
        }
    }
}

/// Runs `middlewares` in order. `true` if one of them halted the chain.
fn halted(
    middlewares: &[BoxedMiddleware],
    req: &mut Request,
    writer: &mut dyn ResponseWriter,
) -> Result<bool, Fault> {
    for (index, middleware) in middlewares.iter().enumerate() {
        if let Flow::Halt(response) = middleware.handle(req) {
            debug!(index, path = req.path(), "middleware halted the chain");
            if let Some(response) = response {
                response.write_to(writer).map_err(Fault::Write)?;
            }
            return Ok(true);
        }
    }
    Ok(false)
}
