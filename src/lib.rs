//! # rampart
//!
//! Uniform responses and fault containment between an HTTP engine and your
//! handlers.
//!
//! ## The contract
//!
//! Every request ends with exactly one well-formed response. The client
//! never sees an engine error page or a dropped connection because a
//! handler failed:
//!
//! - **Business errors** are ordinary responses: `req.responder().biz_error(..)`.
//! - **Handler faults** (an `Err` from a handler, a body that fails to
//!   encode, a panic) go to one place, the panic resolver.
//! - **Transport faults** (no matching route, wrong method, oversized body)
//!   are caught by the bad-status resolver and rewritten into the same
//!   envelope, with `200` on the wire.
//!
//! Clients parse one shape:
//!
//! ```json
//! {"status":"SUCCESS","message":"success","data":{"id":"42"}}
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use rampart::{App, BoxError, Config, Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), rampart::Error> {
//!     let router = Router::new()
//!         .get("/users/{id}", get_user)
//!         .post("/users",     create_user);
//!
//!     Server::bind("0.0.0.0:3000")?
//!         .serve(App::new(Config::new(), router))
//!         .await?;
//!     Ok(())
//! }
//!
//! async fn get_user(req: Request) -> Result<Response, BoxError> {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Ok(req.responder().success(serde_json::json!({ "id": id }))?)
//! }
//!
//! async fn create_user(req: Request) -> Result<Response, BoxError> {
//!     if req.body().is_empty() {
//!         return Ok(req.responder().bad_parameters(Some("empty body"))?);
//!     }
//!     Ok(Response::builder().status(201).header("location", "/users/99").text("created"))
//! }
//! ```

mod app;
mod chain;
mod config;
mod deferred;
mod envelope;
mod error;
mod handler;
mod recovery;
mod registry;
mod request;
mod resolver;
mod responder;
mod response;
mod router;
mod server;
mod status;
mod writer;

pub mod middleware;

pub use app::{App, TRACE_ID_HEADER};
pub use config::{Config, Settings};
pub use deferred::DeferredWriter;
pub use envelope::{BodyEncoder, Envelope, JsonEncoder};
pub use error::{BoxError, Error, Fault};
pub use handler::{Handler, HandlerResult};
pub use recovery::{PanicResolver, default_panic_resolver};
pub use registry::StatusRegistry;
pub use request::{Request, RequestInfo};
pub use resolver::{BadStatusResolver, DEFAULT_IGNORED_CODES};
pub use responder::Responder;
pub use response::{ContentType, Cookie, Header, IntoResponse, RawBuilder, Response, ResponseData, WriteFn};
pub use router::{Group, Router, RouterInfo};
pub use server::{Server, Shutdown};
pub use status::DomainStatus;
pub use writer::{HttpWriter, ResponseWriter};
