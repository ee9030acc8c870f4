//! Minimal rampart example: enveloped JSON endpoints, a business error, a
//! panicking handler and a basic-auth group.
//!
//! Run with:
//!   cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl http://localhost:3000/orders/7          # BIZ_ERROR envelope
//!   curl http://localhost:3000/boom              # EXCEPTION envelope, still 200
//!   curl http://localhost:3000/nowhere           # NOT_FOUND envelope
//!   curl -X POST http://localhost:3000/users/42  # METHOD_NOT_ALLOWED envelope
//!   curl -u acexy:acexy http://localhost:3000/auth/invoke

use rampart::{App, BoxError, Config, Group, Request, Response, Router, RouterInfo, Server};
use serde::Serialize;

#[derive(Serialize)]
struct User {
    id: String,
    name: &'static str,
}

#[tokio::main]
async fn main() -> Result<(), rampart::Error> {
    tracing_subscriber::fmt::init();

    let auth = Group::new(RouterInfo::new("auth").basic_auth("acexy", "acexy"))
        .get("invoke", invoke);

    let router = Router::new()
        .get("/users/{id}",  get_user)
        .get("/orders/{id}", get_order)
        .get("/boom",        boom)
        .mount(auth);

    let config = Config::new().middleware(|req: &mut Request| {
        tracing::info!(path = req.path(), client = ?req.client_ip(), "incoming");
        rampart::middleware::Flow::Continue
    });

    let outcome = Server::bind("0.0.0.0:3000")?
        .serve(App::new(config, router))
        .await?;
    tracing::info!(?outcome, "bye");
    Ok(())
}

// GET /users/{id}
async fn get_user(req: Request) -> Result<Response, BoxError> {
    let id = req.param("id").unwrap_or("unknown").to_owned();
    Ok(req.responder().success(User { id, name: "alice" })?)
}

// GET /orders/{id}: known business failure, reported with a biz code.
async fn get_order(req: Request) -> Result<Response, BoxError> {
    Ok(req.responder().biz_error(1001, "order is archived")?)
}

async fn boom(_req: Request) -> Result<Response, BoxError> {
    panic!("handler bug")
}

async fn invoke(_req: Request) -> Result<Response, BoxError> {
    Ok(Response::text("invoked"))
}
