//! HTTP basic authentication.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use super::{Flow, Middleware};
use crate::request::Request;
use crate::response::Response;

const REALM: &str = r#"Basic realm="Authorization Required""#;

/// Credentials a route group accepts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BasicAuthAccount {
    pub username: String,
    pub password: String,
}

impl BasicAuthAccount {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

/// Rejects requests whose `Authorization` header does not carry one of the
/// configured accounts. Rejection is a `401` with a `WWW-Authenticate`
/// challenge.
pub struct BasicAuth {
    expected: Vec<String>,
}

impl BasicAuth {
    pub fn new(accounts: impl IntoIterator<Item = BasicAuthAccount>) -> Self {
        let expected = accounts.into_iter()
            .map(|a| format!("Basic {}", STANDARD.encode(format!("{}:{}", a.username, a.password))))
            .collect();
        Self { expected }
    }

    fn accepts(&self, header: &str) -> bool {
        self.expected.iter().any(|e| constant_time_eq(e.as_bytes(), header.as_bytes()))
    }
}

impl Middleware for BasicAuth {
    fn handle(&self, req: &mut Request) -> Flow {
        if req.header("authorization").is_some_and(|h| self.accepts(h)) {
            return Flow::Continue;
        }
        debug!(path = req.path(), "basic auth rejected");
        Flow::Halt(Some(Response::raw(|w| {
            w.set_header("www-authenticate", REALM);
            w.write_status(401);
            Ok(())
        })))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
