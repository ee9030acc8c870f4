//! Panic recovery.
//!
//! The whole per-request chain runs inside [`guard`]. Handler errors, write
//! failures and panics all come out of it as one [`Fault`], which the panic
//! resolver turns into the response the client gets. The engine's own crash
//! behaviour (a dropped connection) is never reached for a failure in
//! handler code.
//!
//! The one unrecoverable case is the resolver itself: if it returns `None`,
//! panics, or produces a response that fails to write, the failure is logged
//! and the client gets a bare `500` when nothing has been committed yet.
//! This is not retried.

use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::error;

use crate::error::Fault;
use crate::request::RequestInfo;
use crate::response::Response;
use crate::writer::ResponseWriter;

/// Maps a fault to the response the client receives.
pub type PanicResolver = Arc<dyn Fn(&RequestInfo, &Fault) -> Option<Response> + Send + Sync>;

/// Logs the fault and answers with an `EXCEPTION` envelope.
pub fn default_panic_resolver(info: &RequestInfo, fault: &Fault) -> Option<Response> {
    error!(method = %info.method, path = %info.path, %fault, "request failed");
    match info.responder.exception(None) {
        Ok(response) => Some(response),
        Err(e) => {
            error!(error = %e, "exception envelope failed to encode");
            None
        }
    }
}

/// Runs `fut`, turning a panic into [`Fault::Panic`].
pub(crate) async fn guard<F>(fut: F) -> Result<(), Fault>
where
    F: Future<Output = Result<(), Fault>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => Err(Fault::from_panic(payload)),
    }
}

/// Hands `fault` to `resolver` and writes whatever it returns.
pub(crate) fn recover(
    resolver: &PanicResolver,
    info: &RequestInfo,
    fault: Fault,
    writer: &mut dyn ResponseWriter,
) {
    let outcome = catch_unwind(AssertUnwindSafe(|| match resolver(info, &fault) {
        Some(response) => response.write_to(&mut *writer).map_err(|e| e.to_string()),
        None => Err("panic resolver returned no response".to_owned()),
    }));

    let reason = match outcome {
        Ok(Ok(())) => return,
        Ok(Err(reason)) => reason,
        Err(payload) => Fault::from_panic(payload).to_string(),
    };
    error!(method = %info.method, path = %info.path, %fault, %reason, "recovery failed");
    if !writer.is_committed() {
        writer.write_status(500);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::Responder;
    use crate::writer::HttpWriter;

    fn info() -> RequestInfo {
        RequestInfo { method: http::Method::GET, path: "/boom".into(), responder: Responder::default() }
    }

    async fn explode() -> Result<(), Fault> {
        panic!("kaboom")
    }

    #[tokio::test]
    async fn guard_catches_panics() {
        let outcome = guard(explode()).await;
        assert!(matches!(outcome, Err(Fault::Panic(m)) if m == "kaboom"));

        let outcome = guard(async { Ok::<(), Fault>(()) }).await;
        assert!(outcome.is_ok());
    }

    #[test]
    fn default_resolver_writes_exception_envelope() {
        let resolver: PanicResolver = Arc::new(default_panic_resolver);
        let mut w = HttpWriter::new();
        recover(&resolver, &info(), Fault::Panic("x".into()), &mut w);

        assert_eq!(w.status(), 200);
        let body: serde_json::Value = serde_json::from_slice(w.body()).unwrap();
        assert_eq!(body["status"], "EXCEPTION");
    }

    #[test]
    fn silent_resolver_falls_back_to_500() {
        let resolver: PanicResolver = Arc::new(|_: &RequestInfo, _: &Fault| -> Option<Response> { None });
        let mut w = HttpWriter::new();
        recover(&resolver, &info(), Fault::Panic("x".into()), &mut w);
        assert_eq!(w.status(), 500);
        assert!(w.body().is_empty());
    }

    #[test]
    fn panicking_resolver_falls_back_to_500() {
        let resolver: PanicResolver = Arc::new(|_: &RequestInfo, _: &Fault| -> Option<Response> {
            panic!("resolver bug")
        });
        let mut w = HttpWriter::new();
        recover(&resolver, &info(), Fault::Panic("x".into()), &mut w);
        assert_eq!(w.status(), 500);
    }
}
