//! Bad-status resolution.
//!
//! After the chain finishes, the status sitting in the
//! [`DeferredWriter`](crate::DeferredWriter) is checked. `200` and ignored
//! codes pass through. Anything else is replaced on the wire by `200` and an
//! envelope whose domain status comes from the [`StatusRegistry`]. That is
//! how an unmatched route, a method mismatch or an oversized upload end up
//! in the same `{status, message, data}` shape as application errors.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::Fault;
use crate::registry::StatusRegistry;
use crate::request::RequestInfo;
use crate::writer::ResponseWriter;

/// Codes left alone unless
/// [`disable_default_ignore_codes`](crate::Settings::disable_default_ignore_codes)
/// is set: success without an envelope, and redirects.
pub const DEFAULT_IGNORED_CODES: [u16; 10] = [201, 202, 204, 206, 301, 302, 303, 304, 307, 308];

/// Rewrites pending bad statuses into `200` plus an envelope.
///
/// The one exception to that contract is a response whose status is already
/// committed: a handler that writes `Response::builder().status(410).text(..)`
/// puts its status on the wire with the first body byte, and the client gets
/// exactly that. Use it when a route must answer with a real transport error.
#[derive(Debug, Clone)]
pub struct BadStatusResolver {
    ignored: HashSet<u16>,
    registry: StatusRegistry,
}

impl BadStatusResolver {
    pub fn new(ignore: impl IntoIterator<Item = u16>, include_defaults: bool) -> Self {
        let mut ignored: HashSet<u16> = ignore.into_iter().collect();
        if include_defaults {
            ignored.extend(DEFAULT_IGNORED_CODES);
        }
        Self { ignored, registry: StatusRegistry::new() }
    }

    pub fn is_ignored(&self, code: u16) -> bool {
        self.ignored.contains(&code)
    }

    /// Rewrites a bad status still pending on `writer` into an envelope.
    ///
    /// A response whose status already reached the wire is left untouched:
    /// whoever committed it meant to send it.
    pub(crate) fn resolve(&self, info: &RequestInfo, writer: &mut dyn ResponseWriter) -> Result<(), Fault> {
        let code = writer.status();
        if code == 200 || self.is_ignored(code) {
            return Ok(());
        }
        if writer.is_committed() {
            debug!(method = %info.method, path = %info.path, status = code, "bad status already committed");
            return Ok(());
        }

        warn!(method = %info.method, path = %info.path, status = code, "request bad response http status code");
        let status = self.registry.resolve(code);
        writer.write_status(200);
        info.responder
            .status_error(status, None)
            .and_then(|response| response.write_to(writer))
            .map_err(Fault::Write)
    }
}

impl Default for BadStatusResolver {
    fn default() -> Self {
        Self::new([], true)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::deferred::DeferredWriter;
    use crate::responder::Responder;
    use crate::writer::HttpWriter;

    fn info() -> RequestInfo {
        RequestInfo { method: http::Method::GET, path: "/x".into(), responder: Responder::default() }
    }

    fn run(resolver: &BadStatusResolver, status: Option<u16>) -> http::Response<http_body_util::Full<bytes::Bytes>> {
        let mut w = DeferredWriter::new(HttpWriter::new());
        if let Some(status) = status {
            w.write_status(status);
        }
        resolver.resolve(&info(), &mut w).unwrap();
        w.finish().into_response()
    }

    fn envelope_status(w: &HttpWriter) -> String {
        let body: Value = serde_json::from_slice(w.body()).unwrap();
        body["status"].as_str().unwrap().to_owned()
    }

    #[test]
    fn ok_passes_through() {
        let res = run(&BadStatusResolver::default(), Some(200));
        assert_eq!(res.status(), 200);
        assert!(res.headers().get("content-type").is_none());
    }

    #[test]
    fn untouched_writer_becomes_not_found() {
        let mut w = DeferredWriter::new(HttpWriter::new());
        BadStatusResolver::default().resolve(&info(), &mut w).unwrap();
        let w = w.finish();
        assert_eq!(w.status(), 200);
        assert_eq!(envelope_status(&w), "NOT_FOUND");
    }

    #[test]
    fn mapped_and_unmapped_codes() {
        for (code, expected) in [(405, "METHOD_NOT_ALLOWED"), (413, "UPLOAD_LIMIT_EXCEEDED"), (500, "STATUS_CODE_EXCEPTION")] {
            let mut w = DeferredWriter::new(HttpWriter::new());
            w.write_status(code);
            BadStatusResolver::default().resolve(&info(), &mut w).unwrap();
            let w = w.finish();
            assert_eq!(w.status(), 200);
            assert_eq!(envelope_status(&w), expected);
        }
    }

    #[test]
    fn ignored_codes_pass_through() {
        let res = run(&BadStatusResolver::new([404], true), Some(404));
        assert_eq!(res.status(), 404);

        let res = run(&BadStatusResolver::default(), Some(302));
        assert_eq!(res.status(), 302);
    }

    #[test]
    fn defaults_can_be_dropped() {
        let resolver = BadStatusResolver::new([], false);
        assert!(!resolver.is_ignored(302));
        let res = run(&resolver, Some(302));
        assert_eq!(res.status(), 200);
    }

    #[test]
    fn committed_status_is_left_alone() {
        let mut w = DeferredWriter::new(HttpWriter::new());
        w.write_status(500);
        w.write_body(b"raw failure");
        BadStatusResolver::default().resolve(&info(), &mut w).unwrap();
        let w = w.finish();
        assert_eq!(w.status(), 500);
        assert_eq!(w.body(), b"raw failure");
    }
}
