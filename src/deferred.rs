//! Status writes held back until the bad-status resolver has had its say.
//!
//! The engine writes a status as soon as it decides one (`404` for an
//! unmatched route, `413` for an oversized body), long before the resolver
//! runs. [`DeferredWriter`] keeps that status in memory instead, so it can
//! still be inspected and replaced once the chain is done.

use tracing::warn;

use crate::response::Cookie;
use crate::writer::ResponseWriter;

/// Wraps a [`ResponseWriter`] and buffers `write_status`.
///
/// The buffered status reaches the inner writer on the first body write or
/// on [`finish`](Self::finish), whichever comes first.
#[derive(Debug)]
pub struct DeferredWriter<W> {
    inner: W,
    buffered: u16,
}

impl<W: ResponseWriter> DeferredWriter<W> {
    /// Buffered status before anyone writes one. Nothing that runs ends up
    /// as "not found".
    pub const DEFAULT_STATUS: u16 = 404;

    pub fn new(inner: W) -> Self {
        Self { inner, buffered: Self::DEFAULT_STATUS }
    }

    /// Current buffered status; does not commit anything.
    pub fn buffered_status(&self) -> u16 {
        self.buffered
    }

    /// Commits the buffered status if nothing has been written yet and hands
    /// back the inner writer.
    pub fn finish(mut self) -> W {
        self.commit();
        self.inner
    }

    fn commit(&mut self) {
        if !self.inner.is_committed() {
            self.inner.write_status(self.buffered);
        }
    }
}

impl<W: ResponseWriter> ResponseWriter for DeferredWriter<W> {
    fn write_status(&mut self, code: u16) {
        if self.inner.is_committed() {
            warn!(current = self.inner.status(), ignored = code, "status already committed");
            return;
        }
        self.buffered = code;
    }

    fn write_body(&mut self, body: &[u8]) {
        self.commit();
        self.inner.write_body(body);
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.inner.set_header(name, value);
    }

    fn set_cookie(&mut self, cookie: &Cookie) {
        self.inner.set_cookie(cookie);
    }

    fn is_committed(&self) -> bool {
        self.inner.is_committed()
    }

    fn status(&self) -> u16 {
        if self.inner.is_committed() { self.inner.status() } else { self.buffered }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::HttpWriter;

    #[test]
    fn defaults_to_not_found() {
        let w = DeferredWriter::new(HttpWriter::new());
        assert_eq!(w.buffered_status(), 404);
        assert_eq!(w.finish().into_response().status(), 404);
    }

    #[test]
    fn status_is_buffered_until_body() {
        let mut w = DeferredWriter::new(HttpWriter::new());
        w.write_status(405);
        w.write_status(200);
        assert!(!w.is_committed());
        assert_eq!(w.status(), 200);

        w.write_body(b"{}");
        assert!(w.is_committed());
        w.write_status(500);
        assert_eq!(w.status(), 200);
        assert_eq!(w.finish().into_response().status(), 200);
    }

    #[test]
    fn finish_commits_buffered_status() {
        let mut w = DeferredWriter::new(HttpWriter::new());
        w.write_status(204);
        let res = w.finish().into_response();
        assert_eq!(res.status(), 204);
    }
}
