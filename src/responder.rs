//! Structured (enveloped) response builders.

use std::sync::Arc;

use serde::Serialize;

use crate::envelope::{BodyEncoder, Envelope};
use crate::error::Error;
use crate::response::{Response, ResponseData};
use crate::status::DomainStatus;

/// Builds enveloped responses with the application's [`BodyEncoder`].
///
/// Every [`Request`](crate::Request) carries one, as does the
/// [`RequestInfo`](crate::RequestInfo) handed to resolvers. Builders fail
/// only when encoding fails; returning that error from a handler with `?`
/// sends it to the panic resolver.
///
/// ```rust,ignore
/// async fn get_user(req: Request) -> Result<Response, BoxError> {
///     let user = load(req.param("id")).await?;
///     Ok(req.responder().success(user)?)
/// }
/// ```
#[derive(Clone)]
pub struct Responder {
    encoder: Arc<dyn BodyEncoder>,
}

impl Responder {
    pub fn new(encoder: Arc<dyn BodyEncoder>) -> Self {
        Self { encoder }
    }

    /// Encodes `envelope` into a [`ResponseData`] with the encoder's content
    /// type, ready for extra headers or cookies.
    pub fn encode(&self, envelope: &Envelope) -> Result<ResponseData, Error> {
        let body = self.encoder.encode(envelope).map_err(Error::Encode)?;
        Ok(ResponseData::new()
            .with_content_type(self.encoder.content_type())
            .with_body(body))
    }

    pub fn envelope(&self, envelope: &Envelope) -> Result<Response, Error> {
        self.encode(envelope).map(Response::Structured)
    }

    pub fn success<T: Serialize>(&self, data: T) -> Result<Response, Error> {
        let data = serde_json::to_value(data).map_err(Error::encode)?;
        self.envelope(&Envelope::success(data))
    }

    pub fn exception(&self, message: Option<&str>) -> Result<Response, Error> {
        self.status_error(DomainStatus::Exception, message)
    }

    pub fn bad_parameters(&self, message: Option<&str>) -> Result<Response, Error> {
        self.status_error(DomainStatus::BadRequestParameters, message)
    }

    pub fn unauthorized(&self, message: Option<&str>) -> Result<Response, Error> {
        self.status_error(DomainStatus::Unauthorized, message)
    }

    pub fn status_error(&self, status: DomainStatus, message: Option<&str>) -> Result<Response, Error> {
        self.envelope(&Envelope::status(status, message))
    }

    pub fn biz_error(&self, code: i64, message: impl Into<String>) -> Result<Response, Error> {
        self.envelope(&Envelope::biz_error(code, message))
    }
}

impl Default for Responder {
    fn default() -> Self {
        Self::new(Arc::new(crate::envelope::JsonEncoder))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::error::BoxError;

    fn body(response: Response) -> Value {
        serde_json::from_slice(&response.data().unwrap().body).unwrap()
    }

    #[test]
    fn success_wraps_payload() {
        let response = Responder::default().success(json!({"id": 3})).unwrap();
        assert!(!response.is_raw());
        assert_eq!(response.data().unwrap().content_type.as_deref(), Some("application/json"));
        assert_eq!(body(response), json!({"status": "SUCCESS", "message": "success", "data": {"id": 3}}));
    }

    #[test]
    fn error_builders() {
        let r = Responder::default();
        assert_eq!(body(r.exception(None).unwrap())["status"], "EXCEPTION");
        assert_eq!(body(r.bad_parameters(Some("id must be numeric")).unwrap())["message"], "id must be numeric");
        assert_eq!(body(r.unauthorized(None).unwrap())["status"], "UNAUTHORIZED");
        assert_eq!(body(r.status_error(DomainStatus::NotFound, None).unwrap())["status"], "NOT_FOUND");
        assert_eq!(body(r.biz_error(42, "out of stock").unwrap())["bizCode"], 42);
    }

    struct FailingEncoder;

    impl BodyEncoder for FailingEncoder {
        fn content_type(&self) -> &str { "application/never" }

        fn encode(&self, _: &Envelope) -> Result<Vec<u8>, BoxError> {
            Err("encoder offline".into())
        }
    }

    #[test]
    fn encoder_failures_are_errors() {
        let r = Responder::new(Arc::new(FailingEncoder));
        assert!(matches!(r.success(1), Err(Error::Encode(_))));
    }
}
