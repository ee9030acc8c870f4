//! The `{status, message, data}` envelope and the encoder that turns it into
//! body bytes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BoxError;
use crate::status::DomainStatus;

/// Structured wrapper used by every enveloped response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub status: DomainStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biz_code: Option<i64>,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn success(data: Value) -> Self {
        Self {
            status: DomainStatus::Success,
            message: DomainStatus::Success.default_message().to_owned(),
            biz_code: None,
            data,
        }
    }

    /// Error envelope with no payload. `None` uses the status' default message.
    pub fn status(status: DomainStatus, message: Option<&str>) -> Self {
        Self {
            status,
            message: message.unwrap_or(status.default_message()).to_owned(),
            biz_code: None,
            data: Value::Null,
        }
    }

    pub fn biz_error(code: i64, message: impl Into<String>) -> Self {
        Self {
            status: DomainStatus::BizError,
            message: message.into(),
            biz_code: Some(code),
            data: Value::Null,
        }
    }
}

/// Turns an [`Envelope`] into body bytes.
///
/// Replace the default [`JsonEncoder`] through
/// [`Config::encoder`](crate::Config::encoder). Raw responses
/// ([`Response::json`](crate::Response::json) and friends) never go through
/// the encoder.
pub trait BodyEncoder: Send + Sync + 'static {
    /// Content type stamped on enveloped responses.
    fn content_type(&self) -> &str;

    fn encode(&self, envelope: &Envelope) -> Result<Vec<u8>, BoxError>;
}

/// Default encoder: `serde_json`, `application/json`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonEncoder;

impl BodyEncoder for JsonEncoder {
    fn content_type(&self) -> &str { "application/json" }

    fn encode(&self, envelope: &Envelope) -> Result<Vec<u8>, BoxError> {
        Ok(serde_json::to_vec(envelope)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_shape() {
        let bytes = JsonEncoder.encode(&Envelope::success(json!({"id": 1}))).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, json!({"status": "SUCCESS", "message": "success", "data": {"id": 1}}));
    }

    #[test]
    fn biz_code_only_on_biz_errors() {
        let plain = serde_json::to_value(Envelope::status(DomainStatus::NotFound, None)).unwrap();
        assert!(plain.get("bizCode").is_none());
        assert_eq!(plain["message"], "resource not found");

        let biz = serde_json::to_value(Envelope::biz_error(1001, "quota exhausted")).unwrap();
        assert_eq!(biz["status"], "BIZ_ERROR");
        assert_eq!(biz["bizCode"], 1001);
        assert_eq!(biz["message"], "quota exhausted");
    }
}
