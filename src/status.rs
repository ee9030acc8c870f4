//! Domain status codes carried inside the response envelope.
//!
//! The transport status a client sees is `200` for every enveloped response.
//! What actually happened lives in the envelope's `status` field:
//!
//! ```json
//! {"status":"NOT_FOUND","message":"resource not found","data":null}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Application-level status, independent of the HTTP status on the wire.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainStatus {
    Success,
    Exception,
    BadRequestParameters,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    MediaTypeNotAllowed,
    UploadLimitExceeded,
    /// Fallback for transport codes with no specific mapping.
    StatusCodeException,
    /// Business error; the envelope also carries a `bizCode`.
    BizError,
}

impl DomainStatus {
    /// Returns the wire representation (e.g. `"NOT_FOUND"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success              => "SUCCESS",
            Self::Exception            => "EXCEPTION",
            Self::BadRequestParameters => "BAD_REQUEST_PARAMETERS",
            Self::Unauthorized         => "UNAUTHORIZED",
            Self::Forbidden            => "FORBIDDEN",
            Self::NotFound             => "NOT_FOUND",
            Self::MethodNotAllowed     => "METHOD_NOT_ALLOWED",
            Self::MediaTypeNotAllowed  => "MEDIA_TYPE_NOT_ALLOWED",
            Self::UploadLimitExceeded  => "UPLOAD_LIMIT_EXCEEDED",
            Self::StatusCodeException  => "STATUS_CODE_EXCEPTION",
            Self::BizError             => "BIZ_ERROR",
        }
    }

    /// Message used when the caller does not supply one.
    pub fn default_message(self) -> &'static str {
        match self {
            Self::Success              => "success",
            Self::Exception            => "system exception",
            Self::BadRequestParameters => "bad request parameters",
            Self::Unauthorized         => "unauthorized",
            Self::Forbidden            => "forbidden",
            Self::NotFound             => "resource not found",
            Self::MethodNotAllowed     => "method not allowed",
            Self::MediaTypeNotAllowed  => "media type not allowed",
            Self::UploadLimitExceeded  => "upload limit exceeded",
            Self::StatusCodeException  => "bad http status code",
            Self::BizError             => "business error",
        }
    }
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
