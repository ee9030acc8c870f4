//! Unified error types.

use std::any::Any;

use thiserror::Error;

/// Boxed error accepted from handlers and pluggable encoders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by rampart's fallible operations.
///
/// Business errors are [`Response`](crate::Response) values, not `Error`s.
/// This type surfaces infrastructure failures: binding a port, reading
/// settings, or turning a value into body bytes.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid listen address: {0}")]
    Addr(#[from] std::net::AddrParseError),

    #[error("encode: {0}")]
    Encode(#[source] BoxError),

    #[error("invalid settings: {0}")]
    Settings(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn encode(e: impl Into<BoxError>) -> Self {
        Self::Encode(e.into())
    }
}

/// A failure promoted out of the request chain.
///
/// Every fault ends up in the configured panic resolver. Handlers never see
/// this type; they return an error and the chain executor wraps it.
#[derive(Debug, Error)]
pub enum Fault {
    /// The handler returned `Err`.
    #[error("handler error: {0}")]
    Handler(#[source] BoxError),

    /// Writing a response failed, usually because its body did not encode.
    #[error("response write failed: {0}")]
    Write(#[source] Error),

    /// Something panicked while the request was in flight.
    #[error("panic: {0}")]
    Panic(String),
}

impl Fault {
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_owned()
        };
        Self::Panic(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_keep_their_message() {
        let fault = Fault::from_panic(Box::new("static str"));
        assert_eq!(fault.to_string(), "panic: static str");

        let fault = Fault::from_panic(Box::new(String::from("owned")));
        assert_eq!(fault.to_string(), "panic: owned");

        let fault = Fault::from_panic(Box::new(42_u32));
        assert_eq!(fault.to_string(), "panic: non-string panic payload");
    }
}
