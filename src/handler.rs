//! Handler trait and type erasure.
//!
//! Every route handler has the same shape:
//!
//! ```text
//! async fn name(req: Request) -> Result<impl IntoResponse, impl Into<BoxError>>
//! ```
//!
//! `Ok` is normal output: a [`Response`], `Option<Response>`, or `()` for a
//! bare `200`. `Err` is a handler fault: the chain stops and the panic
//! resolver decides what the client sees.
//!
//! The router stores handlers of different types side by side, so each one
//! is erased behind `dyn ErasedHandler`:
//!
//! ```text
//! async fn hello(req: Request) -> Result<Response, BoxError> { … }
//!        ↓ router.get("/", hello)
//! Arc::new(FnHandler(hello))                  ← BoxedHandler
//!        ↓ handler.call(req) at request time
//! Box::pin(async { normalize(hello(req).await) })
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::BoxError;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// Normalized handler output.
pub type HandlerResult = Result<Option<Response>, BoxError>;

/// A heap-allocated, type-erased future resolving to a [`HandlerResult`].
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` because it appears in the return type of the public
/// `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid route handler.
///
/// Sealed: only the blanket impl below satisfies it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R, E> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: IntoResponse + Send + 'static,
    E: Into<BoxError> + 'static,
{
}

impl<F, Fut, R, E> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: IntoResponse + Send + 'static,
    E: Into<BoxError> + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

struct FnHandler<F>(F);

impl<F, Fut, R, E> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: IntoResponse + Send + 'static,
    E: Into<BoxError> + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move {
            match fut.await {
                Ok(r)  => Ok(r.into_response()),
                Err(e) => Err(e.into()),
            }
        })
    }
}
