//! HTTP server and bounded graceful shutdown.
//!
//! When a shutdown signal arrives the server:
//! 1. Stops `listener.accept()`, so no new connections are made.
//! 2. Tells every open connection to finish its in-flight request and close.
//! 3. Waits up to the drain timeout, then aborts whatever is left.
//!
//! [`Server::serve`] reports which of the two endings happened.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::app::App;
use crate::config::Settings;
use crate::error::Error;

/// How the server stopped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Shutdown {
    /// Every connection finished within the drain timeout.
    Graceful,
    /// The drain timeout ran out and remaining connections were aborted.
    Forced,
}

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    drain_timeout: Duration,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust,no_run
    /// # fn main() -> Result<(), rampart::Error> {
    /// let server = rampart::Server::bind("0.0.0.0:3000")?;
    /// # Ok(()) }
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        Ok(Self { addr: addr.parse()?, drain_timeout: Duration::from_secs(30) })
    }

    /// Binds to `listen_address` and drains for `shutdown_timeout_secs`.
    pub fn from_settings(settings: &Settings) -> Result<Self, Error> {
        Ok(Self::bind(&settings.listen_address)?.drain_timeout(settings.shutdown_timeout()))
    }

    /// How long shutdown waits for in-flight requests. Defaults to 30 s.
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Serves `app` until SIGTERM or Ctrl-C.
    pub async fn serve(self, app: App) -> Result<Shutdown, Error> {
        self.serve_with_shutdown(app, shutdown_signal()).await
    }

    /// Serves `app` until `signal` resolves.
    pub async fn serve_with_shutdown(
        self,
        app: App,
        signal: impl Future<Output = ()>,
    ) -> Result<Shutdown, Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let app = Arc::new(app);
        let (stop_tx, _) = broadcast::channel::<()>(1);

        info!(addr = %self.addr, "rampart listening");

        let mut tasks = tokio::task::JoinSet::new();
        tokio::pin!(signal);

        loop {
            tokio::select! {
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = Arc::clone(&app);
                    let mut stop_rx = stop_tx.subscribe();
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |mut req: hyper::Request<hyper::body::Incoming>| {
                            let app = Arc::clone(&app);
                            req.extensions_mut().insert(remote_addr);
                            async move { Ok::<_, Infallible>(app.handle(req).await) }
                        });

                        let builder = ConnBuilder::new(TokioExecutor::new());
                        let conn = builder.serve_connection(io, svc);
                        tokio::pin!(conn);

                        let res = tokio::select! {
                            res = conn.as_mut() => res,
                            _ = stop_rx.recv() => {
                                conn.as_mut().graceful_shutdown();
                                conn.await
                            }
                        };
                        if let Err(e) = res {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        drop(listener);
        let _ = stop_tx.send(());

        let drained = tokio::time::timeout(self.drain_timeout, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        let outcome = match drained {
            Ok(()) => Shutdown::Graceful,
            Err(_) => {
                warn!(remaining = tasks.len(), "drain timeout elapsed, aborting connections");
                tasks.abort_all();
                Shutdown::Forced
            }
        };
        info!(?outcome, "rampart stopped");
        Ok(outcome)
    }
}

/// Resolves on the first shutdown signal the process receives: SIGTERM or
/// SIGINT on Unix, Ctrl-C elsewhere. A handler that fails to install just
/// never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => { sig.recv().await; }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
