//! Running the server-under-test on a background thread.
//!
//! # Design
//! `start` binds synchronously so bind errors reach the caller before the
//! test runs, then serves the router on a dedicated current-thread tokio
//! runtime. The returned `RunningServer` is the only way to stop it; stopping
//! twice is a no-op and dropping the handle stops the server too.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::thread::JoinHandle;

use axum::Router;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::error::HarnessError;

/// Handle to a server started by `start`.
#[derive(Debug)]
pub struct RunningServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<io::Result<()>>>,
}

/// Bind `port` on the loopback interface and serve `router` until stopped.
///
/// Port `0` binds an ephemeral port; `RunningServer::port` reports it.
pub fn start(port: u16, router: Router) -> Result<RunningServer, HarnessError> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port))
        .map_err(|source| HarnessError::Bind { port, source })?;
    let addr = listener
        .local_addr()
        .map_err(|source| HarnessError::Bind { port, source })?;
    listener
        .set_nonblocking(true)
        .map_err(|source| HarnessError::Bind { port, source })?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(HarnessError::Runtime)?;
    let (shutdown, signal) = oneshot::channel::<()>();

    let thread = std::thread::Builder::new()
        .name(format!("server-{}", addr.port()))
        .spawn(move || {
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener)?;
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        let _ = signal.await;
                    })
                    .await
            })
        })
        .map_err(HarnessError::Runtime)?;

    info!(%addr, "server started");
    Ok(RunningServer {
        addr,
        shutdown: Some(shutdown),
        thread: Some(thread),
    })
}

impl RunningServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Signal shutdown and wait for the serving thread to exit.
    pub fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let Some(thread) = self.thread.take() else {
            return;
        };
        match thread.join() {
            Ok(Ok(())) => info!(addr = %self.addr, "server stopped"),
            Ok(Err(err)) => warn!(addr = %self.addr, "server exited with error: {err}"),
            Err(_) => warn!(addr = %self.addr, "server thread panicked"),
        }
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.stop();
    }
}
