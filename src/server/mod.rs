mod framing;
pub mod handlers;
mod types;

pub use framing::{Frame, is_complete, read_frame};
pub use handlers::ConnectionHandler;
pub use types::{
    INVALID_JSON, NO_DESCRIPTION, PredictionRequest, PredictionResponse, SERVER_ERROR_PREFIX,
};

use crate::{Result, config::ServerConfig, llm::Predictor};
use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::{net::TcpListener, sync::Notify};
use tracing::{Instrument, debug, error, info, info_span};

// Pause after a failed accept so resource exhaustion does not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

pub struct Server {
    listener: TcpListener,
    handler: Arc<ConnectionHandler>,
    handle: ServerHandle,
}

/// Stops a running [`Server`] from outside its accept loop.
#[derive(Clone)]
pub struct ServerHandle {
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

impl ServerHandle {
    /// Closes the listener. Connections already accepted run to completion.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        // notify_one keeps a permit, so a stop issued before `run` polls is not lost.
        self.shutdown.notify_one();
    }

    /// True while [`Server::run`] is accepting connections.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Server {
    /// Binds the listening socket. Failure here is fatal to startup.
    pub async fn bind(config: &ServerConfig, predictor: Predictor) -> Result<Self> {
        let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
        let handler = ConnectionHandler::new(Arc::new(predictor))
            .with_read_timeout(config.read_timeout());

        info!("Server listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            handler: Arc::new(handler),
            handle: ServerHandle {
                running: Arc::new(AtomicBool::new(false)),
                shutdown: Arc::new(Notify::new()),
            },
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    /// Accepts until [`ServerHandle::stop`] is called, one task per connection.
    pub async fn run(self) -> Result<()> {
        let Self {
            listener,
            handler,
            handle,
        } = self;

        handle.running.store(true, Ordering::SeqCst);
        loop {
            let accepted = tokio::select! {
                biased;
                _ = handle.shutdown.notified() => break,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => {
                    info!("Connection from {}", peer);
                    let handler = Arc::clone(&handler);
                    tokio::spawn(
                        async move { handler.handle(stream, peer).await }
                            .instrument(info_span!("connection", %peer)),
                    );
                }
                Err(e) if handle.is_running() => {
                    error!("Socket error: {}", e);
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                }
                Err(e) => debug!("Accept failed after stop: {}", e),
            }
        }

        handle.running.store(false, Ordering::SeqCst);
        drop(listener);
        info!("Server stopped");
        Ok(())
    }
}
