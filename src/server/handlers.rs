use super::framing::{self, Frame};
use super::types::{INVALID_JSON, NO_DESCRIPTION, PredictionRequest, PredictionResponse};
use crate::{Error, Result, llm::Predictor, llm::preview};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

/// Serves exactly one request per connection.
///
/// Handlers share nothing mutable: the predictor is read-only and each call to
/// [`ConnectionHandler::handle`] owns its stream.
pub struct ConnectionHandler {
    predictor: Arc<Predictor>,
    read_timeout: Option<Duration>,
}

impl ConnectionHandler {
    pub fn new(predictor: Arc<Predictor>) -> Self {
        Self {
            predictor,
            read_timeout: None,
        }
    }

    pub fn with_read_timeout(mut self, read_timeout: Option<Duration>) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Reads one request, answers it, and closes the stream.
    ///
    /// The stream is taken by value and released once on return, on every
    /// path.
    pub async fn handle<S>(&self, mut stream: S, peer: SocketAddr)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let response = match self.respond(&mut stream, peer).await {
            Ok(Some(response)) => response,
            Ok(None) => {
                info!("Connection from {} closed without data", peer);
                close(&mut stream).await;
                return;
            }
            Err(Error::Decode(e)) => {
                error!("JSON decode error: {}", e);
                PredictionResponse::new(INVALID_JSON)
            }
            Err(e) => {
                error!("Error handling client {}: {}", peer, e);
                PredictionResponse::server_error(&e)
            }
        };

        match send(&mut stream, &response).await {
            Ok(()) => info!("Sent response to {}", peer),
            Err(e) => warn!("Failed to send response to {}: {}", peer, e),
        }
        close(&mut stream).await;
    }

    /// `Ok(None)` when the peer closed before sending anything.
    async fn respond<S>(&self, stream: &mut S, peer: SocketAddr) -> Result<Option<PredictionResponse>>
    where
        S: AsyncRead + Unpin,
    {
        let frame: Frame = framing::read_frame(stream, self.read_timeout).await?;
        if frame.is_blank() {
            return Ok(None);
        }
        if !frame.complete {
            debug!("Peer {} closed before a complete request was framed", peer);
        }

        info!(
            "Received from {}: {}...",
            peer,
            preview(&String::from_utf8_lossy(&frame.bytes), 100)
        );

        let request = PredictionRequest::decode(&frame.bytes)?;
        let prediction = match request.description() {
            Some(description) => self.predictor.predict(description).await,
            None => NO_DESCRIPTION.to_string(),
        };

        Ok(Some(PredictionResponse::new(prediction)))
    }
}

async fn send<W>(stream: &mut W, response: &PredictionResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let bytes = response.encode()?;
    stream.write_all(&bytes).await?;
    stream.flush().await?;
    Ok(())
}

async fn close<W>(stream: &mut W)
where
    W: AsyncWrite + Unpin,
{
    if let Err(e) = stream.shutdown().await {
        debug!("Shutdown after response failed: {}", e);
    }
}
