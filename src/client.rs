//! Consumer side of the relay protocol: send a description, read one line back.

use crate::{Error, Result, server::PredictionResponse};
use serde_json::json;
use std::time::Duration;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
};
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct PredictionClient {
    addr: String,
    timeout: Duration,
}

impl PredictionClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Asks the relay for a prediction, bounded by the client timeout.
    pub async fn predict(&self, description: &str) -> Result<String> {
        tokio::time::timeout(self.timeout, self.exchange(description))
            .await
            .map_err(|_| Error::timeout("prediction request", self.timeout))?
    }

    async fn exchange(&self, description: &str) -> Result<String> {
        let stream = TcpStream::connect(self.addr.as_str()).await?;
        let (read_half, mut write_half) = stream.into_split();

        let mut line = json!({ "description": description }).to_string();
        line.push('\n');
        debug!("Sending {} bytes to {}", line.len(), self.addr);
        write_half.write_all(line.as_bytes()).await?;

        let mut reply = String::new();
        BufReader::new(read_half).read_line(&mut reply).await?;
        if reply.trim().is_empty() {
            return Err(Error::protocol("relay returned an empty response"));
        }

        let response: PredictionResponse = serde_json::from_str(reply.trim_end())?;
        Ok(response.prediction)
    }
}
