//! Sends its arguments as one description to a running relay and prints the
//! prediction.
//!
//! ```bash
//! relay-ask "Coffee \$4.50 at the airport"
//! ```

use anyhow::{Result, bail};
use prediction_relay::{client::PredictionClient, config};

#[tokio::main]
async fn main() -> Result<()> {
    let description = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if description.trim().is_empty() {
        bail!("usage: relay-ask <description>");
    }

    let config = config::load().await?;
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let prediction = PredictionClient::new(addr).predict(&description).await?;
    println!("{}", prediction);

    Ok(())
}
