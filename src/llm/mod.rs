mod client;
mod predictor;
mod types;

pub use client::{LlmClient, OpenAiClient};
pub use predictor::{Predictor, UNAVAILABLE_PREFIX};
pub(crate) use predictor::preview;
pub use types::*;
