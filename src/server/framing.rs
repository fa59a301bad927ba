//! Request framing by incremental parsing.
//!
//! The wire has no length prefix and no delimiter. After every read the whole
//! buffer is parsed as one JSON value, and framing ends as soon as that value
//! parses and is non-empty. Malformed input never parses, so the peer closing
//! its side is the only thing that ends it. Invalid UTF-8 is the exception:
//! it cannot be completed by more bytes and fails immediately.

use crate::{Error, Result};
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

const READ_CHUNK_SIZE: usize = 4096;

/// Bytes collected from one connection.
#[derive(Debug, Default)]
pub struct Frame {
    pub bytes: Vec<u8>,
    /// True when a non-empty JSON value was parsed before the peer closed.
    pub complete: bool,
}

impl Frame {
    /// True when nothing but whitespace arrived.
    pub fn is_blank(&self) -> bool {
        self.bytes.trim_ascii().is_empty()
    }
}

pub async fn read_frame<R>(reader: &mut R, read_timeout: Option<Duration>) -> Result<Frame>
where
    R: AsyncRead + Unpin,
{
    let mut frame = Frame::default();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        let n = read_chunk(reader, &mut chunk, read_timeout).await?;
        if n == 0 {
            trace!("Peer closed after {} bytes", frame.bytes.len());
            return Ok(frame);
        }

        frame.bytes.extend_from_slice(&chunk[..n]);
        check_utf8(&frame.bytes)?;
        if is_complete(&frame.bytes) {
            frame.complete = true;
            return Ok(frame);
        }
    }
}

async fn read_chunk<R>(reader: &mut R, chunk: &mut [u8], limit: Option<Duration>) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, reader.read(chunk))
            .await
            .map_err(|_| Error::timeout("socket read", limit))?
            .map_err(Error::from),
        None => Ok(reader.read(chunk).await?),
    }
}

/// Rejects invalid UTF-8. A multi-byte character cut off at the end of the
/// buffer is not an error: the rest may still arrive.
fn check_utf8(buffer: &[u8]) -> Result<()> {
    match std::str::from_utf8(buffer) {
        Err(e) if e.error_len().is_some() => Err(Error::Utf8(e)),
        _ => Ok(()),
    }
}

/// Whether `buffer` holds exactly one non-empty JSON value.
pub fn is_complete(buffer: &[u8]) -> bool {
    serde_json::from_slice::<Value>(buffer)
        .map(|value| is_non_empty(&value))
        .unwrap_or(false)
}

/// Truthiness of a JSON value: `null`, `false`, `0`, `""`, `[]` and `{}` are empty.
pub(crate) fn is_non_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
