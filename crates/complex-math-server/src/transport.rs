//! Line-delimited JSON-RPC over a byte stream (stdin/stdout in production).
//!
//! One request per line in, one compact JSON response per line out, flushed
//! before the next line is read. Blank lines, lines that are not UTF-8 and
//! lines that are not a JSON object are dropped without a response.

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use complex_math_mcp::{JsonRpcRequest, JsonRpcResponse};

use crate::app_state::AppState;
use crate::handlers;

/// Counters reported when the input stream ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServeSummary {
    /// Lines read, including blank and dropped ones.
    pub lines: usize,
    pub responses: usize,
}

/// Serve requests from `reader` until end of input.
///
/// # Errors
///
/// Returns an I/O error when reading the input or writing a response fails.
pub async fn serve<R, W>(
    state: &AppState,
    mut reader: R,
    mut writer: W,
) -> std::io::Result<ServeSummary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut summary = ServeSummary::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(summary);
        }
        summary.lines += 1;

        let Some(response) = process_line(state, &buf) else {
            continue;
        };

        let mut frame = serde_json::to_vec(&response)?;
        frame.push(b'\n');
        writer.write_all(&frame).await?;
        writer.flush().await?;
        summary.responses += 1;
    }
}

/// Decode one input line and dispatch it. `None` means the line is dropped.
pub fn process_line(state: &AppState, raw: &[u8]) -> Option<JsonRpcResponse> {
    let Ok(line) = std::str::from_utf8(raw) else {
        tracing::warn!("dropping line that is not valid UTF-8");
        return None;
    };

    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(%err, "dropping malformed JSON line");
            return None;
        }
    };

    if !value.is_object() {
        tracing::warn!("dropping JSON line that is not an object");
        return None;
    }

    let req: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(req) => req,
        Err(err) => {
            tracing::warn!(%err, "dropping line that is not a JSON-RPC request");
            return None;
        }
    };

    Some(handlers::handle_request(state, &req))
}
