//! Incremental decoder for server-sent-event streams
//!
//! Network chunks can end anywhere, including inside a JSON payload or a
//! multi-byte character. [`decode_frames`] only ever consumes complete lines
//! and hands the rest back, so callers keep it until more bytes arrive.

#[cfg(test)]
mod proptests;

use serde_json::Value;

/// Sentinel payload ending an OpenAI-style completion stream
pub const DONE_SENTINEL: &str = "[DONE]";

/// Longest line [`FrameDecoder`] holds back; longer lines are dropped
pub const MAX_LINE_BYTES: usize = 1 << 20;

/// One decoded `data:` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Data(String),
    Done,
}

/// Split `input` into complete frames and the unconsumed tail.
///
/// Lines end at `\n` (a preceding `\r` is dropped). Only `data:` lines
/// produce frames; comments, `event:`/`id:` fields, blank lines and empty
/// payloads are skipped.
pub fn decode_frames(input: &[u8]) -> (Vec<Frame>, &[u8]) {
    let mut frames = Vec::new();
    let mut rest = input;

    while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
        let (line, tail) = rest.split_at(pos);
        if let Some(frame) = parse_line(line) {
            frames.push(frame);
        }
        rest = &tail[1..];
    }

    (frames, rest)
}

fn parse_line(line: &[u8]) -> Option<Frame> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let payload = line.strip_prefix(b"data:")?;
    let payload = payload.strip_prefix(b" ").unwrap_or(payload);
    if payload.is_empty() {
        return None;
    }

    let text = String::from_utf8_lossy(payload);
    if text.trim() == DONE_SENTINEL {
        Some(Frame::Done)
    } else {
        Some(Frame::Data(text.into_owned()))
    }
}

/// Stateful wrapper around [`decode_frames`] for a chunked byte stream
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    /// Inside an oversized line; skip bytes up to its newline
    discarding: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk, returning every frame it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        let mut chunk = chunk;
        if self.discarding {
            let Some(pos) = chunk.iter().position(|&b| b == b'\n') else {
                return Vec::new();
            };
            self.discarding = false;
            chunk = &chunk[pos + 1..];
        }

        // The buffer never holds a newline between calls, so only a chunk
        // that carries one can complete a line
        let completes_line = chunk.contains(&b'\n');
        self.buffer.extend_from_slice(chunk);

        let frames = if completes_line {
            let (frames, rest) = decode_frames(&self.buffer);
            let consumed = self.buffer.len() - rest.len();
            self.buffer.drain(..consumed);
            frames
        } else {
            Vec::new()
        };

        if self.buffer.len() > MAX_LINE_BYTES {
            tracing::warn!(bytes = self.buffer.len(), "Dropping oversized stream line");
            self.buffer.clear();
            self.discarding = true;
        }
        frames
    }

    /// End of stream: a final line without a trailing newline still counts
    pub fn finish(&mut self) -> Option<Frame> {
        let line = std::mem::take(&mut self.buffer);
        if std::mem::take(&mut self.discarding) {
            return None;
        }
        parse_line(&line)
    }

    /// Bytes held back waiting for the end of their line
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Extract `choices[0].delta.content` when present and non-empty
pub fn delta_content(chunk: &Value) -> Option<&str> {
    chunk
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Encode a JSON payload as one SSE frame
pub fn encode_frame(payload: &Value) -> String {
    format!("data: {payload}\n\n")
}

/// Completion chunk carrying a single content fragment
#[cfg(test)]
pub fn content_frame(text: &str) -> String {
    encode_frame(&serde_json::json!({"choices": [{"delta": {"content": text}}]}))
}
