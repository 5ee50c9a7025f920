//! Incremental parser for OpenAI-style Server-Sent-Events streams.
//!
//! The wire format is newline-delimited `data: {json}` records terminated
//! by a literal `data: [DONE]`:
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"Hello"}}]}
//!
//! data: {"choices":[{"delta":{"content":" there"}}]}
//!
//! data: [DONE]
//! ```
//!
//! Partial lines are buffered across reads, so a record split at any byte
//! offset by the network is reassembled before parsing. Complete lines
//! that still fail to parse are skipped silently.

use serde::Deserialize;

use crate::providers::common::PushParser;

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

/// Push parser for `data:`-prefixed SSE lines.
#[derive(Default)]
pub struct SseLineParser {
    buf: Vec<u8>,
    done: bool,
}

impl SseLineParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        // Non-data SSE fields (event:, id:, comments) carry no text.
        let data = line.strip_prefix("data:")?.trim_start();

        if data == "[DONE]" {
            self.done = true;
            return None;
        }

        let chunk: StreamChunk = serde_json::from_str(data).ok()?;
        let content = chunk.choices.first()?.delta.content.as_deref()?;
        if content.is_empty() {
            return None;
        }
        Some(content.to_string())
    }
}

impl PushParser for SseLineParser {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        self.buf.extend_from_slice(chunk);

        let mut fragments = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line).into_owned();
            if let Some(fragment) = self.process_line(&line) {
                fragments.push(fragment);
            }
            if self.done {
                break;
            }
        }
        fragments
    }

    fn finish(&mut self) -> Vec<String> {
        // A final record may arrive without a trailing newline.
        if self.done || self.buf.is_empty() {
            return Vec::new();
        }
        let line = String::from_utf8_lossy(&std::mem::take(&mut self.buf)).into_owned();
        self.process_line(&line).into_iter().collect()
    }

    fn is_done(&self) -> bool {
        self.done
    }
}
