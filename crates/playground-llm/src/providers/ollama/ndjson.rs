//! Incremental parser for Ollama's newline-delimited JSON streaming.
//!
//! One whole JSON object per line, no `data:` prefix and no terminator
//! sentinel; the stream simply ends when the connection closes:
//!
//! ```text
//! {"model":"llama3.2","message":{"role":"assistant","content":"Hel"},"done":false}
//! {"model":"llama3.2","message":{"role":"assistant","content":"lo"},"done":true}
//! ```
//!
//! Partial lines are buffered across reads; malformed complete lines are
//! skipped.

use serde::Deserialize;

use crate::providers::common::PushParser;

#[derive(Debug, Deserialize)]
struct ChatLine {
    #[serde(default)]
    message: Option<LineMessage>,
}

#[derive(Debug, Deserialize)]
struct LineMessage {
    #[serde(default)]
    content: String,
}

/// Push parser for line-delimited JSON chat chunks.
#[derive(Default)]
pub struct NdjsonLineParser {
    buf: Vec<u8>,
}

impl NdjsonLineParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn process_line(line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let parsed: ChatLine = serde_json::from_str(line).ok()?;
        let content = parsed.message?.content;
        if content.is_empty() {
            return None;
        }
        Some(content)
    }
}

impl PushParser for NdjsonLineParser {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut fragments = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line).into_owned();
            if let Some(fragment) = Self::process_line(&line) {
                fragments.push(fragment);
            }
        }
        fragments
    }

    fn finish(&mut self) -> Vec<String> {
        if self.buf.is_empty() {
            return Vec::new();
        }
        let line = String::from_utf8_lossy(&std::mem::take(&mut self.buf)).into_owned();
        Self::process_line(&line).into_iter().collect()
    }
}
