//! Incremental parser for Google's streaming response format.
//!
//! `streamGenerateContent` delivers a loosely delimited JSON array whose
//! elements are complete response objects, split across network reads at
//! arbitrary byte offsets:
//!
//! ```text
//! [{"candidates":[{"content":{"parts":[{"text":"Hel"}]}}]}
//! ,{"candidates":[{"content":{"parts":[{"text":"lo"}]}}]}
//! ]
//! ```
//!
//! The parser scans bytes for complete top-level objects, tracking brace
//! depth while ignoring braces inside quoted strings (with escape
//! handling), and carries incomplete objects over to the next read.

use serde::Deserialize;

use crate::providers::common::PushParser;

#[derive(Debug, Deserialize)]
struct StreamObject {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize, Default)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Push parser for a bracketed stream of JSON objects.
#[derive(Default)]
pub struct JsonArrayParser {
    buf: Vec<u8>,
}

impl JsonArrayParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locate the first complete top-level JSON object in the buffer.
    ///
    /// Returns the byte range of the object. Array punctuation and
    /// whitespace before the object are consumed along with it by the
    /// caller.
    fn find_object(&self) -> Option<(usize, usize)> {
        let mut depth = 0usize;
        let mut start = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (i, &byte) in self.buf.iter().enumerate() {
            if escaped {
                escaped = false;
                continue;
            }
            match byte {
                b'\\' => escaped = true,
                b'"' => in_string = !in_string,
                b'{' if !in_string => {
                    if depth == 0 {
                        start = i;
                    }
                    depth += 1;
                }
                b'}' if !in_string => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some((start, i));
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn extract_text(object: &[u8]) -> Option<String> {
        let parsed: StreamObject = serde_json::from_slice(object).ok()?;
        let text = parsed
            .candidates
            .first()?
            .content
            .parts
            .first()?
            .text
            .as_deref()?;
        if text.is_empty() {
            return None;
        }
        Some(text.to_string())
    }
}

impl PushParser for JsonArrayParser {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut fragments = Vec::new();
        while let Some((start, end)) = self.find_object() {
            // Malformed objects are dropped with everything before them,
            // so the scan always makes progress.
            if let Some(text) = Self::extract_text(&self.buf[start..=end]) {
                fragments.push(text);
            }
            self.buf.drain(..=end);
        }
        fragments
    }
}
