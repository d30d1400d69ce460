//! Newline-delimited JSON stream parsing.
//!
//! The streaming chat protocol emits one JSON object per line, but HTTP
//! chunk boundaries do not respect line boundaries: a fragment can arrive
//! split across reads, or several lines can land in one read. `LineBuffer`
//! accumulates bytes and parses each complete line independently. A line
//! that fails to parse is skipped; one malformed fragment must not kill
//! the whole stream.

use murmur_types::llm::StreamChunk;

use super::types::StreamFragment;

#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    /// Feed raw bytes; returns the chunks for every complete line consumed.
    ///
    /// Bytes stay raw until a full line is available: a multibyte character
    /// split across two reads must not be decoded piecewise. UTF-8
    /// continuation bytes are never 0x0A, so splitting on the newline byte
    /// cannot land inside a character.
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<StreamChunk> {
        self.buf.extend_from_slice(bytes);

        let mut chunks = Vec::new();
        while let Some(newline) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(chunk) = parse_line(line.trim()) {
                chunks.push(chunk);
            }
        }
        chunks
    }

    /// Flush a trailing line that arrived without a final newline.
    pub(crate) fn finish(self) -> Option<StreamChunk> {
        let tail = String::from_utf8_lossy(&self.buf);
        parse_line(tail.trim())
    }
}

fn parse_line(line: &str) -> Option<StreamChunk> {
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<StreamFragment>(line) {
        Ok(fragment) if fragment.done => Some(StreamChunk::done(fragment.eval_count)),
        Ok(fragment) => {
            let content = fragment.message.map(|m| m.content).unwrap_or_default();
            Some(StreamChunk::delta(content))
        }
        Err(e) => {
            tracing::debug!(error = %e, "skipping malformed stream line");
            None
        }
    }
}
