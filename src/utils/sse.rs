//! Incremental server-sent-events line splitting.

use memchr::memchr;

/// Buffers raw response bytes and yields complete `data:` payloads.
///
/// Network chunks may split a line (or a multi-byte character) anywhere, so
/// bytes stay buffered until a newline arrives.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    Data(String),
    /// A complete line that was not valid UTF-8.
    Invalid,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and collect every complete `data:` line now available.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseLine> {
        self.buffer.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(newline_pos) = memchr(b'\n', &self.buffer) {
            if let Some(line) = decode_line(&self.buffer[..newline_pos]) {
                lines.push(line);
            }
            self.buffer.drain(..=newline_pos);
        }
        lines
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<SseLine> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest)
    }
}

fn decode_line(raw: &[u8]) -> Option<SseLine> {
    match std::str::from_utf8(raw) {
        Ok(line) => extract_data_payload(line.trim()).map(|data| SseLine::Data(data.to_string())),
        Err(_) => Some(SseLine::Invalid),
    }
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}
