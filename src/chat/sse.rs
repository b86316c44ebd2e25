use std::str::Utf8Error;

/// Incremental decoder for a server-sent-event byte stream.
///
/// The transport delivers UTF-8 text in arbitrarily sized chunks; a chunk
/// boundary may fall inside an event record or inside a multi-byte
/// character. The decoder therefore only ever consumes complete lines:
/// `0x0A` cannot occur inside a UTF-8 continuation sequence, so a partial
/// character can only sit at the unterminated tail of the buffer, where it
/// stays until the rest of it arrives.
#[derive(Debug, Default)]
pub struct SseRecordDecoder {
    buf: Vec<u8>,
}

impl SseRecordDecoder {
    pub fn new() -> Self {
        SseRecordDecoder::default()
    }

    /// Feeds one transport chunk and returns the payloads of every `data:`
    /// record completed by it. Comment lines, other SSE fields and blank
    /// record separators are skipped.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>, Utf8Error> {
        self.buf.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(newline) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=newline).collect();
            let line = std::str::from_utf8(&line[..line.len() - 1])?;
            let line = line.trim_end_matches('\r');

            if let Some(payload) = line.strip_prefix("data:") {
                payloads.push(payload.trim_start().to_string());
            }
        }

        Ok(payloads)
    }
}
