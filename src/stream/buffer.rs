//! Newline frame splitter for incremental response bodies.

/// Accumulates incoming text and yields complete `\n`-terminated lines.
///
/// The trailing unterminated fragment is retained until more input arrives
/// or [`LineBuffer::flush_remainder`] is called, so the lines produced do not
/// depend on how the input was chunked.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: String,
    /// Bytes of a UTF-8 sequence cut off at the end of the last read.
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text and return every line completed by it, in order.
    pub fn feed(&mut self, text: &str) -> Vec<String> {
        self.buffer.push_str(text);
        self.drain_lines()
    }

    /// Append raw bytes, carrying an incomplete trailing UTF-8 sequence over
    /// to the next call.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(bytes);

        let mut rest = input.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    // valid_up_to guarantees this slice is well-formed
                    self.buffer
                        .push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match err.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        self.drain_lines()
    }

    /// Take whatever unterminated content is left. Called once at end of input.
    pub fn flush_remainder(&mut self) -> String {
        if !self.pending.is_empty() {
            let pending = std::mem::take(&mut self.pending);
            self.buffer.push_str(&String::from_utf8_lossy(&pending));
        }
        std::mem::take(&mut self.buffer)
    }

    /// Whether any unterminated content is buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.pending.is_empty()
    }

    fn drain_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };
        let tail = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, tail);
        complete
            .strip_suffix('\n')
            .unwrap_or(&complete)
            .split('\n')
            .map(str::to_string)
            .collect()
    }
}
