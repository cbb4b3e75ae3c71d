/// Splits a growing byte stream into complete lines.
///
/// State is the byte offset already consumed plus the trailing fragment that
/// has not seen its newline yet. Feeding the next appended range returns every
/// line it completes and keeps the new fragment for the following call, so a
/// line split across two reads is yielded exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncrementalLineReader {
    offset: u64,
    leftover: Vec<u8>,
}

impl IncrementalLineReader {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            offset: 0,
            leftover: Vec::new(),
        }
    }

    /// Bytes consumed from the source so far.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Incomplete trailing fragment carried to the next read.
    #[must_use]
    pub fn leftover(&self) -> &[u8] {
        &self.leftover
    }

    /// Consumes a newly appended byte range and returns the completed lines.
    ///
    /// Line terminators (`\n` or `\r\n`) are stripped and empty lines are
    /// dropped. Invalid UTF-8 is replaced rather than rejected.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let chunk_len = u64::try_from(chunk.len()).unwrap_or(u64::MAX);
        self.offset = self.offset.saturating_add(chunk_len);
        self.leftover.extend_from_slice(chunk);

        let Some(last_newline) = self.leftover.iter().rposition(|byte| *byte == b'\n') else {
            return Vec::new();
        };
        let rest = self.leftover.split_off(last_newline.saturating_add(1));
        let complete = std::mem::replace(&mut self.leftover, rest);

        complete
            .split(|byte| *byte == b'\n')
            .filter_map(decode_line)
            .collect()
    }

    /// Flushes the final fragment once the source is known to be complete.
    pub fn finish(&mut self) -> Option<String> {
        let fragment = std::mem::take(&mut self.leftover);
        decode_line(&fragment)
    }
}

fn decode_line(raw: &[u8]) -> Option<String> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    if raw.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(raw).into_owned())
}
