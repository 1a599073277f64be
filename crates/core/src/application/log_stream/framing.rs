// Chunk decoding and line framing for streamed tool output

use once_cell::sync::Lazy;
use regex::Regex;

static LINE_TERMINATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n").expect("line terminator regex must compile"));

/// Incremental UTF-8 decoder.
///
/// A multi-byte sequence split across chunks is held back until completed;
/// invalid bytes become U+FFFD.
#[derive(Debug, Default)]
pub(crate) struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::new();
        let mut offset = 0;
        loop {
            match std::str::from_utf8(&self.pending[offset..]) {
                Ok(text) => {
                    out.push_str(text);
                    offset = self.pending.len();
                    break;
                }
                Err(e) => {
                    let valid_end = offset + e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[offset..valid_end]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            offset = valid_end + len;
                        }
                        // incomplete sequence at the end: wait for more bytes
                        None => {
                            offset = valid_end;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..offset);
        out
    }

    /// Flush a dangling partial sequence at end-of-stream
    pub fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}

/// Split on `\r?\n`, keeping every terminator as its own token.
///
/// `"a\r\nb\n"` -> `["a", "\r\n", "b", "\n", ""]`
pub(crate) fn split_keeping_terminators(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for m in LINE_TERMINATOR_RE.find_iter(text) {
        tokens.push(&text[last..m.start()]);
        tokens.push(m.as_str());
        last = m.end();
    }
    tokens.push(&text[last..]);
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_keeps_terminators() {
        assert_eq!(
            split_keeping_terminators("a\r\nb\n"),
            vec!["a", "\r\n", "b", "\n", ""]
        );
        assert_eq!(split_keeping_terminators("partial"), vec!["partial"]);
        assert_eq!(split_keeping_terminators(""), vec![""]);
    }

    #[test]
    fn test_decoder_joins_split_multibyte() {
        let mut decoder = Utf8ChunkDecoder::default();
        let bytes = "né".as_bytes();
        assert_eq!(decoder.push(&bytes[..2]), "n");
        assert_eq!(decoder.push(&bytes[2..]), "é");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_decoder_replaces_invalid_bytes() {
        let mut decoder = Utf8ChunkDecoder::default();
        assert_eq!(decoder.push(&[b'a', 0xff, b'b']), "a\u{fffd}b");
    }

    #[test]
    fn test_decoder_flushes_dangling_bytes() {
        let mut decoder = Utf8ChunkDecoder::default();
        assert_eq!(decoder.push(&[b'x', 0xe2, 0x82]), "x");
        assert_eq!(decoder.finish(), "\u{fffd}");
    }
}
