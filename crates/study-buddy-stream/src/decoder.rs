//! Stateful UTF-8 decoding across chunk boundaries.
//!
//! Network chunks split text at arbitrary byte offsets, including in the
//! middle of a multi-byte character. The decoder holds back an incomplete
//! trailing sequence until the next chunk completes it.

/// Incremental UTF-8 decoder.
///
/// Concatenating every `decode` result followed by `finish` yields the same
/// text as decoding the whole byte stream at once with
/// [`String::from_utf8_lossy`].
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    held: Vec<u8>,
}

impl Utf8StreamDecoder {
    /// Create a decoder with no held-back bytes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk in streaming mode.
    ///
    /// Invalid sequences become U+FFFD. A multi-byte sequence cut off at the
    /// end of the chunk is kept for the next call.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.held.extend_from_slice(chunk);
        let mut out = String::with_capacity(self.held.len());
        let mut consumed = 0;

        loop {
            match std::str::from_utf8(&self.held[consumed..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    consumed = self.held.len();
                    break;
                }
                Err(e) => {
                    let valid_up_to = consumed + e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.held[consumed..valid_up_to]));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            consumed = valid_up_to + bad;
                        }
                        None => {
                            consumed = valid_up_to;
                            break;
                        }
                    }
                }
            }
        }

        self.held.drain(..consumed);
        out
    }

    /// Final pass: flush any held-back bytes.
    ///
    /// A sequence that never completed decodes to U+FFFD.
    pub fn finish(&mut self) -> String {
        let rest = std::mem::take(&mut self.held);
        String::from_utf8_lossy(&rest).into_owned()
    }

    /// Whether bytes are waiting for the rest of their character.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.held.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_in_pieces(bytes: &[u8], split_at: &[usize]) -> String {
        let mut decoder = Utf8StreamDecoder::new();
        let mut out = String::new();
        let mut start = 0;
        for &end in split_at {
            out.push_str(&decoder.decode(&bytes[start..end]));
            start = end;
        }
        out.push_str(&decoder.decode(&bytes[start..]));
        out.push_str(&decoder.finish());
        out
    }

    #[test]
    fn ascii_passes_through() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"data: hi\n"), "data: hi\n");
        assert!(!decoder.has_pending());
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn multibyte_split_across_chunks() {
        // "é" is 0xC3 0xA9
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(&[b'c', b'a', b'f', 0xC3]), "caf");
        assert!(decoder.has_pending());
        assert_eq!(decoder.decode(&[0xA9, b'!']), "é!");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn every_split_of_mixed_text_matches_whole_decode() {
        let text = "नमस्ते 👋 Study Buddy — 你好";
        let bytes = text.as_bytes();
        for i in 0..=bytes.len() {
            assert_eq!(decode_in_pieces(bytes, &[i]), text, "split at {i}");
        }
    }

    #[test]
    fn emoji_split_into_single_bytes() {
        let text = "🎉";
        let bytes = text.as_bytes();
        let splits: Vec<usize> = (1..bytes.len()).collect();
        assert_eq!(decode_in_pieces(bytes, &splits), text);
    }

    #[test]
    fn invalid_byte_becomes_replacement() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(&[b'a', 0xFF, b'b']), "a\u{FFFD}b");
    }

    #[test]
    fn truncated_tail_flushes_as_replacement() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(&[b'x', 0xE2, 0x82]), "x");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn matches_lossy_decode_for_invalid_input() {
        let bytes = [b'o', b'k', 0xC3, b'(', 0xF0, 0x9F, 0x98, b'z'];
        let expected = String::from_utf8_lossy(&bytes).into_owned();
        for i in 0..=bytes.len() {
            assert_eq!(decode_in_pieces(&bytes, &[i]), expected, "split at {i}");
        }
    }
}
