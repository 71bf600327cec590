//! SplitStage: re-chunk a text stream on a delimiter.
//!
//! Input chunks are concatenated and cut on the delimiter; the piece after
//! the last delimiter is carried over to the next chunk and emitted on
//! flush. Multi-byte characters split across chunk boundaries are
//! reassembled before cutting.

use crate::error::StreamResult;
use crate::stream::{Chunk, Done, Outlet, TransformLogic};
use regex::Regex;

/// Where to cut the stream.
#[derive(Debug, Clone)]
pub enum Delimiter {
    Literal(String),
    Pattern(Regex),
}

impl From<&str> for Delimiter {
    fn from(s: &str) -> Self {
        Delimiter::Literal(s.to_string())
    }
}

impl From<String> for Delimiter {
    fn from(s: String) -> Self {
        Delimiter::Literal(s)
    }
}

impl From<Regex> for Delimiter {
    fn from(re: Regex) -> Self {
        Delimiter::Pattern(re)
    }
}

#[derive(Debug)]
enum Cutter {
    /// `\r?\n`
    Newline,
    Literal(String),
    Pattern(Regex),
}

impl Cutter {
    fn from_delimiter(delimiter: Option<Delimiter>) -> Self {
        match delimiter {
            None => Cutter::Newline,
            Some(Delimiter::Literal(s)) if s.is_empty() => Cutter::Newline,
            Some(Delimiter::Literal(s)) => Cutter::Literal(s),
            Some(Delimiter::Pattern(re)) => Cutter::Pattern(re),
        }
    }

    fn cut(&self, text: &str) -> Vec<String> {
        match self {
            Cutter::Newline => {
                let mut pieces: Vec<String> = text.split('\n').map(str::to_string).collect();
                let last = pieces.len() - 1;
                for piece in &mut pieces[..last] {
                    if piece.ends_with('\r') {
                        piece.pop();
                    }
                }
                pieces
            }
            Cutter::Literal(d) => text.split(d.as_str()).map(str::to_string).collect(),
            Cutter::Pattern(re) => re.split(text).map(str::to_string).collect(),
        }
    }
}

/// Split stage.
#[derive(Debug)]
pub struct SplitStage {
    cutter: Cutter,
    object_mode: bool,
    /// Text after the last delimiter seen.
    carry: String,
    /// Trailing bytes of an incomplete UTF-8 sequence.
    partial: Vec<u8>,
}

impl SplitStage {
    /// `None` or an empty literal splits on line breaks.
    pub fn new(delimiter: Option<Delimiter>, object_mode: bool) -> Self {
        Self {
            cutter: Cutter::from_delimiter(delimiter),
            object_mode,
            carry: String::new(),
            partial: Vec::new(),
        }
    }

    fn append(&mut self, chunk: Chunk) {
        match chunk {
            Chunk::Bytes(bytes) => {
                self.partial.extend_from_slice(&bytes);
                self.decode_partial();
            }
            other => self.carry.push_str(&other.to_text()),
        }
    }

    fn decode_partial(&mut self) {
        let bytes = std::mem::take(&mut self.partial);
        match std::str::from_utf8(&bytes) {
            Ok(text) => self.carry.push_str(text),
            // Incomplete sequence at the end: keep it for the next chunk.
            Err(e) if e.error_len().is_none() => {
                let valid = e.valid_up_to();
                self.carry.push_str(&String::from_utf8_lossy(&bytes[..valid]));
                self.partial = bytes[valid..].to_vec();
            }
            Err(_) => self.carry.push_str(&String::from_utf8_lossy(&bytes)),
        }
    }
}

impl TransformLogic for SplitStage {
    fn transform(&mut self, chunk: Chunk, done: Done) {
        self.append(chunk);
        let mut pieces = self.cutter.cut(&self.carry);
        self.carry = pieces.pop().unwrap_or_default();
        for piece in pieces {
            done.push(Chunk::text_for_mode(piece, self.object_mode));
        }
        done.ok();
    }

    fn flush(&mut self, out: &Outlet<'_>) -> StreamResult<()> {
        if !self.partial.is_empty() {
            let tail = std::mem::take(&mut self.partial);
            self.carry.push_str(&String::from_utf8_lossy(&tail));
        }
        if !self.carry.is_empty() {
            out.push(Chunk::text_for_mode(std::mem::take(&mut self.carry), self.object_mode));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{scheduler, Mode, Source, StreamRef, Transform};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn split(input: Vec<Chunk>, delimiter: Option<Delimiter>) -> Vec<String> {
        let source: StreamRef = Source::from_chunks("src", false, input);
        let stage: StreamRef =
            Transform::new("Split", SplitStage::new(delimiter, false), Mode::data());
        source.core().native_pipe(&stage).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        stage
            .core()
            .on_data(move |c| s.borrow_mut().push(c.to_text().into_owned()));
        scheduler::run();
        let out = seen.borrow().clone();
        out
    }

    #[test]
    fn test_default_splits_lines() {
        let out = split(vec![Chunk::Bytes(b"a\nb\r\nc".to_vec())], None);
        assert_eq!(out, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_literal_uses_default() {
        let out = split(vec!["x\ny".into()], Some("".into()));
        assert_eq!(out, vec!["x", "y"]);
    }

    #[test]
    fn test_literal_comma() {
        let out = split(vec!["a,b\nc,d".into()], Some(",".into()));
        assert_eq!(out, vec!["a", "b\nc", "d"]);
    }

    #[test]
    fn test_pattern() {
        let re = Regex::new(r"\d+").unwrap();
        let out = split(vec!["a1b22c".into()], Some(re.into()));
        assert_eq!(out, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_pieces_span_chunks() {
        let out = split(vec!["he".into(), "llo\nwor".into(), "ld\n".into()], None);
        assert_eq!(out, vec!["hello", "world"]);
    }

    #[test]
    fn test_crlf_across_chunks() {
        let out = split(vec!["a\r".into(), "\nb".into()], None);
        assert_eq!(out, vec!["a", "b"]);
    }

    #[test]
    fn test_multibyte_across_chunks() {
        let bytes = "é\nü".as_bytes();
        let out = split(
            vec![Chunk::Bytes(bytes[..1].to_vec()), Chunk::Bytes(bytes[1..].to_vec())],
            None,
        );
        assert_eq!(out, vec!["é", "ü"]);
    }

    #[test]
    fn test_empty_middle_pieces_are_kept() {
        let out = split(vec!["a\n\nb".into()], None);
        assert_eq!(out, vec!["a", "", "b"]);
    }
}
