//! Line reader with one line of lookahead.
//!
//! The text format delimits its numeric blocks by indentation only, so the
//! parser has to look at the next line's leading spaces before deciding
//! whether it belongs to the current block.

use std::io::{self, BufRead};

pub(crate) struct LineReader<R> {
    inner: R,
    peeked: Option<String>,
    line_no: usize,
    eof: bool,
}

impl<R: BufRead> LineReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            peeked: None,
            line_no: 0,
            eof: false,
        }
    }

    /// Look at the next line without consuming it.
    pub(crate) fn peek(&mut self) -> io::Result<Option<&str>> {
        if self.peeked.is_none() && !self.eof {
            let mut buf = String::new();
            if self.inner.read_line(&mut buf)? == 0 {
                self.eof = true;
            } else {
                let len = buf.trim_end_matches(&['\n', '\r'][..]).len();
                buf.truncate(len);
                self.peeked = Some(buf);
            }
        }
        Ok(self.peeked.as_deref())
    }

    /// Leading space count of the next line, `None` at end of stream.
    pub(crate) fn peek_indent(&mut self) -> io::Result<Option<usize>> {
        Ok(self.peek()?.map(indent_of))
    }

    /// Consume the next line.
    pub(crate) fn next_line(&mut self) -> io::Result<Option<String>> {
        self.peek()?;
        let line = self.peeked.take();
        if line.is_some() {
            self.line_no += 1;
        }
        Ok(line)
    }

    /// Consume the next line only if it sits at exactly `indent` spaces.
    pub(crate) fn next_if_indent(&mut self, indent: usize) -> io::Result<Option<String>> {
        if self.peek_indent()? == Some(indent) {
            self.next_line()
        } else {
            Ok(None)
        }
    }

    /// 1-based number of the most recently consumed line.
    pub(crate) fn line_no(&self) -> usize {
        self.line_no
    }
}

fn indent_of(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b' ').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_does_not_consume() {
        let mut reader = LineReader::new(" a\n  b\nc\n".as_bytes());
        assert_eq!(reader.peek_indent().unwrap(), Some(1));
        assert_eq!(reader.peek_indent().unwrap(), Some(1));
        assert_eq!(reader.next_line().unwrap().as_deref(), Some(" a"));
        assert_eq!(reader.line_no(), 1);
        assert_eq!(reader.peek_indent().unwrap(), Some(2));
    }

    #[test]
    fn test_next_if_indent_stops_on_other_indent() {
        let mut reader = LineReader::new("  x\n  y\n z\n".as_bytes());
        assert!(reader.next_if_indent(2).unwrap().is_some());
        assert!(reader.next_if_indent(2).unwrap().is_some());
        assert!(reader.next_if_indent(2).unwrap().is_none());
        assert_eq!(reader.next_line().unwrap().as_deref(), Some(" z"));
        assert_eq!(reader.next_line().unwrap(), None);
        assert_eq!(reader.peek_indent().unwrap(), None);
    }

    #[test]
    fn test_strips_crlf() {
        let mut reader = LineReader::new("abc\r\n".as_bytes());
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("abc"));
    }
}
