//! Recursive-descent reader: turns source bytes into [`Value`] trees.
//!
//! One token of lookahead (the next unconsumed byte) decides which literal
//! form to parse, matching the dispatch shape of a hand-rolled lexer that
//! peeks a byte and branches: integers, lists, tuples, quoted symbols,
//! booleans, strings, symbols, in that priority order.

use crate::error::ReaderError;
use crate::interp::value::Value;
use crate::lex::Cursor;

pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Cursor<'a> for Reader<'a> {
    fn buffer(&self) -> &[u8] {
        self.buf
    }
    fn cursor(&self) -> usize {
        self.pos
    }
    fn cursor_mut(&mut self) -> &mut usize {
        &mut self.pos
    }
    fn line(&self) -> usize {
        self.line
    }
    fn line_mut(&mut self) -> &mut usize {
        &mut self.line
    }
}

impl<'a> Reader<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Reader {
            buf: src,
            pos: 0,
            line: 1,
        }
    }

    /// Parses every top-level object in the source, stopping cleanly at
    /// end-of-input. Used for both program files (wrapped into a list by the
    /// caller) and one-off REPL lines.
    pub fn read_all(&mut self) -> Result<Vec<Value>, ReaderError> {
        let mut out = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            if self.peek_byte().is_none() {
                return Ok(out);
            }
            out.push(self.read_object()?);
        }
    }

    pub fn read_object(&mut self) -> Result<Value, ReaderError> {
        self.skip_whitespace_and_comments();
        let line = self.line();

        match self.peek_byte() {
            None => Err(ReaderError::UnexpectedEof),
            Some(b) if b == b'-' && self.peek_byte_offset(1).is_some_and(|b| b.is_ascii_digit()) => {
                self.read_int(line)
            }
            Some(b) if b.is_ascii_digit() => self.read_int(line),
            Some(b'[') => self.read_list(line),
            Some(b'(') => self.read_tuple(false, line),
            Some(b'\'') if self.peek_byte_offset(1) == Some(b'(') => {
                self.next_byte();
                self.read_tuple(true, line)
            }
            Some(b'#') if matches!(self.peek_byte_offset(1), Some(b't') | Some(b'f')) => {
                self.read_bool(line)
            }
            Some(b'"') => self.read_string(line),
            Some(b) if Self::is_symbol_char(b) => self.read_symbol(line),
            Some(b) => Err(ReaderError::MismatchedByte {
                expected: b'?',
                found: Some(b),
            }),
        }
    }

    fn read_int(&mut self, line: usize) -> Result<Value, ReaderError> {
        let start = self.cursor();
        if self.peek_byte() == Some(b'-') {
            self.next_byte();
        }
        while self.peek_byte().map_or(false, |b| b.is_ascii_digit()) {
            self.next_byte();
        }
        let text = std::str::from_utf8(&self.buf[start..self.cursor()]).unwrap();
        let n = text.parse::<i64>().map_err(|_| ReaderError::InvalidNumber {
            text: text.to_owned(),
            line,
        })?;
        Ok(Value::int(n, line))
    }

    fn read_bool(&mut self, line: usize) -> Result<Value, ReaderError> {
        self.expect_byte(b'#')?;
        let b = match self.next_byte() {
            Some(b't') => true,
            Some(b'f') => false,
            found => {
                return Err(ReaderError::MismatchedByte {
                    expected: b't',
                    found,
                })
            }
        };
        Ok(Value::boolean(b, line))
    }

    fn read_symbol(&mut self, line: usize) -> Result<Value, ReaderError> {
        let quoted = self.peek_byte() == Some(b'\'');
        if quoted {
            self.next_byte();
        }
        let start = self.cursor();
        while self.peek_byte().map_or(false, Self::is_symbol_char) {
            self.next_byte();
        }
        let name = std::str::from_utf8(&self.buf[start..self.cursor()])
            .unwrap()
            .to_owned();
        Ok(Value::symbol(name, quoted, line))
    }

    fn read_string(&mut self, line: usize) -> Result<Value, ReaderError> {
        self.expect_byte(b'"')?;
        let mut s = String::new();
        loop {
            match self.next_byte() {
                None => return Err(ReaderError::UnterminatedString { line }),
                Some(b'"') => break,
                Some(b'\\') => match self.next_byte() {
                    Some(b'n') => s.push('\n'),
                    Some(b'r') => s.push('\r'),
                    Some(b't') => s.push('\t'),
                    Some(other) => s.push(other as char),
                    None => return Err(ReaderError::UnterminatedString { line }),
                },
                Some(b) => s.push(b as char),
            }
        }
        Ok(Value::string(s, line))
    }

    fn read_list(&mut self, line: usize) -> Result<Value, ReaderError> {
        self.expect_byte(b'[')?;
        let mut items = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            match self.peek_byte() {
                Some(b']') => {
                    self.next_byte();
                    return Ok(Value::list(items, line));
                }
                None => return Err(ReaderError::UnexpectedEof),
                _ => items.push(self.read_object()?),
            }
        }
    }

    fn read_tuple(&mut self, quoted: bool, line: usize) -> Result<Value, ReaderError> {
        self.expect_byte(b'(')?;
        let mut names = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            match self.peek_byte() {
                Some(b')') => {
                    self.next_byte();
                    return Ok(Value::tuple(names, quoted, line));
                }
                None => return Err(ReaderError::UnexpectedEof),
                _ => {
                    let element = self.read_object()?;
                    match element.data() {
                        crate::interp::value::Data::Symbol { name, .. } if name.len() == 1 => {
                            names.push(name.clone())
                        }
                        _ => {
                            return Err(ReaderError::MismatchedByte {
                                expected: b')',
                                found: self.peek_byte(),
                            })
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::value::Data;

    fn read_one(src: &str) -> Value {
        Reader::new(src.as_bytes()).read_object().unwrap()
    }

    #[test]
    fn reads_integers() {
        assert!(matches!(read_one("42").data(), Data::Int(42)));
        assert!(matches!(read_one("-7").data(), Data::Int(-7)));
    }

    #[test]
    fn reads_booleans() {
        assert!(matches!(read_one("#t").data(), Data::Bool(true)));
        assert!(matches!(read_one("#f").data(), Data::Bool(false)));
    }

    #[test]
    fn reads_strings_with_escapes() {
        match read_one(r#""a\nb""#).data() {
            Data::String(s) => assert_eq!(s, "a\nb"),
            _ => panic!("expected string"),
        }
    }

    #[test]
    fn reads_quoted_symbol() {
        match read_one("'foo").data() {
            Data::Symbol { name, quoted } => {
                assert_eq!(name, "foo");
                assert!(quoted);
            }
            _ => panic!("expected symbol"),
        }
    }

    #[test]
    fn reads_nested_list() {
        match read_one("[1 [2 3] 4]").data() {
            Data::List(items) => assert_eq!(items.len(), 3),
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn reads_tuple_of_single_char_symbols() {
        match read_one("(x y)").data() {
            Data::Tuple { names, quoted } => {
                assert_eq!(names, &["x".to_string(), "y".to_string()]);
                assert!(!quoted);
            }
            _ => panic!("expected tuple"),
        }
    }

    #[test]
    fn reads_quoted_tuple() {
        match read_one("'(x)").data() {
            Data::Tuple { quoted, .. } => assert!(quoted),
            _ => panic!("expected tuple"),
        }
    }

    #[test]
    fn skips_line_comments_between_tokens() {
        let mut reader = Reader::new(b"1 // comment\n2");
        let all = reader.read_all().unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn rejects_multi_char_symbol_inside_tuple() {
        let mut reader = Reader::new(b"(foo)");
        assert!(reader.read_object().is_err());
    }
}
