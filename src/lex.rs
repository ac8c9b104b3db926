use crate::error::ReaderError;

/// Low-level byte cursor shared by the reader. Mirrors the shape of a
/// hand-rolled lexer base: a borrowed buffer, an integer cursor, and a
/// handful of default-implemented helpers built only on `buffer`/`cursor`.
pub(crate) trait Cursor<'a> {
    fn buffer(&self) -> &[u8];
    fn cursor(&self) -> usize;
    fn cursor_mut(&mut self) -> &mut usize;
    fn line(&self) -> usize;
    fn line_mut(&mut self) -> &mut usize;

    fn next_byte(&mut self) -> Option<u8> {
        self.buffer().get(self.cursor()).copied().map(|b| {
            *self.cursor_mut() += 1;
            if b == b'\n' {
                *self.line_mut() += 1;
            }
            b
        })
    }

    fn peek_byte(&self) -> Option<u8> {
        self.buffer().get(self.cursor()).copied()
    }

    fn peek_byte_offset(&self, offset: usize) -> Option<u8> {
        self.buffer().get(self.cursor() + offset).copied()
    }

    fn is_whitespace(b: u8) -> bool {
        matches!(b, b' ' | b'\t' | b'\n' | b'\r')
    }

    /// The canonical symbol character set: ASCII letters plus the historical
    /// punctuation set, extended with `#`, `.`, and `^`.
    fn is_symbol_char(b: u8) -> bool {
        b.is_ascii_alphabetic()
            || matches!(
                b,
                b'@' | b'$'
                    | b'#'
                    | b'+'
                    | b'-'
                    | b'*'
                    | b'/'
                    | b'='
                    | b'?'
                    | b'%'
                    | b'>'
                    | b'<'
                    | b'_'
                    | b'.'
                    | b'^'
                    | b'\''
            )
    }

    /// Skips whitespace and `//`-to-end-of-line comments, repeatedly, so a
    /// comment followed by more whitespace and another comment is all
    /// consumed in one call.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.peek_byte().map_or(false, Self::is_whitespace) {
                self.next_byte();
            }

            if self.peek_byte() == Some(b'/') && self.peek_byte_offset(1) == Some(b'/') {
                while !matches!(self.peek_byte(), None | Some(b'\n')) {
                    self.next_byte();
                }
                continue;
            }

            break;
        }
    }

    fn expect_byte(&mut self, expected: u8) -> Result<(), ReaderError> {
        match self.next_byte() {
            Some(found) if found == expected => Ok(()),
            found => Err(ReaderError::MismatchedByte { expected, found }),
        }
    }
}
