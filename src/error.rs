use std::fmt;
use std::io;

/// A syntax failure surfaced while reading source text into values.
#[derive(Debug)]
pub enum ReaderError {
    UnexpectedEof,
    MismatchedByte { expected: u8, found: Option<u8> },
    UnterminatedString { line: usize },
    InvalidNumber { text: String, line: usize },
    UnexpectedCloseDelimiter { found: u8, line: usize },
    IoError(io::Error),
}

impl From<io::Error> for ReaderError {
    fn from(err: io::Error) -> Self {
        Self::IoError(err)
    }
}

impl fmt::Display for ReaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaderError::UnexpectedEof => write!(f, "unexpected end of input"),
            ReaderError::MismatchedByte { expected, found } => write!(
                f,
                "expected byte {:?}, found {:?}",
                *expected as char,
                found.map(|b| b as char)
            ),
            ReaderError::UnterminatedString { line } => {
                write!(f, "unterminated string literal starting at line {}", line)
            }
            ReaderError::InvalidNumber { text, line } => {
                write!(f, "invalid number '{}' at line {}", text, line)
            }
            ReaderError::UnexpectedCloseDelimiter { found, line } => write!(
                f,
                "unexpected closing delimiter {:?} at line {}",
                *found as char, line
            ),
            ReaderError::IoError(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for ReaderError {}

pub type ReaderResult<T> = anyhow::Result<T>;
