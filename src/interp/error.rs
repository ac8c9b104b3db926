use std::fmt;

use crate::interp::value::Value;

pub type RuntimeResult<T> = anyhow::Result<T>;

/// A single entry in the call trace attached to a [`RuntimeError`]: the
/// procedure that was executing and the source line of the token being
/// evaluated.
#[derive(Debug, Clone)]
pub struct TraceFrame {
    pub procedure: String,
    pub line: usize,
}

/// An evaluation-time failure. Carries enough context (the offending value's
/// rendered form, truncated, plus the frame chain active at the point of
/// failure) to render a trace walking back to the root call.
#[derive(Debug)]
pub struct RuntimeError {
    pub message: String,
    pub offending: Option<String>,
    pub trace: Vec<TraceFrame>,
}

const MAX_OFFENDING_LEN: usize = 30;

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        RuntimeError {
            message: message.into(),
            offending: None,
            trace: Vec::new(),
        }
    }

    pub fn with_value(message: impl Into<String>, offending: &Value) -> Self {
        RuntimeError {
            message: message.into(),
            offending: Some(crate::interp::printer::repr(offending)),
            trace: Vec::new(),
        }
    }

    pub fn push_trace(mut self, procedure: impl Into<String>, line: usize) -> Self {
        self.trace.push(TraceFrame {
            procedure: procedure.into(),
            line,
        });
        self
    }
}

fn truncate(s: &str) -> String {
    if s.len() <= MAX_OFFENDING_LEN {
        return s.to_owned();
    }
    let mut cut = MAX_OFFENDING_LEN;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}[...]", &s[..cut])
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(offending) = &self.offending {
            write!(f, ": '{}'", truncate(offending))?;
        }

        for (i, frame) in self.trace.iter().enumerate() {
            if i == 0 {
                write!(f, " in {}:{}", frame.procedure, frame.line)?;
            } else {
                write!(f, " called from {}:{}", frame.procedure, frame.line)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for RuntimeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_no_trace() {
        let err = RuntimeError::new("division by zero");
        assert_eq!(err.to_string(), "division by zero");
    }

    #[test]
    fn display_truncates_long_offending_values() {
        let long = "a".repeat(50);
        let err = RuntimeError::new("type mismatch").push_trace("toplevel", 1);
        let err = RuntimeError {
            offending: Some(long.clone()),
            ..err
        };
        let rendered = err.to_string();
        assert!(rendered.contains("[...]"));
        assert!(!rendered.contains(&long));
    }

    #[test]
    fn display_walks_trace_in_order() {
        let err = RuntimeError::new("oops")
            .push_trace("inner", 3)
            .push_trace("outer", 7);
        let rendered = err.to_string();
        assert_eq!(rendered, "oops in inner:3 called from outer:7");
    }
}
