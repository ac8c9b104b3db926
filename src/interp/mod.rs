//! The interpreter: value model, reader, printer, evaluator, and the
//! built-in library, wired together behind a small public `Interpreter`
//! facade.

pub mod builtin;
pub mod context;
pub mod error;
pub mod eval;
pub mod printer;
pub mod reader;
pub mod value;

use context::Context;
use error::RuntimeResult;
use reader::Reader;
use value::Value;

/// A ready-to-use interpreter: a context with the built-in library already
/// installed.
pub struct Interpreter {
    pub context: Context,
}

impl Interpreter {
    pub fn new() -> Self {
        let mut context = Context::new();
        builtin::install(&mut context);
        Interpreter { context }
    }

    /// Parses and evaluates `source` against this interpreter's context,
    /// leaving whatever the program pushes on the operand stack.
    pub fn run(&mut self, source: &str) -> anyhow::Result<()> {
        let program = Reader::new(source.as_bytes()).read_all()?;
        eval::eval(&mut self.context, &program)
    }

    /// Wraps `source` in `[ ... ]`, parses it as a single list, and evaluates
    /// the list's contents directly — the form both REPL lines and whole
    /// files are run in, so a top-level `return`-like early exit can't leak
    /// partially-evaluated syntax onto the stack.
    pub fn run_wrapped(&mut self, source: &str) -> anyhow::Result<()> {
        let wrapped = format!("[{}]", source);
        let program = Reader::new(wrapped.as_bytes()).read_all()?;
        let items = match program.as_slice() {
            [single] => match single.data() {
                value::Data::List(items) => items.clone(),
                _ => unreachable!("wrapping in [ ] always produces a list"),
            },
            _ => unreachable!("wrapping in [ ] always produces exactly one value"),
        };
        eval::eval(&mut self.context, &items)
    }

    /// Parses `fragment` as a single value and pushes it onto the operand
    /// stack without evaluating it — used to seed the stack from extra file
    /// mode arguments before the program body runs.
    pub fn push_fragment(&mut self, fragment: &str) -> anyhow::Result<()> {
        let mut reader = Reader::new(fragment.as_bytes());
        let value = reader.read_object()?;
        self.context.push(value);
        Ok(())
    }

    pub fn stack(&self) -> &[Value] {
        &self.context.stack
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

pub type InterpResult<T> = RuntimeResult<T>;

#[cfg(test)]
mod tests {
    use super::*;
    use value::Data;

    #[test]
    fn runs_a_program_end_to_end() {
        let mut interp = Interpreter::new();
        interp.run("[1 2 3] [dup *] map").unwrap();
        match interp.stack()[0].data() {
            Data::List(items) => assert_eq!(items.len(), 3),
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn surfaces_runtime_errors_with_trace() {
        let mut interp = Interpreter::new();
        let err = interp.run("1 0 /").unwrap_err();
        assert!(err.to_string().contains("division by zero"));
    }
}
