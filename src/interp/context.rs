//! Evaluation context: the operand stack, the call-frame chain, and the
//! procedure table. Local variables live in a fixed 256-slot array per
//! frame, one slot per possible single-character symbol name — the idiomatic
//! stand-in for a byte-indexed C array.

use std::collections::HashMap;

use crate::interp::error::{RuntimeError, RuntimeResult};
use crate::interp::value::Value;

pub type NativeFn = fn(&mut Context) -> RuntimeResult<()>;

/// A named word. `body` holds a user-defined quotation (set by `define`);
/// `native` holds a built-in implementation. Both may be present at once —
/// `define`-ing over a built-in name sets `body` but never clears `native`,
/// so a later `define` with an empty body still leaves the native fallback
/// reachable.
#[derive(Clone)]
pub struct Procedure {
    pub native: Option<NativeFn>,
    pub body: Option<Value>,
}

impl Procedure {
    pub fn native(f: NativeFn) -> Self {
        Procedure {
            native: Some(f),
            body: None,
        }
    }

    pub fn with_body(body: Value) -> Self {
        Procedure {
            native: None,
            body: Some(body),
        }
    }
}

const LOCAL_SLOTS: usize = 256;

pub struct Frame {
    pub locals: Box<[Option<Value>; LOCAL_SLOTS]>,
    pub procedure_name: String,
    pub line: usize,
    pub previous: Option<Box<Frame>>,
}

impl Frame {
    fn new(procedure_name: impl Into<String>, line: usize) -> Self {
        Frame {
            locals: Box::new(std::array::from_fn(|_| None)),
            procedure_name: procedure_name.into(),
            line,
            previous: None,
        }
    }

    pub fn get_local(&self, name: &str) -> Option<Value> {
        let slot = name.as_bytes().first().copied()? as usize;
        self.locals[slot].clone()
    }

    pub fn set_local(&mut self, name: &str, value: Value) {
        if let Some(&b) = name.as_bytes().first() {
            self.locals[b as usize] = Some(value);
        }
    }
}

pub struct Context {
    pub stack: Vec<Value>,
    pub frame: Box<Frame>,
    pub procedures: HashMap<String, Procedure>,
}

impl Context {
    pub fn new() -> Self {
        Context {
            stack: Vec::new(),
            frame: Box::new(Frame::new("toplevel", 0)),
            procedures: HashMap::new(),
        }
    }

    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> RuntimeResult<Value> {
        self.stack
            .pop()
            .ok_or_else(|| RuntimeError::new("stack underflow").into())
    }

    /// Fails unless the stack holds at least `n` values. The error carries
    /// the same call-frame trace as every other runtime error, so a stack
    /// underflow reads no differently from a type mismatch one line later.
    pub fn check_stack_len(&self, n: usize) -> RuntimeResult<()> {
        if self.stack.len() < n {
            return Err(self.error_with_trace(RuntimeError::new(format!(
                "stack underflow: expected at least {} value(s), found {}",
                n,
                self.stack.len()
            ))));
        }
        Ok(())
    }

    pub fn enter_call(&mut self, procedure_name: impl Into<String>, line: usize) {
        let new_frame = Box::new(Frame::new(procedure_name, line));
        let caller = std::mem::replace(&mut self.frame, new_frame);
        self.frame.previous = Some(caller);
    }

    pub fn exit_call(&mut self) {
        if let Some(previous) = self.frame.previous.take() {
            self.frame = previous;
        }
    }

    /// Swaps the current frame out for its caller's, returning the child so
    /// it can be restored afterward. `up-eval` uses this so a quotation runs
    /// with visibility into the caller's locals instead of its own.
    pub fn swap_to_caller(&mut self) -> Option<Box<Frame>> {
        let parent = self.frame.previous.take()?;
        Some(std::mem::replace(&mut self.frame, parent))
    }

    pub fn restore_from_caller(&mut self, child: Box<Frame>) {
        let parent = std::mem::replace(&mut self.frame, child);
        self.frame.previous = Some(parent);
    }

    /// Attaches the current call-frame chain to a [`RuntimeError`] and
    /// converts it into the boxed error type every fallible interpreter
    /// function returns, so call sites can write `Err(ctx.error_with_trace(...))`
    /// directly.
    pub fn error_with_trace(&self, mut err: RuntimeError) -> anyhow::Error {
        let mut frame: Option<&Frame> = Some(&self.frame);
        while let Some(f) = frame {
            err = err.push_trace(f.procedure_name.clone(), f.line);
            frame = f.previous.as_deref();
        }
        err.into()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locals_are_keyed_by_first_byte() {
        let mut frame = Frame::new("p", 1);
        frame.set_local("x", Value::int(1, 1));
        assert!(matches!(
            frame.get_local("x").unwrap().data(),
            crate::interp::value::Data::Int(1)
        ));
        assert!(frame.get_local("y").is_none());
    }

    #[test]
    fn enter_and_exit_call_restores_previous_frame() {
        let mut ctx = Context::new();
        ctx.frame.set_local("x", Value::int(1, 1));
        ctx.enter_call("inner", 2);
        assert!(ctx.frame.get_local("x").is_none());
        ctx.exit_call();
        assert!(ctx.frame.get_local("x").is_some());
    }

    #[test]
    fn check_stack_len_detects_underflow() {
        let ctx = Context::new();
        assert!(ctx.check_stack_len(1).is_err());
    }

    #[test]
    fn swap_to_caller_and_restore_round_trips() {
        let mut ctx = Context::new();
        ctx.frame.set_local("x", Value::int(1, 1));
        ctx.enter_call("inner", 2);
        ctx.frame.set_local("y", Value::int(2, 1));

        let child = ctx.swap_to_caller().unwrap();
        assert!(ctx.frame.get_local("x").is_some());

        ctx.restore_from_caller(child);
        assert!(ctx.frame.get_local("y").is_some());
    }
}
