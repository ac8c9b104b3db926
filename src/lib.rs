#![allow(dead_code)]

mod error;
mod interp;
mod lex;

pub use crate::error::{ReaderError, ReaderResult};
pub use crate::interp::context::{Context, Frame, NativeFn, Procedure};
pub use crate::interp::error::{RuntimeError, RuntimeResult};
pub use crate::interp::reader::Reader;
pub use crate::interp::value::{compare, CompareResult, Data, Value};
pub use crate::interp::{builtin, printer, InterpResult, Interpreter};
