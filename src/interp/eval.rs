//! The evaluator: walks a sequence of values left to right, dispatching each
//! one according to its kind.
//!
//! - A literal (Int, Bool, String, List, or a quoted Symbol/Tuple) is pushed
//!   as-is — a cheap `Rc` clone, never a copy.
//! - An unquoted Tuple captures locals: it pops one value per name, in
//!   reverse, and binds them into the current frame.
//! - An unquoted Symbol either reads a local (`$x` form) or is looked up in
//!   the procedure table and dispatched — to a native function directly, or
//!   to a user-defined body in a freshly pushed call frame.

use crate::interp::context::Context;
use crate::interp::error::{RuntimeError, RuntimeResult};
use crate::interp::value::{Data, Value};

pub fn eval(ctx: &mut Context, program: &[Value]) -> RuntimeResult<()> {
    for item in program {
        step(ctx, item)?;
    }
    Ok(())
}

fn step(ctx: &mut Context, item: &Value) -> RuntimeResult<()> {
    ctx.frame.line = item.line();

    match item.data() {
        Data::Tuple { names, quoted } => {
            if *quoted {
                ctx.push(item.unquote());
            } else {
                capture_locals(ctx, names)?;
            }
        }
        Data::Symbol { name, quoted } => {
            if *quoted {
                ctx.push(item.unquote());
            } else if let Some(var) = name.strip_prefix('$') {
                let value = ctx.frame.get_local(var).ok_or_else(|| {
                    ctx.error_with_trace(RuntimeError::new(format!(
                        "undefined local variable '${}'",
                        var
                    )))
                })?;
                ctx.push(value);
            } else {
                dispatch(ctx, name, item.line())?;
            }
        }
        _ => ctx.push(item.clone()),
    }

    Ok(())
}

fn capture_locals(ctx: &mut Context, names: &[String]) -> RuntimeResult<()> {
    ctx.check_stack_len(names.len())
        .map_err(|_| ctx.error_with_trace(RuntimeError::new("stack underflow during capture")))?;

    for name in names.iter().rev() {
        let value = ctx.pop()?;
        ctx.frame.set_local(name, value);
    }
    Ok(())
}

fn dispatch(ctx: &mut Context, name: &str, line: usize) -> RuntimeResult<()> {
    let procedure = ctx.procedures.get(name).cloned().ok_or_else(|| {
        ctx.error_with_trace(RuntimeError::new(format!(
            "symbol '{}' not bound to a procedure",
            name
        )))
    })?;

    log::trace!("dispatching '{}' at line {}", name, line);

    if let Some(body) = procedure.body {
        let items = match body.data() {
            Data::List(items) => items.clone(),
            _ => {
                return Err(ctx.error_with_trace(RuntimeError::new(format!(
                    "procedure '{}' has a non-list body",
                    name
                ))))
            }
        };

        ctx.enter_call(name.to_owned(), line);
        let result = eval(ctx, &items);
        ctx.exit_call();
        return result;
    }

    if let Some(native) = procedure.native {
        // Natives run in the calling frame (no new call frame is pushed),
        // but several of them branch on which name they were invoked under
        // (e.g. `+` vs `-`), so the frame's name is swapped in for the
        // duration of the call and restored afterward.
        let previous_name = std::mem::replace(&mut ctx.frame.procedure_name, name.to_owned());
        let result = native(ctx);
        ctx.frame.procedure_name = previous_name;
        return result;
    }

    Err(ctx.error_with_trace(RuntimeError::new(format!(
        "symbol '{}' not bound to a procedure",
        name
    ))))
}

/// Pops the top of stack, requires it to be a list (a quotation), and
/// evaluates its contents against the given context as-is — used directly
/// by the `eval` built-in, and with a swapped frame by `up-eval`.
pub fn eval_quotation_on_top(ctx: &mut Context) -> RuntimeResult<()> {
    let quotation = ctx.pop()?;
    match quotation.data() {
        Data::List(items) => {
            let items = items.clone();
            eval(ctx, &items)
        }
        _ => Err(ctx.error_with_trace(RuntimeError::with_value(
            "expected a list to evaluate",
            &quotation,
        ))),
    }
}
