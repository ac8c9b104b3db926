//! The native built-in library plus the handful of bootstrap words that are
//! themselves written in the language and parsed at startup.
//!
//! Several natives (`+`/`-`/`*`/`/`, the six relational operators, and
//! `if`/`if-else`/`while`) share one implementation keyed off the calling
//! frame's procedure name, mirroring how a single C function backed several
//! entries in the original procedure table.

use std::cmp::Ordering;

use crate::interp::context::{Context, Procedure};
use crate::interp::error::{RuntimeError, RuntimeResult};
use crate::interp::eval;
use crate::interp::printer;
use crate::interp::reader::Reader;
use crate::interp::value::{self, CompareResult, Data, Value};

const STACK_SHOW_MAX: usize = 16;

pub fn install(ctx: &mut Context) {
    let natives: &[(&str, crate::interp::context::NativeFn)] = &[
        ("+", arithmetic),
        ("-", arithmetic),
        ("*", arithmetic),
        ("/", arithmetic),
        ("==", compare_op),
        ("!=", compare_op),
        (">=", compare_op),
        ("<=", compare_op),
        (">", compare_op),
        ("<", compare_op),
        ("sort", sort),
        ("define", define),
        ("if", control_flow),
        ("if-else", control_flow),
        ("while", control_flow),
        ("eval", eval_builtin),
        ("up-eval", up_eval_builtin),
        ("prin", prin),
        ("print", print),
        ("#", length),
        ("<-", list_append),
        ("@", at),
        (".", show_stack),
        ("^", concatenate),
        ("to-tuple", to_tuple),
    ];

    for &(name, f) in natives {
        ctx.procedures.insert(name.to_owned(), Procedure::native(f));
    }

    install_bootstrap(ctx, "dup", "[(x) $x $x]");
    install_bootstrap(ctx, "swap", "[(x y) $y $x]");
    install_bootstrap(ctx, "drop", "[(_)]");
    install_bootstrap(
        ctx,
        "map",
        "[(l f) $l # (s) 0 (i) [] [$i $s <] [$l $i @ $f up-eval <- $i 1 + (i)] while]",
    );
    install_bootstrap(
        ctx,
        "each",
        "[(l f) $l # (s) 0 (i) [$i $s <] [$l $i @ $f up-eval $i 1 + (i)] while]",
    );
    install_bootstrap(ctx, "head", "[0 @]");
    install_bootstrap(
        ctx,
        "tail",
        "[#t (d) [] (n) [[$d] [#f (d) drop] [$n swap <- (n)] if-else] foreach $n]",
    );
}

fn install_bootstrap(ctx: &mut Context, name: &str, source: &str) {
    let mut parsed = Reader::new(source.as_bytes())
        .read_all()
        .unwrap_or_else(|e| panic!("bootstrap word '{}' failed to parse: {}", name, e));
    assert_eq!(
        parsed.len(),
        1,
        "bootstrap word '{}' must be a single list literal",
        name
    );
    let body = parsed.remove(0);
    ctx.procedures
        .entry(name.to_owned())
        .and_modify(|p| p.body = Some(body.clone()))
        .or_insert_with(|| Procedure::with_body(body));
}

fn list_items(v: &Value, what: &str, ctx: &Context) -> RuntimeResult<Vec<Value>> {
    match v.data() {
        Data::List(items) => Ok(items.clone()),
        _ => Err(ctx.error_with_trace(RuntimeError::with_value(
            format!("{} expects a list", what),
            v,
        ))),
    }
}

fn pop_int(ctx: &mut Context) -> RuntimeResult<i64> {
    let v = ctx.pop()?;
    match v.data() {
        Data::Int(n) => Ok(*n),
        _ => Err(ctx.error_with_trace(RuntimeError::with_value("expected an integer", &v))),
    }
}

fn arithmetic(ctx: &mut Context) -> RuntimeResult<()> {
    ctx.check_stack_len(2)?;
    if !matches!(ctx.stack[ctx.stack.len() - 1].data(), Data::Int(_))
        || !matches!(ctx.stack[ctx.stack.len() - 2].data(), Data::Int(_))
    {
        return Err(ctx.error_with_trace(RuntimeError::new("arithmetic expects two integers")));
    }

    let name = ctx.frame.procedure_name.clone();
    let b = pop_int(ctx)?;
    let a = pop_int(ctx)?;
    let line = ctx.frame.line;

    if name == "/" && b == 0 {
        return Err(ctx.error_with_trace(RuntimeError::new("division by zero")));
    }

    let result = match name.as_str() {
        "+" => a.checked_add(b),
        "-" => a.checked_sub(b),
        "*" => a.checked_mul(b),
        "/" => a.checked_div(b),
        _ => unreachable!("arithmetic registered under unexpected name '{}'", name),
    }
    .ok_or_else(|| ctx.error_with_trace(RuntimeError::new("integer overflow")))?;

    ctx.push(Value::int(result, line));
    Ok(())
}

fn compare_op(ctx: &mut Context) -> RuntimeResult<()> {
    ctx.check_stack_len(2)?;
    let name = ctx.frame.procedure_name.clone();
    let b = ctx.pop()?;
    let a = ctx.pop()?;
    let line = ctx.frame.line;

    let ordering = match value::compare(&a, &b) {
        CompareResult::Ordering(o) => o,
        CompareResult::TypeMismatch => {
            ctx.push(a);
            ctx.push(b);
            return Err(ctx.error_with_trace(RuntimeError::new("type mismatch in comparison")));
        }
    };

    let result = match name.as_str() {
        "==" => ordering == Ordering::Equal,
        "!=" => ordering != Ordering::Equal,
        "<=" => ordering != Ordering::Greater,
        ">=" => ordering != Ordering::Less,
        "<" => ordering == Ordering::Less,
        ">" => ordering == Ordering::Greater,
        _ => unreachable!("compare_op registered under unexpected name '{}'", name),
    };

    ctx.push(Value::boolean(result, line));
    Ok(())
}

fn sort(ctx: &mut Context) -> RuntimeResult<()> {
    ctx.check_stack_len(1)?;
    if !matches!(ctx.stack[ctx.stack.len() - 1].data(), Data::List(_)) {
        let top = ctx.stack[ctx.stack.len() - 1].clone();
        return Err(ctx.error_with_trace(RuntimeError::with_value("sort expects a list", &top)));
    }

    let list = ctx.pop()?;
    let original = list.clone();
    let mut list = value::ensure_exclusive(list);
    let items = match value::data_mut(&mut list) {
        Data::List(items) => items,
        _ => unreachable!(),
    };

    let mut mismatch = false;
    items.sort_by(|a, b| match value::compare(a, b) {
        CompareResult::Ordering(o) => o,
        CompareResult::TypeMismatch => {
            mismatch = true;
            Ordering::Equal
        }
    });

    if mismatch {
        log::warn!("sort rejected a heterogeneous list");
        ctx.push(original);
        return Err(ctx.error_with_trace(RuntimeError::new(
            "type mismatch while sorting heterogeneous list",
        )));
    }

    ctx.push(list);
    Ok(())
}

fn define(ctx: &mut Context) -> RuntimeResult<()> {
    ctx.check_stack_len(2)?;
    let len = ctx.stack.len();

    if !matches!(ctx.stack[len - 1].data(), Data::Symbol { .. }) {
        let top = ctx.stack[len - 1].clone();
        return Err(ctx.error_with_trace(RuntimeError::with_value(
            "define expects a symbol name on top of the stack",
            &top,
        )));
    }
    if !matches!(ctx.stack[len - 2].data(), Data::List(_)) {
        let body = ctx.stack[len - 2].clone();
        return Err(ctx.error_with_trace(RuntimeError::with_value(
            "define expects a list body",
            &body,
        )));
    }

    let symbol = ctx.pop()?;
    let body = ctx.pop()?;

    let name = match symbol.data() {
        Data::Symbol { name, .. } => name.clone(),
        _ => unreachable!(),
    };

    log::debug!("defining procedure '{}'", name);

    ctx.procedures
        .entry(name)
        .and_modify(|p| p.body = Some(body.clone()))
        .or_insert_with(|| Procedure::with_body(body));

    Ok(())
}

fn pop_quotation(ctx: &mut Context, what: &str) -> RuntimeResult<Vec<Value>> {
    let v = ctx.pop()?;
    list_items(&v, what, ctx)
}

fn control_flow(ctx: &mut Context) -> RuntimeResult<()> {
    let name = ctx.frame.procedure_name.clone();
    let is_while = name == "while";
    let is_else = name == "if-else";

    let else_branch = if is_else {
        Some(pop_quotation(ctx, "if-else")?)
    } else {
        None
    };
    let if_branch = pop_quotation(ctx, &name)?;
    let condition = pop_quotation(ctx, &name)?;

    loop {
        eval::eval(ctx, &condition)?;
        let result = ctx.pop()?;
        let result = match result.data() {
            Data::Bool(b) => *b,
            _ => {
                return Err(ctx.error_with_trace(RuntimeError::with_value(
                    "condition must leave a boolean on the stack",
                    &result,
                )))
            }
        };

        if result {
            eval::eval(ctx, &if_branch)?;
            if is_while {
                continue;
            }
        } else if let Some(else_branch) = &else_branch {
            eval::eval(ctx, else_branch)?;
        }

        break;
    }

    Ok(())
}

fn eval_builtin(ctx: &mut Context) -> RuntimeResult<()> {
    eval::eval_quotation_on_top(ctx)
}

fn up_eval_builtin(ctx: &mut Context) -> RuntimeResult<()> {
    match ctx.swap_to_caller() {
        Some(child) => {
            let result = eval::eval_quotation_on_top(ctx);
            ctx.restore_from_caller(child);
            result
        }
        None => eval::eval_quotation_on_top(ctx),
    }
}

fn prin(ctx: &mut Context) -> RuntimeResult<()> {
    use std::io::Write;
    let v = ctx.pop()?;
    print!("{}", printer::repr(&v));
    std::io::stdout().flush().ok();
    Ok(())
}

fn print(ctx: &mut Context) -> RuntimeResult<()> {
    let v = ctx.pop()?;
    println!("{}", printer::repr(&v));
    Ok(())
}

fn length(ctx: &mut Context) -> RuntimeResult<()> {
    let v = ctx.pop()?;
    let line = ctx.frame.line;
    let len = match v.data() {
        Data::List(items) => items.len(),
        Data::Tuple { names, .. } => names.len(),
        Data::String(s) => s.len(),
        Data::Symbol { name, .. } => name.len(),
        _ => {
            return Err(ctx.error_with_trace(RuntimeError::with_value(
                "# expects a list, tuple, string, or symbol",
                &v,
            )))
        }
    };
    ctx.push(Value::int(len as i64, line));
    Ok(())
}

fn list_append(ctx: &mut Context) -> RuntimeResult<()> {
    ctx.check_stack_len(2)?;
    if !matches!(ctx.stack[ctx.stack.len() - 2].data(), Data::List(_)) {
        let element = ctx.pop()?;
        let list = ctx.pop()?;
        ctx.push(list);
        ctx.push(element.clone());
        return Err(ctx.error_with_trace(RuntimeError::with_value("<- expects a list", &element)));
    }

    let element = ctx.pop()?;
    let list = ctx.pop()?;
    let mut list = value::ensure_exclusive(list);
    match value::data_mut(&mut list) {
        Data::List(items) => items.push(element),
        _ => unreachable!(),
    }
    ctx.push(list);
    Ok(())
}

fn at(ctx: &mut Context) -> RuntimeResult<()> {
    ctx.check_stack_len(2)?;
    let len = ctx.stack.len();

    if !matches!(ctx.stack[len - 1].data(), Data::Int(_)) {
        let top = ctx.stack[len - 1].clone();
        return Err(ctx.error_with_trace(RuntimeError::with_value(
            "@ expects an integer index",
            &top,
        )));
    }
    if !matches!(
        ctx.stack[len - 2].data(),
        Data::String(_) | Data::List(_) | Data::Tuple { .. }
    ) {
        let target = ctx.stack[len - 2].clone();
        return Err(ctx.error_with_trace(RuntimeError::with_value(
            "@ expects a list, tuple, or string",
            &target,
        )));
    }

    let index = ctx.pop()?;
    let target = ctx.pop()?;
    let line = ctx.frame.line;

    let idx = match index.data() {
        Data::Int(n) => *n,
        _ => unreachable!(),
    };

    fn resolve(idx: i64, len: usize) -> Option<usize> {
        let real = if idx < 0 { idx + len as i64 } else { idx };
        if real < 0 || real >= len as i64 {
            None
        } else {
            Some(real as usize)
        }
    }

    let result = match target.data() {
        Data::String(s) => {
            let bytes = s.as_bytes();
            match resolve(idx, bytes.len()) {
                Some(i) => Value::string((bytes[i] as char).to_string(), line),
                None => Value::boolean(false, line),
            }
        }
        Data::List(items) => match resolve(idx, items.len()) {
            Some(i) => items[i].clone(),
            None => Value::boolean(false, line),
        },
        Data::Tuple { names, .. } => match resolve(idx, names.len()) {
            Some(i) => Value::symbol(names[i].clone(), false, line),
            None => Value::boolean(false, line),
        },
        _ => unreachable!("checked above"),
    };

    ctx.push(result);
    Ok(())
}

fn concatenate(ctx: &mut Context) -> RuntimeResult<()> {
    ctx.check_stack_len(2)?;
    let len = ctx.stack.len();
    let same_kind = matches!(
        (ctx.stack[len - 2].data(), ctx.stack[len - 1].data()),
        (Data::String(_), Data::String(_))
            | (Data::Symbol { .. }, Data::Symbol { .. })
            | (Data::List(_), Data::List(_))
            | (Data::Tuple { .. }, Data::Tuple { .. })
    );

    if !same_kind {
        return Err(ctx.error_with_trace(RuntimeError::new(
            "^ expects two objects of the same type",
        )));
    }

    let b = ctx.pop()?;
    let a = ctx.pop()?;
    let line = ctx.frame.line;

    let result = match (a.data(), b.data()) {
        (Data::String(sa), Data::String(sb)) => Value::string(format!("{}{}", sa, sb), line),
        (Data::Symbol { name: na, .. }, Data::Symbol { name: nb, .. }) => {
            Value::symbol(format!("{}{}", na, nb), false, line)
        }
        (Data::List(la), Data::List(lb)) => {
            let mut items = la.clone();
            items.extend(lb.iter().cloned());
            Value::list(items, line)
        }
        (Data::Tuple { names: na, .. }, Data::Tuple { names: nb, .. }) => {
            let mut names = na.clone();
            names.extend(nb.iter().cloned());
            Value::tuple(names, false, line)
        }
        _ => unreachable!("same_kind check already ruled out mixed variants"),
    };

    ctx.push(result);
    Ok(())
}

fn to_tuple(ctx: &mut Context) -> RuntimeResult<()> {
    ctx.check_stack_len(1)?;

    let items = match ctx.stack[ctx.stack.len() - 1].data() {
        Data::List(items) => items.clone(),
        _ => {
            let top = ctx.stack[ctx.stack.len() - 1].clone();
            return Err(ctx.error_with_trace(RuntimeError::with_value(
                "to-tuple expects a list",
                &top,
            )));
        }
    };

    let mut names = Vec::with_capacity(items.len());
    for item in &items {
        match item.data() {
            Data::Symbol { name, .. } if name.len() == 1 => names.push(name.clone()),
            _ => {
                return Err(ctx.error_with_trace(RuntimeError::with_value(
                    "to-tuple expects a list of single-character symbols",
                    item,
                )))
            }
        }
    }

    let line = ctx.frame.line;
    ctx.pop()?;
    ctx.push(Value::tuple(names, false, line));
    Ok(())
}

/// Renders the top `STACK_SHOW_MAX` stack entries, colorized, oldest first —
/// shared by the `.` built-in and the REPL's post-line display.
pub fn render_stack(stack: &[crate::interp::value::Value]) -> String {
    let start = stack.len().saturating_sub(STACK_SHOW_MAX);
    let mut out = String::new();

    for v in &stack[start..] {
        out.push_str(&printer::color(v));
        out.push(' ');
    }

    if stack.len() > STACK_SHOW_MAX {
        out.push_str(&format!(
            "[... {} more objects ...]",
            stack.len() - STACK_SHOW_MAX
        ));
    }

    out.trim_end().to_owned()
}

fn show_stack(ctx: &mut Context) -> RuntimeResult<()> {
    if !ctx.stack.is_empty() {
        println!("{}", render_stack(&ctx.stack));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::reader::Reader;

    fn run(src: &str) -> Context {
        let mut ctx = Context::new();
        install(&mut ctx);
        let program = Reader::new(src.as_bytes()).read_all().unwrap();
        eval::eval(&mut ctx, &program).unwrap();
        ctx
    }

    #[test]
    fn bootstrap_words_parse_at_install_time() {
        let mut ctx = Context::new();
        install(&mut ctx);
        for name in ["dup", "swap", "drop", "map", "each", "head", "tail"] {
            assert!(ctx.procedures.contains_key(name));
        }
    }

    #[test]
    fn dup_duplicates_top_of_stack() {
        let ctx = run("5 dup");
        assert_eq!(ctx.stack.len(), 2);
        assert!(matches!(ctx.stack[0].data(), Data::Int(5)));
        assert!(matches!(ctx.stack[1].data(), Data::Int(5)));
    }

    #[test]
    fn swap_exchanges_top_two() {
        let ctx = run("1 2 swap");
        assert!(matches!(ctx.stack[0].data(), Data::Int(2)));
        assert!(matches!(ctx.stack[1].data(), Data::Int(1)));
    }

    #[test]
    fn map_applies_quotation_to_each_element() {
        let ctx = run("[1 2 3] [dup *] map");
        assert_eq!(ctx.stack.len(), 1);
        match ctx.stack[0].data() {
            Data::List(items) => {
                let squares: Vec<i64> = items
                    .iter()
                    .map(|v| match v.data() {
                        Data::Int(n) => *n,
                        _ => panic!("expected int"),
                    })
                    .collect();
                assert_eq!(squares, vec![1, 4, 9]);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn head_is_first_element() {
        let ctx = run("[7 8 9] head");
        assert!(matches!(ctx.stack[0].data(), Data::Int(7)));
    }

    #[test]
    fn at_out_of_range_pushes_false() {
        let ctx = run("[1 2 3] 10 @");
        assert!(matches!(ctx.stack[0].data(), Data::Bool(false)));
    }

    #[test]
    fn at_negative_index_counts_from_end() {
        let ctx = run("[1 2 3] -1 @");
        assert!(matches!(ctx.stack[0].data(), Data::Int(3)));
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let mut ctx = Context::new();
        install(&mut ctx);
        let program = Reader::new(b"5 0 /").read_all().unwrap();
        let err = eval::eval(&mut ctx, &program).unwrap_err();
        assert!(err.to_string().contains("division by zero"));
    }

    #[test]
    fn concatenate_rejects_mixed_types() {
        let mut ctx = Context::new();
        install(&mut ctx);
        let program = Reader::new(br#"[1] "x" ^"#).read_all().unwrap();
        assert!(eval::eval(&mut ctx, &program).is_err());
    }

    #[test]
    fn concatenate_lists() {
        let ctx = run("[1 2] [3] ^");
        match ctx.stack[0].data() {
            Data::List(items) => assert_eq!(items.len(), 3),
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn sort_orders_integers() {
        let ctx = run("[3 1 2] sort");
        match ctx.stack[0].data() {
            Data::List(items) => {
                let values: Vec<i64> = items
                    .iter()
                    .map(|v| match v.data() {
                        Data::Int(n) => *n,
                        _ => panic!("expected int"),
                    })
                    .collect();
                assert_eq!(values, vec![1, 2, 3]);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn while_loop_counts_up() {
        let ctx = run("0 (i) [$i 3 <] [$i 1 + (i)] while $i");
        assert!(matches!(ctx.stack[0].data(), Data::Int(3)));
    }

    #[test]
    fn if_else_picks_branch() {
        let ctx = run("#t [1] [2] if-else");
        assert!(matches!(ctx.stack[0].data(), Data::Int(1)));

        let ctx = run("#f [1] [2] if-else");
        assert!(matches!(ctx.stack[0].data(), Data::Int(2)));
    }

    #[test]
    fn tail_bootstrap_parses_but_fails_at_runtime() {
        let mut ctx = Context::new();
        install(&mut ctx);
        let program = Reader::new(b"[1 2 3] tail").read_all().unwrap();
        let err = eval::eval(&mut ctx, &program).unwrap_err();
        assert!(err.to_string().contains("not bound to a procedure"));
    }

    #[test]
    fn define_adds_a_callable_procedure() {
        let ctx = run("[(x) $x $x +] 'double define 21 double");
        assert!(matches!(ctx.stack[0].data(), Data::Int(42)));
    }
}
