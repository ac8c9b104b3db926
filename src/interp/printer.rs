//! Rendering [`Value`]s back to text: a plain machine-readable `repr` used
//! for error messages and round-tripping, and a colorized form used by
//! `print`/`prin` at the terminal. The two are independent — color is purely
//! cosmetic and never affects `repr`'s output.

use crate::interp::value::{Data, Value};

const RESET: &str = "\x1b[0m";

fn color_code(v: &Value) -> &'static str {
    match v.data() {
        Data::Int(_) => "\x1b[33m",                 // yellow
        Data::Bool(_) => "\x1b[35m",                // magenta
        Data::String(_) => "\x1b[32m",              // green
        Data::Symbol { .. } => "\x1b[36m",          // cyan
        Data::List(_) => "\x1b[1m",                 // bold
        Data::Tuple { .. } => "\x1b[1m",            // bold
    }
}

/// Plain textual representation, parseable back by the reader.
pub fn repr(v: &Value) -> String {
    let mut out = String::new();
    write_repr(v, &mut out);
    out
}

fn write_repr(v: &Value, out: &mut String) {
    match v.data() {
        Data::Int(n) => out.push_str(&n.to_string()),
        Data::Bool(b) => out.push_str(if *b { "#t" } else { "#f" }),
        Data::String(s) => {
            out.push('"');
            for c in s.chars() {
                match c {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    c => out.push(c),
                }
            }
            out.push('"');
        }
        Data::Symbol { name, quoted } => {
            if *quoted {
                out.push('\'');
            }
            out.push_str(name);
        }
        Data::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_repr(item, out);
            }
            out.push(']');
        }
        Data::Tuple { names, quoted } => {
            if *quoted {
                out.push('\'');
            }
            out.push('(');
            for (i, name) in names.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                out.push_str(name);
            }
            out.push(')');
        }
    }
}

/// The same rendering `repr` produces, wrapped in an ANSI color appropriate
/// to the value's variant. Used by `print`/`prin`, never by error messages.
pub fn color(v: &Value) -> String {
    format!("{}{}{}", color_code(v), repr(v), RESET)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reprs_int() {
        assert_eq!(repr(&Value::int(42, 1)), "42");
    }

    #[test]
    fn reprs_bool() {
        assert_eq!(repr(&Value::boolean(true, 1)), "#t");
        assert_eq!(repr(&Value::boolean(false, 1)), "#f");
    }

    #[test]
    fn reprs_string_with_escapes() {
        assert_eq!(repr(&Value::string("a\nb", 1)), "\"a\\nb\"");
    }

    #[test]
    fn reprs_quoted_symbol() {
        assert_eq!(repr(&Value::symbol("foo", true, 1)), "'foo");
    }

    #[test]
    fn reprs_nested_list() {
        let list = Value::list(
            vec![Value::int(1, 1), Value::list(vec![Value::int(2, 1)], 1)],
            1,
        );
        assert_eq!(repr(&list), "[1 [2]]");
    }

    #[test]
    fn reprs_tuple() {
        let tuple = Value::tuple(vec!["x".into(), "y".into()], false, 1);
        assert_eq!(repr(&tuple), "(x y)");
    }

    #[test]
    fn color_wraps_repr_and_resets() {
        let v = Value::int(1, 1);
        let colored = color(&v);
        assert!(colored.starts_with("\x1b["));
        assert!(colored.ends_with(RESET));
        assert!(colored.contains(&repr(&v)));
    }
}
