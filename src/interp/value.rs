//! The value model: a tagged sum of the six kinds of data the language
//! manipulates, held behind a cheap-to-clone, reference-counted handle.
//!
//! Sharing discipline: cloning a [`Value`] bumps a refcount, never copies the
//! underlying structure. Built-ins that need to mutate a composite value call
//! [`ensure_exclusive`] first, which deep-copies only if the handle is
//! actually shared. The graph is acyclic by construction (quotations capture
//! values, never the frame that holds them), so plain `Rc` is enough — no
//! cycle collector.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// The six kinds of data a [`Value`] can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Int(i64),
    Bool(bool),
    String(String),
    /// `quoted` symbols push themselves rather than dispatching to a
    /// procedure when evaluated.
    Symbol { name: String, quoted: bool },
    List(Vec<Value>),
    /// Symbols only; used to capture local variables ahead of a procedure
    /// body. `quoted` tuples push themselves rather than binding locals.
    Tuple { names: Vec<String>, quoted: bool },
}

#[derive(Debug)]
struct Node {
    data: Data,
    /// Source line the value's syntax started on, used in error traces.
    line: usize,
}

/// A cheap handle to a [`Data`] value. Clone is `Rc::clone` — O(1), no copy.
#[derive(Debug, Clone)]
pub struct Value(Rc<Node>);

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.0.data == other.0.data
    }
}

impl Value {
    pub fn new(data: Data, line: usize) -> Self {
        Value(Rc::new(Node { data, line }))
    }

    pub fn int(n: i64, line: usize) -> Self {
        Self::new(Data::Int(n), line)
    }

    pub fn boolean(b: bool, line: usize) -> Self {
        Self::new(Data::Bool(b), line)
    }

    pub fn string(s: impl Into<String>, line: usize) -> Self {
        Self::new(Data::String(s.into()), line)
    }

    pub fn symbol(name: impl Into<String>, quoted: bool, line: usize) -> Self {
        Self::new(
            Data::Symbol {
                name: name.into(),
                quoted,
            },
            line,
        )
    }

    pub fn list(items: Vec<Value>, line: usize) -> Self {
        Self::new(Data::List(items), line)
    }

    pub fn tuple(names: Vec<String>, quoted: bool, line: usize) -> Self {
        Self::new(Data::Tuple { names, quoted }, line)
    }

    pub fn data(&self) -> &Data {
        &self.0.data
    }

    pub fn line(&self) -> usize {
        self.0.line
    }

    pub fn type_name(&self) -> &'static str {
        match self.data() {
            Data::Int(_) => "Int",
            Data::Bool(_) => "Bool",
            Data::String(_) => "String",
            Data::Symbol { .. } => "Symbol",
            Data::List(_) => "List",
            Data::Tuple { .. } => "Tuple",
        }
    }

    /// Deep-copies this value, independent of how many references exist to
    /// the original.
    pub fn deep_copy(&self) -> Value {
        let line = self.line();
        match self.data() {
            Data::Int(n) => Value::int(*n, line),
            Data::Bool(b) => Value::boolean(*b, line),
            Data::String(s) => Value::string(s.clone(), line),
            Data::Symbol { name, quoted } => Value::symbol(name.clone(), *quoted, line),
            Data::List(items) => {
                Value::list(items.iter().map(Value::deep_copy).collect(), line)
            }
            Data::Tuple { names, quoted } => Value::tuple(names.clone(), *quoted, line),
        }
    }

    /// Deep-copies this value with its `quoted` flag cleared, if it has one.
    /// This is what evaluating a quoted symbol or tuple literal produces: a
    /// fresh, independent, no-longer-quoted value pushed onto the stack.
    pub fn unquote(&self) -> Value {
        let copy = self.deep_copy();
        match copy.data() {
            Data::Symbol { .. } | Data::Tuple { .. } => {
                let mut copy = copy;
                match data_mut(&mut copy) {
                    Data::Symbol { quoted, .. } => *quoted = false,
                    Data::Tuple { quoted, .. } => *quoted = false,
                    _ => unreachable!(),
                }
                copy
            }
            _ => copy,
        }
    }
}

/// Returns a handle to `v`'s data that is safe to mutate in place: if `v` is
/// uniquely held, `v` is returned unchanged; otherwise a deep copy is made
/// first. After this call, `Rc::get_mut` on the result's inner handle is
/// guaranteed to succeed.
pub fn ensure_exclusive(v: Value) -> Value {
    if Rc::strong_count(&v.0) == 1 {
        return v;
    }
    v.deep_copy()
}

/// Mutable access to the data behind a (just-ensured-exclusive) value.
pub fn data_mut(v: &mut Value) -> &mut Data {
    Rc::get_mut(&mut v.0)
        .map(|node| &mut node.data)
        .expect("ensure_exclusive was not called before data_mut")
}

/// The outcome of [`compare`]: either a genuine ordering within one of the
/// four comparable categories, or a mismatch between categories that aren't
/// comparable to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareResult {
    Ordering(Ordering),
    TypeMismatch,
}

fn category(v: &Value) -> Option<u8> {
    match v.data() {
        Data::Int(_) => Some(0),
        Data::Bool(_) => Some(1),
        Data::String(_) | Data::Symbol { .. } => Some(2),
        Data::List(_) | Data::Tuple { .. } => Some(3),
    }
}

/// C `strcmp` truncates at the first embedded NUL; the text kinds in this
/// language (strings and symbol names) compare the same way, so a literal
/// string with an embedded NUL only compares up to that point.
fn strcmp_bytes(s: &str) -> &[u8] {
    let bytes = s.as_bytes();
    match bytes.iter().position(|&b| b == 0) {
        Some(i) => &bytes[..i],
        None => bytes,
    }
}

fn text_of(v: &Value) -> &str {
    match v.data() {
        Data::String(s) => s,
        Data::Symbol { name, .. } => name,
        _ => unreachable!("text_of called on non-text value"),
    }
}

fn len_of(v: &Value) -> usize {
    match v.data() {
        Data::List(items) => items.len(),
        Data::Tuple { names, .. } => names.len(),
        _ => unreachable!("len_of called on non-composite value"),
    }
}

/// Implements the language's single comparison relation, used by both the
/// relational operators and `sort`.
///
/// Four mutually-incomparable categories: Int, Bool, String|Symbol (compared
/// with `strcmp` semantics), and List|Tuple (compared by length only, never
/// element-by-element — a deliberate choice, not an oversight).
pub fn compare(a: &Value, b: &Value) -> CompareResult {
    let (ca, cb) = match (category(a), category(b)) {
        (Some(ca), Some(cb)) => (ca, cb),
        _ => return CompareResult::TypeMismatch,
    };

    if ca != cb {
        return CompareResult::TypeMismatch;
    }

    let ordering = match ca {
        0 => match (a.data(), b.data()) {
            (Data::Int(x), Data::Int(y)) => x.cmp(y),
            _ => unreachable!(),
        },
        1 => match (a.data(), b.data()) {
            (Data::Bool(x), Data::Bool(y)) => x.cmp(y),
            _ => unreachable!(),
        },
        2 => strcmp_bytes(text_of(a)).cmp(strcmp_bytes(text_of(b))),
        3 => len_of(a).cmp(&len_of(b)),
        _ => unreachable!(),
    };

    CompareResult::Ordering(ordering)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::interp::printer::repr(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_shares_the_handle() {
        let v = Value::list(vec![Value::int(1, 1)], 1);
        let cloned = v.clone();
        assert_eq!(Rc::strong_count(&v.0), 2);
        drop(cloned);
        assert_eq!(Rc::strong_count(&v.0), 1);
    }

    #[test]
    fn ensure_exclusive_is_a_noop_when_unique() {
        let v = Value::int(5, 1);
        let ptr_before = Rc::as_ptr(&v.0);
        let v = ensure_exclusive(v);
        assert_eq!(Rc::as_ptr(&v.0), ptr_before);
    }

    #[test]
    fn ensure_exclusive_copies_when_shared() {
        let v = Value::list(vec![Value::int(1, 1)], 1);
        let shared = v.clone();
        let ptr_before = Rc::as_ptr(&v.0);
        let exclusive = ensure_exclusive(v);
        assert_ne!(Rc::as_ptr(&exclusive.0), ptr_before);
        drop(shared);
    }

    #[test]
    fn compare_ints() {
        let a = Value::int(1, 1);
        let b = Value::int(2, 1);
        assert_eq!(compare(&a, &b), CompareResult::Ordering(Ordering::Less));
    }

    #[test]
    fn compare_strings_stops_at_embedded_nul() {
        let a = Value::string("ab\0zzz", 1);
        let b = Value::string("ab\0yyy", 1);
        assert_eq!(compare(&a, &b), CompareResult::Ordering(Ordering::Equal));
    }

    #[test]
    fn compare_list_and_string_mismatch() {
        let list = Value::list(vec![], 1);
        let string = Value::string("", 1);
        assert_eq!(compare(&list, &string), CompareResult::TypeMismatch);
    }

    #[test]
    fn compare_list_and_tuple_by_length() {
        let list = Value::list(vec![Value::int(1, 1)], 1);
        let tuple = Value::tuple(vec![], false, 1);
        assert_eq!(compare(&list, &tuple), CompareResult::Ordering(Ordering::Greater));
    }

    #[test]
    fn compare_lists_by_length_only() {
        let a = Value::list(vec![Value::int(1, 1), Value::int(2, 1)], 1);
        let b = Value::list(vec![Value::int(99, 1)], 1);
        assert_eq!(compare(&a, &b), CompareResult::Ordering(Ordering::Greater));
    }

    #[test]
    fn compare_int_and_bool_mismatch() {
        let a = Value::int(1, 1);
        let b = Value::boolean(true, 1);
        assert_eq!(compare(&a, &b), CompareResult::TypeMismatch);
    }
}
