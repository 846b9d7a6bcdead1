//! Dynamic values, property keys and methods
//!
//! The engine manipulates a small dynamic value universe: scalars,
//! strings, lists, prototype objects and callable methods. Methods carry
//! the `stringify!`-captured source of their body, which powers the
//! annotation marker, upper detection and the source-text validators.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::ctx::Ctx;
use crate::error::TypeError;
use crate::object::Obj;

/// Global counter for generating unique symbol ids
static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

/// A unique, description-carrying property key.
///
/// Symbols compare and hash by identity; the description is diagnostic
/// only, so two symbols created with the same description are distinct.
#[derive(Clone, Debug)]
pub struct Symbol {
    id: u64,
    desc: Rc<str>,
}

impl Symbol {
    /// Create a fresh symbol with a diagnostic description.
    pub fn new(desc: &str) -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            desc: Rc::from(desc),
        }
    }

    /// The symbol's diagnostic description.
    pub fn description(&self) -> &str {
        &self.desc
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Symbol {}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@@{}", self.desc)
    }
}

/// A property key: a plain string or a symbol.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// String key
    Str(Rc<str>),
    /// Symbol key
    Sym(Symbol),
}

impl Key {
    /// Whether this is a symbol key.
    pub fn is_symbol(&self) -> bool {
        matches!(self, Key::Sym(_))
    }

    /// Whether the key follows the `$`-prefix static naming convention.
    pub fn is_static_convention(&self) -> bool {
        matches!(self, Key::Str(s) if s.starts_with('$'))
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(Rc::from(s))
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(Rc::from(s.as_str()))
    }
}

impl From<Symbol> for Key {
    fn from(sym: Symbol) -> Self {
        Key::Sym(sym)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => write!(f, "{s}"),
            Key::Sym(sym) => write!(f, "{sym}"),
        }
    }
}

/// Signature of every engine-callable function: explicit call context,
/// receiver, positional arguments.
pub type MethodFn = dyn Fn(&mut Ctx, &Obj, &[Value]) -> Result<Value, TypeError>;

/// A callable method with optionally captured source text.
///
/// Built with the [`method!`](crate::method) macro, which records the
/// body via `stringify!` so the validators and the upper-enhancement can
/// inspect it. Methods compare by function identity.
#[derive(Clone)]
pub struct Method {
    func: Rc<MethodFn>,
    src: Option<Rc<str>>,
}

impl Method {
    /// Create a method without source text. Such a method is invisible
    /// to the source-text heuristics.
    pub fn new(func: Rc<MethodFn>) -> Self {
        Self { func, src: None }
    }

    /// Create a method with captured source text.
    pub fn with_src(func: Rc<MethodFn>, src: &str) -> Self {
        Self {
            func,
            src: Some(Rc::from(src)),
        }
    }

    pub(crate) fn from_parts(func: Rc<MethodFn>, src: Option<Rc<str>>) -> Self {
        Self { func, src }
    }

    /// The captured source text, or `""` when none was recorded.
    pub fn src(&self) -> &str {
        self.src.as_deref().unwrap_or("")
    }

    pub(crate) fn src_rc(&self) -> Option<Rc<str>> {
        self.src.clone()
    }

    /// Invoke the method with the given context, receiver and arguments.
    pub fn invoke(&self, ctx: &mut Ctx, this: &Obj, args: &[Value]) -> Result<Value, TypeError> {
        (self.func)(ctx, this, args)
    }

    /// Function identity comparison.
    pub fn same(&self, other: &Method) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.func) as *const u8,
            Rc::as_ptr(&other.func) as *const u8,
        )
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.src {
            Some(src) => write!(f, "Method({src})"),
            None => write!(f, "Method(<opaque>)"),
        }
    }
}

/// A dynamic value.
#[derive(Clone, Debug)]
pub enum Value {
    /// Absent / no value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// Immutable string
    Str(Rc<str>),
    /// Shared mutable list
    List(Rc<RefCell<Vec<Value>>>),
    /// Prototype object handle
    Obj(Obj),
    /// Callable method
    Fn(Method),
}

impl Value {
    /// Build a string value.
    pub fn str(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    /// Build a list value from elements.
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    /// Whether the value is callable.
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Fn(_))
    }

    /// The callable method inside, if any.
    pub fn callable(&self) -> Option<&Method> {
        match self {
            Value::Fn(m) => Some(m),
            _ => None,
        }
    }

    /// Whether the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extract an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Extract the list handle.
    pub fn as_list(&self) -> Option<&Rc<RefCell<Vec<Value>>>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Extract the object handle.
    pub fn as_obj(&self) -> Option<&Obj> {
        match self {
            Value::Obj(o) => Some(o),
            _ => None,
        }
    }

    /// Truthiness for conditionals.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(_) | Value::Obj(_) | Value::Fn(_) => true,
        }
    }

    /// Type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Obj(_) => "object",
            Value::Fn(_) => "fn",
        }
    }

    /// Clone with fresh identity for containers.
    ///
    /// Lists are cloned element-by-element and objects clone their own
    /// data slots, so state materialization hands every instance an
    /// independently mutable copy. Scalars, strings and methods are
    /// cheap handle clones.
    pub fn deep_clone(&self) -> Value {
        match self {
            Value::List(items) => Value::List(Rc::new(RefCell::new(
                items.borrow().iter().map(Value::deep_clone).collect(),
            ))),
            Value::Obj(o) => Value::Obj(o.deep_clone()),
            other => other.clone(),
        }
    }

    /// Identity comparison for heap values; equality for scalars.
    pub fn same_identity(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Obj(a), Value::Obj(b)) => a.ptr_eq(b),
            (Value::Fn(a), Value::Fn(b)) => a.same(b),
            _ => self == other,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::Obj(a), Value::Obj(b)) => a.ptr_eq(b),
            (Value::Fn(a), Value::Fn(b)) => a.same(b),
            _ => false,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Obj(o) => write!(f, "{o:?}"),
            Value::Fn(_) => write!(f, "[fn]"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}
impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}
impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s.as_str()))
    }
}
impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}
impl From<Obj> for Value {
    fn from(o: Obj) -> Self {
        Value::Obj(o)
    }
}
impl From<Method> for Value {
    fn from(m: Method) -> Self {
        Value::Fn(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(!Value::str("").is_truthy());
        assert!(Value::str("x").is_truthy());
        assert!(Value::list(vec![]).is_truthy());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(format!("{}", Value::Null), "null");
        assert_eq!(format!("{}", Value::Int(42)), "42");
        assert_eq!(format!("{}", Value::str("hi")), "hi");
        assert_eq!(
            format!("{}", Value::list(vec![Value::Int(1), Value::Int(2)])),
            "[1, 2]"
        );
    }

    #[test]
    fn test_deep_clone_lists_get_fresh_identity() {
        let original = Value::list(vec![Value::Int(1)]);
        let copy = original.deep_clone();
        assert_eq!(original, copy);
        assert!(!original.same_identity(&copy));

        if let Value::List(items) = &copy {
            items.borrow_mut().push(Value::Int(2));
        }
        assert_ne!(original, copy);
    }

    #[test]
    fn test_symbols_are_unique() {
        let a = Symbol::new("tag");
        let b = Symbol::new("tag");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.description(), "tag");
    }

    #[test]
    fn test_key_conventions() {
        assert!(Key::from("$info").is_static_convention());
        assert!(!Key::from("info").is_static_convention());
        assert!(Key::from(Symbol::new("s")).is_symbol());
    }
}
