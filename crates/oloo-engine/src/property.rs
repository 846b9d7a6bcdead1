//! Property declarations
//!
//! A [`Property`] is what a caller hands to the extension engine for a
//! single key: a data value or an accessor pair, optionally tagged with
//! an attribute string. Attributes can also ride inline inside a method
//! body via the [`attrs!`] marker, which survives in the captured source
//! text and is picked up during descriptor processing.

use crate::value::{Method, Value};

/// A single property declaration. Data (`value`) and accessor
/// (`get`/`set`) forms are mutually exclusive.
#[derive(Debug, Clone, Default)]
pub struct Property {
    /// Data value, absent for accessors
    pub value: Option<Value>,
    /// Getter, invoked with the original receiver
    pub get: Option<Method>,
    /// Setter, invoked with the original receiver
    pub set: Option<Method>,
    /// Attribute tag, e.g. `"static readonly alias=ctor"`
    pub attrs: Option<String>,
}

impl Property {
    /// A data property.
    pub fn value(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// A callable data property.
    pub fn method(method: Method) -> Self {
        Self::value(Value::Fn(method))
    }

    /// A getter-only accessor.
    pub fn getter(get: Method) -> Self {
        Self {
            get: Some(get),
            ..Self::default()
        }
    }

    /// A setter-only accessor.
    pub fn setter(set: Method) -> Self {
        Self {
            set: Some(set),
            ..Self::default()
        }
    }

    /// A full accessor pair.
    pub fn accessor(get: Method, set: Method) -> Self {
        Self {
            get: Some(get),
            set: Some(set),
            ..Self::default()
        }
    }

    /// Tag the declaration with an attribute string.
    pub fn attrs(mut self, attrs: &str) -> Self {
        self.attrs = Some(attrs.to_string());
        self
    }

    /// Whether the declaration is an accessor.
    pub fn is_accessor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }
}

impl From<Value> for Property {
    fn from(value: Value) -> Self {
        Property::value(value)
    }
}

impl From<Method> for Property {
    fn from(method: Method) -> Self {
        Property::method(method)
    }
}

impl From<bool> for Property {
    fn from(v: bool) -> Self {
        Property::value(v)
    }
}

impl From<i64> for Property {
    fn from(v: i64) -> Self {
        Property::value(v)
    }
}

impl From<i32> for Property {
    fn from(v: i32) -> Self {
        Property::value(v)
    }
}

impl From<f64> for Property {
    fn from(v: f64) -> Self {
        Property::value(v)
    }
}

impl From<&str> for Property {
    fn from(v: &str) -> Self {
        Property::value(v)
    }
}

impl From<String> for Property {
    fn from(v: String) -> Self {
        Property::value(v)
    }
}

/// An ordered list of property declarations, as produced by [`props!`].
pub type Props = Vec<(crate::value::Key, Property)>;

/// Build an ordered property list.
///
/// Keys convert through `Key::from` (strings or symbols), values
/// through `Property::from`, so plain data can be written directly:
///
/// ```ignore
/// let props = props! {
///     "kind" => "beginner",
///     "level" => 1,
///     "run" => method!(|ctx, this, args| { ... }),
/// };
/// ```
#[macro_export]
macro_rules! props {
    ( $( $key:expr => $prop:expr ),* $(,)? ) => {
        vec![
            $(
                (
                    $crate::value::Key::from($key),
                    $crate::property::Property::from($prop),
                )
            ),*
        ]
    };
}

/// Define a method, capturing its source text alongside the closure.
///
/// The captured text is what upper-call detection and the source
/// validators inspect, so the body must reference the context, receiver
/// and argument bindings by the names given in the parameter list.
#[macro_export]
macro_rules! method {
    ( | $ctx:ident, $this:ident, $args:ident | $body:block ) => {
        $crate::value::Method::with_src(
            ::std::rc::Rc::new(
                move |$ctx: &mut $crate::ctx::Ctx,
                      $this: &$crate::object::Obj,
                      $args: &[$crate::value::Value]|
                      -> ::std::result::Result<$crate::value::Value, $crate::error::TypeError> {
                    $body
                },
            ),
            stringify!($body),
        )
    };
}

/// Inline attribute marker for method bodies.
///
/// Expands to nothing at runtime; the marker survives in the source
/// text captured by [`method!`] and is read during descriptor
/// processing, e.g. `attrs!("static alias=ctor");`.
#[macro_export]
macro_rules! attrs {
    ( $text:literal ) => {
        ()
    };
}
