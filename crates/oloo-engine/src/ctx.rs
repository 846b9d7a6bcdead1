//! Call context
//!
//! Methods receive a [`Ctx`] as their first argument. It carries the
//! upper binding: the next implementation of the currently-executing
//! method further up the delegate chain. Enhanced methods swap their
//! own binding in before running the body and restore the previous one
//! afterwards, so nested and recursive upper calls each see the right
//! level of the chain.

use std::rc::Rc;

use crate::error::TypeError;
use crate::object::Obj;
use crate::value::{Method, Value};

/// The upper implementation visible to the currently-executing method.
#[derive(Clone)]
pub(crate) struct UpperBinding {
    /// Key of the executing method, for diagnostics
    pub key: Rc<str>,
    /// Next implementation up the chain, if one exists
    pub method: Option<Method>,
}

/// Per-call-tree context threaded through every method invocation.
#[derive(Default)]
pub struct Ctx {
    upper: Option<UpperBinding>,
}

impl Ctx {
    /// A fresh context with no upper binding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke the next implementation of the executing method up the
    /// delegate chain, with `this` as receiver.
    ///
    /// Fails with [`TypeError::NoUpper`] when no further implementation
    /// exists, or when called outside an enhanced method.
    pub fn upper(&mut self, this: &Obj, args: &[Value]) -> Result<Value, TypeError> {
        let binding = self.upper.clone().ok_or_else(|| TypeError::NoUpper {
            key: "<unbound>".to_string(),
        })?;
        match binding.method {
            Some(method) => method.invoke(self, this, args),
            None => Err(TypeError::NoUpper {
                key: binding.key.to_string(),
            }),
        }
    }

    /// Whether an upper implementation is currently reachable.
    pub fn has_upper(&self) -> bool {
        matches!(&self.upper, Some(binding) if binding.method.is_some())
    }

    /// Install a new upper binding, returning the previous one so the
    /// caller can restore it when the method body finishes.
    pub(crate) fn swap_upper(&mut self, binding: Option<UpperBinding>) -> Option<UpperBinding> {
        std::mem::replace(&mut self.upper, binding)
    }
}
