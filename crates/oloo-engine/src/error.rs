//! Error types for type construction
//!
//! Construction-fatal failures raised while extending a prototype. The
//! message wording carries the declaring type's label (or the fallback
//! `Type` when the type was never named), the slot kind and the property
//! key, so failures are attributable without a debugger.

use thiserror::Error;

/// Errors raised synchronously while building or using a type.
///
/// Every variant is fatal to the construction call that raised it; the
/// half-built prototype must be discarded. Advisory conditions are not
/// errors and go through [`crate::warn`] instead.
#[derive(Debug, Error, Clone)]
pub enum TypeError {
    /// A private (underscore-prefixed) member was accessed through a
    /// receiver other than `this`.
    #[error("[{type_name}]: Illegal use of private {noun} '{exprs}' in ({kind}) method '{key}'.")]
    IllegalPrivateUse {
        /// Label of the declaring type (fallback `Type`)
        type_name: String,
        /// `property` or `properties`, matching the number of offenses
        noun: String,
        /// The offending expressions, comma separated, in source order
        exprs: String,
        /// Slot kind being validated: `value`, `get` or `set`
        kind: &'static str,
        /// Property key under which the slot was declared
        key: String,
    },

    /// A static slot references members that are not static anywhere up
    /// the delegate chain nor in the batch currently being built.
    #[error("[{type_name}]: Illegal usage of non-static {noun} '{refs}' in static method '{key}'.")]
    IllegalStaticReference {
        /// Label of the declaring type (fallback `Type`)
        type_name: String,
        /// `method` or `methods`, matching the number of offenses
        noun: String,
        /// The offending references, comma separated, in source order
        refs: String,
        /// Property key of the static slot
        key: String,
    },

    /// A declared interface requires a property the type never modeled.
    #[error("[{type_name}]: Type does not conform to interface '{interface}', missing property '{key}'.")]
    NotImplemented {
        /// Label of the conforming type (fallback `Type`)
        type_name: String,
        /// Label of the interface prototype (fallback `Type`)
        interface: String,
        /// The missing property key
        key: String,
    },

    /// A property was invoked but does not resolve to a callable value.
    #[error("Property '{key}' is not callable.")]
    NotCallable {
        /// Property key that was invoked
        key: String,
    },

    /// `upper` was called with no overridden implementation to dispatch
    /// to, or the owning prototype is gone.
    #[error("No upper implementation found for property '{key}'.")]
    NoUpper {
        /// Property key the upper call tried to resolve
        key: String,
    },

    /// A property definition was attempted on a non-extensible object.
    #[error("Cannot define property '{key}' on a non-extensible object.")]
    NotExtensible {
        /// Property key that could not be defined
        key: String,
    },

    /// A non-configurable property was redefined.
    #[error("Cannot redefine non-configurable property '{key}'.")]
    NotConfigurable {
        /// Property key that could not be redefined
        key: String,
    },
}

/// Resolve the diagnostic label for a type name, falling back to the
/// generic `Type` when the type was never named.
pub(crate) fn label(name: &str) -> String {
    if name.is_empty() {
        "Type".to_string()
    } else {
        name.to_string()
    }
}
