//! OLOO Engine
//!
//! A prototypal (objects-linking-to-other-objects) object model:
//! - Dynamic values, string/symbol keys and prototype objects with
//!   re-pointable delegate links
//! - Descriptor-attribute-driven property extension (statics, aliases,
//!   per-instance state, integrity levels)
//! - Dynamic `upper` dispatch resolved against the owner's delegate at
//!   call time, so prototypes and functions can be swapped after
//!   construction
//! - Source-text validators for private access, static purity and
//!   unflagged overrides
//! - A chainable [`Prototype`] controller and the declarative
//!   [`prototype`] entry point

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod attrs;
pub mod ctx;
pub mod descriptor;
pub mod enhance;
pub mod error;
pub mod extend;
pub mod object;
pub mod patterns;
pub mod property;
pub mod prototype;
pub mod validate;
pub mod value;
pub mod warn;

pub use ctx::Ctx;
pub use descriptor::{Dsc, ExtendOpts};
pub use error::TypeError;
pub use extend::extend;
pub use object::{Integrity, Obj, Slot, SlotRepr, Statics, WeakObj};
pub use property::{Property, Props};
pub use prototype::{create, prototype, Model, Prototype};
pub use value::{Key, Method, Symbol, Value};

/// Result of engine operations.
pub type TypeResult<T> = Result<T, TypeError>;
