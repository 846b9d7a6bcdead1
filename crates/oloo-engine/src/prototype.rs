//! Prototype controller
//!
//! [`Prototype`] is the chainable front door of the engine: it owns one
//! decorated prototype object and drives the extension engine over it.
//! All controller state lives in the prototype itself, so a controller
//! can be reattached to any produced prototype with [`Prototype::of`].
//!
//! [`prototype`] is the declarative form, processing a [`Model`] in a
//! fixed field order.

use rustc_hash::FxHashMap;

use crate::descriptor::ExtendOpts;
use crate::error::{label, TypeError};
use crate::extend::{extend, merge_model};
use crate::object::{Obj, Slot, SlotRepr, Statics};
use crate::property::Props;
use crate::value::{Key, Value};

/// Chainable controller over a single prototype object.
#[derive(Debug, Clone)]
pub struct Prototype {
    proto: Obj,
}

impl Prototype {
    /// A controller over a fresh, anonymous prototype.
    pub fn new() -> Self {
        Self { proto: Obj::new() }
    }

    /// A controller over a fresh prototype carrying a diagnostic name.
    pub fn named(name: &str) -> Self {
        let proto = Obj::new();
        proto.set_name(name);
        Self { proto }
    }

    /// Reattach a controller to an existing prototype.
    pub fn of(proto: &Obj) -> Self {
        Self {
            proto: proto.clone(),
        }
    }

    /// Delegate this prototype from another, or re-point the delegate
    /// in place when one is already set.
    pub fn links(self, proto: &Obj) -> Self {
        self.proto.set_delegate(Some(proto));
        self
    }

    /// Alias of [`Prototype::links`].
    pub fn inherits(self, proto: &Obj) -> Self {
        self.links(proto)
    }

    /// The current delegate, if any.
    pub fn linked(&self) -> Option<Obj> {
        self.proto.delegate()
    }

    /// Extend with properties, no forced context.
    pub fn properties(self, props: Props) -> Result<Self, TypeError> {
        extend(&self.proto, props, &ExtendOpts::none())?;
        Ok(self)
    }

    /// Extend with statics: every declaration is forced `static`.
    pub fn statics(self, props: Props) -> Result<Self, TypeError> {
        extend(&self.proto, props, &ExtendOpts::statics())?;
        Ok(self)
    }

    /// Live view over the statics backing store, or `None` when the
    /// type declares no statics.
    pub fn statics_view(&self) -> Option<Statics> {
        if self.proto.statics_keys().is_empty() {
            None
        } else {
            Some(Statics::of(self.proto.clone()))
        }
    }

    /// Extend with per-instance state: every declaration is forced
    /// `state`, recorded in the model and materialized at creation.
    pub fn state(self, props: Props) -> Result<Self, TypeError> {
        extend(&self.proto, props, &ExtendOpts::state())?;
        Ok(self)
    }

    /// The merged default state: this type's modeled state plus every
    /// delegate's, closer types winning per key.
    pub fn default_state(&self) -> FxHashMap<Key, Value> {
        let mut merged = FxHashMap::default();
        let mut cur = Some(self.proto.clone());
        while let Some(obj) = cur {
            for (key, dsc) in obj.model_entries() {
                if dsc.state && !merged.contains_key(&key) {
                    merged.insert(key, dsc.value.unwrap_or(Value::Null));
                }
            }
            cur = obj.delegate();
        }
        merged
    }

    /// Merge each source prototype's recorded model into this type,
    /// left to right, with ordinary overwrite-warning semantics.
    pub fn compose(self, sources: &[Obj]) -> Result<Self, TypeError> {
        for source in sources {
            merge_model(&self.proto, source)?;
            self.proto.push_component(source.clone());
        }
        Ok(self)
    }

    /// Alias of [`Prototype::compose`].
    pub fn with_(self, sources: &[Obj]) -> Result<Self, TypeError> {
        self.compose(sources)
    }

    /// Alias of [`Prototype::compose`].
    pub fn mixin(self, sources: &[Obj]) -> Result<Self, TypeError> {
        self.compose(sources)
    }

    /// Declare conformance: every key modeled by each interface must
    /// already be modeled by this type.
    pub fn implements(self, interfaces: &[Obj]) -> Result<Self, TypeError> {
        for interface in interfaces {
            for key in interface.model_keys() {
                if self.proto.model_get(&key).is_none() {
                    return Err(TypeError::NotImplemented {
                        type_name: label(&self.proto.name()),
                        interface: label(&interface.name()),
                        key: key.to_string(),
                    });
                }
            }
            self.proto.push_interface(interface.clone());
        }
        Ok(self)
    }

    /// The prototype object itself.
    pub fn out(&self) -> Obj {
        self.proto.clone()
    }

    /// Materialize an instance: a fresh object delegating from the
    /// prototype, with the merged default state defined as own data
    /// slots. Values are deep-cloned so instances never share state
    /// identity.
    pub fn create(&self) -> Obj {
        let instance = Obj::derive(&self.proto);
        for (key, value) in self.default_state() {
            instance.define_unchecked(
                key,
                Slot {
                    repr: SlotRepr::Data(value.deep_clone()),
                    enumerable: true,
                    configurable: true,
                    writable: true,
                },
            );
        }
        instance
    }
}

impl Default for Prototype {
    fn default() -> Self {
        Self::new()
    }
}

/// Materialize an instance of any produced prototype.
pub fn create(proto: &Obj) -> Obj {
    Prototype::of(proto).create()
}

/// Declarative type description, processed by [`prototype`] in a fixed
/// field order: links, compose, statics, properties, state, implements.
#[derive(Default)]
pub struct Model {
    /// Diagnostic name of the type
    pub name: Option<String>,
    /// Prototype to delegate from
    pub links: Option<Obj>,
    /// Prototypes whose models are merged in, left to right
    pub compose: Vec<Obj>,
    /// Declarations forced `static`
    pub statics: Props,
    /// Declarations with no forced context
    pub properties: Props,
    /// Declarations forced `state`
    pub state: Props,
    /// Interfaces the type must conform to
    pub implements: Vec<Obj>,
}

/// Build a prototype from a declarative model.
pub fn prototype(model: Model) -> Result<Obj, TypeError> {
    let mut controller = match model.name.as_deref() {
        Some(name) => Prototype::named(name),
        None => Prototype::new(),
    };
    if let Some(base) = &model.links {
        controller = controller.links(base);
    }
    controller = controller
        .compose(&model.compose)?
        .statics(model.statics)?
        .properties(model.properties)?
        .state(model.state)?
        .implements(&model.implements)?;
    Ok(controller.out())
}
