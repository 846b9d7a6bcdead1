//! Prototype objects
//!
//! [`Obj`] is a cheap handle to a heap object holding a slot table, a
//! re-pointable delegate link, the declared model, the statics backing
//! store and provenance lists. All of the original design's hidden
//! symbol channels are explicit fields here.
//!
//! Property lookup walks the delegate chain; assignment follows the
//! usual prototypal rules (setters and static cells are consulted along
//! the chain, plain data shadows onto the receiver).

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;

use crate::ctx::Ctx;
use crate::descriptor::Dsc;
use crate::error::TypeError;
use crate::value::{Key, Method, Value};
use crate::warn;

/// Global counter for generating unique object ids
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

fn generate_object_id() -> u64 {
    NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Integrity level of an object, from most to least permissive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Integrity {
    /// New properties may be added
    Extensible,
    /// No new properties
    NonExtensible,
    /// No new properties, existing ones non-configurable
    Sealed,
    /// Sealed plus all data non-writable
    Frozen,
}

/// Representation of an installed property.
#[derive(Debug, Clone)]
pub enum SlotRepr {
    /// Plain data value
    Data(Value),
    /// Accessor pair
    Accessor {
        /// Getter, invoked with the original receiver
        get: Option<Method>,
        /// Setter, invoked with the original receiver
        set: Option<Method>,
    },
    /// Thin proxy over the owning prototype's statics backing store.
    /// Carries the primary store key so aliases share one entry; the
    /// store is the single source of truth for the value.
    StaticCell(Key),
}

/// An installed property: representation plus descriptor flags.
#[derive(Debug, Clone)]
pub struct Slot {
    /// Value representation
    pub repr: SlotRepr,
    /// Shows up in enumerable key listings
    pub enumerable: bool,
    /// May be redefined
    pub configurable: bool,
    /// May be assigned (data and static cells)
    pub writable: bool,
}

impl Slot {
    /// A plain writable, configurable, enumerable data slot.
    pub fn data(value: Value) -> Self {
        Self {
            repr: SlotRepr::Data(value),
            enumerable: true,
            configurable: true,
            writable: true,
        }
    }
}

struct ObjData {
    id: u64,
    name: String,
    slots: FxHashMap<Key, Slot>,
    delegate: Option<Obj>,
    model: FxHashMap<Key, Dsc>,
    statics: FxHashMap<Key, Value>,
    components: Vec<Obj>,
    interfaces: Vec<Obj>,
    integrity: Integrity,
}

impl ObjData {
    fn empty() -> Self {
        Self {
            id: generate_object_id(),
            name: String::new(),
            slots: FxHashMap::default(),
            delegate: None,
            model: FxHashMap::default(),
            statics: FxHashMap::default(),
            components: Vec::new(),
            interfaces: Vec::new(),
            integrity: Integrity::Extensible,
        }
    }
}

/// Handle to a prototype object. Cloning the handle aliases the object.
#[derive(Clone)]
pub struct Obj {
    inner: Rc<RefCell<ObjData>>,
}

/// Non-owning handle, used by enhanced methods so that a prototype's own
/// slots never keep the prototype alive through a reference cycle.
#[derive(Clone)]
pub struct WeakObj {
    inner: Weak<RefCell<ObjData>>,
}

impl WeakObj {
    /// Recover the strong handle if the object is still alive.
    pub fn upgrade(&self) -> Option<Obj> {
        self.inner.upgrade().map(|inner| Obj { inner })
    }
}

impl Obj {
    /// Create a fresh object with no delegate.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObjData::empty())),
        }
    }

    /// Create a fresh object delegating to `proto`.
    pub fn derive(proto: &Obj) -> Self {
        let obj = Self::new();
        obj.inner.borrow_mut().delegate = Some(proto.clone());
        obj
    }

    /// Downgrade to a non-owning handle.
    pub fn downgrade(&self) -> WeakObj {
        WeakObj {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Unique object id.
    pub fn id(&self) -> u64 {
        self.inner.borrow().id
    }

    /// Diagnostic label (empty for anonymous objects).
    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    /// Set the diagnostic label.
    pub fn set_name(&self, name: &str) {
        self.inner.borrow_mut().name = name.to_string();
    }

    /// Handle identity.
    pub fn ptr_eq(&self, other: &Obj) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ------------------------------------------------------------------
    // Delegation
    // ------------------------------------------------------------------

    /// The current delegate, if any.
    pub fn delegate(&self) -> Option<Obj> {
        self.inner.borrow().delegate.clone()
    }

    /// Re-point the delegate. Supported after construction: methods
    /// resolve their upper implementation against the delegate current
    /// at call time, so already-built instances follow the swap.
    pub fn set_delegate(&self, delegate: Option<&Obj>) {
        self.inner.borrow_mut().delegate = delegate.cloned();
    }

    /// Whether `proto` appears anywhere up the delegate chain.
    pub fn delegates_from(&self, proto: &Obj) -> bool {
        let mut cur = self.delegate();
        while let Some(obj) = cur {
            if obj.ptr_eq(proto) {
                return true;
            }
            cur = obj.delegate();
        }
        false
    }

    // ------------------------------------------------------------------
    // Own slots
    // ------------------------------------------------------------------

    /// Whether the object has its own (non-inherited) property.
    pub fn has_own(&self, key: &Key) -> bool {
        self.inner.borrow().slots.contains_key(key)
    }

    /// Copy of the object's own slot for a key.
    pub fn own_slot(&self, key: &Key) -> Option<Slot> {
        self.inner.borrow().slots.get(key).cloned()
    }

    /// All own keys, symbols first.
    pub fn own_keys(&self) -> Vec<Key> {
        let data = self.inner.borrow();
        let mut keys: Vec<Key> = data.slots.keys().filter(|k| k.is_symbol()).cloned().collect();
        keys.extend(data.slots.keys().filter(|k| !k.is_symbol()).cloned());
        keys
    }

    /// Define an own property, honoring integrity and configurability.
    pub fn define(&self, key: Key, slot: Slot) -> Result<(), TypeError> {
        let mut data = self.inner.borrow_mut();
        if let Some(existing) = data.slots.get(&key) {
            if !existing.configurable {
                return Err(TypeError::NotConfigurable {
                    key: key.to_string(),
                });
            }
        } else if data.integrity != Integrity::Extensible {
            return Err(TypeError::NotExtensible {
                key: key.to_string(),
            });
        }
        data.slots.insert(key, slot);
        Ok(())
    }

    /// Define an own data property with default flags.
    pub fn define_data(&self, key: impl Into<Key>, value: Value) -> Result<(), TypeError> {
        self.define(key.into(), Slot::data(value))
    }

    pub(crate) fn define_unchecked(&self, key: Key, slot: Slot) {
        self.inner.borrow_mut().slots.insert(key, slot);
    }

    // ------------------------------------------------------------------
    // Chain access
    // ------------------------------------------------------------------

    /// Find a property along the delegate chain. Returns the owning
    /// object together with a copy of the slot.
    pub fn lookup(&self, key: &Key) -> Option<(Obj, Slot)> {
        let mut cur = self.clone();
        loop {
            let (slot, next) = {
                let data = cur.inner.borrow();
                (data.slots.get(key).cloned(), data.delegate.clone())
            };
            if let Some(slot) = slot {
                return Some((cur, slot));
            }
            cur = next?;
        }
    }

    /// Read a property, walking the delegate chain. Getters run with
    /// `self` as receiver; static cells read the owning prototype's
    /// backing store; a missing property reads as null.
    pub fn get(&self, ctx: &mut Ctx, key: impl Into<Key>) -> Result<Value, TypeError> {
        let key = key.into();
        match self.lookup(&key) {
            None => Ok(Value::Null),
            Some((owner, slot)) => match slot.repr {
                SlotRepr::Data(value) => Ok(value),
                SlotRepr::StaticCell(store_key) => {
                    Ok(owner.static_value(&store_key).unwrap_or(Value::Null))
                }
                SlotRepr::Accessor { get: Some(getter), .. } => getter.invoke(ctx, self, &[]),
                SlotRepr::Accessor { get: None, .. } => Ok(Value::Null),
            },
        }
    }

    /// Write a property. Setters and static cells are honored along the
    /// chain; writable inherited data shadows onto the receiver; writes
    /// to read-only properties warn and do nothing.
    pub fn set(&self, ctx: &mut Ctx, key: impl Into<Key>, value: Value) -> Result<(), TypeError> {
        let key = key.into();
        match self.lookup(&key) {
            Some((owner, slot)) => match slot.repr {
                SlotRepr::Accessor { set: Some(setter), .. } => {
                    setter.invoke(ctx, self, &[value])?;
                    Ok(())
                }
                SlotRepr::Accessor { set: None, .. } => {
                    warn::emit(format!("No setter for property '{key}'."));
                    Ok(())
                }
                SlotRepr::StaticCell(store_key) => {
                    if slot.writable {
                        owner.set_static(store_key, value);
                    } else {
                        warn::emit(format!(
                            "Trying to set value '{value}' on readonly (static) property '{key}'."
                        ));
                    }
                    Ok(())
                }
                SlotRepr::Data(_) => {
                    if !slot.writable {
                        warn::emit(format!(
                            "Trying to set value '{value}' on readonly property '{key}'."
                        ));
                        return Ok(());
                    }
                    if owner.ptr_eq(self) {
                        let mut updated = slot;
                        updated.repr = SlotRepr::Data(value);
                        self.define_unchecked(key, updated);
                    } else {
                        // Shadow the inherited data property.
                        self.define(key, Slot::data(value))?;
                    }
                    Ok(())
                }
            },
            None => self.define(key, Slot::data(value)),
        }
    }

    /// Invoke a property as a method with `self` as receiver.
    pub fn call(
        &self,
        ctx: &mut Ctx,
        key: impl Into<Key>,
        args: &[Value],
    ) -> Result<Value, TypeError> {
        let key = key.into();
        match self.get(ctx, key.clone())? {
            Value::Fn(method) => method.invoke(ctx, self, args),
            _ => Err(TypeError::NotCallable {
                key: key.to_string(),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Statics backing store
    // ------------------------------------------------------------------

    pub(crate) fn record_static(&self, key: Key, value: Value) {
        self.inner.borrow_mut().statics.insert(key, value);
    }

    /// Read a value from this object's statics backing store.
    pub fn static_value(&self, key: &Key) -> Option<Value> {
        self.inner.borrow().statics.get(key).cloned()
    }

    pub(crate) fn set_static(&self, key: Key, value: Value) {
        self.inner.borrow_mut().statics.insert(key, value);
    }

    /// Whether this object's statics store has an entry for `key`.
    pub fn has_static(&self, key: &Key) -> bool {
        self.inner.borrow().statics.contains_key(key)
    }

    /// Whether any statics store up the chain (including this object's)
    /// has an entry for `key`.
    pub fn chain_has_static(&self, key: &Key) -> bool {
        let mut cur = Some(self.clone());
        while let Some(obj) = cur {
            if obj.has_static(key) {
                return true;
            }
            cur = obj.delegate();
        }
        false
    }

    /// Keys present in this object's statics store.
    pub fn statics_keys(&self) -> Vec<Key> {
        self.inner.borrow().statics.keys().cloned().collect()
    }

    // ------------------------------------------------------------------
    // Model and provenance
    // ------------------------------------------------------------------

    pub(crate) fn model_insert(&self, key: Key, dsc: Dsc) -> Option<Dsc> {
        self.inner.borrow_mut().model.insert(key, dsc)
    }

    /// The declared descriptor for a key, if this object models one.
    pub fn model_get(&self, key: &Key) -> Option<Dsc> {
        self.inner.borrow().model.get(key).cloned()
    }

    /// All modeled keys.
    pub fn model_keys(&self) -> Vec<Key> {
        self.inner.borrow().model.keys().cloned().collect()
    }

    /// All modeled entries.
    pub fn model_entries(&self) -> Vec<(Key, Dsc)> {
        self.inner
            .borrow()
            .model
            .iter()
            .map(|(k, d)| (k.clone(), d.clone()))
            .collect()
    }

    pub(crate) fn push_component(&self, component: Obj) {
        self.inner.borrow_mut().components.push(component);
    }

    /// Composed source prototypes, in composition order.
    pub fn components(&self) -> Vec<Obj> {
        self.inner.borrow().components.clone()
    }

    pub(crate) fn push_interface(&self, interface: Obj) {
        self.inner.borrow_mut().interfaces.push(interface);
    }

    /// Declared interface prototypes, in declaration order.
    pub fn interfaces(&self) -> Vec<Obj> {
        self.inner.borrow().interfaces.clone()
    }

    // ------------------------------------------------------------------
    // Integrity
    // ------------------------------------------------------------------

    /// Current integrity level.
    pub fn integrity(&self) -> Integrity {
        self.inner.borrow().integrity
    }

    /// Disallow new properties.
    pub fn prevent_extensions(&self) {
        let mut data = self.inner.borrow_mut();
        if data.integrity < Integrity::NonExtensible {
            data.integrity = Integrity::NonExtensible;
        }
    }

    /// Seal: no new properties, existing ones non-configurable.
    pub fn seal(&self) {
        let mut data = self.inner.borrow_mut();
        for slot in data.slots.values_mut() {
            slot.configurable = false;
        }
        if data.integrity < Integrity::Sealed {
            data.integrity = Integrity::Sealed;
        }
    }

    /// Freeze: seal plus all data non-writable.
    pub fn freeze(&self) {
        let mut data = self.inner.borrow_mut();
        for slot in data.slots.values_mut() {
            slot.configurable = false;
            slot.writable = false;
        }
        data.integrity = Integrity::Frozen;
    }

    /// Whether new properties may be added.
    pub fn is_extensible(&self) -> bool {
        self.integrity() == Integrity::Extensible
    }

    /// Whether the object is sealed (or frozen).
    pub fn is_sealed(&self) -> bool {
        self.integrity() >= Integrity::Sealed
    }

    /// Whether the object is frozen.
    pub fn is_frozen(&self) -> bool {
        self.integrity() == Integrity::Frozen
    }

    // ------------------------------------------------------------------
    // Cloning
    // ------------------------------------------------------------------

    /// Clone with fresh identity: same delegate, own data slots cloned
    /// deeply. Used when materializing default state onto instances.
    pub fn deep_clone(&self) -> Obj {
        let copy = Obj::new();
        {
            let src = self.inner.borrow();
            let mut dst = copy.inner.borrow_mut();
            dst.name = src.name.clone();
            dst.delegate = src.delegate.clone();
            dst.integrity = src.integrity;
            for (key, slot) in &src.slots {
                let repr = match &slot.repr {
                    SlotRepr::Data(v) => SlotRepr::Data(v.deep_clone()),
                    other => other.clone(),
                };
                dst.slots.insert(
                    key.clone(),
                    Slot {
                        repr,
                        enumerable: slot.enumerable,
                        configurable: slot.configurable,
                        writable: slot.writable,
                    },
                );
            }
        }
        copy
    }
}

impl Default for Obj {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Obj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.inner.borrow();
        if data.name.is_empty() {
            write!(f, "Obj#{}", data.id)
        } else {
            write!(f, "Obj#{}({})", data.id, data.name)
        }
    }
}

impl PartialEq for Obj {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

/// Live view over a prototype's statics backing store.
///
/// Not a copy: every read and write goes straight through to the store,
/// so values mutated through instances are visible here and vice versa.
pub struct Statics {
    owner: Obj,
}

impl Statics {
    pub(crate) fn of(owner: Obj) -> Self {
        Self { owner }
    }

    /// Read a static value.
    pub fn get(&self, key: impl Into<Key>) -> Option<Value> {
        self.owner.static_value(&key.into())
    }

    /// Write a static value directly into the store.
    pub fn set(&self, key: impl Into<Key>, value: Value) {
        self.owner.set_static(key.into(), value);
    }

    /// Whether the store has an entry.
    pub fn contains(&self, key: impl Into<Key>) -> bool {
        self.owner.has_static(&key.into())
    }

    /// Number of entries in the store.
    pub fn len(&self) -> usize {
        self.owner.statics_keys().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys in the store.
    pub fn keys(&self) -> Vec<Key> {
        self.owner.statics_keys()
    }
}
