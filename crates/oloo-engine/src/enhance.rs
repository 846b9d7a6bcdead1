//! Property enhancement
//!
//! Turns a validated descriptor into the slot that actually gets
//! installed. Static data is moved into the owning prototype's backing
//! store and replaced by a [`SlotRepr::StaticCell`] proxy; method and
//! accessor slots whose source calls `upper` are wrapped so the next
//! implementation is re-resolved against the owner's delegate at every
//! call.

use std::rc::Rc;

use crate::ctx::{Ctx, UpperBinding};
use crate::descriptor::Dsc;
use crate::object::{Obj, Slot, SlotRepr};
use crate::patterns;
use crate::value::{Key, Method, MethodFn, Value};

/// Which function of a slot an upper wrapper dispatches through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// Callable data value
    Method,
    /// Accessor getter
    Getter,
    /// Accessor setter
    Setter,
}

/// Enhance a descriptor into an installable slot. The descriptor is the
/// working clone; the pristine model copy stays untouched so later
/// composition can re-enhance against a different owner.
pub fn enhance(dsc: &Dsc, owner: &Obj) -> Slot {
    if dsc.is_static && dsc.is_property() {
        return static_cell(dsc, owner);
    }

    let value = dsc.value.as_ref().map(|v| match v {
        Value::Fn(m) => Value::Fn(maybe_upper_wrap(m, owner, &dsc.key, SlotKind::Method)),
        other => {
            let v = other.clone();
            apply_integrity(dsc, &v);
            v
        }
    });
    let get = dsc
        .get
        .as_ref()
        .map(|m| maybe_upper_wrap(m, owner, &dsc.key, SlotKind::Getter));
    let set = dsc
        .set
        .as_ref()
        .map(|m| maybe_upper_wrap(m, owner, &dsc.key, SlotKind::Setter));

    let repr = if dsc.is_accessor() {
        SlotRepr::Accessor { get, set }
    } else {
        SlotRepr::Data(value.unwrap_or(Value::Null))
    };
    Slot {
        repr,
        enumerable: dsc.enumerable,
        configurable: dsc.configurable,
        writable: dsc.writable,
    }
}

/// Move static data into the owner's backing store and hand back the
/// proxy slot. The store entry lives under the primary key, so every
/// alias reads and writes the same cell.
fn static_cell(dsc: &Dsc, owner: &Obj) -> Slot {
    let value = dsc.value.clone().unwrap_or(Value::Null);
    apply_integrity(dsc, &value);
    owner.record_static(dsc.key.clone(), value);
    Slot {
        repr: SlotRepr::StaticCell(dsc.key.clone()),
        enumerable: dsc.enumerable,
        configurable: dsc.configurable,
        writable: dsc.writable,
    }
}

fn apply_integrity(dsc: &Dsc, value: &Value) {
    if let Value::Obj(obj) = value {
        if dsc.frozen {
            obj.freeze();
        } else if dsc.sealed {
            obj.seal();
        } else if !dsc.extensible {
            obj.prevent_extensions();
        }
    }
}

fn maybe_upper_wrap(inner: &Method, owner: &Obj, key: &Key, kind: SlotKind) -> Method {
    if patterns::calls_upper(inner.src()) {
        upper_wrap(inner.clone(), owner, key, kind)
    } else {
        inner.clone()
    }
}

/// Wrap a method so that, at every call, the next same-named, same-kind
/// implementation is looked up on the owner's *current* delegate and
/// bound as the context's upper. The previous binding is restored on
/// both success and failure.
fn upper_wrap(inner: Method, owner: &Obj, key: &Key, kind: SlotKind) -> Method {
    let weak = owner.downgrade();
    let key = key.clone();
    let src = inner.src_rc();
    let func: Rc<MethodFn> = Rc::new(move |ctx: &mut Ctx, this: &Obj, args: &[Value]| {
        let upper = weak
            .upgrade()
            .and_then(|owner| owner.delegate())
            .and_then(|proto| resolve_kind(&proto, &key, kind));
        let binding = UpperBinding {
            key: Rc::from(key.to_string().as_str()),
            method: upper,
        };
        let saved = ctx.swap_upper(Some(binding));
        let result = inner.invoke(ctx, this, args);
        ctx.swap_upper(saved);
        result
    });
    Method::from_parts(func, src)
}

/// Find the function of the given kind for a key, starting at `start`
/// and walking the delegate chain.
pub fn resolve_kind(start: &Obj, key: &Key, kind: SlotKind) -> Option<Method> {
    let (_, slot) = start.lookup(key)?;
    match (kind, slot.repr) {
        (SlotKind::Method, SlotRepr::Data(Value::Fn(m))) => Some(m),
        (SlotKind::Getter, SlotRepr::Accessor { get, .. }) => get,
        (SlotKind::Setter, SlotRepr::Accessor { set, .. }) => set,
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ExtendOpts;
    use crate::method;
    use crate::property::Property;
    use crate::warn;

    fn build(key: &str, raw: Property) -> Dsc {
        Dsc::build(Key::from(key), raw, &ExtendOpts::none())
    }

    #[test]
    fn test_static_data_becomes_cell() {
        let owner = Obj::new();
        let dsc = build("count", Property::value(7).attrs("static"));
        let slot = enhance(&dsc, &owner);
        assert!(matches!(slot.repr, SlotRepr::StaticCell(_)));
        assert_eq!(owner.static_value(&Key::from("count")), Some(Value::Int(7)));
    }

    #[test]
    fn test_readonly_static_write_warns() {
        let mut ctx = Ctx::new();
        let owner = Obj::new();
        let dsc = build("max", Property::value(10).attrs("static readonly"));
        let slot = enhance(&dsc, &owner);
        owner.define_unchecked(Key::from("max"), slot);

        let ((), warnings) = warn::capture(|| {
            owner.set(&mut ctx, "max", Value::Int(99)).unwrap();
        });
        assert_eq!(
            warnings,
            vec!["Trying to set value '99' on readonly (static) property 'max'.".to_string()]
        );
        assert_eq!(owner.get(&mut ctx, "max").unwrap(), Value::Int(10));
    }

    #[test]
    fn test_upper_resolves_at_call_time() {
        let mut ctx = Ctx::new();

        let base = Obj::new();
        let base_m = method!(|_ctx, _this, _args| { Ok(Value::Int(1)) });
        base.define_data("run", Value::Fn(base_m)).unwrap();

        let mid = Obj::derive(&base);
        let mid_m = method!(|ctx, this, args| {
            let below = ctx.upper(this, args)?.as_int().unwrap_or(0);
            Ok(Value::Int(below + 10))
        });
        let dsc = build("run", Property::method(mid_m));
        let slot = enhance(&dsc, &mid);
        mid.define_unchecked(Key::from("run"), slot);

        let inst = Obj::derive(&mid);
        assert_eq!(inst.call(&mut ctx, "run", &[]).unwrap(), Value::Int(11));

        // Re-point the owner's delegate; already-built slots follow.
        let other = Obj::new();
        let other_m = method!(|_ctx, _this, _args| { Ok(Value::Int(100)) });
        other.define_data("run", Value::Fn(other_m)).unwrap();
        mid.set_delegate(Some(&other));
        assert_eq!(inst.call(&mut ctx, "run", &[]).unwrap(), Value::Int(110));
    }

    #[test]
    fn test_frozen_attribute_freezes_object_value() {
        let owner = Obj::new();
        let nested = Obj::new();
        let dsc = build("cfg", Property::value(Value::Obj(nested.clone())).attrs("frozen"));
        let _ = enhance(&dsc, &owner);
        assert!(nested.is_frozen());
    }
}
