//! Source-text validators
//!
//! Best-effort checks over the source captured by `method!`, run before
//! a descriptor is installed. Private-access and static-reference
//! violations are fatal; override and overwrite conditions are advisory
//! warnings. All checks are skipped for descriptors carrying
//! `!validate`.

use crate::descriptor::Dsc;
use crate::error::{label, TypeError};
use crate::object::Obj;
use crate::patterns;
use crate::value::{Key, Method, Value};
use crate::warn;

/// Run every validator for a descriptor against its target prototype.
/// `batch_static_keys` are the static keys of the extension batch being
/// processed, which static slots may reference before installation.
pub fn validate(target: &Obj, dsc: &Dsc, batch_static_keys: &[Key]) -> Result<(), TypeError> {
    if !dsc.validate {
        return Ok(());
    }
    for (kind, method) in slot_functions(dsc) {
        validate_private_use(target, dsc, kind, method)?;
        validate_static_references(target, dsc, kind, method, batch_static_keys)?;
    }
    validate_overrides(target, dsc);
    validate_overwrite(target, dsc);
    Ok(())
}

/// The functions a descriptor carries, tagged with the slot kind names
/// used in diagnostics.
fn slot_functions(dsc: &Dsc) -> Vec<(&'static str, &Method)> {
    let mut out = Vec::new();
    if let Some(Value::Fn(m)) = &dsc.value {
        out.push(("value", m));
    }
    if let Some(m) = &dsc.get {
        out.push(("get", m));
    }
    if let Some(m) = &dsc.set {
        out.push(("set", m));
    }
    out
}

/// Fatal: private (underscore-prefixed) members accessed through a
/// receiver other than `this`.
fn validate_private_use(
    target: &Obj,
    dsc: &Dsc,
    kind: &'static str,
    method: &Method,
) -> Result<(), TypeError> {
    let offenders = patterns::illegal_private_refs(method.src());
    if offenders.is_empty() {
        return Ok(());
    }
    Err(TypeError::IllegalPrivateUse {
        type_name: label(&target.name()),
        noun: if offenders.len() > 1 {
            "properties".to_string()
        } else {
            "property".to_string()
        },
        exprs: offenders.join(","),
        kind,
        key: dsc.key.to_string(),
    })
}

/// Fatal: a static slot referencing `this` members that are not static
/// in the current batch nor anywhere up the delegate chain.
fn validate_static_references(
    target: &Obj,
    dsc: &Dsc,
    _kind: &'static str,
    method: &Method,
    batch_static_keys: &[Key],
) -> Result<(), TypeError> {
    if !dsc.is_static {
        return Ok(());
    }
    let mut offenders = Vec::new();
    for name in patterns::this_member_refs(method.src()) {
        let key = Key::from(name.as_str());
        let in_batch = batch_static_keys.contains(&key);
        if !in_batch && !target.chain_has_static(&key) {
            offenders.push(format!("this.{name}"));
        }
    }
    if offenders.is_empty() {
        return Ok(());
    }
    Err(TypeError::IllegalStaticReference {
        type_name: label(&target.name()),
        noun: if offenders.len() > 1 {
            "methods".to_string()
        } else {
            "method".to_string()
        },
        refs: offenders.join(","),
        key: dsc.key.to_string(),
    })
}

/// Advisory: a slot shadowing an inherited property without declaring
/// `override` and without dispatching to `upper`. Emitted per slot
/// entry; the wording differs for function and non-function entries.
fn validate_overrides(target: &Obj, dsc: &Dsc) {
    let inherited = target
        .delegate()
        .map(|proto| proto.lookup(&dsc.key).is_some())
        .unwrap_or(false);
    if !inherited || dsc.is_override {
        return;
    }

    let mut entries: Vec<(&'static str, Option<&Method>)> = Vec::new();
    match &dsc.value {
        Some(Value::Fn(m)) => entries.push(("value", Some(m))),
        Some(_) => entries.push(("value", None)),
        None => {}
    }
    if let Some(m) = &dsc.get {
        entries.push(("get", Some(m)));
    }
    if let Some(m) = &dsc.set {
        entries.push(("set", Some(m)));
    }

    for (kind, method) in entries {
        let is_fn = method.is_some();
        if let Some(m) = method {
            if patterns::calls_upper(m.src()) {
                continue;
            }
        }
        warn::emit(format!(
            "[{}]: No overriding attribute {}in overriding ({kind}) property '{}'.",
            label(&target.name()),
            if is_fn { "and not calling upper " } else { "" },
            dsc.key
        ));
    }
}

/// Advisory: the target already owns a property under the primary key
/// or any alias the slot will be installed under.
fn validate_overwrite(target: &Obj, dsc: &Dsc) {
    for key in dsc.install_keys() {
        if target.has_own(&key) {
            warn::emit(format!(
                "[{}]: Property '{key}' is being overwritten.",
                label(&target.name())
            ));
        }
    }
}
