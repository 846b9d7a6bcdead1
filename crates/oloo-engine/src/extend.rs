//! Extension engine
//!
//! Applies a batch of property declarations to a prototype in two
//! passes. Pass one builds every descriptor (symbol keys first, then
//! string keys) and records a pristine copy in the prototype's model, so
//! composition can later re-enhance against a different owner. Pass two
//! validates each descriptor, enhances a working copy and installs it
//! under the primary key and every alias.
//!
//! The first fatal validation or definition failure aborts the whole
//! call. Already-installed properties stay installed; there is no
//! rollback.

use crate::descriptor::{Dsc, ExtendOpts};
use crate::enhance::enhance;
use crate::error::TypeError;
use crate::object::Obj;
use crate::property::Props;
use crate::validate::validate;
use crate::value::Key;

/// Extend a prototype with a batch of declarations.
///
/// `state`-flagged descriptors are recorded in the model only and never
/// installed on the shared prototype; instances materialize them at
/// creation time.
pub fn extend(target: &Obj, props: Props, opts: &ExtendOpts) -> Result<(), TypeError> {
    let (symbols, strings): (Vec<_>, Vec<_>) =
        props.into_iter().partition(|(key, _)| key.is_symbol());

    let mut dscs = Vec::with_capacity(symbols.len() + strings.len());
    for (key, raw) in symbols.into_iter().chain(strings) {
        let dsc = Dsc::build(key.clone(), raw, opts);
        target.model_insert(key, dsc.clone());
        dscs.push(dsc);
    }

    let batch_statics: Vec<Key> = dscs
        .iter()
        .filter(|dsc| dsc.is_static)
        .map(|dsc| dsc.key.clone())
        .collect();

    for dsc in &dscs {
        validate(target, dsc, &batch_statics)?;
        if dsc.state {
            continue;
        }
        let slot = enhance(dsc, target);
        for key in dsc.install_keys() {
            target.define(key, slot.clone())?;
        }
    }
    Ok(())
}

/// Re-apply another prototype's recorded model onto a target, used by
/// composition. Descriptors are re-enhanced from their pristine copies,
/// so upper wrappers and static cells bind to the new owner.
pub fn merge_model(target: &Obj, source: &Obj) -> Result<(), TypeError> {
    let mut entries = source.model_entries();
    entries.sort_by_key(|(key, _)| !key.is_symbol());

    let batch_statics: Vec<Key> = entries
        .iter()
        .filter(|(_, dsc)| dsc.is_static)
        .map(|(key, _)| key.clone())
        .collect();

    for (key, mut dsc) in entries {
        // Statics keep their current value when the source store was
        // mutated after declaration.
        if dsc.is_static {
            if let Some(current) = source.static_value(&key) {
                dsc.value = Some(current);
            }
        }
        target.model_insert(key, dsc.clone());
        validate(target, &dsc, &batch_statics)?;
        if dsc.state {
            continue;
        }
        let slot = enhance(&dsc, target);
        for key in dsc.install_keys() {
            target.define(key, slot.clone())?;
        }
    }
    Ok(())
}
