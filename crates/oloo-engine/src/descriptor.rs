//! Extended property descriptors
//!
//! [`Dsc`] is what a raw [`Property`] declaration becomes once its
//! annotation has been parsed and contextual forcing applied. It carries
//! the plain slot flags (enumerable/configurable/writable) plus the
//! extended attributes the extension engine acts on.

use crate::attrs::{self, Attr, AttrValue};
use crate::patterns;
use crate::property::Property;
use crate::value::{Key, Method, Value};
use crate::warn;

/// Contextual options for a whole extension batch. Batch-level forcing
/// wins over per-property annotations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtendOpts {
    /// Treat every property in the batch as static
    pub force_static: bool,
    /// Treat every property in the batch as per-instance state
    pub force_state: bool,
}

impl ExtendOpts {
    /// No forcing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Force `static` on the whole batch.
    pub fn statics() -> Self {
        Self {
            force_static: true,
            ..Self::default()
        }
    }

    /// Force `state` on the whole batch.
    pub fn state() -> Self {
        Self {
            force_state: true,
            ..Self::default()
        }
    }
}

/// The extended descriptor: value XOR accessor pair, slot flags, and the
/// attribute set driving enhancement and validation.
#[derive(Debug, Clone)]
pub struct Dsc {
    /// Primary key
    pub key: Key,
    /// Data value, absent for accessors
    pub value: Option<Value>,
    /// Getter
    pub get: Option<Method>,
    /// Setter
    pub set: Option<Method>,

    /// Shows up in enumerable key listings
    pub enumerable: bool,
    /// May be redefined
    pub configurable: bool,
    /// May be assigned
    pub writable: bool,

    /// Installed once per prototype, value shared by all instances
    pub is_static: bool,
    /// Additional keys the slot is installed under
    pub aliases: Vec<Key>,
    /// Declared intent to shadow an inherited property
    pub is_override: bool,
    /// Constant: assignment is refused
    pub is_const: bool,
    /// Read-only: assignment is refused
    pub readonly: bool,
    /// Freeze the property's object value on installation
    pub frozen: bool,
    /// Seal the property's object value on installation
    pub sealed: bool,
    /// Allow extension of the property's object value (default true)
    pub extensible: bool,
    /// Non-removable: the slot may not be redefined
    pub attached: bool,
    /// Shorthand for readonly + attached
    pub solid: bool,
    /// Run the source validators for this slot (default true)
    pub validate: bool,
    /// Per-instance data: recorded in the model, never installed on the
    /// shared prototype
    pub state: bool,
    /// Unrecognized attributes, passed through untouched
    pub extras: Vec<Attr>,
}

impl Dsc {
    /// Build a descriptor from a raw declaration.
    ///
    /// Annotation text is taken from the first slot source carrying an
    /// inline marker (value, then getter, then setter), falling back to
    /// the declaration's side-channel tag. `$`-prefixed string keys and
    /// batch-level forcing are applied after the annotation, and the
    /// composite attributes are resolved last.
    pub fn build(key: Key, raw: Property, opts: &ExtendOpts) -> Dsc {
        let annotation = find_annotation(&raw);

        let is_method = matches!(&raw.value, Some(v) if v.is_callable());
        let is_accessor = raw.is_accessor();

        let mut dsc = Dsc {
            key,
            value: raw.value,
            get: raw.get,
            set: raw.set,
            enumerable: !is_method && !is_accessor,
            configurable: true,
            writable: true,
            is_static: false,
            aliases: Vec::new(),
            is_override: false,
            is_const: false,
            readonly: false,
            frozen: false,
            sealed: false,
            extensible: true,
            attached: false,
            solid: false,
            validate: true,
            state: false,
            extras: Vec::new(),
        };

        let mut explicit_enumerable = false;
        if let Some(text) = annotation {
            for attr in attrs::parse(&text) {
                if attr.name == "enumerable" {
                    explicit_enumerable = true;
                }
                dsc.assign_attr(attr);
            }
        }

        // Convention: $-prefixed string keys are static.
        if dsc.key.is_static_convention() {
            dsc.is_static = true;
        }

        // Batch-level forcing wins over per-property annotations.
        if opts.force_static {
            dsc.is_static = true;
            dsc.state = false;
        }
        if opts.force_state {
            dsc.state = true;
            dsc.is_static = false;
        }

        // Statics default to enumerable, but an explicit attribute wins.
        if dsc.is_static {
            if !explicit_enumerable {
                dsc.enumerable = true;
            }
            dsc.state = false;
        }

        // Composite attributes, fixed order.
        if dsc.solid || dsc.readonly || dsc.is_const {
            dsc.writable = false;
        }
        if dsc.solid || dsc.attached {
            dsc.configurable = false;
        }

        // Plain non-static data defaults to per-instance state.
        if dsc.is_property() && !dsc.is_static {
            dsc.state = true;
        }

        dsc
    }

    fn assign_attr(&mut self, attr: Attr) {
        if !attrs::is_recognized(&attr.name) {
            warn::emit(format!(
                "'{}' is an unknown attribute and will not be processed.",
                attr.name
            ));
            self.extras.push(attr);
            return;
        }
        let flag = attr.value.as_flag();
        match attr.name.as_str() {
            "static" => self.is_static = flag,
            "alias" => {
                if let AttrValue::List(names) = &attr.value {
                    self.aliases = names.iter().map(|n| Key::from(n.as_str())).collect();
                }
            }
            "override" => self.is_override = flag,
            "enumerable" => self.enumerable = flag,
            "configurable" => self.configurable = flag,
            "writable" => self.writable = flag,
            "const" => self.is_const = flag,
            "readonly" => self.readonly = flag,
            "frozen" => self.frozen = flag,
            "sealed" => self.sealed = flag,
            "extensible" => self.extensible = flag,
            "attached" => self.attached = flag,
            "solid" => self.solid = flag,
            "validate" => self.validate = flag,
            "state" => self.state = flag,
            _ => unreachable!("recognized attribute without a field"),
        }
    }

    /// Callable data property.
    pub fn is_method(&self) -> bool {
        matches!(&self.value, Some(v) if v.is_callable())
    }

    /// Accessor (getter and/or setter).
    pub fn is_accessor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    /// Plain (non-callable) data property.
    pub fn is_property(&self) -> bool {
        !self.is_accessor() && !self.is_method()
    }

    /// The primary key plus every alias, in installation order.
    pub fn install_keys(&self) -> Vec<Key> {
        let mut keys = vec![self.key.clone()];
        keys.extend(self.aliases.iter().cloned());
        keys
    }
}

/// Locate the annotation text for a declaration: inline markers in slot
/// sources first (value, getter, setter), then the side-channel tag.
fn find_annotation(raw: &Property) -> Option<String> {
    if let Some(Value::Fn(m)) = &raw.value {
        if let Some(found) = patterns::annotation(m.src()) {
            return Some(found);
        }
    }
    if let Some(m) = &raw.get {
        if let Some(found) = patterns::annotation(m.src()) {
            return Some(found);
        }
    }
    if let Some(m) = &raw.set {
        if let Some(found) = patterns::annotation(m.src()) {
            return Some(found);
        }
    }
    raw.attrs.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{attrs, method};

    #[test]
    fn test_plain_data_defaults_to_state() {
        let dsc = Dsc::build(Key::from("x"), Property::value(1), &ExtendOpts::none());
        assert!(dsc.state);
        assert!(!dsc.is_static);
        assert!(dsc.enumerable && dsc.configurable && dsc.writable);
        assert!(dsc.validate);
    }

    #[test]
    fn test_method_is_not_state_and_not_enumerable() {
        let m = method!(|_ctx, _this, _args| { Ok(Value::Null) });
        let dsc = Dsc::build(Key::from("run"), Property::method(m), &ExtendOpts::none());
        assert!(dsc.is_method());
        assert!(!dsc.state);
        assert!(!dsc.enumerable);
    }

    #[test]
    fn test_dollar_prefix_forces_static() {
        let dsc = Dsc::build(Key::from("$count"), Property::value(0), &ExtendOpts::none());
        assert!(dsc.is_static);
        assert!(!dsc.state);
        assert!(dsc.enumerable);
    }

    #[test]
    fn test_side_channel_attrs() {
        let dsc = Dsc::build(
            Key::from("pi"),
            Property::value(3).attrs("static readonly alias=PI|π"),
            &ExtendOpts::none(),
        );
        assert!(dsc.is_static);
        assert!(dsc.readonly);
        assert!(!dsc.writable);
        assert_eq!(dsc.aliases.len(), 2);
        assert_eq!(dsc.install_keys().len(), 3);
    }

    #[test]
    fn test_inline_marker_wins_over_side_channel() {
        let m = method!(|_ctx, _this, _args| {
            attrs!("alias=ctor");
            Ok(Value::Null)
        });
        let dsc = Dsc::build(
            Key::from("constructor"),
            Property::method(m).attrs("static"),
            &ExtendOpts::none(),
        );
        assert_eq!(dsc.aliases, vec![Key::from("ctor")]);
        assert!(!dsc.is_static);
    }

    #[test]
    fn test_explicit_enumerable_wins_over_static_default() {
        let dsc = Dsc::build(
            Key::from("x"),
            Property::value(1).attrs("static !enumerable"),
            &ExtendOpts::none(),
        );
        assert!(dsc.is_static);
        assert!(!dsc.enumerable);

        let dsc = Dsc::build(
            Key::from("y"),
            Property::value(1).attrs("static"),
            &ExtendOpts::none(),
        );
        assert!(dsc.enumerable);
    }

    #[test]
    fn test_composite_rules() {
        let dsc = Dsc::build(
            Key::from("x"),
            Property::value(1).attrs("solid"),
            &ExtendOpts::none(),
        );
        assert!(!dsc.writable);
        assert!(!dsc.configurable);

        let dsc = Dsc::build(
            Key::from("y"),
            Property::value(1).attrs("attached"),
            &ExtendOpts::none(),
        );
        assert!(dsc.writable);
        assert!(!dsc.configurable);
    }

    #[test]
    fn test_unknown_attr_warns_and_passes_through() {
        let (dsc, warnings) = warn::capture(|| {
            Dsc::build(
                Key::from("x"),
                Property::value(1).attrs("sparkly"),
                &ExtendOpts::none(),
            )
        });
        assert_eq!(dsc.extras.len(), 1);
        assert_eq!(dsc.extras[0].name, "sparkly");
        assert_eq!(
            warnings,
            vec!["'sparkly' is an unknown attribute and will not be processed.".to_string()]
        );
    }

    #[test]
    fn test_batch_forcing_wins() {
        let dsc = Dsc::build(
            Key::from("x"),
            Property::value(1).attrs("state"),
            &ExtendOpts::statics(),
        );
        assert!(dsc.is_static);
        assert!(!dsc.state);

        let dsc = Dsc::build(
            Key::from("y"),
            Property::value(1).attrs("static"),
            &ExtendOpts::state(),
        );
        assert!(dsc.state);
        assert!(!dsc.is_static);
    }
}
