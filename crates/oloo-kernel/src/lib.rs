//! OLOO Kernel
//!
//! A minimal inversion-of-control container for prototypes built with
//! `oloo-engine`. Implementations are bound per owner under an
//! interface name; [`Kernel::spawn`] materializes instances of the
//! bound implementation with extra state merged over the defaults.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

use rustc_hash::FxHashMap;
use thiserror::Error;

use oloo_engine::{create, Key, Obj, Value};

/// Errors raised by the container.
#[derive(Debug, Error, Clone)]
pub enum KernelError {
    /// An implementation was bound under an empty interface name.
    #[error("Cannot bind an implementation to an empty interface name.")]
    EmptyInterface,

    /// No implementation is bound for the interface on the given owner.
    #[error("No implementation bound for interface '{name}'.")]
    NotBound {
        /// The interface name that was requested
        name: String,
    },
}

/// Inversion-of-control container. Bindings are scoped per owner
/// prototype, so two types can bind different implementations under the
/// same interface name.
#[derive(Debug, Default)]
pub struct Kernel {
    bindings: FxHashMap<(u64, String), Obj>,
}

impl Kernel {
    /// An empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an implementation prototype under an interface name, scoped
    /// to `owner`. Rebinding the same name replaces the implementation.
    pub fn bind(
        &mut self,
        owner: &Obj,
        interface: &str,
        implementation: &Obj,
    ) -> Result<(), KernelError> {
        if interface.is_empty() {
            return Err(KernelError::EmptyInterface);
        }
        self.bindings
            .insert((owner.id(), interface.to_string()), implementation.clone());
        Ok(())
    }

    /// The implementation bound for an interface on `owner`, if any.
    pub fn bound(&self, owner: &Obj, interface: &str) -> Option<Obj> {
        self.bindings
            .get(&(owner.id(), interface.to_string()))
            .cloned()
    }

    /// Materialize an instance of the implementation bound for an
    /// interface on `owner`. The instance carries the implementation's
    /// default state with `extra_state` merged over it, extra winning
    /// per key.
    pub fn spawn(
        &self,
        owner: &Obj,
        interface: &str,
        extra_state: impl IntoIterator<Item = (Key, Value)>,
    ) -> Result<Obj, KernelError> {
        let implementation = self.bound(owner, interface).ok_or_else(|| {
            KernelError::NotBound {
                name: interface.to_string(),
            }
        })?;
        let instance = create(&implementation);
        for (key, value) in extra_state {
            // Fresh instances are extensible and their state slots are
            // configurable, so this cannot fail.
            let _ = instance.define_data(key, value);
        }
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oloo_engine::{props, Ctx, Prototype};

    fn point_proto() -> Obj {
        Prototype::named("Pos")
            .state(props! { "x" => 0, "y" => 0 })
            .unwrap()
            .out()
    }

    #[test]
    fn test_bind_rejects_empty_interface() {
        let mut kernel = Kernel::new();
        let owner = Obj::new();
        let err = kernel.bind(&owner, "", &point_proto()).unwrap_err();
        assert!(matches!(err, KernelError::EmptyInterface));
    }

    #[test]
    fn test_spawn_merges_extra_state() {
        let mut ctx = Ctx::new();
        let mut kernel = Kernel::new();
        let owner = Obj::new();
        kernel.bind(&owner, "position", &point_proto()).unwrap();

        let pos = kernel
            .spawn(&owner, "position", [(Key::from("x"), Value::Int(7))])
            .unwrap();
        assert_eq!(pos.get(&mut ctx, "x").unwrap(), Value::Int(7));
        assert_eq!(pos.get(&mut ctx, "y").unwrap(), Value::Int(0));
    }

    #[test]
    fn test_bindings_are_scoped_per_owner() {
        let mut kernel = Kernel::new();
        let a = Obj::new();
        let b = Obj::new();
        kernel.bind(&a, "position", &point_proto()).unwrap();

        assert!(kernel.bound(&a, "position").is_some());
        assert!(kernel.bound(&b, "position").is_none());
        let err = kernel.spawn(&b, "position", []).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No implementation bound for interface 'position'."
        );
    }
}
