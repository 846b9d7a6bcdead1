//! Integration tests for the declarative model and composition
//!
//! Tests cover:
//! - The declarative `prototype(Model)` entry point
//! - Interface conformance via `implements`
//! - Trait composition with `compose` and re-enhancement
//! - Controller reattachment with `Prototype::of`
//! - No-arg reads staying pure

use oloo_engine::{
    attrs, create, method, prototype, props, warn, Ctx, Key, Model, Obj, Prototype, Value,
};

fn ipos() -> Obj {
    prototype(Model {
        name: Some("IPos".into()),
        state: props! { "x" => Value::Null, "y" => Value::Null },
        ..Model::default()
    })
    .unwrap()
}

#[test]
fn test_declarative_pos_conforms_to_ipos() {
    let mut ctx = Ctx::new();
    let iface = ipos();
    let pos = prototype(Model {
        name: Some("Pos".into()),
        properties: props! {
            "move_to" => method!(|ctx, this, args| {
                this.set(ctx, "x", args[0].clone())?;
                this.set(ctx, "y", args[1].clone())?;
                Ok(Value::Obj(this.clone()))
            }),
        },
        state: props! { "x" => 0, "y" => 0 },
        implements: vec![iface.clone()],
        ..Model::default()
    })
    .unwrap();

    assert!(pos.interfaces()[0].ptr_eq(&iface));

    let p = create(&pos);
    p.call(&mut ctx, "move_to", &[Value::Int(3), Value::Int(4)]).unwrap();
    assert_eq!(p.get(&mut ctx, "x").unwrap(), Value::Int(3));
    assert_eq!(p.get(&mut ctx, "y").unwrap(), Value::Int(4));
}

#[test]
fn test_missing_interface_key_is_fatal() {
    let iface = ipos();
    let err = prototype(Model {
        name: Some("Pos".into()),
        state: props! { "x" => 0 },
        implements: vec![iface],
        ..Model::default()
    })
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "[Pos]: Type does not conform to interface 'IPos', missing property 'y'."
    );
}

#[test]
fn test_compose_merges_trait_models() {
    let mut ctx = Ctx::new();
    let walker = prototype(Model {
        name: Some("Walker".into()),
        properties: props! {
            "walk" => method!(|_ctx, _this, _args| { Ok(Value::str("walking")) }),
        },
        state: props! { "speed" => 1 },
        ..Model::default()
    })
    .unwrap();
    let swimmer = prototype(Model {
        name: Some("Swimmer".into()),
        properties: props! {
            "swim" => method!(|_ctx, _this, _args| { Ok(Value::str("swimming")) }),
        },
        ..Model::default()
    })
    .unwrap();

    let duck = prototype(Model {
        name: Some("Duck".into()),
        compose: vec![walker.clone(), swimmer.clone()],
        ..Model::default()
    })
    .unwrap();

    assert_eq!(duck.components().len(), 2);
    let d = create(&duck);
    assert_eq!(d.call(&mut ctx, "walk", &[]).unwrap(), Value::str("walking"));
    assert_eq!(d.call(&mut ctx, "swim", &[]).unwrap(), Value::str("swimming"));
    // Composed state materializes on instances of the composite.
    assert_eq!(d.get(&mut ctx, "speed").unwrap(), Value::Int(1));
}

#[test]
fn test_compose_conflict_warns_and_last_wins() {
    let mut ctx = Ctx::new();
    let a = prototype(Model {
        name: Some("A".into()),
        properties: props! {
            "greet" => method!(|_ctx, _this, _args| { Ok(Value::str("a")) }),
        },
        ..Model::default()
    })
    .unwrap();
    let b = prototype(Model {
        name: Some("B".into()),
        properties: props! {
            "greet" => method!(|_ctx, _this, _args| { Ok(Value::str("b")) }),
        },
        ..Model::default()
    })
    .unwrap();

    let (merged, warnings) = warn::capture(|| {
        prototype(Model {
            name: Some("AB".into()),
            compose: vec![a.clone(), b.clone()],
            ..Model::default()
        })
        .unwrap()
    });
    assert_eq!(
        warnings,
        vec!["[AB]: Property 'greet' is being overwritten.".to_string()]
    );
    assert_eq!(merged.call(&mut ctx, "greet", &[]).unwrap(), Value::str("b"));
}

#[test]
fn test_composed_statics_get_their_own_store() {
    let mut ctx = Ctx::new();
    let counter = prototype(Model {
        name: Some("Counter".into()),
        statics: props! { "count" => 0 },
        ..Model::default()
    })
    .unwrap();

    let derived = prototype(Model {
        name: Some("Derived".into()),
        compose: vec![counter.clone()],
        ..Model::default()
    })
    .unwrap();

    derived.set(&mut ctx, "count", Value::Int(5)).unwrap();
    assert_eq!(counter.get(&mut ctx, "count").unwrap(), Value::Int(0));
    assert_eq!(derived.get(&mut ctx, "count").unwrap(), Value::Int(5));
}

#[test]
fn test_controller_reattaches_to_any_prototype() {
    let base = Prototype::named("Base").out();
    let proto = prototype(Model {
        name: Some("Thing".into()),
        links: Some(base.clone()),
        state: props! { "x" => 1 },
        ..Model::default()
    })
    .unwrap();

    let t = Prototype::of(&proto);
    assert!(t.linked().unwrap().ptr_eq(&base));
    assert_eq!(
        t.default_state().get(&Key::from("x")),
        Some(&Value::Int(1))
    );
    assert!(t.out().ptr_eq(&proto));
}

#[test]
fn test_no_arg_reads_are_pure() {
    let t = Prototype::named("Quiet")
        .statics(props! { "n" => 1 })
        .unwrap();

    // Repeated reads neither mutate nor warn.
    let ((), warnings) = warn::capture(|| {
        for _ in 0..3 {
            assert!(t.linked().is_none());
            assert!(t.statics_view().is_some());
            assert_eq!(t.default_state().len(), 0);
        }
    });
    assert!(warnings.is_empty());

    let bare = Prototype::named("Bare");
    assert!(bare.statics_view().is_none());
}

#[test]
fn test_upper_works_through_composition() {
    let mut ctx = Ctx::new();
    let base = prototype(Model {
        name: Some("Base".into()),
        properties: props! {
            "describe" => method!(|_ctx, _this, _args| { Ok(Value::str("base")) }),
        },
        ..Model::default()
    })
    .unwrap();

    let decorated = prototype(Model {
        name: Some("Decorated".into()),
        properties: props! {
            "describe" => method!(|ctx, this, args| {
                attrs!("override");
                let below = ctx.upper(this, args)?;
                let text = format!("decorated {}", below.as_str().unwrap_or(""));
                Ok(Value::str(&text))
            }),
        },
        ..Model::default()
    })
    .unwrap();

    // Compose the decorated model into a type that links the base; the
    // re-enhanced wrapper resolves upper against the new owner's chain.
    let combined = prototype(Model {
        name: Some("Combined".into()),
        links: Some(base.clone()),
        compose: vec![decorated.clone()],
        ..Model::default()
    })
    .unwrap();

    let inst = create(&combined);
    assert_eq!(
        inst.call(&mut ctx, "describe", &[]).unwrap(),
        Value::str("decorated base")
    );
}
