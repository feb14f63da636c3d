//! Object identity: cycles, shared references, memo scope and supertype
//! class maps.

use morph_core::config::{MemoScope, MorphConfig};
use morph_core::model::{TypeDef, TypeRef, TypeRegistry, Value};
use morph_core::ClassMap;
use morph_engine::MappingEngine;

// ─── Helpers ───────────────────────────────────────────────────────────────

fn registry() -> TypeRegistry {
    TypeRegistry::new()
        .with(
            TypeDef::class("Node")
                .field("name", TypeRef::String)
                .field("next", "Node")
                .build(),
        )
        .with(
            TypeDef::class("NodeDto")
                .field("name", TypeRef::String)
                .field("next", "NodeDto")
                .build(),
        )
        .with(
            TypeDef::class("Pair")
                .field("left", "Node")
                .field("right", "Node")
                .build(),
        )
        .with(
            TypeDef::class("PairDto")
                .field("left", "NodeDto")
                .field("right", "NodeDto")
                .build(),
        )
        .with(TypeDef::abstract_class("Base").field("id", TypeRef::String).build())
        .with(
            TypeDef::class("Derived")
                .extends("Base")
                .field("extra", TypeRef::String)
                .build(),
        )
        .with(TypeDef::abstract_class("BaseDto").field("key", TypeRef::String).build())
        .with(
            TypeDef::class("DerivedDto")
                .extends("BaseDto")
                .field("extra", TypeRef::String)
                .build(),
        )
}

fn node(types: &TypeRegistry, name: &str) -> Value {
    Value::Object(types.instantiate("Node").unwrap().with("name", name))
}

fn get(value: &Value, name: &str) -> Value {
    value.as_object().and_then(|o| o.get(name)).unwrap_or_default()
}

fn set(value: &Value, name: &str, to: &Value) {
    assert!(value.as_object().unwrap().set(name, to.clone()));
}

fn engine_with_scope(types: TypeRegistry, scope: MemoScope) -> MappingEngine {
    let mut config = MorphConfig::default();
    config.engine.memo_scope = Some(scope);
    MappingEngine::builder(types).config(config).build().unwrap()
}

// ─── Cycles and shared references ──────────────────────────────────────────

#[test]
fn two_node_cycle_maps_to_a_mirrored_cycle() {
    let types = registry();
    let a = node(&types, "a");
    let b = node(&types, "b");
    set(&a, "next", &b);
    set(&b, "next", &a);
    let engine = MappingEngine::builder(types).build().unwrap();

    let dto_a = engine.map(&a, "NodeDto").unwrap();
    let dto_b = get(&dto_a, "next");
    assert_eq!(get(&dto_b, "name"), Value::from("b"));
    assert!(get(&dto_b, "next").same_ref(&dto_a));
}

#[test]
fn self_reference_points_back_at_the_destination() {
    let types = registry();
    let a = node(&types, "a");
    set(&a, "next", &a);
    let engine = MappingEngine::builder(types).build().unwrap();

    let dto = engine.map(&a, "NodeDto").unwrap();
    assert!(get(&dto, "next").same_ref(&dto));
}

#[test]
fn shared_source_maps_to_one_destination() {
    let types = registry();
    let shared = node(&types, "shared");
    let pair = Value::Object(
        types
            .instantiate("Pair")
            .unwrap()
            .with("left", shared.clone())
            .with("right", shared),
    );
    let engine = MappingEngine::builder(types).build().unwrap();

    let dto = engine.map(&pair, "PairDto").unwrap();
    assert!(get(&dto, "left").same_ref(&get(&dto, "right")));
}

#[test]
fn equal_but_distinct_sources_stay_distinct() {
    let types = registry();
    let pair = Value::Object(
        types
            .instantiate("Pair")
            .unwrap()
            .with("left", node(&types, "twin"))
            .with("right", node(&types, "twin")),
    );
    let engine = MappingEngine::builder(types).build().unwrap();

    let dto = engine.map(&pair, "PairDto").unwrap();
    assert!(!get(&dto, "left").same_ref(&get(&dto, "right")));
}

// ─── Memo scope ────────────────────────────────────────────────────────────

#[test]
fn engine_scope_reuses_destinations_across_calls() {
    let types = registry();
    let a = node(&types, "a");
    let engine = engine_with_scope(types, MemoScope::Engine);

    let first = engine.map(&a, "NodeDto").unwrap();
    let second = engine.map(&a, "NodeDto").unwrap();
    assert!(first.same_ref(&second));
    assert_eq!(engine.identity_memo_len(), 1);

    engine.reset_identity_memo();
    let third = engine.map(&a, "NodeDto").unwrap();
    assert!(!first.same_ref(&third));
}

#[test]
fn call_scope_starts_every_call_fresh() {
    let types = registry();
    let a = node(&types, "a");
    set(&a, "next", &a);
    let engine = engine_with_scope(types, MemoScope::Call);

    let first = engine.map(&a, "NodeDto").unwrap();
    let second = engine.map(&a, "NodeDto").unwrap();
    assert!(!first.same_ref(&second));
    assert!(get(&second, "next").same_ref(&second));
    assert_eq!(engine.identity_memo_len(), 0);
}

// ─── Supertype class maps ──────────────────────────────────────────────────

#[test]
fn ancestor_class_map_applies_to_subtypes() {
    let types = registry();
    let src = Value::Object(
        types
            .instantiate("Derived")
            .unwrap()
            .with("id", "d-1")
            .with("extra", "more"),
    );
    let engine = MappingEngine::builder(types)
        .class_map(
            ClassMap::builder("Base", "BaseDto")
                .map("id", "key")
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let dto = engine.map(&src, "DerivedDto").unwrap();
    assert_eq!(get(&dto, "key"), Value::from("d-1"));
    assert_eq!(get(&dto, "extra"), Value::from("more"));

    let back = engine.map(&dto, "Derived").unwrap();
    assert_eq!(get(&back, "id"), Value::from("d-1"));
}

// ─── Concurrent callers ────────────────────────────────────────────────────

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn engine_is_send_and_sync() {
    assert_send_sync::<MappingEngine>();
    assert_send_sync::<Value>();
}

#[test]
fn threads_share_one_destination_per_source() {
    let types = registry();
    let shared = node(&types, "shared");
    set(&shared, "next", &shared);
    let engine = MappingEngine::builder(types).build().unwrap();
    let first = engine.map(&shared, "NodeDto").unwrap();

    let results: Vec<Value> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| engine.map(&shared, "NodeDto").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.iter().all(|dto| dto.same_ref(&first)));
    assert_eq!(engine.identity_memo_len(), 1);
}

#[test]
fn threads_map_their_own_cycles_independently() {
    let types = registry();
    let sources: Vec<Value> = (0..8)
        .map(|i| {
            let a = node(&types, &format!("a{i}"));
            let b = node(&types, &format!("b{i}"));
            set(&a, "next", &b);
            set(&b, "next", &a);
            a
        })
        .collect();
    let engine = engine_with_scope(types, MemoScope::Call);

    std::thread::scope(|scope| {
        for (i, src) in sources.iter().enumerate() {
            let engine = &engine;
            scope.spawn(move || {
                let dto = engine.map(src, "NodeDto").unwrap();
                let next = get(&dto, "next");
                assert_eq!(get(&dto, "name"), Value::from(format!("a{i}").as_str()));
                assert_eq!(get(&next, "name"), Value::from(format!("b{i}").as_str()));
                assert!(get(&next, "next").same_ref(&dto));
            });
        }
    });
}
