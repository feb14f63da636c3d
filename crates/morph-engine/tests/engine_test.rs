//! End-to-end mapping through the public engine API: default and explicit
//! class maps, deep paths, policies, map ids, map-backed objects, enums,
//! dates, events, statistics and configuration.

use std::io::Write;
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;

use morph_core::classmap::FieldMap;
use morph_core::config::MorphConfig;
use morph_core::events::{MappingEvent, MappingEventHandler, MappingEventType};
use morph_core::model::{PrimitiveKind, TypeDef, TypeRef, TypeRegistry, Value};
use morph_core::{ClassMap, MappingError};
use morph_engine::MappingEngine;

// ─── Helpers ───────────────────────────────────────────────────────────────

fn registry() -> TypeRegistry {
    TypeRegistry::new()
        .with(
            TypeDef::class("Address")
                .field("street", TypeRef::String)
                .field("city", TypeRef::String)
                .build(),
        )
        .with(
            TypeDef::class("AddressDto")
                .field("street", TypeRef::String)
                .field("city", TypeRef::String)
                .build(),
        )
        .with(
            TypeDef::class("Person")
                .field("name", TypeRef::String)
                .field("age", TypeRef::Primitive(PrimitiveKind::Int))
                .field("address", "Address")
                .field("email", TypeRef::String)
                .build(),
        )
        .with(
            TypeDef::class("PersonDto")
                .field("name", TypeRef::String)
                .field("age", TypeRef::Wrapper(PrimitiveKind::Long))
                .field("address", "AddressDto")
                .field("contact", TypeRef::String)
                .field("city", TypeRef::String)
                .build(),
        )
        .with(TypeDef::enumeration("Status", ["ACTIVE", "CLOSED", "FROZEN"]).build())
        .with(TypeDef::enumeration("StatusDto", ["ACTIVE", "CLOSED"]).build())
        .with(
            TypeDef::class("Account")
                .field("status", "Status")
                .field("code", TypeRef::String)
                .build(),
        )
        .with(
            TypeDef::class("AccountDto")
                .field("status", "StatusDto")
                .field("code", "Status")
                .build(),
        )
        .with(TypeDef::class("Event").field("at", TypeRef::Date).build())
        .with(TypeDef::class("EventDto").field("at", TypeRef::String).build())
}

fn object(types: &TypeRegistry, name: &str, fields: &[(&str, Value)]) -> Value {
    let mut obj = types.instantiate(name).unwrap();
    for (field, value) in fields {
        obj = obj.with(field, value.clone());
    }
    Value::Object(obj)
}

fn field(value: &Value, name: &str) -> Value {
    value.as_object().and_then(|o| o.get(name)).unwrap_or_default()
}

fn ann(types: &TypeRegistry) -> Value {
    let address = object(
        types,
        "Address",
        &[("street", "1 Main St".into()), ("city", "Springfield".into())],
    );
    object(
        types,
        "Person",
        &[
            ("name", "Ann".into()),
            ("age", Value::Int(42)),
            ("address", address),
            ("email", "ann@example.com".into()),
        ],
    )
}

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<MappingEventType>>,
}

impl Recorder {
    fn push(&self, event: &MappingEvent<'_>) {
        self.seen.lock().push(event.event_type);
    }
}

impl MappingEventHandler for Recorder {
    fn on_mapping_started(&self, event: &MappingEvent<'_>) {
        self.push(event);
    }

    fn on_pre_write_destination_value(&self, event: &MappingEvent<'_>) {
        self.push(event);
    }

    fn on_post_write_destination_value(&self, event: &MappingEvent<'_>) {
        self.push(event);
    }

    fn on_mapping_finished(&self, event: &MappingEvent<'_>) {
        self.push(event);
    }
}

// ─── Default and explicit class maps ───────────────────────────────────────

#[test]
fn maps_same_named_properties_without_configuration() {
    let types = registry();
    let src = ann(&types);
    let engine = MappingEngine::builder(types).build().unwrap();

    let dto = engine.map(&src, "PersonDto").unwrap();
    assert_eq!(dto.runtime_type(), TypeRef::named("PersonDto"));
    assert_eq!(field(&dto, "name"), Value::from("Ann"));
    assert_eq!(field(&dto, "age"), Value::Long(42));
    assert_eq!(field(&field(&dto, "address"), "city"), Value::from("Springfield"));
    assert_eq!(
        field(&dto, "address").runtime_type(),
        TypeRef::named("AddressDto")
    );
    assert!(field(&dto, "contact").is_null());
    assert_eq!(engine.class_maps().synthesized_count(), 2);
}

#[test]
fn explicit_renames_and_deep_paths_work_both_ways() {
    let types = registry();
    let src = ann(&types);
    let class_map = ClassMap::builder("Person", "PersonDto")
        .wildcard(false)
        .map("email", "contact")
        .map("address.city", "city")
        .map("name", "address.street")
        .build()
        .unwrap();
    let engine = MappingEngine::builder(types)
        .class_map(class_map)
        .build()
        .unwrap();

    let dto = engine.map(&src, "PersonDto").unwrap();
    assert_eq!(field(&dto, "contact"), Value::from("ann@example.com"));
    assert_eq!(field(&dto, "city"), Value::from("Springfield"));
    assert_eq!(field(&field(&dto, "address"), "street"), Value::from("Ann"));
    assert!(field(&dto, "name").is_null());

    let back = engine.map(&dto, "Person").unwrap();
    assert_eq!(field(&back, "email"), Value::from("ann@example.com"));
    assert_eq!(field(&back, "name"), Value::from("Ann"));
    assert_eq!(field(&field(&back, "address"), "city"), Value::from("Springfield"));
}

#[test]
fn map_onto_keeps_the_destination_instance() {
    let types = registry();
    let src = ann(&types);
    let dest = object(&types, "PersonDto", &[("contact", "keep".into())]);
    let engine = MappingEngine::builder(types).build().unwrap();

    engine.map_onto(&src, &dest).unwrap();
    assert_eq!(field(&dest, "name"), Value::from("Ann"));
    assert_eq!(field(&dest, "contact"), Value::from("keep"));
}

#[test]
fn copy_by_reference_shares_the_source_value() {
    let types = registry();
    let src = ann(&types);
    let engine = MappingEngine::builder(types)
        .class_map(
            ClassMap::builder("Person", "Person")
                .field(FieldMap::builder("address", "address").copy_by_reference(true))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let copy = engine.map(&src, "Person").unwrap();
    assert!(!copy.same_ref(&src));
    assert!(field(&copy, "address").same_ref(&field(&src, "address")));
    assert_eq!(field(&copy, "name"), Value::from("Ann"));
}

#[test]
fn null_sources_are_rejected() {
    let types = registry();
    let dest = object(&types, "PersonDto", &[]);
    let src = ann(&types);
    let engine = MappingEngine::builder(types).build().unwrap();

    let err = engine.map(&Value::Null, "PersonDto").unwrap_err();
    assert!(matches!(err, MappingError::InvalidRequest { .. }));
    let err = engine.map_onto(&Value::Null, &dest).unwrap_err();
    assert!(matches!(err, MappingError::InvalidRequest { .. }));
    let err = engine.map_onto(&src, &Value::Null).unwrap_err();
    assert!(matches!(err, MappingError::InvalidRequest { .. }));
}

// ─── Null, empty-string and trim policies ──────────────────────────────────

#[test]
fn null_source_overwrites_by_default() {
    let types = registry();
    let src = object(&types, "Person", &[("age", Value::Int(1))]);
    let dest = object(&types, "PersonDto", &[("name", "old".into())]);
    let engine = MappingEngine::builder(types).build().unwrap();

    engine.map_onto(&src, &dest).unwrap();
    assert!(field(&dest, "name").is_null());
}

#[test]
fn map_null_off_keeps_existing_values() {
    let types = registry();
    let src = object(&types, "Person", &[("age", Value::Int(1))]);
    let dest = object(&types, "PersonDto", &[("name", "old".into())]);
    let engine = MappingEngine::builder(types)
        .class_map(
            ClassMap::builder("Person", "PersonDto")
                .map_null(false)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    engine.map_onto(&src, &dest).unwrap();
    assert_eq!(field(&dest, "name"), Value::from("old"));
    assert_eq!(field(&dest, "age"), Value::Long(1));
}

#[test]
fn empty_strings_follow_the_field_override() {
    let types = registry();
    let src = object(&types, "Person", &[("name", "".into()), ("email", "".into())]);
    let dest = object(
        &types,
        "PersonDto",
        &[("name", "old".into()), ("contact", "old".into())],
    );
    let engine = MappingEngine::builder(types)
        .class_map(
            ClassMap::builder("Person", "PersonDto")
                .map_empty_string(false)
                .field(FieldMap::builder("email", "contact").map_empty_string(true))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    engine.map_onto(&src, &dest).unwrap();
    assert_eq!(field(&dest, "name"), Value::from("old"));
    assert_eq!(field(&dest, "contact"), Value::from(""));
}

#[test]
fn strings_are_trimmed_when_asked() {
    let types = registry();
    let src = object(&types, "Person", &[("name", "  Ann  ".into())]);
    let engine = MappingEngine::builder(types)
        .class_map(
            ClassMap::builder("Person", "PersonDto")
                .trim_strings(true)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let dto = engine.map(&src, "PersonDto").unwrap();
    assert_eq!(field(&dto, "name"), Value::from("Ann"));
}

// ─── Map ids ───────────────────────────────────────────────────────────────

#[test]
fn map_id_selects_a_named_variant() {
    let types = registry();
    let src = ann(&types);
    let engine = MappingEngine::builder(types)
        .class_map(
            ClassMap::builder("Person", "PersonDto")
                .map_id("summary")
                .wildcard(false)
                .map("name", "name")
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let summary = engine.map_with_id(&src, "PersonDto", "summary").unwrap();
    assert_eq!(field(&summary, "name"), Value::from("Ann"));
    assert!(field(&summary, "age").is_null());

    // the memo would otherwise hand back the summary for the same source
    engine.reset_identity_memo();
    let full = engine.map(&src, "PersonDto").unwrap();
    assert_eq!(field(&full, "age"), Value::Long(42));

    let err = engine.map_with_id(&src, "PersonDto", "nope").unwrap_err();
    assert!(matches!(err, MappingError::Configuration { .. }));
}

// ─── Map-backed objects ────────────────────────────────────────────────────

#[test]
fn objects_map_to_and_from_maps() {
    let types = registry();
    let src = ann(&types);
    let engine = MappingEngine::builder(types).build().unwrap();

    let map = engine.map(&src, TypeRef::Map).unwrap();
    let Value::Map(entries) = &map else {
        panic!("expected a map, got {map:?}");
    };
    assert_eq!(entries.read().get_str("name"), Some(&Value::from("Ann")));
    assert_eq!(entries.read().get_str("age"), Some(&Value::Int(42)));

    let input = Value::map([
        (Value::from("name"), Value::from("Bob")),
        (Value::from("age"), Value::from("7")),
    ]);
    let person = engine.map(&input, "Person").unwrap();
    assert_eq!(field(&person, "name"), Value::from("Bob"));
    assert_eq!(field(&person, "age"), Value::Int(7));
}

// ─── Enums and dates ───────────────────────────────────────────────────────

#[test]
fn enums_map_by_case_name() {
    let types = registry();
    let src = object(
        &types,
        "Account",
        &[
            ("status", Value::enum_value("Status", "ACTIVE")),
            ("code", "CLOSED".into()),
        ],
    );
    let engine = MappingEngine::builder(types).build().unwrap();

    let dto = engine.map(&src, "AccountDto").unwrap();
    assert_eq!(field(&dto, "status"), Value::enum_value("StatusDto", "ACTIVE"));
    assert_eq!(field(&dto, "code"), Value::enum_value("Status", "CLOSED"));
}

#[test]
fn unknown_enum_case_fails_the_field() {
    let types = registry();
    let src = object(
        &types,
        "Account",
        &[("status", Value::enum_value("Status", "FROZEN"))],
    );
    let engine = MappingEngine::builder(types).build().unwrap();

    let err = engine.map(&src, "AccountDto").unwrap_err();
    let MappingError::FieldMapping { dest_field, .. } = &err else {
        panic!("expected a field mapping error, got {err:?}");
    };
    assert_eq!(dest_field, "status");
    assert!(matches!(err.root_cause(), MappingError::Configuration { .. }));
}

#[test]
fn dates_use_the_class_map_format() {
    let types = registry();
    let at = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let src = object(&types, "Event", &[("at", Value::Date(at))]);
    let engine = MappingEngine::builder(types)
        .class_map(
            ClassMap::builder("Event", "EventDto")
                .date_format("%Y/%m/%d")
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let dto = engine.map(&src, "EventDto").unwrap();
    assert_eq!(field(&dto, "at"), Value::from("2024/03/01"));
    let back = engine.map(&dto, "Event").unwrap();
    assert_eq!(field(&back, "at"), Value::Date(at));
}

// ─── Events and statistics ─────────────────────────────────────────────────

#[test]
fn events_bracket_every_write() {
    let types = registry();
    let src = object(
        &types,
        "Address",
        &[("street", "1 Main St".into()), ("city", "Springfield".into())],
    );
    let recorder = Arc::new(Recorder::default());
    let engine = MappingEngine::builder(types)
        .event_handler(recorder.clone())
        .build()
        .unwrap();

    engine.map(&src, "AddressDto").unwrap();
    use MappingEventType::*;
    assert_eq!(
        *recorder.seen.lock(),
        vec![
            MappingStarted,
            PreWritingDestinationValue,
            PostWritingDestinationValue,
            PreWritingDestinationValue,
            PostWritingDestinationValue,
            MappingFinished,
        ]
    );

    let stats = engine.statistics().unwrap();
    assert_eq!(stats.mapping_success, 1);
    assert_eq!(stats.field_success, 2);
    assert_eq!(stats.field_failure, 0);
}

#[test]
fn reused_destination_still_brackets_the_call() {
    let types = registry();
    let src = object(
        &types,
        "Address",
        &[("street", "1 Main St".into()), ("city", "Springfield".into())],
    );
    let recorder = Arc::new(Recorder::default());
    let engine = MappingEngine::builder(types)
        .event_handler(recorder.clone())
        .build()
        .unwrap();

    let first = engine.map(&src, "AddressDto").unwrap();
    let after_first = recorder.seen.lock().len();
    let second = engine.map(&src, "AddressDto").unwrap();
    assert!(first.same_ref(&second));

    use MappingEventType::*;
    assert_eq!(after_first, 6);
    assert_eq!(recorder.seen.lock()[after_first..], [MappingStarted, MappingFinished]);
}

#[test]
fn engine_settings_load_from_a_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[mapping]
trim_strings = true

[engine]
memo_scope = "call"
statistics_enabled = false
"#
    )
    .unwrap();
    let config = MorphConfig::from_file(file.path()).unwrap();

    let types = registry();
    let src = object(&types, "Person", &[("name", " Ann ".into())]);
    let engine = MappingEngine::builder(types).config(config).build().unwrap();

    let dto = engine.map(&src, "PersonDto").unwrap();
    assert_eq!(field(&dto, "name"), Value::from("Ann"));
    assert!(engine.statistics().is_none());
    assert_eq!(engine.identity_memo_len(), 0);
}
