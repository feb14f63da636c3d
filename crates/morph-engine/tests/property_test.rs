//! Property-based checks of round-trip and merge invariants.

use proptest::prelude::*;

use morph_core::classmap::{FieldMap, RelationshipType};
use morph_core::model::{PrimitiveKind, TypeDef, TypeRef, TypeRegistry, Value};
use morph_core::ClassMap;
use morph_engine::MappingEngine;

fn registry() -> TypeRegistry {
    TypeRegistry::new()
        .with(
            TypeDef::class("Address")
                .field("city", TypeRef::String)
                .field("zip", TypeRef::Primitive(PrimitiveKind::Int))
                .build(),
        )
        .with(
            TypeDef::class("AddressDto")
                .field("city", TypeRef::String)
                .field("zip", TypeRef::String)
                .build(),
        )
        .with(
            TypeDef::class("Person")
                .field("name", TypeRef::String)
                .field("age", TypeRef::Primitive(PrimitiveKind::Int))
                .field("address", "Address")
                .field("tags", TypeRef::list_of(TypeRef::String))
                .build(),
        )
        .with(
            TypeDef::class("PersonDto")
                .field("fullName", TypeRef::String)
                .field("age", TypeRef::Wrapper(PrimitiveKind::Long))
                .field("address", "AddressDto")
                .field("tags", TypeRef::list_of(TypeRef::String))
                .build(),
        )
        .with(TypeDef::class("Bag").field("values", TypeRef::list_of(TypeRef::String)).build())
}

fn get(value: &Value, name: &str) -> Value {
    value.as_object().and_then(|o| o.get(name)).unwrap_or_default()
}

proptest! {
    #[test]
    fn round_trip_restores_the_source(
        name in "[A-Za-z ]{0,16}",
        age in any::<i32>(),
        city in "[A-Za-z]{1,12}",
        zip in 0i32..99_999,
        tags in proptest::collection::vec("[a-z]{1,6}", 0..5),
    ) {
        let types = registry();
        let address = types.instantiate("Address").unwrap().with("city", city.as_str()).with("zip", zip);
        let src = Value::Object(
            types
                .instantiate("Person")
                .unwrap()
                .with("name", name.as_str())
                .with("age", age)
                .with("address", address)
                .with("tags", Value::list(tags.iter().map(|t| Value::from(t.as_str())))),
        );
        let engine = MappingEngine::builder(types)
            .class_map(ClassMap::builder("Person", "PersonDto").map("name", "fullName").build().unwrap())
            .build()
            .unwrap();

        let dto = engine.map(&src, "PersonDto").unwrap();
        let back = engine.map(&dto, "Person").unwrap();

        prop_assert_eq!(get(&back, "name"), get(&src, "name"));
        prop_assert_eq!(get(&back, "age"), Value::Int(age));
        prop_assert_eq!(get(&get(&back, "address"), "city"), Value::from(city.as_str()));
        prop_assert_eq!(get(&get(&back, "address"), "zip"), Value::Int(zip));
        prop_assert_eq!(get(&back, "tags"), get(&src, "tags"));
        prop_assert!(!get(&back, "address").same_ref(&get(&src, "address")));
    }

    #[test]
    fn cumulative_merge_length_is_the_sum(
        first in proptest::collection::vec("[a-z]{1,4}", 0..6),
        second in proptest::collection::vec("[a-z]{1,4}", 0..6),
    ) {
        let types = registry();
        let strings = |items: &[String]| Value::list(items.iter().map(|s| Value::from(s.as_str())));
        let src = Value::Object(types.instantiate("Bag").unwrap().with("values", strings(&second)));
        let dest = Value::Object(types.instantiate("Bag").unwrap().with("values", strings(&first)));
        let engine = MappingEngine::builder(types).build().unwrap();

        engine.map_onto(&src, &dest).unwrap();
        let merged = get(&dest, "values").elements().unwrap();
        prop_assert_eq!(merged.len(), first.len() + second.len());
    }

    #[test]
    fn non_cumulative_merge_never_duplicates_strings(
        first in proptest::collection::btree_set("[a-z]{1,3}", 0..6),
        second in proptest::collection::btree_set("[a-z]{1,3}", 0..6),
    ) {
        let types = registry();
        let strings = |items: &std::collections::BTreeSet<String>| {
            Value::list(items.iter().map(|s| Value::from(s.as_str())))
        };
        let src = Value::Object(types.instantiate("Bag").unwrap().with("values", strings(&second)));
        let dest = Value::Object(types.instantiate("Bag").unwrap().with("values", strings(&first)));
        let engine = MappingEngine::builder(types)
            .class_map(
                ClassMap::builder("Bag", "Bag")
                    .field(FieldMap::builder("values", "values").relationship(RelationshipType::NonCumulative))
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        engine.map_onto(&src, &dest).unwrap();
        let merged = get(&dest, "values").elements().unwrap();
        prop_assert_eq!(merged.len(), first.union(&second).count());
    }
}
