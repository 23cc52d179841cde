//! Nested customization through `InnerSpec`: map slots, list elements, wildcards,
//! lazies and ordering between sizes and values

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::Rng;
use serde::Deserialize;
use specimen::{
    ArbitraryBuilder, Describe, Fixture, GenerationError, InnerSpec, TypeDescriptor, TypeRef, Value, ValueSource,
};

#[derive(Debug, Deserialize)]
struct SimpleObject {
    str: String,
    #[allow(dead_code)]
    integer: i32,
}

impl Describe for SimpleObject {
    fn type_name() -> String {
        "SimpleObject".to_string()
    }

    fn describe() -> TypeDescriptor {
        TypeDescriptor::record("SimpleObject")
            .property("str", TypeRef::of::<String>())
            .property("integer", TypeRef::of::<i32>())
    }
}

#[derive(Debug, Deserialize)]
struct ComplexObject {
    value: SimpleObject,
}

impl Describe for ComplexObject {
    fn type_name() -> String {
        "ComplexObject".to_string()
    }

    fn describe() -> TypeDescriptor {
        TypeDescriptor::record("ComplexObject").property("value", TypeRef::of::<SimpleObject>())
    }
}

#[derive(Debug, Deserialize)]
struct ComplexObjectObject {
    value: ComplexObject,
}

impl Describe for ComplexObjectObject {
    fn type_name() -> String {
        "ComplexObjectObject".to_string()
    }

    fn describe() -> TypeDescriptor {
        TypeDescriptor::record("ComplexObjectObject").property("value", TypeRef::of::<ComplexObject>())
    }
}

/// Maps with object keys do not survive JSON, so this one is inspected as a `Value`
struct MapObject;

impl Describe for MapObject {
    fn type_name() -> String {
        "MapObject".to_string()
    }

    fn describe() -> TypeDescriptor {
        TypeDescriptor::record("MapObject")
            .property("strMap", TypeRef::of::<HashMap<String, String>>())
            .property("mapValueMap", TypeRef::of::<HashMap<String, HashMap<String, String>>>())
            .property("listValueMap", TypeRef::of::<HashMap<String, Vec<String>>>())
            .property("objectValueMap", TypeRef::of::<HashMap<String, SimpleObject>>())
            .property("objectKeyMap", TypeRef::of::<HashMap<SimpleObject, String>>())
    }
}

struct NestedKeyMapObject;

impl Describe for NestedKeyMapObject {
    fn type_name() -> String {
        "NestedKeyMapObject".to_string()
    }

    fn describe() -> TypeDescriptor {
        TypeDescriptor::record("NestedKeyMapObject")
            .property("mapKeyMap", TypeRef::of::<HashMap<HashMap<String, String>, String>>())
    }
}

#[derive(Debug, Deserialize)]
struct IntegerMapObject {
    #[serde(rename = "integerMap")]
    integer_map: HashMap<i32, i32>,
}

impl Describe for IntegerMapObject {
    fn type_name() -> String {
        "IntegerMapObject".to_string()
    }

    fn describe() -> TypeDescriptor {
        TypeDescriptor::record("IntegerMapObject").property("integerMap", TypeRef::of::<HashMap<i32, i32>>())
    }
}

#[derive(Debug, Deserialize)]
struct ListStringObject {
    values: Vec<String>,
}

impl Describe for ListStringObject {
    fn type_name() -> String {
        "ListStringObject".to_string()
    }

    fn describe() -> TypeDescriptor {
        TypeDescriptor::record("ListStringObject").property("values", TypeRef::of::<Vec<String>>())
    }
}

#[derive(Debug, Deserialize)]
struct NestedListStringObject {
    values: Vec<Vec<String>>,
}

impl Describe for NestedListStringObject {
    fn type_name() -> String {
        "NestedListStringObject".to_string()
    }

    fn describe() -> TypeDescriptor {
        TypeDescriptor::record("NestedListStringObject").property("values", TypeRef::of::<Vec<Vec<String>>>())
    }
}

fn sut() -> Fixture {
    Fixture::builder().default_not_null(true).build()
}

/// Fixture whose containers always hold at least one element
fn non_empty_sut() -> Fixture {
    Fixture::builder()
        .default_not_null(true)
        .default_container_size(1, 3)
        .build()
}

fn sample_map_object(spec: InnerSpec) -> Value {
    sut().give_me_builder::<MapObject>().unwrap().set_inner(spec).sample().unwrap()
}

fn entries<'a>(value: &'a Value, field: &str) -> &'a [(Value, Value)] {
    value.field(field).and_then(Value::as_entries).expect("map field")
}

fn keys(value: &Value, field: &str) -> Vec<Value> {
    entries(value, field).iter().map(|(k, _)| k.clone()).collect()
}

fn values(value: &Value, field: &str) -> Vec<Value> {
    entries(value, field).iter().map(|(_, v)| v.clone()).collect()
}

fn s(text: &str) -> Value {
    Value::from(text)
}

#[test]
fn test_key() {
    let actual = sample_map_object(InnerSpec::new().property_spec("strMap", |m| m.min_size(1).key("key")));
    assert!(keys(&actual, "strMap").contains(&s("key")));
}

#[test]
fn test_value() {
    let actual = sample_map_object(InnerSpec::new().property_spec("strMap", |m| m.min_size(1).value("value")));
    assert!(values(&actual, "strMap").contains(&s("value")));
}

#[test]
fn test_entry() {
    let actual = sample_map_object(InnerSpec::new().property_spec("strMap", |m| m.min_size(1).entry("key", "value")));
    assert_eq!(actual.field("strMap").unwrap().get(&s("key")), Some(&s("value")));
}

#[test]
fn test_keys() {
    let actual = sample_map_object(
        InnerSpec::new().property_spec("strMap", |m| m.min_size(3).keys(["key1", "key2", "key3"])),
    );
    let keys = keys(&actual, "strMap");
    for expected in ["key1", "key2", "key3"] {
        assert!(keys.contains(&s(expected)), "missing {}", expected);
    }
}

#[test]
fn test_values() {
    let actual = sample_map_object(
        InnerSpec::new().property_spec("strMap", |m| m.min_size(3).values(["value1", "value2", "value3"])),
    );
    let values = values(&actual, "strMap");
    for expected in ["value1", "value2", "value3"] {
        assert!(values.contains(&s(expected)), "missing {}", expected);
    }
}

#[test]
fn test_entries() {
    let actual = sample_map_object(
        InnerSpec::new().property_spec("strMap", |m| m.min_size(2).entries([("key1", "value1"), ("key2", "value2")])),
    );
    let map = actual.field("strMap").unwrap();
    assert_eq!(map.get(&s("key1")), Some(&s("value1")));
    assert_eq!(map.get(&s("key2")), Some(&s("value2")));
}

#[test]
fn test_entry_twice() {
    let actual = sample_map_object(
        InnerSpec::new().property_spec("strMap", |m| m.min_size(2).entry("key1", "value1").entry("key2", "value2")),
    );
    let map = actual.field("strMap").unwrap();
    assert_eq!(map.get(&s("key1")), Some(&s("value1")));
    assert_eq!(map.get(&s("key2")), Some(&s("value2")));
}

#[test]
fn test_value_null() {
    let actual = sample_map_object(InnerSpec::new().property_spec("strMap", |m| m.min_size(1).value(Value::Null)));
    assert!(values(&actual, "strMap").iter().any(Value::is_null));
}

#[test]
fn test_key_null_is_rejected() {
    let err = sut()
        .give_me_builder::<MapObject>()
        .unwrap()
        .set_inner(InnerSpec::new().property_spec("strMap", |m| m.min_size(1).key(None::<String>)))
        .sample()
        .unwrap_err();
    assert!(matches!(err, GenerationError::NullMapKey { .. }));
    assert!(err.to_string().contains("Map key cannot be null."));
}

#[test]
fn test_key_lazy_null_is_rejected() {
    let err = sut()
        .give_me_builder::<MapObject>()
        .unwrap()
        .set_inner(InnerSpec::new().property_spec("strMap", |m| m.min_size(1).key_lazy(|| Value::Null)))
        .sample()
        .unwrap_err();
    assert_eq!(err, GenerationError::NullMapKey { path: "strMap[0].KEY".to_string() });
}

#[test]
fn test_key_in_key() {
    let actual = non_empty_sut()
        .give_me_builder::<NestedKeyMapObject>()
        .unwrap()
        .set_inner(InnerSpec::new().property_spec("mapKeyMap", |m| m.key_spec(|k| k.key("key"))))
        .sample()
        .unwrap();

    let inner_keys: Vec<Value> = keys(&actual, "mapKeyMap")
        .iter()
        .flat_map(|key| key.as_entries().unwrap().iter().map(|(k, _)| k.clone()))
        .collect();
    assert!(inner_keys.contains(&s("key")));
}

#[test]
fn test_value_in_key() {
    let actual = non_empty_sut()
        .give_me_builder::<NestedKeyMapObject>()
        .unwrap()
        .set_inner(InnerSpec::new().property_spec("mapKeyMap", |m| m.key_spec(|k| k.value("value"))))
        .sample()
        .unwrap();

    let inner_values: Vec<Value> = keys(&actual, "mapKeyMap")
        .iter()
        .flat_map(|key| key.as_entries().unwrap().iter().map(|(_, v)| v.clone()))
        .collect();
    assert!(inner_values.contains(&s("value")));
}

#[test]
fn test_key_in_value() {
    let actual = sample_map_object(
        InnerSpec::new().property_spec("mapValueMap", |m| m.min_size(1).value_spec(|v| v.min_size(1).key("key"))),
    );
    let inner_keys: Vec<Value> = values(&actual, "mapValueMap")
        .iter()
        .flat_map(|v| v.as_entries().unwrap().iter().map(|(k, _)| k.clone()))
        .collect();
    assert!(inner_keys.contains(&s("key")));
}

#[test]
fn test_value_in_value() {
    let actual = sample_map_object(
        InnerSpec::new().property_spec("mapValueMap", |m| m.min_size(1).value_spec(|v| v.min_size(1).value("value"))),
    );
    let inner_values: Vec<Value> = values(&actual, "mapValueMap")
        .iter()
        .flat_map(|v| v.as_entries().unwrap().iter().map(|(_, v)| v.clone()))
        .collect();
    assert!(inner_values.contains(&s("value")));
}

#[test]
fn test_size_in_value() {
    let actual = sample_map_object(InnerSpec::new().property_spec("listValueMap", |m| m.size(1).value_spec(|v| v.size(10))));
    let sizes: Vec<usize> = values(&actual, "listValueMap").iter().filter_map(Value::len).collect();
    assert_eq!(sizes, vec![10]);
}

#[test]
fn test_list_element_in_value() {
    let actual = sample_map_object(
        InnerSpec::new().property_spec("listValueMap", |m| m.size(1).value_spec(|v| v.size(1).list_element(0, "test"))),
    );
    let elements: Vec<Value> = values(&actual, "listValueMap")
        .iter()
        .flat_map(|v| v.as_elements().unwrap().to_vec())
        .collect();
    assert_eq!(elements, vec![s("test")]);
}

#[test]
fn test_property_in_value() {
    let actual = sample_map_object(
        InnerSpec::new().property_spec("objectValueMap", |m| m.size(1).value_spec(|v| v.property("str", "test"))),
    );
    let fields: Vec<Value> = values(&actual, "objectValueMap")
        .iter()
        .filter_map(|v| v.field("str").cloned())
        .collect();
    assert_eq!(fields, vec![s("test")]);
}

#[test]
fn test_entry_in_entry_value() {
    let actual = sample_map_object(InnerSpec::new().property_spec("mapValueMap", |m| {
        m.min_size(1)
            .entry_value_spec("key1", |v| v.min_size(1).entry("key2", "value"))
    }));
    let inner = actual.field("mapValueMap").unwrap().get(&s("key1")).unwrap();
    assert_eq!(inner.get(&s("key2")), Some(&s("value")));
}

#[test]
fn test_entry_in_entry_key() {
    let actual = non_empty_sut()
        .give_me_builder::<NestedKeyMapObject>()
        .unwrap()
        .set_inner(InnerSpec::new().property_spec("mapKeyMap", |m| m.entry_spec(|k| k.entry("key", "value2"), "value1")))
        .sample()
        .unwrap();

    let (key, _) = entries(&actual, "mapKeyMap")
        .iter()
        .find(|(_, v)| v == &s("value1"))
        .expect("entry with value1");
    assert_eq!(key.get(&s("key")), Some(&s("value2")));
}

#[test]
fn test_entry_value_set_null() {
    let actual = sample_map_object(InnerSpec::new().property_spec("strMap", |m| m.size(1).entry("key", Value::Null)));
    assert_eq!(actual.field("strMap").unwrap().get(&s("key")), Some(&Value::Null));
}

#[test]
fn test_list_element_in_list_element() {
    let actual: NestedListStringObject = sut()
        .give_me_builder::<NestedListStringObject>()
        .unwrap()
        .set_inner(InnerSpec::new().property_spec("values", |l| {
            l.size(1).list_element_spec(0, |e| e.size(1).list_element(0, "test"))
        }))
        .sample_as()
        .unwrap();
    assert_eq!(actual.values[0][0], "test");
}

#[test]
fn test_property_in_property() {
    let actual: ComplexObjectObject = sut()
        .give_me_builder::<ComplexObjectObject>()
        .unwrap()
        .set_inner(InnerSpec::new().property_spec("value", |v| v.property_spec("value", |w| w.property("str", "test"))))
        .sample_as()
        .unwrap();
    assert_eq!(actual.value.value.str, "test");
}

#[test]
fn test_size_and_entry() {
    let actual = sample_map_object(InnerSpec::new().property_spec("strMap", |m| m.size(4).entry("key", "test")));
    let map = actual.field("strMap").unwrap();
    assert_eq!(map.len(), Some(4));
    assert_eq!(map.get(&s("key")), Some(&s("test")));
}

#[test]
fn test_entry_and_size() {
    let actual = sample_map_object(InnerSpec::new().property_spec("strMap", |m| m.entry("key", "test").size(4)));
    let map = actual.field("strMap").unwrap();
    assert_eq!(map.len(), Some(4));
    assert_eq!(map.get(&s("key")), Some(&s("test")));
}

#[test]
fn test_size_twice_returns_latter_size() {
    let actual = sample_map_object(InnerSpec::new().property_spec("strMap", |m| m.size(1).entry("key", "test").size(0)));
    assert_eq!(actual.field("strMap").unwrap().len(), Some(0));
}

/// A lazy supplier backed by another builder, customized after the lazy was registered
fn shared_string_builder(fixture: &Fixture) -> Arc<Mutex<ArbitraryBuilder>> {
    Arc::new(Mutex::new(fixture.give_me_builder::<String>().unwrap()))
}

fn set_shared(shared: &Arc<Mutex<ArbitraryBuilder>>, value: &str) {
    let mut guard = shared.lock().unwrap();
    *guard = guard.clone().set("$", value);
}

#[test]
fn test_key_lazy() {
    let fixture = sut();
    let variable = shared_string_builder(&fixture);
    let reader = Arc::clone(&variable);
    let builder = fixture
        .give_me_builder::<MapObject>()
        .unwrap()
        .set_inner(InnerSpec::new().property_spec("strMap", move |m| {
            m.size(1).key_lazy(move || reader.lock().unwrap().sample().unwrap())
        }));
    set_shared(&variable, "key");

    let actual = builder.sample().unwrap();
    assert!(keys(&actual, "strMap").contains(&s("key")));
}

#[test]
fn test_value_lazy() {
    let fixture = sut();
    let variable = shared_string_builder(&fixture);
    let reader = Arc::clone(&variable);
    let builder = fixture
        .give_me_builder::<MapObject>()
        .unwrap()
        .set_inner(InnerSpec::new().property_spec("strMap", move |m| {
            m.min_size(1).value_lazy(move || reader.lock().unwrap().sample().unwrap())
        }));
    set_shared(&variable, "value");

    let actual = builder.sample().unwrap();
    assert!(values(&actual, "strMap").contains(&s("value")));
}

#[test]
fn test_entry_lazy() {
    let fixture = sut();
    let key_variable = shared_string_builder(&fixture);
    let value_variable = shared_string_builder(&fixture);
    let key_reader = Arc::clone(&key_variable);
    let value_reader = Arc::clone(&value_variable);
    let builder = fixture
        .give_me_builder::<MapObject>()
        .unwrap()
        .set_inner(InnerSpec::new().property_spec("strMap", move |m| {
            m.min_size(1).entry_lazy(
                move || key_reader.lock().unwrap().sample().unwrap(),
                move || value_reader.lock().unwrap().sample().unwrap(),
            )
        }));
    set_shared(&key_variable, "key");
    set_shared(&value_variable, "value");

    let actual = builder.sample().unwrap();
    assert_eq!(actual.field("strMap").unwrap().get(&s("key")), Some(&s("value")));
}

fn percent() -> i32 {
    rand::thread_rng().gen_range(0..=100)
}

fn sample_integer_map(spec: InnerSpec) -> IntegerMapObject {
    sut()
        .give_me_builder::<IntegerMapObject>()
        .unwrap()
        .set_inner(InnerSpec::new().property_inner("integerMap", spec))
        .sample_as()
        .unwrap()
}

#[test]
fn test_all_key_lazy() {
    let actual = sample_integer_map(InnerSpec::new().all_key_lazy(percent));
    assert!(actual.integer_map.keys().all(|k| (0..=100).contains(k)));
}

#[test]
fn test_all_value_lazy() {
    let actual = sample_integer_map(InnerSpec::new().all_value_lazy(percent));
    assert!(actual.integer_map.values().all(|v| (0..=100).contains(v)));
}

#[test]
fn test_all_entry() {
    let actual = sample_integer_map(InnerSpec::new().all_entry(ValueSource::lazy(percent), 100));
    assert!(actual.integer_map.keys().all(|k| (0..=100).contains(k)));
    assert!(actual.integer_map.values().all(|v| *v == 100));
}

#[test]
fn test_all_entry_lazy() {
    let actual = sample_integer_map(InnerSpec::new().all_entry_lazy(percent, percent));
    assert!(actual.integer_map.keys().all(|k| (0..=100).contains(k)));
    assert!(actual.integer_map.values().all(|v| (0..=100).contains(v)));
}

#[test]
fn test_lazy_key_colliding_with_key_keeps_latter_entry() {
    let actual = sample_map_object(InnerSpec::new().property_spec("strMap", |m| {
        m.size(2).entry("key", "first").entry_lazy(|| "key", || "second")
    }));
    assert_eq!(entries(&actual, "strMap"), &[(s("key"), s("second"))]);
}

#[test]
fn test_key_colliding_with_lazy_key_keeps_latter_entry() {
    let actual = sample_map_object(InnerSpec::new().property_spec("strMap", |m| {
        m.size(2).entry_lazy(|| "key", || "first").entry("key", "second")
    }));
    assert_eq!(entries(&actual, "strMap"), &[(s("key"), s("second"))]);
}

#[test]
fn test_all_key_lazy_constant_collapses() {
    let actual = sample_map_object(InnerSpec::new().property_spec("strMap", |m| {
        m.size(3).all_key_lazy(|| "key").all_value("value")
    }));
    assert_eq!(entries(&actual, "strMap"), &[(s("key"), s("value"))]);
}

#[test]
fn test_all_key() {
    let actual = sample_map_object(InnerSpec::new().property_spec("objectKeyMap", |m| {
        m.all_key_spec(|k| k.property("str", "test"))
    }));
    assert!(keys(&actual, "objectKeyMap").iter().all(|k| k.field("str") == Some(&s("test"))));
}

#[test]
fn test_all_value() {
    let actual = sample_map_object(InnerSpec::new().property_spec("strMap", |m| m.all_value("test")));
    assert!(values(&actual, "strMap").iter().all(|v| v == &s("test")));
}

#[test]
fn test_all_value_inner() {
    let actual = sample_map_object(InnerSpec::new().property_spec("objectValueMap", |m| {
        m.all_value_spec(|v| v.property("str", "test"))
    }));
    assert!(values(&actual, "objectValueMap").iter().all(|v| v.field("str") == Some(&s("test"))));
}

#[test]
fn test_all_list_element() {
    let actual: Vec<String> = sut()
        .give_me_builder::<Vec<String>>()
        .unwrap()
        .set_inner(InnerSpec::new().all_list_element("test"))
        .sample_as()
        .unwrap();
    assert!(actual.iter().all(|v| v == "test"));
}

#[test]
fn test_all_list_element_inner_spec() {
    let actual: Vec<Vec<String>> = sut()
        .give_me_builder::<Vec<Vec<String>>>()
        .unwrap()
        .set_inner(InnerSpec::new().all_list_element_spec(|e| e.all_list_element("test")))
        .sample_as()
        .unwrap();
    assert!(actual.iter().flatten().all(|v| v == "test"));
}

#[test]
fn test_list_element_overrides_all_list_element() {
    let actual: Vec<String> = sut()
        .give_me_builder::<Vec<String>>()
        .unwrap()
        .set_inner(InnerSpec::new().size(3).all_list_element("x").list_element(0, "y"))
        .sample_as()
        .unwrap();
    assert_eq!(actual, vec!["y", "x", "x"]);
}

#[test]
fn test_all_list_element_after_list_element_wins() {
    let actual: Vec<String> = sut()
        .give_me_builder::<Vec<String>>()
        .unwrap()
        .set_inner(InnerSpec::new().size(3).list_element(0, "y").all_list_element("x"))
        .sample_as()
        .unwrap();
    assert_eq!(actual, vec!["x", "x", "x"]);
}

#[test]
fn test_set_post_condition() {
    let actual: SimpleObject = sut()
        .give_me_builder::<SimpleObject>()
        .unwrap()
        .set_inner(InnerSpec::new().property_spec("str", |p| {
            p.post_condition(|v| v.as_str().map_or(false, |s| s.chars().count() > 5))
        }))
        .sample_as()
        .unwrap();
    assert!(actual.str.chars().count() > 5);
}

#[test]
fn test_inner() {
    let inner_spec = InnerSpec::new().property("str", "test");
    let actual: SimpleObject = sut()
        .give_me_builder::<SimpleObject>()
        .unwrap()
        .set_inner(InnerSpec::new().inner(inner_spec))
        .sample_as()
        .unwrap();
    assert_eq!(actual.str, "test");
}

#[test]
fn test_property_inner() {
    let inner_spec = InnerSpec::new().property("str", "test");
    let actual: ComplexObject = sut()
        .give_me_builder::<ComplexObject>()
        .unwrap()
        .set_inner(InnerSpec::new().property_inner("value", inner_spec))
        .sample_as()
        .unwrap();
    assert_eq!(actual.value.str, "test");
}

#[test]
fn test_list_element_in_max_size() {
    let actual: Vec<String> = sut()
        .give_me_builder::<Vec<String>>()
        .unwrap()
        .set_inner(InnerSpec::new().max_size(2).list_element(0, "expected").list_element(1, "expected"))
        .sample_as()
        .unwrap();
    assert_eq!(actual, vec!["expected", "expected"]);
}

fn sample_list_object(builder: ArbitraryBuilder) -> Vec<String> {
    builder.sample_as::<ListStringObject>().unwrap().values
}

fn list_object_builder() -> ArbitraryBuilder {
    sut().give_me_builder::<ListStringObject>().unwrap()
}

#[test]
fn test_set_after_size_returns_set() {
    let actual = sample_list_object(list_object_builder().set_inner(
        InnerSpec::new()
            .property_spec("values", |v| v.size(2))
            .property("values", Vec::<String>::new()),
    ));
    assert!(actual.is_empty());
}

#[test]
fn test_size_after_set_returns_size() {
    let actual = sample_list_object(list_object_builder().set_inner(
        InnerSpec::new()
            .property("values", Vec::<String>::new())
            .property_spec("values", |v| v.size(2)),
    ));
    assert_eq!(actual.len(), 2);
}

#[test]
fn test_size_after_set_with_separate_inner_spec_returns_size() {
    let actual = sample_list_object(
        list_object_builder()
            .set_inner(InnerSpec::new().property("values", Vec::<String>::new()))
            .set_inner(InnerSpec::new().property_spec("values", |v| v.size(2))),
    );
    assert_eq!(actual.len(), 2);
}

#[test]
fn test_set_after_set_with_separate_inner_spec_returns_set() {
    let actual = sample_list_object(
        list_object_builder()
            .set_inner(InnerSpec::new().property_spec("values", |v| v.size(2)))
            .set_inner(InnerSpec::new().property("values", Vec::<String>::new())),
    );
    assert!(actual.is_empty());
}

#[test]
fn test_inner_spec_increments_sequence() {
    let actual = sample_list_object(
        list_object_builder()
            .set_inner(
                InnerSpec::new()
                    .property_spec("values", |v| v.size(1))
                    .property_spec("values", |v| v.size(2))
                    .property_spec("values", |v| v.size(3)),
            )
            .size("values", 5),
    );
    assert_eq!(actual.len(), 5);
}

#[test]
fn test_set_not_null() {
    let fixture = Fixture::builder().null_inject(1.0).build();
    let desc = TypeDescriptor::record("NullableObject").nullable_property("str", TypeDescriptor::string());
    let actual = fixture
        .builder_for(desc)
        .unwrap()
        .set_inner(InnerSpec::new().property_not_null("str"))
        .sample()
        .unwrap();
    assert!(!actual.field("str").unwrap().is_null());
}

#[test]
fn test_keys_for_collection() {
    let key_list = vec!["key1".to_string(), "key2".to_string(), "key3".to_string()];
    let actual = sample_map_object(InnerSpec::new().property_spec("strMap", |m| m.keys(key_list.clone()).size(3)));
    let keys = keys(&actual, "strMap");
    assert!(key_list.iter().all(|k| keys.contains(&s(k))));
}

#[test]
fn test_values_for_collection() {
    let value_list = vec!["value1", "value2", "value3"];
    let actual = sample_map_object(InnerSpec::new().property_spec("strMap", |m| m.values(value_list.clone()).size(3)));
    let values = values(&actual, "strMap");
    assert!(value_list.iter().all(|v| values.contains(&s(v))));
}

#[test]
fn test_entries_for_collection() {
    let entry_list = vec![("key1", "value1"), ("key2", "value2")];
    let actual = sample_map_object(InnerSpec::new().property_spec("strMap", |m| m.entries(entry_list).size(2)));
    let map = actual.field("strMap").unwrap();
    assert_eq!(map.get(&s("key1")), Some(&s("value1")));
    assert_eq!(map.get(&s("key2")), Some(&s("value2")));
}

#[test]
fn test_supplier_wrapping_is_transparent() {
    let desc = TypeDescriptor::deferred(TypeRef::of::<SimpleObject>());
    let actual = sut()
        .builder_for(desc)
        .unwrap()
        .set_inner(InnerSpec::new().property("str", "test"))
        .sample()
        .unwrap();
    assert!(matches!(actual, Value::Deferred(_)));
    assert_eq!(actual.invoke().field("str"), Some(&s("test")));
}

#[test]
fn test_supplier_object_field() {
    let desc = TypeDescriptor::record("SupplierStringObject").property("value", TypeDescriptor::deferred(TypeDescriptor::string()));
    let actual = sut()
        .builder_for(desc)
        .unwrap()
        .set_inner(InnerSpec::new().property("value", Value::deferred("test")))
        .sample()
        .unwrap();
    assert_eq!(actual.field("value"), Some(&Value::deferred("test")));
}
