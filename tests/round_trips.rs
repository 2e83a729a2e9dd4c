//! Struct/enum/collection round trips through the public `to_datum`/
//! `from_datum_slice` entry points, exercising the `serde` bridge on top of
//! the `Value`-level codec.

use avro_codec_core::Schema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Person {
	name: String,
	age: i32,
	nickname: Option<String>,
}

fn person_schema() -> Schema {
	Schema::from_str(
		r#"{"type": "record", "name": "Person", "fields": [
			{"name": "name", "type": "string"},
			{"name": "age", "type": "int"},
			{"name": "nickname", "type": ["null", "string"], "default": null}
		]}"#,
	)
	.unwrap()
}

#[test]
fn struct_with_optional_field_round_trips() {
	let schema = person_schema();
	for person in [
		Person { name: "Ada".to_owned(), age: 36, nickname: None },
		Person { name: "Alan".to_owned(), age: 41, nickname: Some("Al".to_owned()) },
	] {
		let bytes = avro_codec_core::to_datum(&person, &schema).unwrap();
		let back: Person = avro_codec_core::from_datum_slice(&bytes, &schema).unwrap();
		assert_eq!(back, person);
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Shape {
	Circle { radius: f64 },
	Square { side: f64 },
}

fn shape_schema() -> Schema {
	Schema::from_str(
		r#"[
			{"type": "record", "name": "Circle", "fields": [{"name": "radius", "type": "double"}]},
			{"type": "record", "name": "Square", "fields": [{"name": "side", "type": "double"}]}
		]"#,
	)
	.unwrap()
}

#[test]
fn enum_of_struct_variants_round_trips_by_union_index() {
	let schema = shape_schema();
	for shape in [Shape::Circle { radius: 2.0 }, Shape::Square { side: 3.0 }] {
		let bytes = avro_codec_core::to_datum(&shape, &schema).unwrap();
		let back: Shape = avro_codec_core::from_datum_slice(&bytes, &schema).unwrap();
		assert_eq!(back, shape);
	}
}

#[test]
fn vec_of_longs_round_trips_across_a_block_boundary() {
	let schema = Schema::from_str(r#"{"type": "array", "items": "long"}"#).unwrap();
	let values: Vec<i64> = (0..250).collect();
	let bytes = avro_codec_core::to_datum(&values, &schema).unwrap();
	let back: Vec<i64> = avro_codec_core::from_datum_slice(&bytes, &schema).unwrap();
	assert_eq!(back, values);
}

#[test]
fn map_of_strings_round_trips() {
	use std::collections::BTreeMap;
	let schema = Schema::from_str(r#"{"type": "map", "values": "string"}"#).unwrap();
	let mut values = BTreeMap::new();
	values.insert("a".to_owned(), "one".to_owned());
	values.insert("b".to_owned(), "two".to_owned());
	let bytes = avro_codec_core::to_datum(&values, &schema).unwrap();
	let back: BTreeMap<String, String> = avro_codec_core::from_datum_slice(&bytes, &schema).unwrap();
	assert_eq!(back, values);
}
