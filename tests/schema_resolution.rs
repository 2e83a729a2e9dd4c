//! Reader/writer resolution exercised end-to-end through the codec: a writer
//! schema with a dropped field and a promoted type, read back by a reader
//! schema that adds a defaulted field.

use avro_codec_core::codec::compile;
use avro_codec_core::config::Config;
use avro_codec_core::io::{Buf, Reader};
use avro_codec_core::resolve::resolve;
use avro_codec_core::schema::{Action, RegularType, Value};
use avro_codec_core::Schema;
use std::str::FromStr;

#[test]
fn dropped_field_promoted_type_and_new_defaulted_field() {
	let writer = Schema::from_str(
		r#"{"type": "record", "name": "Event", "fields": [
			{"name": "a", "type": "int"},
			{"name": "c", "type": "string"}
		]}"#,
	)
	.unwrap();
	let reader = Schema::from_str(
		r#"{"type": "record", "name": "Event", "fields": [
			{"name": "a", "type": "long"},
			{"name": "b", "type": "string", "default": "x"}
		]}"#,
	)
	.unwrap();

	let resolved = resolve(&reader, &writer).unwrap();
	assert_ne!(resolved.cache_fingerprint(), resolved.fingerprint());

	let record = match &resolved.root().type_ {
		RegularType::Record(r) => r,
		other => panic!("expected a resolved record, got {other:?}"),
	};
	assert_eq!(record.fields.len(), 3, "writer's a, c, plus reader-only b");
	assert_eq!(record.fields[0].name, "a");
	assert_eq!(record.fields[0].action, Action::Normal);
	assert_eq!(record.fields[1].name, "c");
	assert_eq!(record.fields[1].action, Action::Ignore);
	assert_eq!(record.fields[2].name, "b");
	assert_eq!(record.fields[2].action, Action::SetDefault);

	// Write a value under the writer schema...
	let writer_codec = compile(&writer).unwrap();
	let config = Config::default();
	let mut buf = Buf::new();
	let value = Value::Record(vec![
		("a".to_owned(), Value::Int(5)),
		("c".to_owned(), Value::String("dropped on read".to_owned())),
	]);
	writer_codec.encode(&value, &mut buf, &config).unwrap();

	// ...and read it back under the resolved schema.
	let resolved_codec = compile(&resolved).unwrap();
	let bytes = buf.into_vec();
	let mut r = Reader::new(&bytes[..], &config);
	let decoded = resolved_codec.decode(&mut r, &config).unwrap();

	assert_eq!(
		decoded,
		Value::Record(vec![
			("a".to_owned(), Value::Long(5)),
			("b".to_owned(), Value::String("x".to_owned())),
		])
	);
}

#[test]
fn incompatible_schemas_refuse_to_resolve() {
	let writer = Schema::from_str(r#"{"type": "long"}"#).unwrap();
	let reader = Schema::from_str(r#"{"type": "int"}"#).unwrap();
	assert!(resolve(&reader, &writer).is_err());
}
