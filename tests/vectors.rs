//! Concrete end-to-end byte-sequence scenarios, pinned to exact hex
//!
//! Each case decodes a literal byte sequence against a schema and checks the
//! resulting `Value`, then re-encodes it and checks the bytes come back out
//! byte-for-byte (modulo chunking choices the writer is free to make, which
//! these schemas are small enough to avoid).

use avro_codec_core::codec::compile;
use avro_codec_core::config::Config;
use avro_codec_core::io::{Buf, Reader};
use avro_codec_core::schema::Value;
use avro_codec_core::Schema;
use rust_decimal::Decimal;
use std::str::FromStr;

fn decode_bytes(schema: &Schema, bytes: &[u8]) -> Value {
	let codec = compile(schema).unwrap();
	let config = Config::default();
	let mut reader = Reader::new(&bytes[..], &config);
	codec.decode(&mut reader, &config).unwrap()
}

fn encode_value(schema: &Schema, value: &Value) -> Vec<u8> {
	let codec = compile(schema).unwrap();
	let config = Config::default();
	let mut buf = Buf::new();
	codec.encode(value, &mut buf, &config).unwrap();
	buf.into_vec()
}

#[test]
fn record_of_long_and_string() {
	let schema = Schema::from_str(
		r#"{"type": "record", "name": "R", "fields": [
			{"name": "a", "type": "long"},
			{"name": "b", "type": "string"}
		]}"#,
	)
	.unwrap();
	let bytes = [0x36, 0x06, 0x66, 0x6F, 0x6F];
	let value = decode_bytes(&schema, &bytes);
	assert_eq!(
		value,
		Value::Record(vec![("a".to_owned(), Value::Long(27)), ("b".to_owned(), Value::String("foo".to_owned()))])
	);
	assert_eq!(encode_value(&schema, &value), bytes);
}

#[test]
fn nullable_union_of_string_non_null() {
	let schema = Schema::from_str(r#"["null", "string"]"#).unwrap();
	let bytes = [0x02, 0x06, 0x66, 0x6F, 0x6F];
	let value = decode_bytes(&schema, &bytes);
	assert_eq!(value, Value::String("foo".to_owned()));
	assert_eq!(encode_value(&schema, &value), bytes);
}

#[test]
fn timestamp_micros_round_trips_the_wire_varint() {
	let schema = Schema::from_str(r#"{"type": "long", "logicalType": "timestamp-micros"}"#).unwrap();
	let bytes = [0x80, 0xCD, 0xB7, 0xA2, 0xEE, 0xC7, 0xCD, 0x05];
	let value = decode_bytes(&schema, &bytes);
	assert!(matches!(value, Value::TimeLike(_)));
	assert_eq!(encode_value(&schema, &value), bytes);
}

#[test]
fn decimal_on_bytes_scale_2() {
	let schema = Schema::from_str(r#"{"type": "bytes", "logicalType": "decimal", "precision": 5, "scale": 2}"#).unwrap();
	let bytes = [0x06, 0x00, 0x87, 0x78];
	let value = decode_bytes(&schema, &bytes);
	assert_eq!(value, Value::Decimal(Decimal::new(34680, 2)));
	assert_eq!(encode_value(&schema, &value), bytes);
}

#[test]
fn enum_lookup() {
	let schema = Schema::from_str(r#"{"type": "enum", "name": "E", "symbols": ["foo", "bar"]}"#).unwrap();
	let bytes = [0x02];
	let value = decode_bytes(&schema, &bytes);
	assert_eq!(value, Value::Enum("bar".to_owned()));
	assert_eq!(encode_value(&schema, &value), bytes);
}

#[test]
fn array_of_int_two_blocks() {
	let schema = Schema::from_str(r#"{"type": "array", "items": "int"}"#).unwrap();
	let bytes = [0x03, 0x04, 0x36, 0x38, 0x00];
	let value = decode_bytes(&schema, &bytes);
	assert_eq!(value, Value::Array(vec![Value::Int(27), Value::Int(28)]));
	assert_eq!(encode_value(&schema, &value), bytes);
}
