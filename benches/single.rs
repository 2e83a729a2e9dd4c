//! Single-object encode/decode throughput for a representative record schema

use avro_codec_core::codec::compile;
use avro_codec_core::config::Config;
use avro_codec_core::io::{Buf, Reader};
use avro_codec_core::schema::Value;
use avro_codec_core::Schema;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::str::FromStr;

fn schema() -> Schema {
	Schema::from_str(
		r#"{"type": "record", "name": "Event", "fields": [
			{"name": "id", "type": "long"},
			{"name": "name", "type": "string"},
			{"name": "tags", "type": {"type": "array", "items": "string"}},
			{"name": "score", "type": "double"}
		]}"#,
	)
	.unwrap()
}

fn value() -> Value {
	Value::Record(vec![
		("id".to_owned(), Value::Long(42)),
		("name".to_owned(), Value::String("widget".to_owned())),
		(
			"tags".to_owned(),
			Value::Array(vec![
				Value::String("red".to_owned()),
				Value::String("small".to_owned()),
				Value::String("fragile".to_owned()),
			]),
		),
		("score".to_owned(), Value::Double(3.5)),
	])
}

fn bench_encode(c: &mut Criterion) {
	let schema = schema();
	let codec = compile(&schema).unwrap();
	let config = Config::default();
	let value = value();
	c.bench_function("encode record", |b| {
		b.iter(|| {
			let mut buf = Buf::new();
			codec.encode(black_box(&value), &mut buf, &config).unwrap();
			black_box(buf.into_vec())
		})
	});
}

fn bench_decode(c: &mut Criterion) {
	let schema = schema();
	let codec = compile(&schema).unwrap();
	let config = Config::default();
	let mut buf = Buf::new();
	codec.encode(&value(), &mut buf, &config).unwrap();
	let bytes = buf.into_vec();
	c.bench_function("decode record", |b| {
		b.iter(|| {
			let mut reader = Reader::new(black_box(&bytes[..]), &config);
			black_box(codec.decode(&mut reader, &config).unwrap())
		})
	});
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
