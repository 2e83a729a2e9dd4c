//! A single-object Avro binary codec core
//!
//! This crate implements the wire-level half of
//! [Apache Avro](https://avro.apache.org/docs/current/specification/)'s
//! binary encoding: given a [`Schema`](schema::Schema) and any
//! `T: Serialize`/`DeserializeOwned`, [`to_datum`]/[`from_datum_slice`] (and
//! their `Reader`/`Writer`-driven siblings) encode and decode values without
//! the Object Container File framing layer.
//!
//! ```
//! # use avro_codec_core::schema::Schema;
//! # use std::str::FromStr;
//! let schema = Schema::from_str(r#"{"type": "long"}"#).unwrap();
//! let bytes = avro_codec_core::to_datum(&42i64, &schema).unwrap();
//! let back: i64 = avro_codec_core::from_datum_slice(&bytes, &schema).unwrap();
//! assert_eq!(back, 42);
//! ```
//!
//! The moving parts, roughly bottom to top:
//! - [`io`]: the binary primitives (varints, block framing, sticky errors)
//! - [`schema`]: the immutable, arena-based schema graph and its dynamic
//!   [`Value`](schema::Value) representation
//! - [`codec`]: compiles a schema into something that can actually walk a
//!   [`Value`](schema::Value) against the wire, with a process-wide cache
//! - [`resolve`]: reader/writer schema resolution, producing the composite
//!   schema [`codec`] compiles against when the two differ
//! - [`bridge`]: the `serde`-based conversion between `Value` and whatever
//!   concrete Rust type a caller actually wants

pub mod bridge;
pub mod codec;
pub mod config;
pub mod error;
pub mod io;
pub mod resolve;
pub mod schema;

pub use config::Config;
pub use error::{CodecError, ErrorKind};
pub use schema::Schema;

use schema::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{BufRead, BufReader, Read, Write};

/// Encode `value` against `schema`, returning the encoded bytes
pub fn to_datum<T: Serialize + 'static>(value: &T, schema: &Schema) -> Result<Vec<u8>, CodecError> {
	to_datum_with_config(value, schema, &Config::default())
}

/// Like [`to_datum`], with an explicit [`Config`]
pub fn to_datum_with_config<T: Serialize + 'static>(
	value: &T,
	schema: &Schema,
	config: &Config,
) -> Result<Vec<u8>, CodecError> {
	let codec = codec::cache::get_or_compile(schema)?;
	let value: Value = bridge::t_to_value(value)?;
	let mut buf = io::Buf::new();
	codec.encode(&value, &mut buf, config)?;
	Ok(buf.into_vec())
}

/// Encode `value` against `schema` directly to a `std::io::Write` sink
pub fn to_datum_writer<T: Serialize + 'static, W: Write>(
	value: &T,
	schema: &Schema,
	sink: W,
) -> Result<(), CodecError> {
	let bytes = to_datum(value, schema)?;
	let mut writer = io::Writer::new(sink);
	writer.buf_mut().write_raw(&bytes);
	writer.flush()
}

/// Decode one value of `schema` from `bytes`
pub fn from_datum_slice<T: DeserializeOwned + 'static>(bytes: &[u8], schema: &Schema) -> Result<T, CodecError> {
	from_datum_reader(bytes, schema, &Config::default())
}

/// Decode one value of `schema`, reading from `source` with an explicit
/// [`Config`]
pub fn from_datum_reader<T: DeserializeOwned + 'static, R: Read>(
	source: R,
	schema: &Schema,
	config: &Config,
) -> Result<T, CodecError> {
	let codec = codec::cache::get_or_compile(schema)?;
	let mut reader = io::Reader::new(BufReader::new(source), config);
	let value = codec.decode(&mut reader, config)?;
	bridge::value_to_t(value)
}

/// Decode one value of `schema` from an already-buffered source
pub fn from_datum_buf_read<T: DeserializeOwned + 'static, R: BufRead>(
	source: R,
	schema: &Schema,
	config: &Config,
) -> Result<T, CodecError> {
	let codec = codec::cache::get_or_compile(schema)?;
	let mut reader = io::Reader::new(source, config);
	let value = codec.decode(&mut reader, config)?;
	bridge::value_to_t(value)
}
