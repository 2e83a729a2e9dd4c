//! Compiles a [`Schema`] into a reusable encoder/decoder over the dynamic
//! [`Value`] representation (§4.2-§4.6)
//!
//! The actual encode/decode walk lives on [`Codec`] below; [`compiler`]
//! validates a schema into one, and [`cache`] memoizes that compilation
//! process-wide. [`logical`] holds the wire<->[`Value`] conversions for
//! logical types, and [`skip`] implements schema-guided skipping for fields
//! a reader schema doesn't want (`Action::Ignore`, produced by
//! [`crate::resolve`]).

pub mod cache;
pub mod compiler;
pub mod logical;
pub mod skip;

pub use compiler::compile;

use crate::config::Config;
use crate::error::{CodecError, ErrorKind};
use crate::io::{Buf, Reader};
use crate::schema::{
	Action, Array, Enum, LogicalType, Map, PrimitiveKind, Record, RegularType, Schema, SchemaKey,
	SchemaNode, Union, Value,
};
use std::collections::BTreeMap;
use std::io::BufRead;

const OP: &str = "codec";

fn type_mismatch(expected: &str, got: &Value) -> CodecError {
	ErrorKind::SchemaMismatch(format!("expected {expected}, got {}", got.kind_name())).at(OP)
}

/// A [`Schema`] that has been validated and is ready to encode/decode
/// [`Value`]s against
///
/// Build one with [`compile`], or - almost always preferable, since it
/// avoids repeating the validation pass - via [`cache::get_or_compile`].
pub struct Codec {
	schema: Schema,
}

impl Codec {
	/// The schema this codec encodes/decodes against
	pub fn schema(&self) -> &Schema {
		&self.schema
	}

	/// Encode `value` against this codec's root schema into `buf`
	pub fn encode(&self, value: &Value, buf: &mut Buf, config: &Config) -> Result<(), CodecError> {
		self.encode_at(self.schema.root_key(), value, buf, config)
	}

	/// Decode one value of this codec's root schema from `reader`
	pub fn decode<R: BufRead>(&self, reader: &mut Reader<R>, config: &Config) -> Result<Value, CodecError> {
		self.decode_at(self.schema.root_key(), reader, config)
	}

	fn encode_at(
		&self,
		key: SchemaKey,
		value: &Value,
		buf: &mut Buf,
		config: &Config,
	) -> Result<(), CodecError> {
		let node = self.schema.node(key);
		match &node.logical_type {
			Some(logical) => self.encode_logical(node, logical, value, buf, config),
			None => self.encode_regular(&node.type_, value, buf, config),
		}
	}

	fn encode_regular(
		&self,
		type_: &RegularType,
		value: &Value,
		buf: &mut Buf,
		config: &Config,
	) -> Result<(), CodecError> {
		match type_ {
			RegularType::Null => match value {
				Value::Null => Ok(()),
				other => Err(type_mismatch("null", other)),
			},
			RegularType::Boolean => match value {
				Value::Boolean(b) => {
					buf.write_bool(*b);
					Ok(())
				}
				other => Err(type_mismatch("boolean", other)),
			},
			RegularType::Int => match value {
				Value::Int(v) => {
					buf.write_int(*v);
					Ok(())
				}
				other => Err(type_mismatch("int", other)),
			},
			RegularType::Long => match value {
				Value::Long(v) => {
					buf.write_long(*v);
					Ok(())
				}
				Value::Int(v) => {
					buf.write_long(*v as i64);
					Ok(())
				}
				other => Err(type_mismatch("long", other)),
			},
			RegularType::Float => match value {
				Value::Float(v) => {
					buf.write_float(*v);
					Ok(())
				}
				Value::Int(v) => {
					buf.write_float(*v as f32);
					Ok(())
				}
				Value::Long(v) => {
					buf.write_float(*v as f32);
					Ok(())
				}
				other => Err(type_mismatch("float", other)),
			},
			RegularType::Double => match value {
				Value::Double(v) => {
					buf.write_double(*v);
					Ok(())
				}
				Value::Float(v) => {
					buf.write_double(*v as f64);
					Ok(())
				}
				Value::Int(v) => {
					buf.write_double(*v as f64);
					Ok(())
				}
				Value::Long(v) => {
					buf.write_double(*v as f64);
					Ok(())
				}
				other => Err(type_mismatch("double", other)),
			},
			RegularType::Bytes => match value {
				Value::Bytes(b) => {
					buf.write_bytes(b);
					Ok(())
				}
				Value::String(s) => {
					buf.write_bytes(s.as_bytes());
					Ok(())
				}
				other => Err(type_mismatch("bytes", other)),
			},
			RegularType::String => match value {
				Value::String(s) => {
					buf.write_string(s);
					Ok(())
				}
				Value::Bytes(b) => {
					buf.write_bytes(b);
					Ok(())
				}
				other => Err(type_mismatch("string", other)),
			},
			RegularType::Fixed(fixed) => match value {
				Value::Fixed(b) => {
					if b.len() != fixed.size {
						return Err(ErrorKind::SchemaMismatch(format!(
							"fixed({}) value has {} bytes",
							fixed.size,
							b.len()
						))
						.at(OP));
					}
					buf.write_raw(b);
					Ok(())
				}
				other => Err(type_mismatch("fixed", other)),
			},
			RegularType::Enum(e) => match value {
				Value::Enum(name) => {
					let idx = e
						.symbols
						.iter()
						.position(|s| s == name)
						.ok_or_else(|| ErrorKind::SchemaMismatch(format!("unknown enum symbol {name:?}")).at(OP))?;
					buf.write_int(idx as i32);
					Ok(())
				}
				other => Err(type_mismatch("enum", other)),
			},
			RegularType::Array(array) => match value {
				Value::Array(items) => self.encode_array(array, items, buf, config),
				other => Err(type_mismatch("array", other)),
			},
			RegularType::Map(map) => match value {
				Value::Map(entries) => self.encode_map(map, entries, buf, config),
				other => Err(type_mismatch("map", other)),
			},
			RegularType::Record(record) => match value {
				Value::Record(fields) => self.encode_record(record, fields, buf, config),
				other => Err(type_mismatch("record", other)),
			},
			RegularType::Union(union) => self.encode_union(union, value, buf, config),
			RegularType::Ref(target) => self.encode_at(*target, value, buf, config),
		}
	}

	fn encode_logical(
		&self,
		node: &SchemaNode,
		logical: &LogicalType,
		value: &Value,
		buf: &mut Buf,
		config: &Config,
	) -> Result<(), CodecError> {
		match logical {
			LogicalType::Date | LogicalType::TimeMillis => {
				let v = logical::time_like(value)?;
				buf.write_int(v as i32);
				Ok(())
			}
			LogicalType::TimeMicros
			| LogicalType::TimestampMillis
			| LogicalType::TimestampMicros
			| LogicalType::LocalTimestampMillis
			| LogicalType::LocalTimestampMicros => {
				let v = logical::time_like(value)?;
				buf.write_long(v);
				Ok(())
			}
			LogicalType::Decimal { precision, scale } => {
				let decimal = match value {
					Value::Decimal(d) => d,
					other => return Err(type_mismatch("decimal", other)),
				};
				if *precision > 38 {
					return Err(ErrorKind::SchemaMismatch(format!(
						"decimal precision {precision} exceeds supported 38 digits"
					))
					.at(OP));
				}
				logical::check_decimal_precision(decimal, *scale, *precision)?;
				let fixed_size = match &node.type_ {
					RegularType::Fixed(f) => Some(f.size),
					_ => None,
				};
				let bytes = logical::decimal_to_bytes(decimal, *scale, fixed_size)?;
				match fixed_size {
					Some(_) => buf.write_raw(&bytes),
					None => buf.write_bytes(&bytes),
				}
				Ok(())
			}
			LogicalType::Duration => {
				let (months, days, millis) = match value {
					Value::Duration(m, d, ms) => (*m, *d, *ms),
					other => return Err(type_mismatch("duration", other)),
				};
				buf.write_raw(&logical::duration_to_bytes(months, days, millis));
				Ok(())
			}
			LogicalType::Uuid => {
				let s = match value {
					Value::String(s) => s,
					other => return Err(type_mismatch("uuid string", other)),
				};
				logical::validate_uuid(s)?;
				buf.write_string(s);
				Ok(())
			}
			LogicalType::Unknown(_) => self.encode_regular(&node.type_, value, buf, config),
		}
	}

	fn encode_array(
		&self,
		array: &Array,
		items: &[Value],
		buf: &mut Buf,
		config: &Config,
	) -> Result<(), CodecError> {
		for (chunk_idx, chunk) in items.chunks(config.block_length.max(1)).enumerate() {
			let mut scratch = Buf::new();
			for (i, item) in chunk.iter().enumerate() {
				self.encode_at(array.items, item, &mut scratch, config)
					.map_err(|e| e.with_path_context(chunk_idx * config.block_length.max(1) + i))?;
			}
			buf.write_block(chunk.len(), &scratch, !config.disable_block_size_header);
		}
		buf.write_block_terminator();
		Ok(())
	}

	fn encode_map(
		&self,
		map: &Map,
		entries: &BTreeMap<String, Value>,
		buf: &mut Buf,
		config: &Config,
	) -> Result<(), CodecError> {
		let pairs: Vec<_> = entries.iter().collect();
		for chunk in pairs.chunks(config.block_length.max(1)) {
			let mut scratch = Buf::new();
			for (k, v) in chunk {
				scratch.write_string(k);
				self.encode_at(map.values, v, &mut scratch, config)
					.map_err(|e| e.with_path_context(k.as_str()))?;
			}
			buf.write_block(chunk.len(), &scratch, !config.disable_block_size_header);
		}
		buf.write_block_terminator();
		Ok(())
	}

	fn encode_record(
		&self,
		record: &Record,
		fields: &[(String, Value)],
		buf: &mut Buf,
		config: &Config,
	) -> Result<(), CodecError> {
		for field in &record.fields {
			let found = fields.iter().find(|(n, _)| n == &field.name).map(|(_, v)| v);
			match found.or(field.default.as_ref()) {
				Some(v) => self
					.encode_at(field.type_, v, buf, config)
					.map_err(|e| e.with_path_context(&field.name))?,
				None => return Err(ErrorKind::MissingField(field.name.clone()).at(OP)),
			}
		}
		Ok(())
	}

	fn encode_union(
		&self,
		union: &Union,
		value: &Value,
		buf: &mut Buf,
		config: &Config,
	) -> Result<(), CodecError> {
		if let Some((idx, inner)) = value.as_union() {
			let branch = *union
				.variants
				.get(idx)
				.ok_or_else(|| ErrorKind::UnionResolution(format!("branch index {idx} out of range")).at(OP))?;
			buf.write_long(idx as i64);
			return self.encode_at(branch, inner, buf, config);
		}
		for (idx, &branch_key) in union.variants.iter().enumerate() {
			if self.value_matches(branch_key, value) {
				buf.write_long(idx as i64);
				return self.encode_at(branch_key, value, buf, config);
			}
		}
		Err(ErrorKind::UnionResolution(format!(
			"no union branch matches a {} value",
			value.kind_name()
		))
		.at(OP))
	}

	fn value_matches(&self, key: SchemaKey, value: &Value) -> bool {
		let node = self.schema.node(key);
		if let Some(logical) = &node.logical_type {
			return match (logical, value) {
				(LogicalType::Decimal { .. }, Value::Decimal(_)) => true,
				(LogicalType::Duration, Value::Duration(..)) => true,
				(LogicalType::Uuid, Value::String(_)) => true,
				(
					LogicalType::Date
					| LogicalType::TimeMillis
					| LogicalType::TimeMicros
					| LogicalType::TimestampMillis
					| LogicalType::TimestampMicros
					| LogicalType::LocalTimestampMillis
					| LogicalType::LocalTimestampMicros,
					Value::TimeLike(_),
				) => true,
				(LogicalType::Unknown(_), _) => self.regular_matches(&node.type_, value),
				_ => false,
			};
		}
		self.regular_matches(&node.type_, value)
	}

	fn regular_matches(&self, type_: &RegularType, value: &Value) -> bool {
		match (type_, value) {
			(RegularType::Null, Value::Null) => true,
			(RegularType::Boolean, Value::Boolean(_)) => true,
			(RegularType::Int, Value::Int(_)) => true,
			(RegularType::Long, Value::Long(_) | Value::Int(_)) => true,
			(RegularType::Float, Value::Float(_) | Value::Int(_) | Value::Long(_)) => true,
			(RegularType::Double, Value::Double(_) | Value::Float(_) | Value::Int(_) | Value::Long(_)) => true,
			(RegularType::Bytes, Value::Bytes(_) | Value::String(_)) => true,
			(RegularType::String, Value::String(_) | Value::Bytes(_)) => true,
			(RegularType::Fixed(f), Value::Fixed(b)) => b.len() == f.size,
			(RegularType::Enum(e), Value::Enum(name)) => e.symbols.iter().any(|s| s == name),
			(RegularType::Array(_), Value::Array(_)) => true,
			(RegularType::Map(_), Value::Map(_)) => true,
			(RegularType::Record(r), Value::Record(fields)) => r
				.fields
				.iter()
				.all(|f| f.has_default() || fields.iter().any(|(n, _)| n == &f.name)),
			(RegularType::Ref(target), _) => self.value_matches(*target, value),
			_ => false,
		}
	}

	fn decode_at<R: BufRead>(
		&self,
		key: SchemaKey,
		reader: &mut Reader<R>,
		config: &Config,
	) -> Result<Value, CodecError> {
		let node = self.schema.node(key);
		let raw = self.decode_regular(&node.type_, node.encoded_type, reader, config)?;
		match &node.logical_type {
			Some(logical) => self.apply_logical_decode(logical, raw),
			None => Ok(raw),
		}
	}

	fn decode_regular<R: BufRead>(
		&self,
		type_: &RegularType,
		encoded_type: Option<PrimitiveKind>,
		reader: &mut Reader<R>,
		config: &Config,
	) -> Result<Value, CodecError> {
		if let Some(writer_kind) = encoded_type {
			let reader_kind = type_
				.primitive_kind()
				.expect("encoded_type is only ever set on primitive nodes");
			return self.decode_promoted(writer_kind, reader_kind, reader);
		}
		match type_ {
			RegularType::Null => Ok(Value::Null),
			RegularType::Boolean => Ok(Value::Boolean(reader.read_bool()?)),
			RegularType::Int => Ok(Value::Int(reader.read_int()?)),
			RegularType::Long => Ok(Value::Long(reader.read_long()?)),
			RegularType::Float => Ok(Value::Float(reader.read_float()?)),
			RegularType::Double => Ok(Value::Double(reader.read_double()?)),
			RegularType::Bytes => Ok(Value::Bytes(reader.read_bytes()?)),
			RegularType::String => Ok(Value::String(reader.read_string()?)),
			RegularType::Fixed(fixed) => {
				let mut bytes = vec![0u8; fixed.size];
				reader.read(&mut bytes)?;
				Ok(Value::Fixed(bytes))
			}
			RegularType::Enum(e) => self.decode_enum(e, reader),
			RegularType::Array(array) => self.decode_array(array, reader, config),
			RegularType::Map(map) => self.decode_map(map, reader, config),
			RegularType::Record(record) => self.decode_record(record, reader, config),
			RegularType::Union(union) => self.decode_union(union, reader, config),
			RegularType::Ref(target) => self.decode_at(*target, reader, config),
		}
	}

	fn decode_promoted<R: BufRead>(
		&self,
		writer: PrimitiveKind,
		reader_kind: PrimitiveKind,
		reader: &mut Reader<R>,
	) -> Result<Value, CodecError> {
		use PrimitiveKind::*;
		let promote_err = |from: PrimitiveKind, to: PrimitiveKind| {
			ErrorKind::SchemaMismatch(format!("cannot promote {} to {}", from.name(), to.name())).at(OP)
		};
		match writer {
			Int => {
				let v = reader.read_int()?;
				match reader_kind {
					Int => Ok(Value::Int(v)),
					Long => Ok(Value::Long(v as i64)),
					Float => Ok(Value::Float(v as f32)),
					Double => Ok(Value::Double(v as f64)),
					other => Err(promote_err(Int, other)),
				}
			}
			Long => {
				let v = reader.read_long()?;
				match reader_kind {
					Long => Ok(Value::Long(v)),
					Float => Ok(Value::Float(v as f32)),
					Double => Ok(Value::Double(v as f64)),
					other => Err(promote_err(Long, other)),
				}
			}
			Float => {
				let v = reader.read_float()?;
				match reader_kind {
					Float => Ok(Value::Float(v)),
					Double => Ok(Value::Double(v as f64)),
					other => Err(promote_err(Float, other)),
				}
			}
			Bytes => {
				let v = reader.read_bytes()?;
				match reader_kind {
					Bytes => Ok(Value::Bytes(v)),
					String => String::from_utf8(v)
						.map(Value::String)
						.map_err(|e| ErrorKind::InvalidEncoding(e.to_string()).at(OP)),
					other => Err(promote_err(Bytes, other)),
				}
			}
			String => {
				let v = reader.read_string()?;
				match reader_kind {
					String => Ok(Value::String(v)),
					Bytes => Ok(Value::Bytes(v.into_bytes())),
					other => Err(promote_err(String, other)),
				}
			}
			other => Err(promote_err(other, reader_kind)),
		}
	}

	fn decode_enum<R: BufRead>(&self, e: &Enum, reader: &mut Reader<R>) -> Result<Value, CodecError> {
		let idx = reader.read_int()?;
		match &e.encoded_symbols {
			Some(writer_symbols) => {
				let symbol = writer_symbols.get(idx as usize).ok_or_else(|| {
					reader.report_error(
						"decode_enum",
						ErrorKind::UnknownSymbol { index: idx as i64, symbol_count: writer_symbols.len() },
					)
				})?;
				if e.symbols.iter().any(|s| s == symbol) {
					Ok(Value::Enum(symbol.clone()))
				} else if let Some(default) = &e.default {
					Ok(Value::Enum(default.clone()))
				} else {
					Err(ErrorKind::UnknownSymbol { index: idx as i64, symbol_count: e.symbols.len() }.at(OP))
				}
			}
			None => {
				let symbol = e
					.symbols
					.get(idx as usize)
					.ok_or_else(|| ErrorKind::UnknownSymbol { index: idx as i64, symbol_count: e.symbols.len() }.at(OP))?;
				Ok(Value::Enum(symbol.clone()))
			}
		}
	}

	fn decode_array<R: BufRead>(
		&self,
		array: &Array,
		reader: &mut Reader<R>,
		config: &Config,
	) -> Result<Value, CodecError> {
		let mut items = Vec::new();
		let mut index = 0usize;
		loop {
			let header = reader.read_block_header()?;
			if header.is_terminator() {
				break;
			}
			if items.len().saturating_add(header.count) > config.max_slice_alloc_size {
				return Err(reader.report_error(
					"decode_array",
					ErrorKind::LimitExceeded(format!(
						"array would exceed max_slice_alloc_size ({})",
						config.max_slice_alloc_size
					)),
				));
			}
			items.reserve(header.count);
			for _ in 0..header.count {
				let item = self
					.decode_at(array.items, reader, config)
					.map_err(|e| e.with_path_context(index))?;
				items.push(item);
				index += 1;
			}
		}
		Ok(Value::Array(items))
	}

	fn decode_map<R: BufRead>(
		&self,
		map: &Map,
		reader: &mut Reader<R>,
		config: &Config,
	) -> Result<Value, CodecError> {
		let mut entries = BTreeMap::new();
		loop {
			let header = reader.read_block_header()?;
			if header.is_terminator() {
				break;
			}
			if entries.len().saturating_add(header.count) > config.max_slice_alloc_size {
				return Err(reader.report_error(
					"decode_map",
					ErrorKind::LimitExceeded(format!(
						"map would exceed max_slice_alloc_size ({})",
						config.max_slice_alloc_size
					)),
				));
			}
			for _ in 0..header.count {
				let key = reader.read_string()?;
				let value = self
					.decode_at(map.values, reader, config)
					.map_err(|e| e.with_path_context(key.as_str()))?;
				entries.insert(key, value);
			}
		}
		Ok(Value::Map(entries))
	}

	fn decode_record<R: BufRead>(
		&self,
		record: &Record,
		reader: &mut Reader<R>,
		config: &Config,
	) -> Result<Value, CodecError> {
		let mut fields = Vec::with_capacity(record.fields.len());
		for field in &record.fields {
			match field.action {
				Action::Normal => {
					let value = self
						.decode_at(field.type_, reader, config)
						.map_err(|e| e.with_path_context(&field.name))?;
					fields.push((field.name.clone(), value));
				}
				Action::SetDefault => {
					let default = field
						.default
						.clone()
						.ok_or_else(|| ErrorKind::MissingField(field.name.clone()).at(OP))?;
					fields.push((field.name.clone(), default));
				}
				Action::Ignore => {
					skip::skip_value(reader, &self.schema, field.type_)
						.map_err(|e| e.with_path_context(&field.name))?;
				}
			}
		}
		Ok(Value::Record(fields))
	}

	fn decode_union<R: BufRead>(
		&self,
		union: &Union,
		reader: &mut Reader<R>,
		config: &Config,
	) -> Result<Value, CodecError> {
		let idx = reader.read_long()?;
		let branch = union.variants.get(idx as usize).copied().ok_or_else(|| {
			reader.report_error(
				"decode_union",
				ErrorKind::UnionResolution(format!("branch index {idx} out of range")),
			)
		})?;
		let value = self.decode_at(branch, reader, config)?;
		if union.null_and_non_null_variant(self.schema.nodes()).is_some() {
			// The common nullable-union shorthand: no ambiguity possible
			// between `null` and the single other branch, so don't make
			// callers unwrap a `Value::Union` for the common case.
			return Ok(value);
		}
		Ok(Value::Union(idx as usize, Box::new(value)))
	}

	fn apply_logical_decode(&self, logical: &LogicalType, raw: Value) -> Result<Value, CodecError> {
		match logical {
			LogicalType::Date | LogicalType::TimeMillis => match raw {
				Value::Int(v) => Ok(Value::TimeLike(v as i64)),
				other => Ok(other),
			},
			LogicalType::TimeMicros
			| LogicalType::TimestampMillis
			| LogicalType::TimestampMicros
			| LogicalType::LocalTimestampMillis
			| LogicalType::LocalTimestampMicros => match raw {
				Value::Long(v) => Ok(Value::TimeLike(v)),
				other => Ok(other),
			},
			LogicalType::Decimal { scale, .. } => match raw {
				Value::Bytes(b) | Value::Fixed(b) => logical::bytes_to_decimal(&b, *scale).map(Value::Decimal),
				other => Ok(other),
			},
			LogicalType::Duration => match raw {
				Value::Fixed(b) => logical::bytes_to_duration(&b).map(|(m, d, ms)| Value::Duration(m, d, ms)),
				other => Ok(other),
			},
			LogicalType::Uuid => match &raw {
				Value::String(s) => {
					logical::validate_uuid(s)?;
					Ok(raw)
				}
				_ => Ok(raw),
			},
			LogicalType::Unknown(_) => Ok(raw),
		}
	}
}
