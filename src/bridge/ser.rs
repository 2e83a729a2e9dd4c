//! `T: Serialize` -> [`Value`]

use crate::error::{CodecError, ErrorKind};
use crate::schema::Value;
use serde::ser::{self, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Convert any `T: Serialize` into a dynamic [`Value`]
pub fn t_to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, CodecError> {
	value.serialize(ValueSerializer).map_err(CodecError::from)
}

#[derive(Debug)]
pub struct BridgeSerError(String);
impl fmt::Display for BridgeSerError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
impl std::error::Error for BridgeSerError {}
impl ser::Error for BridgeSerError {
	fn custom<T: fmt::Display>(msg: T) -> Self {
		Self(msg.to_string())
	}
}
impl From<BridgeSerError> for CodecError {
	fn from(e: BridgeSerError) -> Self {
		ErrorKind::MarshalerFailure(e.0).at("serialize")
	}
}

struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
	type Ok = Value;
	type Error = BridgeSerError;
	type SerializeSeq = SeqSerializer;
	type SerializeTuple = SeqSerializer;
	type SerializeTupleStruct = SeqSerializer;
	type SerializeTupleVariant = TupleVariantSerializer;
	type SerializeMap = MapSerializer;
	type SerializeStruct = StructSerializer;
	type SerializeStructVariant = StructVariantSerializer;

	fn serialize_bool(self, v: bool) -> Result<Value, BridgeSerError> {
		Ok(Value::Boolean(v))
	}
	fn serialize_i8(self, v: i8) -> Result<Value, BridgeSerError> {
		Ok(Value::Int(v as i32))
	}
	fn serialize_i16(self, v: i16) -> Result<Value, BridgeSerError> {
		Ok(Value::Int(v as i32))
	}
	fn serialize_i32(self, v: i32) -> Result<Value, BridgeSerError> {
		Ok(Value::Int(v))
	}
	fn serialize_i64(self, v: i64) -> Result<Value, BridgeSerError> {
		Ok(Value::Long(v))
	}
	fn serialize_u8(self, v: u8) -> Result<Value, BridgeSerError> {
		Ok(Value::Int(v as i32))
	}
	fn serialize_u16(self, v: u16) -> Result<Value, BridgeSerError> {
		Ok(Value::Int(v as i32))
	}
	fn serialize_u32(self, v: u32) -> Result<Value, BridgeSerError> {
		Ok(Value::Long(v as i64))
	}
	fn serialize_u64(self, v: u64) -> Result<Value, BridgeSerError> {
		if v > i64::MAX as u64 {
			return Err(BridgeSerError(format!("u64 {v} overflows avro long")));
		}
		Ok(Value::Long(v as i64))
	}
	fn serialize_f32(self, v: f32) -> Result<Value, BridgeSerError> {
		Ok(Value::Float(v))
	}
	fn serialize_f64(self, v: f64) -> Result<Value, BridgeSerError> {
		Ok(Value::Double(v))
	}
	fn serialize_char(self, v: char) -> Result<Value, BridgeSerError> {
		Ok(Value::String(v.to_string()))
	}
	fn serialize_str(self, v: &str) -> Result<Value, BridgeSerError> {
		Ok(Value::String(v.to_owned()))
	}
	fn serialize_bytes(self, v: &[u8]) -> Result<Value, BridgeSerError> {
		Ok(Value::Bytes(v.to_vec()))
	}
	fn serialize_none(self) -> Result<Value, BridgeSerError> {
		Ok(Value::Null)
	}
	fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Value, BridgeSerError> {
		value.serialize(self)
	}
	fn serialize_unit(self) -> Result<Value, BridgeSerError> {
		Ok(Value::Null)
	}
	fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, BridgeSerError> {
		Ok(Value::Null)
	}
	fn serialize_unit_variant(
		self,
		_name: &'static str,
		_variant_index: u32,
		variant: &'static str,
	) -> Result<Value, BridgeSerError> {
		Ok(Value::Enum(variant.to_owned()))
	}
	fn serialize_newtype_struct<T: ?Sized + Serialize>(
		self,
		_name: &'static str,
		value: &T,
	) -> Result<Value, BridgeSerError> {
		value.serialize(self)
	}
	fn serialize_newtype_variant<T: ?Sized + Serialize>(
		self,
		_name: &'static str,
		variant_index: u32,
		_variant: &'static str,
		value: &T,
	) -> Result<Value, BridgeSerError> {
		Ok(Value::Union(variant_index as usize, Box::new(value.serialize(ValueSerializer)?)))
	}
	fn serialize_seq(self, len: Option<usize>) -> Result<SeqSerializer, BridgeSerError> {
		Ok(SeqSerializer { items: Vec::with_capacity(len.unwrap_or(0)) })
	}
	fn serialize_tuple(self, len: usize) -> Result<SeqSerializer, BridgeSerError> {
		self.serialize_seq(Some(len))
	}
	fn serialize_tuple_struct(
		self,
		_name: &'static str,
		len: usize,
	) -> Result<SeqSerializer, BridgeSerError> {
		self.serialize_seq(Some(len))
	}
	fn serialize_tuple_variant(
		self,
		_name: &'static str,
		variant_index: u32,
		_variant: &'static str,
		len: usize,
	) -> Result<TupleVariantSerializer, BridgeSerError> {
		Ok(TupleVariantSerializer { variant_index, items: Vec::with_capacity(len) })
	}
	fn serialize_map(self, _len: Option<usize>) -> Result<MapSerializer, BridgeSerError> {
		Ok(MapSerializer { entries: BTreeMap::new(), next_key: None })
	}
	fn serialize_struct(
		self,
		_name: &'static str,
		len: usize,
	) -> Result<StructSerializer, BridgeSerError> {
		Ok(StructSerializer { fields: Vec::with_capacity(len) })
	}
	fn serialize_struct_variant(
		self,
		_name: &'static str,
		variant_index: u32,
		_variant: &'static str,
		len: usize,
	) -> Result<StructVariantSerializer, BridgeSerError> {
		Ok(StructVariantSerializer { variant_index, fields: Vec::with_capacity(len) })
	}
}

struct SeqSerializer {
	items: Vec<Value>,
}
impl ser::SerializeSeq for SeqSerializer {
	type Ok = Value;
	type Error = BridgeSerError;
	fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), BridgeSerError> {
		self.items.push(value.serialize(ValueSerializer)?);
		Ok(())
	}
	fn end(self) -> Result<Value, BridgeSerError> {
		Ok(Value::Array(self.items))
	}
}
impl ser::SerializeTuple for SeqSerializer {
	type Ok = Value;
	type Error = BridgeSerError;
	fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), BridgeSerError> {
		ser::SerializeSeq::serialize_element(self, value)
	}
	fn end(self) -> Result<Value, BridgeSerError> {
		ser::SerializeSeq::end(self)
	}
}
impl ser::SerializeTupleStruct for SeqSerializer {
	type Ok = Value;
	type Error = BridgeSerError;
	fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), BridgeSerError> {
		ser::SerializeSeq::serialize_element(self, value)
	}
	fn end(self) -> Result<Value, BridgeSerError> {
		ser::SerializeSeq::end(self)
	}
}

struct TupleVariantSerializer {
	variant_index: u32,
	items: Vec<Value>,
}
impl ser::SerializeTupleVariant for TupleVariantSerializer {
	type Ok = Value;
	type Error = BridgeSerError;
	fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), BridgeSerError> {
		self.items.push(value.serialize(ValueSerializer)?);
		Ok(())
	}
	fn end(self) -> Result<Value, BridgeSerError> {
		Ok(Value::Union(self.variant_index as usize, Box::new(Value::Array(self.items))))
	}
}

struct MapSerializer {
	entries: BTreeMap<String, Value>,
	next_key: Option<String>,
}
impl ser::SerializeMap for MapSerializer {
	type Ok = Value;
	type Error = BridgeSerError;
	fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), BridgeSerError> {
		let key = match key.serialize(ValueSerializer)? {
			Value::String(s) => s,
			other => return Err(BridgeSerError(format!("map key must serialize to a string, got {}", other.kind_name()))),
		};
		self.next_key = Some(key);
		Ok(())
	}
	fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), BridgeSerError> {
		let key = self
			.next_key
			.take()
			.expect("serialize_value called before serialize_key");
		self.entries.insert(key, value.serialize(ValueSerializer)?);
		Ok(())
	}
	fn end(self) -> Result<Value, BridgeSerError> {
		Ok(Value::Map(self.entries))
	}
}

struct StructSerializer {
	fields: Vec<(String, Value)>,
}
impl ser::SerializeStruct for StructSerializer {
	type Ok = Value;
	type Error = BridgeSerError;
	fn serialize_field<T: ?Sized + Serialize>(
		&mut self,
		key: &'static str,
		value: &T,
	) -> Result<(), BridgeSerError> {
		self.fields.push((key.to_owned(), value.serialize(ValueSerializer)?));
		Ok(())
	}
	fn end(self) -> Result<Value, BridgeSerError> {
		Ok(Value::Record(self.fields))
	}
}

struct StructVariantSerializer {
	variant_index: u32,
	fields: Vec<(String, Value)>,
}
impl ser::SerializeStructVariant for StructVariantSerializer {
	type Ok = Value;
	type Error = BridgeSerError;
	fn serialize_field<T: ?Sized + Serialize>(
		&mut self,
		key: &'static str,
		value: &T,
	) -> Result<(), BridgeSerError> {
		self.fields.push((key.to_owned(), value.serialize(ValueSerializer)?));
		Ok(())
	}
	fn end(self) -> Result<Value, BridgeSerError> {
		Ok(Value::Union(self.variant_index as usize, Box::new(Value::Record(self.fields))))
	}
}
