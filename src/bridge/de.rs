//! [`Value`] -> `T: DeserializeOwned`
//!
//! Union branches are matched by their schema-declaration index rather than
//! by name (see [`VariantIdxDeserializer`]), the same way a derived enum's
//! field/variant identifier accepts either a name or a position - this is
//! exactly the positional tagging Avro unions already use, so no name
//! lookup table is needed here.

use crate::error::{CodecError, ErrorKind};
use crate::schema::Value;
use serde::de::{self, DeserializeOwned, IntoDeserializer, Visitor};
use std::collections::BTreeMap;
use std::fmt;
use std::vec::IntoIter;

/// Convert a dynamic [`Value`] into a concrete `T`
pub fn value_to_t<T: DeserializeOwned>(value: Value) -> Result<T, CodecError> {
	T::deserialize(ValueDeserializer(value)).map_err(CodecError::from)
}

#[derive(Debug)]
pub struct BridgeDeError(String);
impl fmt::Display for BridgeDeError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
impl std::error::Error for BridgeDeError {}
impl de::Error for BridgeDeError {
	fn custom<T: fmt::Display>(msg: T) -> Self {
		Self(msg.to_string())
	}
}
impl From<BridgeDeError> for CodecError {
	fn from(e: BridgeDeError) -> Self {
		ErrorKind::MarshalerFailure(e.0).at("deserialize")
	}
}

pub struct ValueDeserializer(pub Value);

impl<'de> de::Deserializer<'de> for ValueDeserializer {
	type Error = BridgeDeError;

	fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BridgeDeError> {
		match self.0 {
			Value::Null => visitor.visit_unit(),
			Value::Boolean(b) => visitor.visit_bool(b),
			Value::Int(v) => visitor.visit_i32(v),
			Value::Long(v) => visitor.visit_i64(v),
			Value::Float(v) => visitor.visit_f32(v),
			Value::Double(v) => visitor.visit_f64(v),
			Value::Bytes(b) => visitor.visit_byte_buf(b),
			Value::String(s) => visitor.visit_string(s),
			Value::Fixed(b) => visitor.visit_byte_buf(b),
			Value::Enum(s) => visitor.visit_string(s),
			Value::Array(items) => visitor.visit_seq(SeqAccess { iter: items.into_iter() }),
			Value::Map(entries) => visitor.visit_map(PairAccess::new(entries)),
			Value::Record(fields) => visitor.visit_map(PairAccess::new(fields)),
			Value::Decimal(d) => visitor.visit_string(d.to_string()),
			Value::Duration(months, days, millis) => visitor.visit_seq(SeqAccess {
				iter: vec![Value::Long(months as i64), Value::Long(days as i64), Value::Long(millis as i64)]
					.into_iter(),
			}),
			Value::TimeLike(v) => visitor.visit_i64(v),
			Value::Union(_, inner) => ValueDeserializer(*inner).deserialize_any(visitor),
		}
	}

	fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BridgeDeError> {
		match unwrap_union(self.0) {
			Value::Null => visitor.visit_none(),
			other => visitor.visit_some(ValueDeserializer(other)),
		}
	}

	fn deserialize_enum<V: Visitor<'de>>(
		self,
		_name: &'static str,
		_variants: &'static [&'static str],
		visitor: V,
	) -> Result<V::Value, BridgeDeError> {
		match self.0 {
			Value::Enum(name) => visitor.visit_enum(name.into_deserializer()),
			Value::Union(idx, inner) => visitor.visit_enum(UnionVariantAccess { idx, inner: *inner }),
			Value::String(name) => visitor.visit_enum(name.into_deserializer()),
			other => Err(BridgeDeError(format!("expected enum or union, got {}", other.kind_name()))),
		}
	}

	fn deserialize_struct<V: Visitor<'de>>(
		self,
		_name: &'static str,
		_fields: &'static [&'static str],
		visitor: V,
	) -> Result<V::Value, BridgeDeError> {
		match unwrap_union(self.0) {
			Value::Record(fields) => visitor.visit_map(PairAccess::new(fields)),
			Value::Map(entries) => visitor.visit_map(PairAccess::new(entries)),
			other => Err(BridgeDeError(format!("expected record, got {}", other.kind_name()))),
		}
	}

	fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value, BridgeDeError> {
		visitor.visit_newtype_struct(self)
	}

	serde::forward_to_deserialize_any! {
		bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
		bytes byte_buf unit unit_struct seq tuple
		tuple_struct map identifier ignored_any
	}
}

fn unwrap_union(value: Value) -> Value {
	match value {
		Value::Union(_, inner) => *inner,
		other => other,
	}
}

struct SeqAccess {
	iter: IntoIter<Value>,
}
impl<'de> de::SeqAccess<'de> for SeqAccess {
	type Error = BridgeDeError;
	fn next_element_seed<T: de::DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>, BridgeDeError> {
		match self.iter.next() {
			Some(v) => seed.deserialize(ValueDeserializer(v)).map(Some),
			None => Ok(None),
		}
	}
	fn size_hint(&self) -> Option<usize> {
		Some(self.iter.len())
	}
}

/// Drives [`de::MapAccess`] over anything that iterates `(String, Value)`
/// pairs - both [`Value::Map`] and [`Value::Record`] share this shape.
struct PairAccess<I> {
	iter: I,
	value: Option<Value>,
}
impl PairAccess<std::collections::btree_map::IntoIter<String, Value>> {
	fn new(entries: BTreeMap<String, Value>) -> Self {
		Self { iter: entries.into_iter(), value: None }
	}
}
impl PairAccess<IntoIter<(String, Value)>> {
	fn new(fields: Vec<(String, Value)>) -> Self {
		Self { iter: fields.into_iter(), value: None }
	}
}
impl<'de, I: Iterator<Item = (String, Value)>> de::MapAccess<'de> for PairAccess<I> {
	type Error = BridgeDeError;
	fn next_key_seed<K: de::DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, BridgeDeError> {
		match self.iter.next() {
			Some((k, v)) => {
				self.value = Some(v);
				seed.deserialize(k.into_deserializer()).map(Some)
			}
			None => Ok(None),
		}
	}
	fn next_value_seed<V: de::DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, BridgeDeError> {
		let value = self.value.take().expect("next_value_seed called before next_key_seed");
		seed.deserialize(ValueDeserializer(value))
	}
}

/// Resolves a union branch by its declaration index, not by variant name -
/// see the module docs.
struct UnionVariantAccess {
	idx: usize,
	inner: Value,
}
impl<'de> de::EnumAccess<'de> for UnionVariantAccess {
	type Error = BridgeDeError;
	type Variant = Self;
	fn variant_seed<V: de::DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self), BridgeDeError> {
		let idx = self.idx;
		let value = seed.deserialize(VariantIdxDeserializer(idx as u64))?;
		Ok((value, self))
	}
}
impl<'de> de::VariantAccess<'de> for UnionVariantAccess {
	type Error = BridgeDeError;
	fn unit_variant(self) -> Result<(), BridgeDeError> {
		Ok(())
	}
	fn newtype_variant_seed<T: de::DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value, BridgeDeError> {
		seed.deserialize(ValueDeserializer(self.inner))
	}
	fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, BridgeDeError> {
		match self.inner {
			Value::Array(items) => visitor.visit_seq(SeqAccess { iter: items.into_iter() }),
			other => Err(BridgeDeError(format!("expected tuple variant payload, got {}", other.kind_name()))),
		}
	}
	fn struct_variant<V: Visitor<'de>>(
		self,
		_fields: &'static [&'static str],
		visitor: V,
	) -> Result<V::Value, BridgeDeError> {
		match self.inner {
			Value::Record(fields) => visitor.visit_map(PairAccess::new(fields)),
			other => Err(BridgeDeError(format!("expected struct variant payload, got {}", other.kind_name()))),
		}
	}
}

struct VariantIdxDeserializer(u64);
impl<'de> de::Deserializer<'de> for VariantIdxDeserializer {
	type Error = BridgeDeError;
	fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BridgeDeError> {
		visitor.visit_u64(self.0)
	}
	serde::forward_to_deserialize_any! {
		bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
		bytes byte_buf option unit unit_struct newtype_struct seq tuple
		tuple_struct map struct enum identifier ignored_any
	}
}
