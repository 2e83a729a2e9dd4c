//! The canonical dynamic host representation that the codec compiler targets
//!
//! Per the "dynamic-typed host values" design note: rather than generating a
//! codec per concrete Rust type via unsafe reflection (not available in Rust)
//! or via a giant hand-written trait-per-shape hierarchy, the codec compiler
//! (see [`crate::codec`]) compiles schema nodes against this single dynamic
//! tagged-variant type. Concrete Rust types are bridged to/from `Value` via
//! `serde` (see [`crate::bridge`]), which is a zero-cost, monomorphized
//! conversion - so the only part that needs runtime compilation and caching
//! is the schema-to-`Value` codec, which is exactly what [`crate::codec::cache`]
//! caches.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Dynamic Avro value
///
/// This is also the representation used for decoded schema default values
/// ([`crate::schema::RecordField::default`]) and for the "tagged map"/"Any"
/// union representations described in the union codec design (§4.4 modes 3
/// and 4).
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
	Null,
	Boolean(bool),
	Int(i32),
	Long(i64),
	Float(f32),
	Double(f64),
	Bytes(Vec<u8>),
	String(String),
	/// Decoded `fixed` value: always exactly the schema's declared size
	Fixed(Vec<u8>),
	/// Decoded `enum` value: the chosen symbol name
	Enum(String),
	Array(Vec<Value>),
	/// Avro map (string-keyed). `BTreeMap` for deterministic iteration order,
	/// which matters for round-trip tests and for the tagged-map union
	/// representation.
	Map(BTreeMap<String, Value>),
	/// Decoded record: fields in schema order, paired with their name for
	/// the map-shaped record host policy (§4.3)
	Record(Vec<(String, Value)>),
	/// Decoded `decimal` logical value
	Decimal(Decimal),
	/// Decoded `duration` logical value: (months, days, milliseconds)
	Duration(u32, u32, u32),
	/// Decoded date/time/timestamp logical value, expressed uniformly as a
	/// signed count of the logical type's natural unit since the epoch (days
	/// for `Date`, milliseconds-of-day for `TimeMillis`, ...). Interpreting
	/// this back into a concrete unit is the job of the call site, which
	/// knows which [`crate::schema::LogicalType`] produced it.
	TimeLike(i64),
	/// An explicitly tagged union value: the chosen branch's index (in
	/// schema declaration order) and its value. Carrying the branch index
	/// here - rather than leaving union branch selection to be inferred
	/// structurally from the inner value's shape - is what lets two
	/// same-shaped branches (e.g. two different records) in the same union
	/// be told apart without guessing; see §4.4's tagged-map union mode.
	Union(usize, Box<Value>),
}

impl Value {
	/// Name used for this value's shape as an avro "kind" name, for error
	/// messages
	pub fn kind_name(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Boolean(_) => "boolean",
			Value::Int(_) => "int",
			Value::Long(_) => "long",
			Value::Float(_) => "float",
			Value::Double(_) => "double",
			Value::Bytes(_) => "bytes",
			Value::String(_) => "string",
			Value::Fixed(_) => "fixed",
			Value::Enum(_) => "enum",
			Value::Array(_) => "array",
			Value::Map(_) => "map",
			Value::Record(_) => "record",
			Value::Decimal(_) => "decimal",
			Value::Duration(..) => "duration",
			Value::TimeLike(_) => "time-like",
			Value::Union(..) => "union",
		}
	}

	/// Shortcut for building a record field lookup
	pub fn record_field(&self, name: &str) -> Option<&Value> {
		match self {
			Value::Record(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
			_ => None,
		}
	}

	/// View this value as an explicitly tagged union branch, if it is one
	pub fn as_union(&self) -> Option<(usize, &Value)> {
		match self {
			Value::Union(idx, inner) => Some((*idx, inner)),
			_ => None,
		}
	}

	/// The value a union branch should be matched against: unwraps one level
	/// of [`Value::Union`] tagging, or returns `self` unchanged for an
	/// untagged value (structural matching then applies, see
	/// [`crate::codec`]).
	pub fn untag(&self) -> &Value {
		match self {
			Value::Union(_, inner) => inner,
			other => other,
		}
	}
}

impl From<()> for Value {
	fn from(_: ()) -> Self {
		Value::Null
	}
}
macro_rules! from_impls {
	($($ty:ty => $variant:ident $(as $as_ty:ty)?),* $(,)?) => {
		$(
			impl From<$ty> for Value {
				fn from(v: $ty) -> Self {
					Value::$variant(v $(as $as_ty)?)
				}
			}
		)*
	};
}
from_impls! {
	bool => Boolean,
	i32 => Int,
	i64 => Long,
	f32 => Float,
	f64 => Double,
	Vec<u8> => Bytes,
	String => String,
}
