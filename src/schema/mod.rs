//! Navigate, build and parse [`Schema`]
//!
//! A [`Schema`] is an immutable, process-lifetime graph of [`SchemaNode`]s
//! stored in a single arena ([`Schema::nodes`]). References between nodes
//! (array items, map values, union variants, record field types, and named
//! back-references) are expressed as [`SchemaKey`] indices into that arena
//! rather than as native Rust references or raw pointers, so that cyclic
//! (self-referential) schemas - which Avro explicitly allows via named-type
//! back-references - can be represented without `unsafe` code.

mod builder;
mod canonical_form;
pub(crate) mod fingerprint;
mod parsing;
pub mod value;

pub use {builder::SchemaBuilder, error::SchemaError, value::Value};

pub mod error;

use std::sync::Arc;

/// The location of a node in a [`Schema`]
///
/// Can be used to index into [`Schema::nodes`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SchemaKey {
	idx: usize,
}
impl SchemaKey {
	/// Construct a `SchemaKey` from a raw index into [`Schema::nodes`]
	pub const fn from_idx(idx: usize) -> Self {
		Self { idx }
	}
	/// The raw index into [`Schema::nodes`] that this key refers to
	pub const fn idx(self) -> usize {
		self.idx
	}
	/// The key of the root node of any [`Schema`]
	pub const fn root() -> Self {
		Self { idx: 0 }
	}
}

/// A fully built, immutable Avro schema
///
/// Cheaply cloneable (it's an `Arc` around the node arena), because the same
/// `Schema` is typically kept around for the lifetime of the process and
/// shared across threads to drive many encode/decode calls.
#[derive(Clone, Debug)]
pub struct Schema {
	inner: Arc<SchemaInner>,
}

#[derive(Debug)]
struct SchemaInner {
	// First node is always the root.
	nodes: Vec<SchemaNode>,
	fingerprint: [u8; 32],
	cache_fingerprint: [u8; 32],
	json: Option<String>,
}

impl Schema {
	/// All the nodes of this schema, as a flat arena. Index `0` is the root.
	pub fn nodes(&self) -> &[SchemaNode] {
		&self.inner.nodes
	}
	/// The root node of this schema (always at index `0`)
	pub fn root(&self) -> &SchemaNode {
		&self.inner.nodes[0]
	}
	/// The [`SchemaKey`] of the root node
	pub fn root_key(&self) -> SchemaKey {
		SchemaKey::root()
	}
	/// Fetch a node by key, panicking if the key is out of range
	///
	/// Keys obtained from this same `Schema` are always in range; this can
	/// only panic if a `SchemaKey` from a different `Schema` is used here.
	pub fn node(&self, key: SchemaKey) -> &SchemaNode {
		&self.inner.nodes[key.idx]
	}
	/// The 32-byte canonical fingerprint of this schema
	///
	/// Stable for the lifetime of the `Schema` (and deterministic given the
	/// same structural schema), used to identify this schema's *structure*
	/// independently of any writer-schema resolution that may have produced
	/// it (for that, see [`Self::cache_fingerprint`]).
	pub fn fingerprint(&self) -> &[u8; 32] {
		&self.inner.fingerprint
	}
	/// The fingerprint used as the codec cache key component for this schema
	///
	/// Equal to [`Self::fingerprint`] for schemas that were not produced by
	/// [resolution](crate::resolve::resolve), and distinct from it otherwise,
	/// so that codecs compiled for a resolved schema never alias with codecs
	/// compiled for the same reader schema used unresolved.
	pub fn cache_fingerprint(&self) -> &[u8; 32] {
		&self.inner.cache_fingerprint
	}
	/// The JSON this schema was parsed from, if it was parsed from JSON
	/// (schemas built programmatically via [`SchemaBuilder`] or produced by
	/// [resolution](crate::resolve::resolve) do not carry this)
	pub fn json(&self) -> Option<&str> {
		self.inner.json.as_deref()
	}

	pub(crate) fn from_nodes_with_json(
		nodes: Vec<SchemaNode>,
		json: Option<String>,
	) -> Result<Self, SchemaError> {
		if nodes.is_empty() {
			return Err(SchemaError::msg("a schema must have at least one node"));
		}
		let fingerprint = fingerprint::canonical_fingerprint(&nodes)?;
		Ok(Self {
			inner: Arc::new(SchemaInner {
				nodes,
				cache_fingerprint: fingerprint,
				fingerprint,
				json,
			}),
		})
	}

	/// Build a `Schema` straight from an arena of nodes, computing its
	/// fingerprint from the canonical form of the schema
	pub fn from_nodes(nodes: Vec<SchemaNode>) -> Result<Self, SchemaError> {
		Self::from_nodes_with_json(nodes, None)
	}

	/// Used by the resolver: same nodes, but an already-computed
	/// `cache_fingerprint` that differs from the structural fingerprint,
	/// reflecting writer-schema resolution state.
	pub(crate) fn from_resolved_nodes(
		nodes: Vec<SchemaNode>,
		cache_fingerprint: [u8; 32],
	) -> Result<Self, SchemaError> {
		let fingerprint = fingerprint::canonical_fingerprint(&nodes)?;
		Ok(Self {
			inner: Arc::new(SchemaInner {
				nodes,
				fingerprint,
				cache_fingerprint,
				json: None,
			}),
		})
	}
}

impl std::str::FromStr for Schema {
	type Err = SchemaError;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		parsing::parse(s)
	}
}

/// A node of an [`Schema`], stored in its arena ([`Schema::nodes`])
///
/// More information about Avro schemas can be found in the
/// [Avro Specification](https://avro.apache.org/docs/current/specification/).
#[derive(Clone, Debug)]
pub struct SchemaNode {
	/// The underlying regular (non-logical) type of this node
	pub type_: RegularType,
	/// Logical type annotation carried by this node, if any
	pub logical_type: Option<LogicalType>,
	/// Set only on primitive nodes (`Int`/`Long`/`Float`/`Double`/`Bytes`/`String`)
	/// that are the result of [resolution](crate::resolve::resolve) against a
	/// writer schema whose primitive kind differs from this (reader) node's
	/// kind. The codec compiler uses this to read the *writer's* wire format
	/// and numerically promote it to this node's kind.
	pub encoded_type: Option<PrimitiveKind>,
}
impl SchemaNode {
	/// Build a new node with no logical type and no promotion marker
	pub fn new(type_: RegularType) -> Self {
		type_.into()
	}
	/// Build a new node carrying a logical type annotation
	pub fn with_logical_type(type_: RegularType, logical_type: LogicalType) -> Self {
		Self {
			type_,
			logical_type: Some(logical_type),
			encoded_type: None,
		}
	}
}
impl From<RegularType> for SchemaNode {
	fn from(type_: RegularType) -> Self {
		Self {
			type_,
			logical_type: None,
			encoded_type: None,
		}
	}
}

/// The non-logical-type identity of a [`SchemaNode`]
#[derive(Clone, Debug)]
pub enum RegularType {
	/// `null`
	Null,
	/// `boolean`
	Boolean,
	/// `int`
	Int,
	/// `long`
	Long,
	/// `float`
	Float,
	/// `double`
	Double,
	/// `bytes`
	Bytes,
	/// `string`
	String,
	/// `array`
	Array(Array),
	/// `map` (Avro maps always have string keys)
	Map(Map),
	/// `union`
	Union(Union),
	/// `record`
	Record(Record),
	/// `enum`
	Enum(Enum),
	/// `fixed`
	Fixed(Fixed),
	/// A back-reference to a previously-registered named type (`record`,
	/// `enum` or `fixed`), by [`SchemaKey`].
	///
	/// This is how self-referential / mutually-recursive schemas are
	/// represented: the named type reserves its `SchemaKey` before its body
	/// (e.g. a record's fields) is parsed, so a field can refer back to it
	/// (or to an enclosing type) via `Ref` before that key's node is filled
	/// in.
	Ref(SchemaKey),
}
impl RegularType {
	/// The [`PrimitiveKind`] of this type, if it is a primitive
	pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
		Some(match self {
			RegularType::Null => PrimitiveKind::Null,
			RegularType::Boolean => PrimitiveKind::Boolean,
			RegularType::Int => PrimitiveKind::Int,
			RegularType::Long => PrimitiveKind::Long,
			RegularType::Float => PrimitiveKind::Float,
			RegularType::Double => PrimitiveKind::Double,
			RegularType::Bytes => PrimitiveKind::Bytes,
			RegularType::String => PrimitiveKind::String,
			_ => return None,
		})
	}
}

/// The primitive kind of a schema node, used both for `encoded_type`
/// promotion markers and as the tagged-map union branch discriminant for
/// non-named types
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PrimitiveKind {
	Null,
	Boolean,
	Int,
	Long,
	Float,
	Double,
	Bytes,
	String,
}
impl PrimitiveKind {
	/// Lowercase Avro type name, as used in schema JSON and in
	/// `unionResolutionName`s
	pub fn name(self) -> &'static str {
		match self {
			PrimitiveKind::Null => "null",
			PrimitiveKind::Boolean => "boolean",
			PrimitiveKind::Int => "int",
			PrimitiveKind::Long => "long",
			PrimitiveKind::Float => "float",
			PrimitiveKind::Double => "double",
			PrimitiveKind::Bytes => "bytes",
			PrimitiveKind::String => "string",
		}
	}
}

/// `array` schema component
#[derive(Clone, Debug)]
pub struct Array {
	/// Key of the schema of each element in the array
	pub items: SchemaKey,
}

/// `map` schema component (Avro map keys are always strings)
#[derive(Clone, Debug)]
pub struct Map {
	/// Key of the schema of each value in the map
	pub values: SchemaKey,
}

/// `union` schema component
#[derive(Clone, Debug)]
pub struct Union {
	/// Keys of the schemas of each branch of the union, in declaration order
	pub variants: Vec<SchemaKey>,
}
impl Union {
	/// For the common `["null", T]` / `[T, "null"]` nullable-union shape,
	/// returns `(null_variant_index, non_null_variant_index)`
	pub fn null_and_non_null_variant(&self, schema: &[SchemaNode]) -> Option<(usize, usize)> {
		if self.variants.len() != 2 {
			return None;
		}
		let is_null = |key: SchemaKey| matches!(schema[key.idx()].type_, RegularType::Null);
		match (is_null(self.variants[0]), is_null(self.variants[1])) {
			(true, false) => Some((0, 1)),
			(false, true) => Some((1, 0)),
			_ => None,
		}
	}
}

/// Fully qualified name of a named type (`record`, `enum`, `fixed`)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Name {
	fully_qualified: String,
}
impl Name {
	/// Build a `Name` from an already-fully-qualified name (`namespace.name`,
	/// or just `name` if there is no namespace)
	pub fn new(fully_qualified: impl Into<String>) -> Self {
		Self {
			fully_qualified: fully_qualified.into(),
		}
	}
	/// The fully qualified name, e.g. `"com.acme.Foo"`
	pub fn fully_qualified_name(&self) -> &str {
		&self.fully_qualified
	}
}

/// Per-field resolution action, set by [resolution](crate::resolve::resolve)
///
/// On a schema that was never resolved against a writer schema, every field
/// has action [`Action::Normal`].
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum Action {
	/// Decode this field normally, from the wire
	#[default]
	Normal,
	/// This field only exists in the reader schema: don't read anything from
	/// the wire, materialize the field's stored default value instead
	SetDefault,
	/// This field only exists in the writer schema: consume (skip) its bytes
	/// from the wire without storing them anywhere
	Ignore,
}

/// `record` schema component
#[derive(Clone, Debug)]
pub struct Record {
	/// Fully qualified name of the record
	pub name: Name,
	/// Aliases (fully qualified) that a writer schema may use to refer to
	/// this same record for the purposes of schema resolution
	pub aliases: Vec<Name>,
	/// Fields, in schema (wire) order
	pub fields: Vec<RecordField>,
}

/// A single field of a [`Record`]
#[derive(Clone, Debug)]
pub struct RecordField {
	/// Field name
	pub name: String,
	/// Aliases that a writer schema's field may use to match this field
	/// during resolution
	pub aliases: Vec<String>,
	/// Key of this field's type
	pub type_: SchemaKey,
	/// Default value for this field, if any was declared in the schema.
	/// Stored as an already-decoded dynamic [`Value`] (decoded once, from the
	/// schema's JSON default, at schema-build time).
	pub default: Option<Value>,
	/// What to do with this field when decoding against this schema: read it
	/// normally, skip it (writer-only field), or set it from `default`
	/// (reader-only field). [`Action::Normal`] unless this schema is the
	/// result of [resolution](crate::resolve::resolve).
	pub action: Action,
}
impl RecordField {
	/// Whether this field has a declared default value
	pub fn has_default(&self) -> bool {
		self.default.is_some()
	}
}

/// `enum` schema component
#[derive(Clone, Debug)]
pub struct Enum {
	/// Fully qualified name of the enum
	pub name: Name,
	/// Aliases for resolution purposes
	pub aliases: Vec<Name>,
	/// Symbols, in declaration order (this order is the wire order: a
	/// symbol's wire representation is its index in this `Vec`, *before* any
	/// resolution - see `encoded_symbols`)
	pub symbols: Vec<String>,
	/// Default symbol, used when resolution encounters a writer symbol that
	/// has no match in `symbols`
	pub default: Option<String>,
	/// Set only by [resolution](crate::resolve::resolve), when the writer's
	/// symbol table is not a subset of this (reader) enum's symbols: holds
	/// the writer's symbol order, so the codec can decode the writer's
	/// on-wire index against the writer's symbols (falling back to
	/// `default` for indices with no match in `symbols`) rather than this
	/// enum's own `symbols`.
	pub encoded_symbols: Option<Vec<String>>,
}

/// `fixed` schema component
#[derive(Clone, Debug)]
pub struct Fixed {
	/// Fully qualified name of the fixed type
	pub name: Name,
	/// Aliases for resolution purposes
	pub aliases: Vec<Name>,
	/// Size in bytes
	pub size: usize,
}

/// Logical type annotation on a primitive or `fixed` node
#[derive(Clone, Debug, PartialEq)]
pub enum LogicalType {
	/// `int` + `date`: days since the Unix epoch
	Date,
	/// `int` + `time-millis`: milliseconds after midnight
	TimeMillis,
	/// `long` + `time-micros`: microseconds after midnight
	TimeMicros,
	/// `long` + `timestamp-millis`: milliseconds since the Unix epoch, UTC
	TimestampMillis,
	/// `long` + `timestamp-micros`: microseconds since the Unix epoch, UTC
	TimestampMicros,
	/// `long` + `local-timestamp-millis`: milliseconds since the Unix epoch,
	/// interpreted in the process's local timezone
	LocalTimestampMillis,
	/// `long` + `local-timestamp-micros`: same, microsecond precision
	LocalTimestampMicros,
	/// `bytes`/`fixed` + `decimal`: arbitrary precision decimal
	Decimal {
		/// Total number of significant decimal digits
		precision: usize,
		/// Number of digits to the right of the decimal point
		scale: usize,
	},
	/// `fixed(12)` + `duration`: months/days/milliseconds triple
	Duration,
	/// `string`/`fixed(16)` + `uuid`
	Uuid,
	/// Any `logicalType` this implementation does not know about. Per the
	/// Avro specification, an unrecognized logical type annotation must be
	/// ignored and the node treated as its underlying regular type.
	Unknown(String),
}
