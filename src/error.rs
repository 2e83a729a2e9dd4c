//! Error kinds shared by the binary I/O primitives, the codec compiler and
//! the schema resolver (§7)
//!
//! All of these funnel into the `Reader`/`Writer`'s sticky `error` field
//! (see [`crate::io`]) rather than being threaded as a `Result` through every
//! single primitive call, following the "sticky error" pattern: once a
//! non-EOF error is recorded, every subsequent operation on that `Reader`/
//! `Writer` short-circuits and returns the same error.

/// A single error produced while encoding, decoding, compiling a codec, or
/// resolving a (reader, writer) schema pair
#[derive(Debug, thiserror::Error, Clone)]
#[error("avro: {op}: {kind}")]
pub struct CodecError {
	/// The operation during which the error was produced (e.g. `"read_long"`,
	/// `"compile record field foo"`), used to build the `"avro: <op>: <msg>"`
	/// message shape required by §7.
	pub op: &'static str,
	/// The underlying error kind
	pub kind: ErrorKind,
}

impl CodecError {
	pub fn new(op: &'static str, kind: ErrorKind) -> Self {
		Self { op, kind }
	}

	/// Wrap this error with additional path context, producing the
	/// `"field.name: <inner>"`-shaped messages required when a structural
	/// boundary (record field, map entry, union branch) is crossed
	pub fn with_path_context(self, segment: impl std::fmt::Display) -> Self {
		Self {
			op: self.op,
			kind: ErrorKind::PathContext {
				segment: segment.to_string(),
				inner: Box::new(self.kind),
			},
		}
	}

	/// Whether this is a benign end-of-stream condition (as opposed to a
	/// real malformed-data or mismatch error). Higher layers (e.g. an OCF
	/// framer) may clear a sticky error that is only `Eof`, per §7.
	pub fn is_eof(&self) -> bool {
		matches!(self.kind, ErrorKind::UnexpectedEof)
	}
}

/// The taxonomy of errors defined in §7 of the specification
#[derive(Debug, thiserror::Error, Clone)]
pub enum ErrorKind {
	/// Host type incompatible with the schema at this node
	#[error("schema mismatch: {0}")]
	SchemaMismatch(String),
	/// Malformed bytes on the wire
	#[error("invalid encoding: {0}")]
	InvalidEncoding(String),
	/// Decode would exceed a configured size limit
	#[error("limit exceeded: {0}")]
	LimitExceeded(String),
	/// Enum symbol index out of range
	#[error("unknown symbol index {index} (enum has {symbol_count} symbols)")]
	UnknownSymbol { index: i64, symbol_count: usize },
	/// `Any`-typed union branch unresolvable under the current policy
	#[error("union resolution failed: {0}")]
	UnionResolution(String),
	/// Encoder lacks a required record field with no default
	#[error("missing required field: {0}")]
	MissingField(String),
	/// Encoder cannot traverse a nil mid-chain embedded pointer
	#[error("nil embedded pointer: {0}")]
	NilEmbeddedPointer(String),
	/// A bridging (de)serialization call failed
	#[error("bridge failure: {0}")]
	MarshalerFailure(String),
	/// Stream ended in the middle of a value
	#[error("unexpected end of input")]
	UnexpectedEof,
	/// Wraps an inner error with a path segment (record field name, map key,
	/// array index, ...) for contextual error messages
	#[error("{segment}: {inner}")]
	PathContext {
		segment: String,
		inner: Box<ErrorKind>,
	},
}

impl ErrorKind {
	pub fn at(self, op: &'static str) -> CodecError {
		CodecError::new(op, self)
	}
}
