//! Programmatic [`Schema`] construction
//!
//! This is the non-JSON entry point for building schemas: reserve a
//! [`SchemaKey`] for a named/recursive node before its body is known, push
//! nodes, then [`freeze`](SchemaBuilder::freeze). This is the same
//! reserve-then-fill dance the internal JSON parser (`schema::parsing`) uses
//! to support self-referential schemas, just exposed directly.

use super::{Name, Schema, SchemaError, SchemaKey, SchemaNode};

/// Incrementally builds the node arena of a [`Schema`]
#[derive(Default)]
pub struct SchemaBuilder {
	nodes: Vec<SchemaNode>,
}

impl SchemaBuilder {
	/// Start a new, empty builder
	pub fn new() -> Self {
		Self::default()
	}

	/// Push a fully-formed node, returning its key
	pub fn push(&mut self, node: impl Into<SchemaNode>) -> SchemaKey {
		let key = SchemaKey::from_idx(self.nodes.len());
		self.nodes.push(node.into());
		key
	}

	/// Reserve a slot (initially `null`) to be [`fill`](Self::fill)ed in
	/// later, e.g. so a record can be referred to from within its own field
	/// list before its fields are known.
	pub fn reserve(&mut self) -> SchemaKey {
		self.push(super::RegularType::Null)
	}

	/// Fill a previously [`reserve`](Self::reserve)d slot
	pub fn fill(&mut self, key: SchemaKey, node: impl Into<SchemaNode>) {
		self.nodes[key.idx()] = node.into();
	}

	/// Number of nodes pushed so far
	pub fn len(&self) -> usize {
		self.nodes.len()
	}
	/// Whether no node has been pushed yet
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Consume the builder into a [`Schema`], computing its fingerprint
	///
	/// The first node ever pushed (index `0`) becomes the schema's root.
	pub fn freeze(self) -> Result<Schema, SchemaError> {
		Schema::from_nodes(self.nodes)
	}
}

impl Name {
	/// Build a [`Name`] by joining a namespace and a bare name, the way Avro
	/// resolves `"namespace"` + `"name"` schema fields into a fully qualified
	/// name
	pub fn from_namespace_and_name(namespace: Option<&str>, name: &str) -> Self {
		match namespace {
			Some(ns) if !name.contains('.') => Self::new(format!("{ns}.{name}")),
			_ => Self::new(name),
		}
	}
}
