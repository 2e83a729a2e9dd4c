//! Reader/writer schema resolution (§4.7)
//!
//! Two entry points: [`compatible`] just answers whether a reader schema can
//! parse data written with a writer schema, and [`resolve`] actually builds
//! the composite schema the codec compiler runs against - the writer's wire
//! layout, annotated with the reader's host shape and an [`Action`] per
//! field telling the decoder whether to read a field normally, skip it
//! (writer-only), or synthesize it from its default (reader-only).
//!
//! Both walks are memoized against the (reader node, writer node) pair they
//! started from, with a sentinel inserted before descending into a pair's
//! body, so mutually recursive named schemas terminate instead of looping
//! forever on their back-edges - the same "defer" trick
//! [`crate::schema::builder::SchemaBuilder`] uses to build such schemas in
//! the first place.

use crate::config::Config;
use crate::schema::{
	Action, Array, Enum, Map, Name, PrimitiveKind, Record, RecordField, RegularType, Schema,
	SchemaError, SchemaKey, SchemaNode, Union,
};
use hashbrown::HashMap;

/// Whether a reader schema can parse data written with a writer schema
pub fn compatible(reader: &Schema, writer: &Schema) -> bool {
	compatible_with(reader, writer, false)
}

fn compatible_with(reader: &Schema, writer: &Schema, partial_unions: bool) -> bool {
	let mut checker = Checker {
		reader: reader.nodes(),
		writer: writer.nodes(),
		memo: HashMap::new(),
		partial_unions,
	};
	checker.check(reader.root_key(), writer.root_key())
}

/// Build the composite schema a codec should compile and run against to
/// decode data written with `writer` into the shape of `reader`
///
/// The result's [`Schema::cache_fingerprint`] differs from its structural
/// [`Schema::fingerprint`] whenever resolution actually did anything beyond
/// reproduce the reader schema verbatim, so that a codec compiled for
/// `resolve(reader, writer)` never aliases, in the codec cache, with one
/// compiled for `reader` read against itself.
pub fn resolve(reader: &Schema, writer: &Schema) -> Result<Schema, SchemaError> {
	resolve_with_config(reader, writer, &Config::default())
}

/// Like [`resolve`], but honoring [`Config::partial_union_type_resolution`]:
/// when set, a reader union need not have a matching branch for every writer
/// union branch, only at least one, and writer branches left unmatched decode
/// to the writer's own shape rather than failing resolution up front.
pub fn resolve_with_config(reader: &Schema, writer: &Schema, config: &Config) -> Result<Schema, SchemaError> {
	let partial_unions = config.partial_union_type_resolution;
	if !compatible_with(reader, writer, partial_unions) {
		return Err(SchemaError::msg(format!(
			"reader schema is not compatible with writer schema: {:?} vs {:?}",
			reader.root().type_,
			writer.root().type_
		)));
	}
	let mut builder = Builder {
		reader: reader.nodes(),
		writer: writer.nodes(),
		out: Vec::new(),
		memo: HashMap::new(),
		partial_unions,
	};
	let root = builder.build(reader.root_key(), writer.root_key())?;
	debug_assert_eq!(root.idx(), 0, "root of resolved schema must be node 0");
	let cache_fingerprint = cache_fingerprint(reader, writer);
	Schema::from_resolved_nodes(builder.out, cache_fingerprint)
}

fn cache_fingerprint(reader: &Schema, writer: &Schema) -> [u8; 32] {
	use sha2::{Digest, Sha256};
	let mut hasher = Sha256::new();
	hasher.update(reader.fingerprint());
	hasher.update(writer.fingerprint());
	hasher.finalize().into()
}

struct Checker<'a> {
	reader: &'a [SchemaNode],
	writer: &'a [SchemaNode],
	memo: HashMap<(usize, usize), bool>,
	partial_unions: bool,
}

impl Checker<'_> {
	fn check(&mut self, reader: SchemaKey, writer: SchemaKey) -> bool {
		let memo_key = (reader.idx(), writer.idx());
		if let Some(&cached) = self.memo.get(&memo_key) {
			return cached;
		}
		// Assume compatible while we recurse, so a cycle through this same
		// pair resolves to "compatible" rather than looping forever; if the
		// body actually isn't, the final `insert` below corrects it for any
		// future (non-recursive) lookup - self-referential schemas are only
		// well-formed if their recursive occurrences are indeed compatible.
		self.memo.insert(memo_key, true);

		let reader_node = &self.reader[reader.idx()];
		let writer_node = resolve_ref(self.writer, writer);
		let writer_key = writer_node.0;
		let writer_node = writer_node.1;

		let result = self.check_nodes(reader, reader_node, writer_key, writer_node);
		self.memo.insert(memo_key, result);
		result
	}

	fn check_nodes(
		&mut self,
		reader_key: SchemaKey,
		reader_node: &SchemaNode,
		writer_key: SchemaKey,
		writer_node: &SchemaNode,
	) -> bool {
		if let RegularType::Ref(target) = reader_node.type_ {
			return self.check(target, writer_key);
		}
		if let RegularType::Union(union) = &reader_node.type_ {
			if !matches!(writer_node.type_, RegularType::Union(_)) {
				return union.variants.iter().any(|&v| self.check(v, writer_key));
			}
		}
		match (&reader_node.type_, &writer_node.type_) {
			(RegularType::Union(r), RegularType::Union(w)) => {
				let mut matched_any = false;
				let all_matched = w.variants.iter().all(|&wv| {
					let matched = r.variants.iter().any(|&rv| self.check(rv, wv));
					matched_any |= matched;
					matched
				});
				if self.partial_unions {
					w.variants.is_empty() || matched_any
				} else {
					all_matched
				}
			}
			(_, RegularType::Union(w)) => w.variants.iter().all(|&wv| self.check(reader_key, wv)),
			(RegularType::Array(r), RegularType::Array(w)) => self.check(r.items, w.items),
			(RegularType::Map(r), RegularType::Map(w)) => self.check(r.values, w.values),
			(RegularType::Enum(r), RegularType::Enum(w)) => names_match(&r.name, &r.aliases, &w.name),
			(RegularType::Fixed(r), RegularType::Fixed(w)) => {
				r.size == w.size && names_match(&r.name, &r.aliases, &w.name)
			}
			(RegularType::Record(r), RegularType::Record(w)) => {
				if !names_match(&r.name, &r.aliases, &w.name) {
					return false;
				}
				r.fields.iter().all(|rf| {
					match find_field(w, rf) {
						Some(wf) => self.check(rf.type_, wf.type_),
						None => rf.has_default(),
					}
				})
			}
			(r, w) => match (r.primitive_kind(), w.primitive_kind()) {
				(Some(rk), Some(wk)) => primitive_promotable(wk, rk),
				_ => false,
			},
		}
	}
}

fn resolve_ref(nodes: &[SchemaNode], key: SchemaKey) -> (SchemaKey, &SchemaNode) {
	match &nodes[key.idx()].type_ {
		RegularType::Ref(target) => resolve_ref(nodes, *target),
		_ => (key, &nodes[key.idx()]),
	}
}

fn names_match(reader_name: &Name, reader_aliases: &[Name], writer_name: &Name) -> bool {
	reader_name == writer_name || reader_aliases.contains(writer_name)
}

fn find_field<'w>(writer: &'w Record, reader_field: &RecordField) -> Option<&'w RecordField> {
	writer.fields.iter().find(|wf| {
		wf.name == reader_field.name || reader_field.aliases.iter().any(|a| a == &wf.name)
	})
}

/// Which writer primitive kinds are promotable to which reader primitive
/// kinds, per the Avro specification's numeric/string promotion table
fn primitive_promotable(writer: PrimitiveKind, reader: PrimitiveKind) -> bool {
	use PrimitiveKind::*;
	if writer == reader {
		return true;
	}
	matches!(
		(writer, reader),
		(Int, Long) | (Int, Float) | (Int, Double)
			| (Long, Float) | (Long, Double)
			| (Float, Double)
			| (String, Bytes) | (Bytes, String)
	)
}

struct Builder<'a> {
	reader: &'a [SchemaNode],
	writer: &'a [SchemaNode],
	out: Vec<SchemaNode>,
	/// Maps a (reader, writer) node pair already built to its key in `out`,
	/// both to dedupe and to break cycles: a pair is inserted here (pointing
	/// at a reserved slot) before its body is built.
	memo: HashMap<(usize, usize), SchemaKey>,
	/// Mirrors [`Config::partial_union_type_resolution`]: when set, a writer
	/// union branch with no matching reader branch is kept as a skip-only
	/// branch (decodes to the writer's own shape) instead of failing to
	/// resolve at all.
	partial_unions: bool,
}

impl Builder<'_> {
	fn push_reserved(&mut self) -> SchemaKey {
		let key = SchemaKey::from_idx(self.out.len());
		self.out.push(SchemaNode::new(RegularType::Null));
		key
	}

	fn build(&mut self, reader: SchemaKey, writer: SchemaKey) -> Result<SchemaKey, SchemaError> {
		let (writer_key, writer_node) = resolve_ref(self.writer, writer);
		let reader_node = &self.reader[reader.idx()];

		if let RegularType::Ref(target) = reader_node.type_ {
			return self.build(target, writer_key);
		}

		let memo_key = (reader.idx(), writer_key.idx());
		if let Some(&key) = self.memo.get(&memo_key) {
			return Ok(key);
		}
		let key = self.push_reserved();
		self.memo.insert(memo_key, key);

		let node = self.build_node(reader_node, writer_node)?;
		self.out[key.idx()] = node;
		Ok(key)
	}

	fn build_node(&mut self, reader: &SchemaNode, writer: &SchemaNode) -> Result<SchemaNode, SchemaError> {
		// A reader union against a non-union writer: resolve against
		// whichever branch matches, the result takes that branch's shape
		// (not wrapped in a union), mirroring `Checker`.
		if let RegularType::Union(union) = &reader.type_ {
			if !matches!(writer.type_, RegularType::Union(_)) {
				for &branch in &union.variants {
					let (_, branch_node) = self.resolved_branch(branch);
					if node_compatible(branch_node, writer) {
						let writer_key_for_branch = self.writer_key_of(writer);
						let sub = self.build(branch, writer_key_for_branch)?;
						return Ok(RegularType::Ref(sub).into());
					}
				}
				return Err(SchemaError::msg("no reader union branch matches writer schema"));
			}
		}

		match (&reader.type_, &writer.type_) {
			(_, RegularType::Union(w)) if !matches!(reader.type_, RegularType::Union(_)) => {
				// Writer is a union, reader is not (e.g. reader narrowed a
				// `["null", "int"]` writer down to plain `int`): the wire
				// still carries the union's branch index, so the resolved
				// node must stay a union whose variants mirror the writer,
				// each individually resolved against the (unchanged) reader.
				let reader_key = self.reader_key_of(reader);
				let mut variants = Vec::with_capacity(w.variants.len());
				for &wv in &w.variants {
					variants.push(self.build(reader_key, wv)?);
				}
				Ok(RegularType::Union(Union { variants }).into())
			}
			(RegularType::Union(r), RegularType::Union(w)) => {
				let mut variants = Vec::with_capacity(w.variants.len());
				for &wv in &w.variants {
					let (_, wv_node) = resolve_ref(self.writer, wv);
					let rv = r.variants.iter().find(|&&rv| {
						let (_, rv_node) = self.resolved_branch(rv);
						node_compatible(rv_node, wv_node)
					});
					match rv {
						Some(&rv) => variants.push(self.build(rv, wv)?),
						None if self.partial_unions => variants.push(self.skip_copy(wv)?),
						None => return Err(SchemaError::msg("no reader union branch matches writer branch")),
					}
				}
				Ok(RegularType::Union(Union { variants }).into())
			}
			(RegularType::Array(r), RegularType::Array(w)) => {
				let items = self.build(r.items, w.items)?;
				Ok(RegularType::Array(Array { items }).into())
			}
			(RegularType::Map(r), RegularType::Map(w)) => {
				let values = self.build(r.values, w.values)?;
				Ok(RegularType::Map(Map { values }).into())
			}
			(RegularType::Enum(r), RegularType::Enum(w)) => {
				let subset = w.symbols.iter().all(|s| r.symbols.contains(s));
				Ok(SchemaNode::new(RegularType::Enum(Enum {
					name: r.name.clone(),
					aliases: r.aliases.clone(),
					symbols: r.symbols.clone(),
					default: r.default.clone(),
					encoded_symbols: if subset { None } else { Some(w.symbols.clone()) },
				})))
			}
			(RegularType::Fixed(r), RegularType::Fixed(_)) => Ok(SchemaNode::new(RegularType::Fixed(r.clone()))),
			(RegularType::Record(r), RegularType::Record(w)) => self.build_record(r, w),
			(reader_type, writer_type) => {
				let reader_kind = reader_type.primitive_kind();
				let writer_kind = writer_type.primitive_kind();
				let mut node = SchemaNode::new(reader_type.clone());
				node.logical_type = reader.logical_type.clone();
				if let (Some(rk), Some(wk)) = (reader_kind, writer_kind) {
					if rk != wk {
						node.encoded_type = Some(wk);
					}
				}
				Ok(node)
			}
		}
	}

	fn build_record(&mut self, reader: &Record, writer: &Record) -> Result<SchemaNode, SchemaError> {
		let mut fields = Vec::with_capacity(writer.fields.len() + reader.fields.len());
		let mut matched_reader_fields = vec![false; reader.fields.len()];

		// Writer's wire order drives the field order: every byte the writer
		// produced must be consumed in the order it was produced.
		for wf in &writer.fields {
			match reader.fields.iter().position(|rf| {
				rf.name == wf.name || wf.aliases.iter().any(|a| a == &rf.name)
			}) {
				Some(idx) => {
					matched_reader_fields[idx] = true;
					let rf = &reader.fields[idx];
					let type_ = self.build(rf.type_, wf.type_)?;
					fields.push(RecordField {
						name: rf.name.clone(),
						aliases: rf.aliases.clone(),
						type_,
						default: rf.default.clone(),
						action: Action::Normal,
					});
				}
				None => {
					// Writer-only field: still has to be consumed from the
					// wire, but contributes nothing to the reader's shape.
					let type_ = self.skip_copy(wf.type_)?;
					fields.push(RecordField {
						name: wf.name.clone(),
						aliases: Vec::new(),
						type_,
						default: None,
						action: Action::Ignore,
					});
				}
			}
		}
		for (idx, rf) in reader.fields.iter().enumerate() {
			if matched_reader_fields[idx] {
				continue;
			}
			// Reader-only field: `compatible` already required it to have a
			// default, nothing is read from the wire for it.
			let type_ = self.copy_reader_subtree(rf.type_)?;
			fields.push(RecordField {
				name: rf.name.clone(),
				aliases: rf.aliases.clone(),
				type_,
				default: rf.default.clone(),
				action: Action::SetDefault,
			});
		}

		Ok(SchemaNode::new(RegularType::Record(Record {
			name: reader.name.clone(),
			aliases: reader.aliases.clone(),
			fields,
		})))
	}

	/// Copy a writer-side subtree verbatim (for a field the reader ignores):
	/// same shape, since it is only ever used to skip bytes on the wire.
	fn skip_copy(&mut self, writer: SchemaKey) -> Result<SchemaKey, SchemaError> {
		let (writer_key, node) = resolve_ref(self.writer, writer);
		let memo_key = (usize::MAX, writer_key.idx());
		if let Some(&key) = self.memo.get(&memo_key) {
			return Ok(key);
		}
		let key = self.push_reserved();
		self.memo.insert(memo_key, key);
		let cloned = match &node.type_ {
			RegularType::Array(a) => RegularType::Array(Array { items: self.skip_copy(a.items)? }),
			RegularType::Map(m) => RegularType::Map(Map { values: self.skip_copy(m.values)? }),
			RegularType::Record(r) => {
				let mut fields = Vec::with_capacity(r.fields.len());
				for f in &r.fields {
					fields.push(RecordField {
						name: f.name.clone(),
						aliases: f.aliases.clone(),
						type_: self.skip_copy(f.type_)?,
						default: f.default.clone(),
						action: Action::Ignore,
					});
				}
				RegularType::Record(Record { name: r.name.clone(), aliases: r.aliases.clone(), fields })
			}
			RegularType::Union(u) => {
				let mut variants = Vec::with_capacity(u.variants.len());
				for &v in &u.variants {
					variants.push(self.skip_copy(v)?);
				}
				RegularType::Union(Union { variants })
			}
			other => other.clone(),
		};
		let mut built = SchemaNode::new(cloned);
		built.logical_type = node.logical_type.clone();
		self.out[key.idx()] = built;
		Ok(key)
	}

	/// Copy a reader-side subtree verbatim (for a reader-only defaulted
	/// field): used only to materialize `SetDefault`, decoded straight from
	/// the stored default, so its exact shape doesn't actually matter to the
	/// decode walk, but the codec compiler still expects every field to
	/// have a `SchemaKey`.
	fn copy_reader_subtree(&mut self, reader: SchemaKey) -> Result<SchemaKey, SchemaError> {
		let node = &self.reader[reader.idx()];
		let memo_key = (reader.idx(), usize::MAX);
		if let Some(&key) = self.memo.get(&memo_key) {
			return Ok(key);
		}
		let key = self.push_reserved();
		self.memo.insert(memo_key, key);
		let node = node.clone();
		self.out[key.idx()] = node;
		Ok(key)
	}

	fn resolved_branch(&self, key: SchemaKey) -> (SchemaKey, &SchemaNode) {
		resolve_ref(self.reader, key)
	}
	fn reader_key_of(&self, node: &SchemaNode) -> SchemaKey {
		find_node_key(self.reader, node)
	}
	fn writer_key_of(&self, node: &SchemaNode) -> SchemaKey {
		find_node_key(self.writer, node)
	}
}

fn find_node_key(nodes: &[SchemaNode], needle: &SchemaNode) -> SchemaKey {
	let needle_ptr = needle as *const SchemaNode;
	for (idx, node) in nodes.iter().enumerate() {
		if std::ptr::eq(node as *const SchemaNode, needle_ptr) {
			return SchemaKey::from_idx(idx);
		}
	}
	unreachable!("node must belong to the slice it was borrowed from")
}

/// A loose structural compatibility check used only to pick a union branch
/// during resolution (not the authoritative check - [`Checker`] is)
fn node_compatible(a: &SchemaNode, b: &SchemaNode) -> bool {
	match (&a.type_, &b.type_) {
		(RegularType::Record(ra), RegularType::Record(rb)) => names_match(&ra.name, &ra.aliases, &rb.name),
		(RegularType::Enum(ea), RegularType::Enum(eb)) => names_match(&ea.name, &ea.aliases, &eb.name),
		(RegularType::Fixed(fa), RegularType::Fixed(fb)) => names_match(&fa.name, &fa.aliases, &fb.name),
		(RegularType::Array(_), RegularType::Array(_)) => true,
		(RegularType::Map(_), RegularType::Map(_)) => true,
		(a, b) => match (a.primitive_kind(), b.primitive_kind()) {
			(Some(ak), Some(bk)) => primitive_promotable(bk, ak),
			_ => false,
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::SchemaBuilder;

	fn primitive(ty: RegularType) -> Schema {
		let mut b = SchemaBuilder::new();
		b.push(ty);
		b.freeze().unwrap()
	}

	#[test]
	fn identical_primitives_compatible() {
		let s = primitive(RegularType::Long);
		assert!(compatible(&s, &s));
	}

	#[test]
	fn int_promotes_to_long() {
		let reader = primitive(RegularType::Long);
		let writer = primitive(RegularType::Int);
		assert!(compatible(&reader, &writer));
		let resolved = resolve(&reader, &writer).unwrap();
		assert_eq!(resolved.node(resolved.root_key()).encoded_type, Some(PrimitiveKind::Int));
	}

	#[test]
	fn long_does_not_demote_to_int() {
		let reader = primitive(RegularType::Int);
		let writer = primitive(RegularType::Long);
		assert!(!compatible(&reader, &writer));
	}

	#[test]
	fn string_bytes_cross_promote() {
		let reader = primitive(RegularType::String);
		let writer = primitive(RegularType::Bytes);
		assert!(compatible(&reader, &writer));
	}

	fn union_of(types: Vec<RegularType>) -> Schema {
		let mut b = SchemaBuilder::new();
		let union_key = b.reserve();
		let variants = types.into_iter().map(|t| b.push(t)).collect();
		b.fill(union_key, RegularType::Union(Union { variants }));
		b.freeze().unwrap()
	}

	#[test]
	fn extra_writer_union_branch_fails_resolution_by_default() {
		let reader = union_of(vec![RegularType::Null, RegularType::Int]);
		let writer = union_of(vec![RegularType::Null, RegularType::Int, RegularType::String]);
		assert!(!compatible(&reader, &writer));
		assert!(resolve(&reader, &writer).is_err());
	}

	#[test]
	fn extra_writer_union_branch_resolves_under_partial_union_resolution() {
		let reader = union_of(vec![RegularType::Null, RegularType::Int]);
		let writer = union_of(vec![RegularType::Null, RegularType::Int, RegularType::String]);
		let config = Config::builder().partial_union_type_resolution(true).build();
		let resolved = resolve_with_config(&reader, &writer, &config).unwrap();
		let RegularType::Union(union) = &resolved.root().type_ else {
			panic!("expected a resolved union root");
		};
		assert_eq!(union.variants.len(), 3, "unmatched branch kept as a skip-only variant");
	}
}
