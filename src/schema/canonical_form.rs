//! Writes the [Parsing Canonical Form](https://avro.apache.org/docs/current/specification/#parsing-canonical-form)
//! of a schema, which is what gets fingerprinted.
//!
//! Strictly follows the reference Java implementation in spirit: logical
//! types are stripped (per [AVRO-1721](https://issues.apache.org/jira/browse/AVRO-1721)),
//! named types are written in full only the first time they are encountered
//! and as a bare name thereafter.

use super::{Array, Map, Name, Record, RegularType, SchemaError, SchemaNode, Union};

use std::fmt::Write;

pub(super) fn write_canonical_form(
	nodes: &[SchemaNode],
	root: usize,
	out: &mut dyn Write,
) -> Result<(), SchemaError> {
	let mut state = State {
		named_type_written: vec![false; nodes.len()],
	};
	state.write_node(nodes, root, out)
}

struct State {
	named_type_written: Vec<bool>,
}

impl State {
	fn write_node(
		&mut self,
		nodes: &[SchemaNode],
		idx: usize,
		out: &mut dyn Write,
	) -> Result<(), SchemaError> {
		let node = nodes
			.get(idx)
			.ok_or_else(|| SchemaError::msg("SchemaKey refers to a non-existing node"))?;
		write_io(match &node.type_ {
			RegularType::Null => write!(out, "\"null\""),
			RegularType::Boolean => write!(out, "\"boolean\""),
			RegularType::Int => write!(out, "\"int\""),
			RegularType::Long => write!(out, "\"long\""),
			RegularType::Float => write!(out, "\"float\""),
			RegularType::Double => write!(out, "\"double\""),
			RegularType::Bytes => write!(out, "\"bytes\""),
			RegularType::String => write!(out, "\"string\""),
			RegularType::Ref(key) => return self.write_node(nodes, key.idx(), out),
			RegularType::Array(Array { items }) => {
				write_io(write!(out, "{{\"type\":\"array\",\"items\":"))?;
				self.write_node(nodes, items.idx(), out)?;
				write_io(write!(out, "}}"))
			}
			RegularType::Map(Map { values }) => {
				write_io(write!(out, "{{\"type\":\"map\",\"values\":"))?;
				self.write_node(nodes, values.idx(), out)?;
				write_io(write!(out, "}}"))
			}
			RegularType::Union(Union { variants }) => {
				write_io(write!(out, "["))?;
				for (i, v) in variants.iter().enumerate() {
					if i > 0 {
						write_io(write!(out, ","))?;
					}
					self.write_node(nodes, v.idx(), out)?;
				}
				write_io(write!(out, "]"))
			}
			RegularType::Record(Record { name, fields, .. }) => {
				if !self.first_occurrence(idx, name, out)? {
					return Ok(());
				}
				write_io(write!(
					out,
					"{{\"name\":\"{}\",\"type\":\"record\",\"fields\":[",
					name.fully_qualified_name()
				))?;
				for (i, f) in fields.iter().enumerate() {
					if i > 0 {
						write_io(write!(out, ","))?;
					}
					write_io(write!(out, "{{\"name\":\"{}\",\"type\":", f.name))?;
					self.write_node(nodes, f.type_.idx(), out)?;
					write_io(write!(out, "}}"))?;
				}
				write_io(write!(out, "]}}"))
			}
			RegularType::Enum(e) => {
				if !self.first_occurrence(idx, &e.name, out)? {
					return Ok(());
				}
				write_io(write!(
					out,
					"{{\"name\":\"{}\",\"type\":\"enum\",\"symbols\":[",
					e.name.fully_qualified_name()
				))?;
				for (i, s) in e.symbols.iter().enumerate() {
					if i > 0 {
						write_io(write!(out, ","))?;
					}
					write_io(write!(out, "\"{s}\""))?;
				}
				write_io(write!(out, "]}}"))
			}
			RegularType::Fixed(f) => {
				if !self.first_occurrence(idx, &f.name, out)? {
					return Ok(());
				}
				write_io(write!(
					out,
					"{{\"name\":\"{}\",\"type\":\"fixed\",\"size\":{}}}",
					f.name.fully_qualified_name(),
					f.size
				))
			}
		})
	}

	/// Returns `false` (and writes only the bare name) if this named node was
	/// already written once before.
	fn first_occurrence(
		&mut self,
		idx: usize,
		name: &Name,
		out: &mut dyn Write,
	) -> Result<bool, SchemaError> {
		if std::mem::replace(&mut self.named_type_written[idx], true) {
			write_io(write!(out, "\"{}\"", name.fully_qualified_name()))?;
			Ok(false)
		} else {
			Ok(true)
		}
	}
}

fn write_io(res: std::fmt::Result) -> Result<(), SchemaError> {
	res.map_err(|_| SchemaError::msg("failed to write canonical form"))
}
