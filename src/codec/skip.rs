//! Schema-guided skip decoders (§4.8)
//!
//! Consumes one encoded value from a [`Reader`] without materializing it as
//! a [`Value`] - used for a resolved record field marked
//! [`Action::Ignore`](crate::schema::Action) (a field the writer wrote that
//! the reader schema doesn't want), and exposed directly for callers that
//! just want to fast-forward past a value whose schema they know but whose
//! content they don't need.

use crate::error::ErrorKind;
use crate::io::Reader;
use crate::schema::{RegularType, Schema, SchemaKey};
use std::io::BufRead;

/// Skip one encoded value of the schema node at `key`, without decoding it
pub fn skip_value<R: BufRead>(
	reader: &mut Reader<R>,
	schema: &Schema,
	key: SchemaKey,
) -> Result<(), crate::error::CodecError> {
	let node = schema.node(key);
	match &node.type_ {
		RegularType::Null => Ok(()),
		RegularType::Boolean => reader.read_byte().map(|_| ()),
		RegularType::Int => reader.read_int().map(|_| ()),
		RegularType::Long => reader.read_long().map(|_| ()),
		RegularType::Float => reader.read_float().map(|_| ()),
		RegularType::Double => reader.read_double().map(|_| ()),
		RegularType::Bytes | RegularType::String => reader.read_bytes().map(|_| ()),
		RegularType::Fixed(fixed) => reader.skip_n_bytes(fixed.size),
		RegularType::Enum(_) => reader.read_int().map(|_| ()),
		RegularType::Array(array) => skip_block(reader, |r| skip_value(r, schema, array.items)),
		RegularType::Map(map) => skip_block(reader, |r| {
			r.read_string()?;
			skip_value(r, schema, map.values)
		}),
		RegularType::Record(record) => {
			for field in &record.fields {
				skip_value(reader, schema, field.type_)?;
			}
			Ok(())
		}
		RegularType::Union(union) => {
			let idx = reader.read_long()?;
			let branch = union
				.variants
				.get(idx as usize)
				.copied()
				.ok_or_else(|| reader.report_error("skip_value", union_index_error(idx)))?;
			skip_value(reader, schema, branch)
		}
		RegularType::Ref(target) => skip_value(reader, schema, *target),
	}
}

fn union_index_error(idx: i64) -> ErrorKind {
	ErrorKind::InvalidEncoding(format!("union branch index {idx} out of range"))
}

fn skip_block<R: BufRead>(
	reader: &mut Reader<R>,
	mut skip_item: impl FnMut(&mut Reader<R>) -> Result<(), crate::error::CodecError>,
) -> Result<(), crate::error::CodecError> {
	loop {
		let header = reader.read_block_header()?;
		if header.is_terminator() {
			return Ok(());
		}
		if let Some(byte_size) = header.byte_size {
			reader.skip_n_bytes(byte_size as usize)?;
			continue;
		}
		for _ in 0..header.count {
			skip_item(reader)?;
		}
	}
}
