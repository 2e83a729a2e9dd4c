//! Compiles a [`Schema`] into a [`Codec`], validating the invariants the
//! encode/decode walk relies on so that a malformed schema fails fast at
//! compile time rather than partway through encoding a value (§4.2)
//!
//! Validation is a single pass over the schema's arena, not per-node
//! recursion through [`RegularType::Ref`] back-edges, so a deeply recursive
//! (self-referential) schema compiles in time linear in its node count
//! rather than walking the same cycle repeatedly.

use super::Codec;
use crate::error::{CodecError, ErrorKind};
use crate::schema::{LogicalType, RegularType, Schema, SchemaNode};

const OP: &str = "compile";

/// Validate `schema` and wrap it into a [`Codec`]
///
/// Prefer [`crate::codec::cache::get_or_compile`] over calling this
/// directly in a hot path: this revalidates the whole schema on every call,
/// which the cache avoids for repeat lookups of the same schema.
pub fn compile(schema: &Schema) -> Result<Codec, CodecError> {
	for node in schema.nodes() {
		validate_node(node)?;
	}
	Ok(Codec {
		schema: schema.clone(),
	})
}

fn validate_node(node: &SchemaNode) -> Result<(), CodecError> {
	if let Some(logical) = &node.logical_type {
		validate_logical(node, logical)?;
	}
	if let RegularType::Union(union) = &node.type_ {
		if union.variants.is_empty() {
			return Err(ErrorKind::SchemaMismatch("union must have at least one branch".into()).at(OP));
		}
	}
	Ok(())
}

fn validate_logical(node: &SchemaNode, logical: &LogicalType) -> Result<(), CodecError> {
	match logical {
		LogicalType::Decimal { precision, scale } => {
			if *precision == 0 || *precision > 38 {
				return Err(ErrorKind::SchemaMismatch(format!(
					"decimal precision {precision} must be in 1..=38"
				))
				.at(OP));
			}
			if scale > precision {
				return Err(ErrorKind::SchemaMismatch(format!(
					"decimal scale {scale} exceeds precision {precision}"
				))
				.at(OP));
			}
			match &node.type_ {
				RegularType::Bytes => Ok(()),
				RegularType::Fixed(fixed) => {
					// floor(log10(2^(8*size-1) - 1)) decimal digits fit in `size` bytes
					let max_digits = ((8.0 * fixed.size as f64 - 1.0) * std::f64::consts::LOG10_2).floor() as usize;
					if *precision > max_digits {
						Err(ErrorKind::SchemaMismatch(format!(
							"decimal precision {precision} does not fit in fixed({})",
							fixed.size
						))
						.at(OP))
					} else {
						Ok(())
					}
				}
				other => Err(ErrorKind::SchemaMismatch(format!(
					"decimal logical type on unsupported underlying type {:?}",
					std::mem::discriminant(other)
				))
				.at(OP)),
			}
		}
		LogicalType::Duration => match &node.type_ {
			RegularType::Fixed(fixed) if fixed.size == 12 => Ok(()),
			_ => Err(ErrorKind::SchemaMismatch(
				"duration logical type requires fixed(12)".into(),
			)
			.at(OP)),
		},
		LogicalType::Uuid => match &node.type_ {
			RegularType::String => Ok(()),
			_ => Err(ErrorKind::SchemaMismatch("uuid logical type requires string".into()).at(OP)),
		},
		LogicalType::Date | LogicalType::TimeMillis => match &node.type_ {
			RegularType::Int => Ok(()),
			_ => Err(ErrorKind::SchemaMismatch(format!("{logical:?} requires int")).at(OP)),
		},
		LogicalType::TimeMicros
		| LogicalType::TimestampMillis
		| LogicalType::TimestampMicros
		| LogicalType::LocalTimestampMillis
		| LogicalType::LocalTimestampMicros => match &node.type_ {
			RegularType::Long => Ok(()),
			_ => Err(ErrorKind::SchemaMismatch(format!("{logical:?} requires long")).at(OP)),
		},
		LogicalType::Unknown(_) => Ok(()),
	}
}
