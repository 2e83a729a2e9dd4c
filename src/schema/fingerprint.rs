//! Canonical 32-byte schema fingerprint
//!
//! Computed the same way the teacher computes its 8-byte Rabin fingerprint
//! for single-object encoding (canonical form fed byte-by-byte through a
//! [`std::fmt::Write`]-compatible hasher sink) but over SHA-256, to match
//! this core's requirement of a 32-byte canonical fingerprint.

use super::{canonical_form::write_canonical_form, SchemaError, SchemaNode};

use sha2::{Digest, Sha256};
use std::fmt::Write;

struct Sha256Sink(Sha256);
impl Write for Sha256Sink {
	fn write_str(&mut self, s: &str) -> std::fmt::Result {
		self.0.update(s.as_bytes());
		Ok(())
	}
}

pub(super) fn canonical_fingerprint(nodes: &[SchemaNode]) -> Result<[u8; 32], SchemaError> {
	let mut sink = Sha256Sink(Sha256::new());
	write_canonical_form(nodes, 0, &mut sink)?;
	Ok(sink.0.finalize().into())
}

#[cfg(test)]
mod tests {
	use {
		super::*,
		crate::schema::{RegularType, SchemaNode},
	};

	#[test]
	fn null_and_boolean_fingerprints_differ() {
		let null = canonical_fingerprint(&[SchemaNode::new(RegularType::Null)]).unwrap();
		let boolean = canonical_fingerprint(&[SchemaNode::new(RegularType::Boolean)]).unwrap();
		assert_ne!(null, boolean);
	}

	#[test]
	fn fingerprint_is_deterministic() {
		let a = canonical_fingerprint(&[SchemaNode::new(RegularType::Long)]).unwrap();
		let b = canonical_fingerprint(&[SchemaNode::new(RegularType::Long)]).unwrap();
		assert_eq!(a, b);
	}
}
