//! Array/map block framing (§4.1, §4.4)

use super::Buf;

/// The header of one array/map block: an item count, and - when the writer
/// chose the size-prefixed form (negative count) - the byte length of the
/// block body, which lets a reader skip the whole block without decoding
/// its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
	pub count: usize,
	pub byte_size: Option<i64>,
}

impl BlockHeader {
	/// The zero-count header that terminates an array/map
	pub fn is_terminator(&self) -> bool {
		self.count == 0
	}
}

/// Append one block's header and body to `out`
///
/// `entries` holds the already-encoded bytes of `count` items. When
/// `size_prefixed` is set the count is written negated, immediately followed
/// by `entries`'s byte length, matching the form Avro readers use to skip
/// blocks whose item schema they don't know how to decode.
pub(super) fn write_block(out: &mut Buf, count: usize, entries: &Buf, size_prefixed: bool) {
	if count == 0 {
		out.write_block_terminator();
		return;
	}
	if size_prefixed {
		out.write_long(-(count as i64));
		out.write_long(entries.len() as i64);
	} else {
		out.write_long(count as i64);
	}
	out.write_raw(entries.as_slice());
}
