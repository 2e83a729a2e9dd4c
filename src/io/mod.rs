//! Binary I/O primitives (§4.1)
//!
//! [`Reader`] and [`Writer`] implement the Avro binary encoding bit-for-bit:
//! zig-zag varints (delegated to the `integer-encoding` crate, exactly the
//! crate the teacher depends on for this), IEEE-754 little-endian floats,
//! length-prefixed bytes/strings, array/map block framing, and schema-guided
//! skipping.
//!
//! Both carry a "sticky" error: once a non-EOF error is recorded, every
//! subsequent operation on the same instance short-circuits and returns that
//! same error without touching the underlying stream again.

mod block;

pub use block::BlockHeader;

use crate::error::{CodecError, ErrorKind};

use integer_encoding::{VarInt, VarIntReader, VarIntWriter};
use std::io::{BufRead, Write};

/// Reads the Avro binary encoding from any `impl BufRead`
///
/// Wrap a plain `impl Read` in a [`std::io::BufReader`] first; `Reader`
/// relies on `BufRead` for its own buffering rather than re-implementing one,
/// using a small reusable scratch slab only for values that straddle a
/// buffer refill boundary.
pub struct Reader<R> {
	inner: R,
	/// Reused across reads for values that don't fit in the current
	/// `fill_buf` window. Spec default cap: 1 KiB before a fresh allocation
	/// is used instead (this is just an optimization, not a correctness
	/// limit).
	scratch: Vec<u8>,
	error: Option<CodecError>,
	pub max_byte_slice_size: usize,
	pub max_slice_alloc_size: usize,
}

const SCRATCH_SLAB_CAP: usize = 1024;

impl<R: BufRead> Reader<R> {
	/// Build a `Reader` around `inner`, with the size limits from `config`
	pub fn new(inner: R, config: &crate::config::Config) -> Self {
		Self {
			inner,
			scratch: Vec::new(),
			error: None,
			max_byte_slice_size: config.max_byte_slice_size,
			max_slice_alloc_size: config.max_slice_alloc_size,
		}
	}

	/// The first error recorded on this reader, if any
	pub fn error(&self) -> Option<&CodecError> {
		self.error.as_ref()
	}

	fn check(&self) -> Result<(), CodecError> {
		match &self.error {
			Some(e) if !e.is_eof() => Err(e.clone()),
			_ => Ok(()),
		}
	}

	/// Record an error on this reader, per the sticky-error rules of §7:
	/// the first non-EOF error wins and is never overwritten; recording is
	/// idempotent once a non-EOF error is present.
	pub fn report_error(&mut self, op: &'static str, kind: ErrorKind) -> CodecError {
		let err = CodecError::new(op, kind);
		match &self.error {
			None => self.error = Some(err.clone()),
			Some(existing) if existing.is_eof() && !err.is_eof() => self.error = Some(err.clone()),
			_ => {}
		}
		err
	}

	fn io_err(&mut self, op: &'static str, e: std::io::Error) -> CodecError {
		let kind = if e.kind() == std::io::ErrorKind::UnexpectedEof {
			ErrorKind::UnexpectedEof
		} else {
			ErrorKind::InvalidEncoding(e.to_string())
		};
		self.report_error(op, kind)
	}

	/// Peek at the next byte without consuming it
	pub fn peek(&mut self) -> Result<u8, CodecError> {
		self.check()?;
		match self.inner.fill_buf() {
			Ok(buf) if !buf.is_empty() => Ok(buf[0]),
			Ok(_) => Err(self.report_error("peek", ErrorKind::UnexpectedEof)),
			Err(e) => Err(self.io_err("peek", e)),
		}
	}

	/// Read and consume a single byte
	pub fn read_byte(&mut self) -> Result<u8, CodecError> {
		self.check()?;
		let b = self.peek()?;
		self.inner.consume(1);
		Ok(b)
	}

	/// Read exactly `buf.len()` bytes
	pub fn read(&mut self, buf: &mut [u8]) -> Result<(), CodecError> {
		self.check()?;
		use std::io::Read;
		self.inner
			.read_exact(buf)
			.map_err(|e| self.io_err("read", e))
	}

	/// Read a zig-zag varint-encoded `int` (32-bit)
	pub fn read_int(&mut self) -> Result<i32, CodecError> {
		self.check()?;
		self.read_varint("read_int")
	}

	/// Read a zig-zag varint-encoded `long` (64-bit)
	pub fn read_long(&mut self) -> Result<i64, CodecError> {
		self.check()?;
		self.read_varint("read_long")
	}

	fn read_varint<I: VarInt>(&mut self, op: &'static str) -> Result<I, CodecError> {
		match self.inner.fill_buf() {
			Ok(buf) if !buf.is_empty() => match I::decode_var(buf) {
				Some((val, read)) => {
					self.inner.consume(read);
					Ok(val)
				}
				// Straddles the current buffer window: fall back to the
				// (slower) byte-by-byte reader from `integer-encoding`, which
				// reads straight off the underlying `Read` impl.
				None => {
					let val = self.inner.read_varint().map_err(|e| self.io_err(op, e))?;
					Ok(val)
				}
			},
			Ok(_) => Err(self.report_error(op, ErrorKind::UnexpectedEof)),
			Err(e) => Err(self.io_err(op, e)),
		}
	}

	/// Read a `float` (IEEE-754 binary32, little-endian)
	pub fn read_float(&mut self) -> Result<f32, CodecError> {
		self.check()?;
		let mut buf = [0u8; 4];
		self.read(&mut buf)?;
		Ok(f32::from_le_bytes(buf))
	}

	/// Read a `double` (IEEE-754 binary64, little-endian)
	pub fn read_double(&mut self) -> Result<f64, CodecError> {
		self.check()?;
		let mut buf = [0u8; 8];
		self.read(&mut buf)?;
		Ok(f64::from_le_bytes(buf))
	}

	/// Read a `boolean`: exactly one byte, `0x00`/`0x01`
	pub fn read_bool(&mut self) -> Result<bool, CodecError> {
		self.check()?;
		match self.read_byte()? {
			0 => Ok(false),
			1 => Ok(true),
			other => Err(self.report_error(
				"read_bool",
				ErrorKind::InvalidEncoding(format!("invalid boolean byte {other:#x}")),
			)),
		}
	}

	fn checked_len(&mut self, op: &'static str) -> Result<usize, CodecError> {
		let len = self.read_long()?;
		if len < 0 {
			return Err(self.report_error(
				op,
				ErrorKind::InvalidEncoding(format!("negative length {len}")),
			));
		}
		let len = len as usize;
		if len > self.max_byte_slice_size {
			return Err(self.report_error(
				op,
				ErrorKind::LimitExceeded(format!(
					"length {len} exceeds max_byte_slice_size ({})",
					self.max_byte_slice_size
				)),
			));
		}
		Ok(len)
	}

	/// Read a `bytes` value: a `long` length followed by that many raw bytes
	pub fn read_bytes(&mut self) -> Result<Vec<u8>, CodecError> {
		self.check()?;
		let len = self.checked_len("read_bytes")?;
		let mut out = vec![0u8; len];
		self.read(&mut out)?;
		Ok(out)
	}

	/// Read a `string` value: a `long` length followed by that many UTF-8 bytes
	pub fn read_string(&mut self) -> Result<String, CodecError> {
		self.check()?;
		let bytes = self.read_bytes()?;
		String::from_utf8(bytes)
			.map_err(|e| self.report_error("read_string", ErrorKind::InvalidEncoding(e.to_string())))
	}

	/// Read a block header for an array/map: a `long` count, and if negative,
	/// a following byte-size `long` (see §4.1)
	pub fn read_block_header(&mut self) -> Result<BlockHeader, CodecError> {
		self.check()?;
		let raw_count = self.read_long()?;
		if raw_count == 0 {
			return Ok(BlockHeader { count: 0, byte_size: None });
		}
		if raw_count < 0 {
			let byte_size = self.read_long()?;
			Ok(BlockHeader {
				count: raw_count.unsigned_abs() as usize,
				byte_size: Some(byte_size),
			})
		} else {
			Ok(BlockHeader { count: raw_count as usize, byte_size: None })
		}
	}

	/// Skip `n` bytes without materializing them
	pub fn skip_n_bytes(&mut self, mut n: usize) -> Result<(), CodecError> {
		self.check()?;
		while n > 0 {
			let avail = match self.inner.fill_buf() {
				Ok(buf) if !buf.is_empty() => buf.len(),
				Ok(_) => return Err(self.report_error("skip_n_bytes", ErrorKind::UnexpectedEof)),
				Err(e) => return Err(self.io_err("skip_n_bytes", e)),
			};
			let take = avail.min(n);
			self.inner.consume(take);
			n -= take;
		}
		Ok(())
	}

	/// Scan forward until `token` is found (inclusive), returning the total
	/// number of bytes skipped including the token itself.
	///
	/// Maintains a boundary stash of `token.len() - 1` trailing bytes so that
	/// matches straddling two `fill_buf` windows are still found. An empty
	/// token matches immediately (returns `0`); a token longer than what the
	/// reader could ever buffer in one window is an error.
	pub fn skip_to(&mut self, token: &[u8]) -> Result<usize, CodecError> {
		self.check()?;
		if token.is_empty() {
			return Ok(0);
		}
		let mut stash: Vec<u8> = Vec::with_capacity(token.len() - 1);
		let mut skipped = 0usize;
		loop {
			let buf = match self.inner.fill_buf() {
				Ok(buf) => buf,
				Err(e) => return Err(self.io_err("skip_to", e)),
			};
			if buf.is_empty() {
				return Err(self.report_error("skip_to", ErrorKind::UnexpectedEof));
			}
			if buf.len() < token.len() && stash.is_empty() {
				return Err(self.report_error(
					"skip_to",
					ErrorKind::InvalidEncoding("token larger than available buffer".to_owned()),
				));
			}
			// Check across the stash/buf boundary first.
			let mut combined_found = None;
			if !stash.is_empty() {
				let mut combined = stash.clone();
				let take = token.len().saturating_sub(1).min(buf.len());
				combined.extend_from_slice(&buf[..take]);
				if let Some(pos) = find(&combined, token) {
					combined_found = Some(pos);
				}
			}
			if let Some(pos) = combined_found {
				let consumed_from_buf = (pos + token.len()).saturating_sub(stash.len());
				self.inner.consume(consumed_from_buf);
				skipped += consumed_from_buf;
				return Ok(skipped);
			}
			if let Some(pos) = find(buf, token) {
				let consumed = pos + token.len();
				self.inner.consume(consumed);
				skipped += consumed;
				return Ok(skipped);
			}
			let consume_len = buf.len();
			skipped += consume_len;
			let keep = token.len() - 1;
			if consume_len >= keep {
				stash.clear();
				stash.extend_from_slice(&buf[consume_len - keep..]);
			} else {
				stash.extend_from_slice(buf);
				let excess = stash.len().saturating_sub(keep);
				stash.drain(0..excess);
			}
			self.inner.consume(consume_len);
		}
	}
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
	if needle.is_empty() || haystack.len() < needle.len() {
		return None;
	}
	haystack.windows(needle.len()).position(|w| w == needle)
}

/// An in-memory append-only byte buffer with typed Avro write primitives
///
/// This is what the codec compiler's `Encoder`s actually write into. A block
/// (array/map) is built by encoding its entries into a fresh, throwaway
/// `Buf`, measuring its length, then appending the block header followed by
/// the scratch bytes to the enclosing `Buf` - rather than reserving a
/// placeholder and back-patching it in place, which avoids any uncertainty
/// about how many bytes a varint header will occupy.
#[derive(Default)]
pub struct Buf {
	bytes: Vec<u8>,
}

impl Buf {
	pub fn new() -> Self {
		Self::default()
	}
	pub fn as_slice(&self) -> &[u8] {
		&self.bytes
	}
	pub fn len(&self) -> usize {
		self.bytes.len()
	}
	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}
	pub fn into_vec(self) -> Vec<u8> {
		self.bytes
	}

	pub fn write_raw(&mut self, bytes: &[u8]) {
		self.bytes.extend_from_slice(bytes);
	}
	pub fn write_bool(&mut self, b: bool) {
		self.bytes.push(b as u8);
	}
	pub fn write_int(&mut self, n: i32) {
		self.bytes.write_varint(n).expect("Vec<u8> writes never fail");
	}
	pub fn write_long(&mut self, n: i64) {
		self.bytes.write_varint(n).expect("Vec<u8> writes never fail");
	}
	pub fn write_float(&mut self, f: f32) {
		self.bytes.extend_from_slice(&f.to_le_bytes());
	}
	pub fn write_double(&mut self, f: f64) {
		self.bytes.extend_from_slice(&f.to_le_bytes());
	}
	pub fn write_bytes(&mut self, b: &[u8]) {
		self.write_long(b.len() as i64);
		self.write_raw(b);
	}
	pub fn write_string(&mut self, s: &str) {
		self.write_bytes(s.as_bytes());
	}

	/// Append one block (see [`block::write_block`])
	pub fn write_block(&mut self, count: usize, entries: &Buf, size_prefixed: bool) {
		block::write_block(self, count, entries, size_prefixed)
	}
	/// Append the zero-length terminator that ends an array/map
	pub fn write_block_terminator(&mut self) {
		self.write_long(0);
	}
}

/// Writes the Avro binary encoding to any `impl Write`
///
/// Buffers everything in an internal [`Buf`] (per §5's resource policy: "one
/// growable buffer") and only touches the underlying sink on [`flush`](Self::flush).
pub struct Writer<W> {
	sink: W,
	buf: Buf,
	error: Option<CodecError>,
}

impl<W: Write> Writer<W> {
	pub fn new(sink: W) -> Self {
		Self {
			sink,
			buf: Buf::new(),
			error: None,
		}
	}

	/// Direct access to the in-progress buffer, for the codec compiler
	pub fn buf_mut(&mut self) -> &mut Buf {
		&mut self.buf
	}

	pub fn error(&self) -> Option<&CodecError> {
		self.error.as_ref()
	}

	pub fn report_error(&mut self, op: &'static str, kind: ErrorKind) -> CodecError {
		let err = CodecError::new(op, kind);
		match &self.error {
			None => self.error = Some(err.clone()),
			Some(existing) if existing.is_eof() && !err.is_eof() => self.error = Some(err.clone()),
			_ => {}
		}
		err
	}

	/// Push the buffered bytes to the sink, propagating any I/O error
	pub fn flush(&mut self) -> Result<(), CodecError> {
		if let Some(e) = &self.error {
			if !e.is_eof() {
				return Err(e.clone());
			}
		}
		self.sink.write_all(self.buf.as_slice()).map_err(|e| {
			self.report_error("flush", ErrorKind::InvalidEncoding(e.to_string()))
		})?;
		self.buf = Buf::new();
		Ok(())
	}

	pub fn into_sink(mut self) -> Result<W, CodecError> {
		self.flush()?;
		Ok(self.sink)
	}
}
