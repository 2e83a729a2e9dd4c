//! Shared (de)serialization configuration (§4.1, §5, §6)
//!
//! Mirrors the split the teacher uses between its `DeserializerConfig` and
//! `SerializerConfig`: a small set of knobs that affect wire-level behavior
//! (size limits, block length, union resolution policy) rather than schema
//! semantics, built through a `ConfigBuilder`.

/// Controls over binary encoding/decoding behavior
#[derive(Debug, Clone)]
pub struct Config {
	/// Target number of items per array/map block when encoding. Avro
	/// readers don't require any particular block length; this only shapes
	/// how a writer chunks long sequences. Default: `100`.
	pub block_length: usize,
	/// When set, the writer never emits the size-prefixed (negative count)
	/// block form, matching encoders that don't want readers to be able to
	/// skip blocks blindly. Default: `false`.
	pub disable_block_size_header: bool,
	/// Upper bound on a single `bytes`/`string`/`fixed` length accepted while
	/// decoding, guarding against a corrupt or hostile length prefix causing
	/// an unbounded allocation. Default: 64 MiB.
	pub max_byte_slice_size: usize,
	/// Upper bound on a single array/map block's pre-allocated capacity.
	/// Default: 1 MiB worth of pointer-sized slots.
	pub max_slice_alloc_size: usize,
	/// When resolving a reader/writer schema pair, whether a union may
	/// resolve against only some of its branches rather than requiring every
	/// writer branch to have a matching reader branch. Default: `false`.
	pub partial_union_type_resolution: bool,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			block_length: 100,
			disable_block_size_header: false,
			max_byte_slice_size: 64 * 1024 * 1024,
			max_slice_alloc_size: 1024 * 1024,
			partial_union_type_resolution: false,
		}
	}
}

impl Config {
	pub fn builder() -> ConfigBuilder {
		ConfigBuilder::default()
	}
}

/// Builder for [`Config`]
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
	config: Config,
}

impl ConfigBuilder {
	pub fn block_length(mut self, block_length: usize) -> Self {
		self.config.block_length = block_length;
		self
	}
	pub fn disable_block_size_header(mut self, disable: bool) -> Self {
		self.config.disable_block_size_header = disable;
		self
	}
	pub fn max_byte_slice_size(mut self, max: usize) -> Self {
		self.config.max_byte_slice_size = max;
		self
	}
	pub fn max_slice_alloc_size(mut self, max: usize) -> Self {
		self.config.max_slice_alloc_size = max;
		self
	}
	pub fn partial_union_type_resolution(mut self, partial: bool) -> Self {
		self.config.partial_union_type_resolution = partial;
		self
	}
	pub fn build(self) -> Config {
		self.config
	}
}
