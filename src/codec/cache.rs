//! Process-wide, type-erased, memoizing cache of compiled [`Codec`]s (§4.2)
//!
//! Keyed by `(schema.cache_fingerprint(), TypeId::of::<Value>())`: the
//! fingerprint so two structurally identical schemas (or the same schema
//! resolved the same way against the same writer) share one compiled
//! `Codec`. The key shape keeps a `TypeId` slot - matching the general cache
//! key described for the core - but it is always `Value`'s, since `compile`
//! only ever walks the schema against the dynamic [`crate::schema::Value`]
//! representation and never looks at a caller's concrete host type; a future
//! non-`Value` host representation could share this cache by keying on its
//! own `TypeId` instead.
//!
//! A `TypeId` is only meaningful for the lifetime of the process, which is
//! exactly the cache's own lifetime (it lives in a `OnceLock`), so this is
//! safe.

use super::{compile, Codec};
use crate::error::CodecError;
use crate::schema::{Schema, Value};
use hashbrown::HashMap;
use std::any::TypeId;
use std::sync::{Arc, OnceLock, RwLock};

type CacheKey = ([u8; 32], TypeId);

fn cache() -> &'static RwLock<HashMap<CacheKey, Arc<Codec>>> {
	static CACHE: OnceLock<RwLock<HashMap<CacheKey, Arc<Codec>>>> = OnceLock::new();
	CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Look up a cached [`Codec`] for `schema`, compiling and inserting one if
/// this is the first time this exact (resolved) schema has been seen
pub fn get_or_compile(schema: &Schema) -> Result<Arc<Codec>, CodecError> {
	let key: CacheKey = (*schema.cache_fingerprint(), TypeId::of::<Value>());

	if let Some(codec) = cache().read().unwrap_or_else(|e| e.into_inner()).get(&key) {
		return Ok(Arc::clone(codec));
	}

	let codec = Arc::new(compile(schema)?);
	let mut guard = cache().write().unwrap_or_else(|e| e.into_inner());
	// Another thread may have compiled the same schema meanwhile; keep
	// whichever copy is already there so callers that cloned an `Arc` before
	// this insert still see it reflected in the cache.
	let codec = Arc::clone(guard.entry(key).or_insert(codec));
	Ok(codec)
}

/// Number of distinct schemas currently cached, for diagnostics and tests
pub fn len() -> usize {
	cache().read().unwrap_or_else(|e| e.into_inner()).len()
}
