//! Bridges the dynamic [`Value`](crate::schema::Value) the codec compiler
//! targets to/from concrete Rust types via `serde` (§3, Design Notes (c))
//!
//! Converting `Value` to/from a concrete `T: Serialize`/`DeserializeOwned`
//! is ordinary, monomorphized `serde` work - no runtime reflection, no
//! per-`T` compilation or caching needed, since `serde`'s own derive macros
//! already generate the field-matching code a struct needs. Only the
//! schema-to-`Value` half (see [`crate::codec`]) is expensive enough to be
//! worth compiling once and caching.

mod de;
mod ser;

pub use de::value_to_t;
pub use ser::t_to_value;
