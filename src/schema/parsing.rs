//! Internal, deliberately lenient JSON-to-[`Schema`] reader
//!
//! Schema JSON parsing and validation is an explicit Non-goal of this crate
//! (it is "external collaborator" plumbing per the core's scope). This
//! module exists only so that tests and examples can build [`Schema`] values
//! from Avro schema text the way every example in this corpus does
//! (`r#"..."#.parse()`); it does not implement or enforce the full Avro
//! schema specification (e.g. name validation, duplicate-name detection,
//! namespace edge cases beyond the common `namespace`+`name` join) - see
//! `DESIGN.md` for this Open Question's resolution.

use super::{
	value::Value, Array, Enum, Fixed, LogicalType, Map, Name, Record, RecordField, RegularType,
	Schema, SchemaError, SchemaKey, SchemaNode, Union,
};

use hashbrown::HashMap;
use serde_json::Value as Json;

pub(super) fn parse(s: &str) -> Result<Schema, SchemaError> {
	let json: Json = serde_json::from_str(s)?;
	let mut ctx = Ctx {
		nodes: Vec::new(),
		named: HashMap::new(),
	};
	let root = ctx.parse_node(&json, None)?;
	assert_eq!(root.idx(), 0, "the first parsed node must be the root");
	Schema::from_nodes_with_json(ctx.nodes, Some(s.to_owned()))
}

struct Ctx {
	nodes: Vec<SchemaNode>,
	named: HashMap<String, SchemaKey>,
}

impl Ctx {
	fn push(&mut self, node: SchemaNode) -> SchemaKey {
		let key = SchemaKey::from_idx(self.nodes.len());
		self.nodes.push(node);
		key
	}

	fn parse_node(&mut self, json: &Json, namespace: Option<&str>) -> Result<SchemaKey, SchemaError> {
		match json {
			Json::String(s) => self.parse_named_reference(s, namespace),
			Json::Array(variants) => {
				let key = self.push(SchemaNode::new(RegularType::Null));
				let variants = variants
					.iter()
					.map(|v| self.parse_node(v, namespace))
					.collect::<Result<Vec<_>, _>>()?;
				self.nodes[key.idx()] = SchemaNode::new(RegularType::Union(Union { variants }));
				Ok(key)
			}
			Json::Object(obj) => self.parse_object(obj, namespace),
			other => Err(SchemaError::msg(format!(
				"expected a schema (string, array or object), got {other}"
			))),
		}
	}

	fn parse_named_reference(
		&mut self,
		name: &str,
		namespace: Option<&str>,
	) -> Result<SchemaKey, SchemaError> {
		if let Some(prim) = primitive_from_name(name) {
			return Ok(self.push(SchemaNode::new(prim)));
		}
		let fq = Name::from_namespace_and_name(namespace, name);
		if let Some(&key) = self.named.get(fq.fully_qualified_name()) {
			return Ok(self.push(SchemaNode::new(RegularType::Ref(key))));
		}
		if let Some(&key) = self.named.get(name) {
			return Ok(self.push(SchemaNode::new(RegularType::Ref(key))));
		}
		Err(SchemaError::msg(format!("unknown named type reference: {name}")))
	}

	fn parse_object(
		&mut self,
		obj: &serde_json::Map<String, Json>,
		namespace: Option<&str>,
	) -> Result<SchemaKey, SchemaError> {
		let type_str = obj
			.get("type")
			.and_then(Json::as_str)
			.ok_or_else(|| SchemaError::msg("schema object missing string \"type\""))?;

		if let Some(prim) = primitive_from_name(type_str) {
			let key = self.push(SchemaNode::new(prim));
			return self.apply_logical_type(key, obj);
		}

		match type_str {
			"array" => {
				let items_json = obj
					.get("items")
					.ok_or_else(|| SchemaError::msg("array schema missing \"items\""))?;
				let key = self.push(SchemaNode::new(RegularType::Null));
				let items = self.parse_node(items_json, namespace)?;
				self.nodes[key.idx()] = SchemaNode::new(RegularType::Array(Array { items }));
				Ok(key)
			}
			"map" => {
				let values_json = obj
					.get("values")
					.ok_or_else(|| SchemaError::msg("map schema missing \"values\""))?;
				let key = self.push(SchemaNode::new(RegularType::Null));
				let values = self.parse_node(values_json, namespace)?;
				self.nodes[key.idx()] = SchemaNode::new(RegularType::Map(Map { values }));
				Ok(key)
			}
			"fixed" => {
				let (name, namespace) = self.parse_name(obj, namespace)?;
				let aliases = self.parse_aliases(obj, namespace.as_deref());
				let size = obj
					.get("size")
					.and_then(Json::as_u64)
					.ok_or_else(|| SchemaError::msg("fixed schema missing numeric \"size\""))?
					as usize;
				let key = self.push(SchemaNode::new(RegularType::Fixed(Fixed {
					name: name.clone(),
					aliases,
					size,
				})));
				self.named.insert(name.fully_qualified_name().to_owned(), key);
				self.apply_logical_type(key, obj)
			}
			"enum" => {
				let (name, namespace) = self.parse_name(obj, namespace)?;
				let aliases = self.parse_aliases(obj, namespace.as_deref());
				let symbols = obj
					.get("symbols")
					.and_then(Json::as_array)
					.ok_or_else(|| SchemaError::msg("enum schema missing \"symbols\""))?
					.iter()
					.map(|s| {
						s.as_str()
							.map(str::to_owned)
							.ok_or_else(|| SchemaError::msg("enum symbol must be a string"))
					})
					.collect::<Result<Vec<_>, _>>()?;
				let default = obj
					.get("default")
					.and_then(Json::as_str)
					.map(str::to_owned);
				let key = self.push(SchemaNode::new(RegularType::Enum(Enum {
					name: name.clone(),
					aliases,
					symbols,
					default,
					encoded_symbols: None,
				})));
				self.named.insert(name.fully_qualified_name().to_owned(), key);
				Ok(key)
			}
			"record" => {
				let (name, inner_namespace) = self.parse_name(obj, namespace)?;
				let aliases = self.parse_aliases(obj, inner_namespace.as_deref());
				let key = self.push(SchemaNode::new(RegularType::Null));
				self.named.insert(name.fully_qualified_name().to_owned(), key);
				let fields_json = obj
					.get("fields")
					.and_then(Json::as_array)
					.ok_or_else(|| SchemaError::msg("record schema missing \"fields\""))?;
				let mut fields = Vec::with_capacity(fields_json.len());
				for f in fields_json {
					fields.push(self.parse_field(f, inner_namespace.as_deref())?);
				}
				self.nodes[key.idx()] = SchemaNode::new(RegularType::Record(Record {
					name,
					aliases,
					fields,
				}));
				Ok(key)
			}
			other => Err(SchemaError::msg(format!("unknown schema type: {other}"))),
		}
	}

	fn parse_field(
		&mut self,
		json: &Json,
		namespace: Option<&str>,
	) -> Result<RecordField, SchemaError> {
		let obj = json
			.as_object()
			.ok_or_else(|| SchemaError::msg("record field must be an object"))?;
		let name = obj
			.get("name")
			.and_then(Json::as_str)
			.ok_or_else(|| SchemaError::msg("record field missing \"name\""))?
			.to_owned();
		let aliases = obj
			.get("aliases")
			.and_then(Json::as_array)
			.map(|a| {
				a.iter()
					.filter_map(Json::as_str)
					.map(str::to_owned)
					.collect()
			})
			.unwrap_or_default();
		let type_json = obj
			.get("type")
			.ok_or_else(|| SchemaError::msg("record field missing \"type\""))?;
		let type_ = self.parse_node(type_json, namespace)?;
		let default = match obj.get("default") {
			Some(default_json) => Some(decode_default(default_json, type_, &self.nodes)?),
			None => None,
		};
		Ok(RecordField {
			name,
			aliases,
			type_,
			default,
			action: super::Action::Normal,
		})
	}

	fn parse_name(
		&self,
		obj: &serde_json::Map<String, Json>,
		namespace: Option<&str>,
	) -> Result<(Name, Option<String>), SchemaError> {
		let bare_name = obj
			.get("name")
			.and_then(Json::as_str)
			.ok_or_else(|| SchemaError::msg("named schema missing \"name\""))?;
		let own_namespace = obj
			.get("namespace")
			.and_then(Json::as_str)
			.map(str::to_owned)
			.or_else(|| {
				bare_name
					.rsplit_once('.')
					.map(|(ns, _)| ns.to_owned())
					.or_else(|| namespace.map(str::to_owned))
			});
		let name = Name::from_namespace_and_name(own_namespace.as_deref(), bare_name);
		Ok((name, own_namespace))
	}

	fn parse_aliases(
		&self,
		obj: &serde_json::Map<String, Json>,
		namespace: Option<&str>,
	) -> Vec<Name> {
		obj.get("aliases")
			.and_then(Json::as_array)
			.map(|a| {
				a.iter()
					.filter_map(Json::as_str)
					.map(|s| Name::from_namespace_and_name(namespace, s))
					.collect()
			})
			.unwrap_or_default()
	}

	fn apply_logical_type(
		&mut self,
		key: SchemaKey,
		obj: &serde_json::Map<String, Json>,
	) -> Result<SchemaKey, SchemaError> {
		if let Some(lt) = obj.get("logicalType").and_then(Json::as_str) {
			let logical_type = match lt {
				"date" => LogicalType::Date,
				"time-millis" => LogicalType::TimeMillis,
				"time-micros" => LogicalType::TimeMicros,
				"timestamp-millis" => LogicalType::TimestampMillis,
				"timestamp-micros" => LogicalType::TimestampMicros,
				"local-timestamp-millis" => LogicalType::LocalTimestampMillis,
				"local-timestamp-micros" => LogicalType::LocalTimestampMicros,
				"uuid" => LogicalType::Uuid,
				"duration" => LogicalType::Duration,
				"decimal" => LogicalType::Decimal {
					precision: obj.get("precision").and_then(Json::as_u64).unwrap_or(0) as usize,
					scale: obj.get("scale").and_then(Json::as_u64).unwrap_or(0) as usize,
				},
				other => LogicalType::Unknown(other.to_owned()),
			};
			self.nodes[key.idx()].logical_type = Some(logical_type);
		}
		Ok(key)
	}
}

fn primitive_from_name(name: &str) -> Option<RegularType> {
	Some(match name {
		"null" => RegularType::Null,
		"boolean" => RegularType::Boolean,
		"int" => RegularType::Int,
		"long" => RegularType::Long,
		"float" => RegularType::Float,
		"double" => RegularType::Double,
		"bytes" => RegularType::Bytes,
		"string" => RegularType::String,
		_ => return None,
	})
}

/// Decode a JSON default value into a dynamic [`Value`], per the type at
/// `type_key`. This is the "default-value decoder synthesis" of §4.2: done
/// once, eagerly, at schema-build time, rather than at every decode.
fn decode_default(json: &Json, type_key: SchemaKey, nodes: &[SchemaNode]) -> Result<Value, SchemaError> {
	let node = &nodes[type_key.idx()];
	match &node.type_ {
		RegularType::Null => Ok(Value::Null),
		RegularType::Boolean => json
			.as_bool()
			.map(Value::Boolean)
			.ok_or_else(|| SchemaError::msg("expected boolean default")),
		RegularType::Int => json
			.as_i64()
			.map(|n| Value::Int(n as i32))
			.ok_or_else(|| SchemaError::msg("expected int default")),
		RegularType::Long => json
			.as_i64()
			.map(Value::Long)
			.ok_or_else(|| SchemaError::msg("expected long default")),
		RegularType::Float => json
			.as_f64()
			.map(|n| Value::Float(n as f32))
			.ok_or_else(|| SchemaError::msg("expected float default")),
		RegularType::Double => json
			.as_f64()
			.map(Value::Double)
			.ok_or_else(|| SchemaError::msg("expected double default")),
		RegularType::String => json
			.as_str()
			.map(|s| Value::String(s.to_owned()))
			.ok_or_else(|| SchemaError::msg("expected string default")),
		RegularType::Bytes | RegularType::Fixed(_) => {
			let s = json
				.as_str()
				.ok_or_else(|| SchemaError::msg("expected string-encoded bytes default"))?;
			Ok(Value::Bytes(s.chars().map(|c| c as u8).collect()))
		}
		RegularType::Enum(e) => {
			let s = json
				.as_str()
				.ok_or_else(|| SchemaError::msg("expected string enum default"))?;
			if !e.symbols.iter().any(|sym| sym == s) {
				return Err(SchemaError::msg(format!(
					"enum default {s:?} is not among the enum's symbols"
				)));
			}
			Ok(Value::Enum(s.to_owned()))
		}
		RegularType::Array(a) => {
			let arr = json
				.as_array()
				.ok_or_else(|| SchemaError::msg("expected array default"))?;
			Ok(Value::Array(
				arr.iter()
					.map(|v| decode_default(v, a.items, nodes))
					.collect::<Result<_, _>>()?,
			))
		}
		RegularType::Map(m) => {
			let obj = json
				.as_object()
				.ok_or_else(|| SchemaError::msg("expected map default"))?;
			let mut out = std::collections::BTreeMap::new();
			for (k, v) in obj {
				out.insert(k.clone(), decode_default(v, m.values, nodes)?);
			}
			Ok(Value::Map(out))
		}
		RegularType::Record(r) => {
			let obj = json
				.as_object()
				.ok_or_else(|| SchemaError::msg("expected record default"))?;
			let mut out = Vec::with_capacity(r.fields.len());
			for f in &r.fields {
				let v = match obj.get(&f.name) {
					Some(v) => decode_default(v, f.type_, nodes)?,
					None => f
						.default
						.clone()
						.ok_or_else(|| SchemaError::msg(format!("missing default for field {}", f.name)))?,
				};
				out.push((f.name.clone(), v));
			}
			Ok(Value::Record(out))
		}
		RegularType::Union(u) => {
			// Per the Avro spec, a union's default value must match the
			// *first* branch's type.
			let first = *u
				.variants
				.first()
				.ok_or_else(|| SchemaError::msg("union with no variants"))?;
			decode_default(json, first, nodes)
		}
		RegularType::Ref(target) => decode_default(json, *target, nodes),
	}
}
