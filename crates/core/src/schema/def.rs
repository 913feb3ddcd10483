//! Serializable schema definitions and their resolution into [`Schema`].
//!
//! Raw definitions mirror the JSON format one to one. [`Resolve`] validates a
//! definition and turns it into the typed schema: option conflicts, bad
//! regexes and missing base URLs are reported with the dotted field path.
//!
//! ```json
//! {
//!   "title": "h1",
//!   "links": { "selector": "a", "attr": "href", "multiple": true, "transform": "url" },
//!   "items": { "selector": ".item", "multiple": true, "fields": { "name": ".name" } }
//! }
//! ```

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::{Field, MultipleField, NestedField, Schema, SingleField, Source};
use crate::error::SchemaError;
use crate::transform::{self, Transform};

pub(crate) fn field_path(prefix: &str, name: &str) -> String {
	if prefix.is_empty() { name.to_string() } else { format!("{prefix}.{name}") }
}

/// Context available while resolving definitions.
#[derive(Debug, Clone, Default)]
pub struct ResolveEnv<'a> {
	/// Base for `url` transforms that do not name one.
	pub base_url: Option<&'a Url>,
	path: String,
}

impl<'a> ResolveEnv<'a> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_base_url(base_url: &'a Url) -> Self {
		Self {
			base_url: Some(base_url),
			path: String::new(),
		}
	}

	/// Dotted path of the field being resolved.
	pub fn path(&self) -> &str {
		&self.path
	}

	fn child(&self, name: &str) -> Self {
		Self {
			base_url: self.base_url,
			path: field_path(&self.path, name),
		}
	}

	fn invalid(&self, reason: impl Into<String>) -> SchemaError {
		SchemaError::InvalidField {
			field: self.path.clone(),
			reason: reason.into(),
		}
	}
}

/// Turns a raw definition into its validated runtime form.
pub trait Resolve {
	type Output;

	fn resolve(&self, env: &ResolveEnv<'_>) -> Result<Self::Output, SchemaError>;
}

/// Raw schema: field definitions in document order, names unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDef {
	fields: Vec<(String, FieldDef)>,
}

impl SchemaDef {
	pub fn fields(&self) -> &[(String, FieldDef)] {
		&self.fields
	}
}

impl<'de> Deserialize<'de> for SchemaDef {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		struct SchemaDefVisitor;

		impl<'de> Visitor<'de> for SchemaDefVisitor {
			type Value = SchemaDef;

			fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str("a map of field names to field definitions")
			}

			fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<SchemaDef, A::Error> {
				let mut fields: Vec<(String, FieldDef)> = Vec::new();
				while let Some((name, field)) = map.next_entry::<String, FieldDef>()? {
					if fields.iter().any(|(existing, _)| *existing == name) {
						return Err(de::Error::custom(format_args!("duplicate field `{name}`")));
					}
					fields.push((name, field));
				}
				Ok(SchemaDef { fields })
			}
		}

		deserializer.deserialize_map(SchemaDefVisitor)
	}
}

impl Resolve for SchemaDef {
	type Output = Schema;

	fn resolve(&self, env: &ResolveEnv<'_>) -> Result<Schema, SchemaError> {
		let mut schema = Schema::new();
		for (name, field) in &self.fields {
			schema.insert(name.clone(), field.resolve(&env.child(name))?);
		}
		Ok(schema)
	}
}

/// A field written either as a bare selector or as a full object.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDef {
	Selector(String),
	Spec(Box<FieldSpec>),
}

impl<'de> Deserialize<'de> for FieldDef {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		struct FieldDefVisitor;

		impl<'de> Visitor<'de> for FieldDefVisitor {
			type Value = FieldDef;

			fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str("a selector string or a field object")
			}

			fn visit_str<E: de::Error>(self, selector: &str) -> Result<FieldDef, E> {
				Ok(FieldDef::Selector(selector.to_string()))
			}

			fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<FieldDef, A::Error> {
				FieldSpec::deserialize(de::value::MapAccessDeserializer::new(map)).map(|spec| FieldDef::Spec(Box::new(spec)))
			}
		}

		deserializer.deserialize_any(FieldDefVisitor)
	}
}

impl Resolve for FieldDef {
	type Output = Field;

	fn resolve(&self, env: &ResolveEnv<'_>) -> Result<Field, SchemaError> {
		match self {
			FieldDef::Selector(selector) => {
				check_selector(selector, env)?;
				Ok(SingleField::new(selector.as_str()).into())
			}
			FieldDef::Spec(spec) => spec.resolve(env),
		}
	}
}

/// Object form of a field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
	pub selector: String,
	#[serde(default)]
	pub attr: Option<String>,
	#[serde(default)]
	pub default: Option<Value>,
	#[serde(default)]
	pub transform: Option<TransformDef>,
	#[serde(default)]
	pub multiple: bool,
	#[serde(default)]
	pub limit: Option<usize>,
	#[serde(default)]
	pub fields: Option<SchemaDef>,
}

fn check_selector(selector: &str, env: &ResolveEnv<'_>) -> Result<(), SchemaError> {
	if selector.trim().is_empty() {
		return Err(SchemaError::EmptySelector { field: env.path.clone() });
	}
	Ok(())
}

impl Resolve for FieldSpec {
	type Output = Field;

	fn resolve(&self, env: &ResolveEnv<'_>) -> Result<Field, SchemaError> {
		check_selector(&self.selector, env)?;
		if self.limit.is_some() && !self.multiple {
			return Err(env.invalid("`limit` requires `multiple`"));
		}

		if let Some(fields) = &self.fields {
			let conflicts = [("attr", self.attr.is_some()), ("default", self.default.is_some()), ("transform", self.transform.is_some())];
			if let Some((option, _)) = conflicts.iter().find(|(_, present)| *present) {
				return Err(env.invalid(format!("`{option}` cannot be combined with `fields`")));
			}
			return Ok(Field::Nested(NestedField {
				selector: self.selector.clone(),
				schema: fields.resolve(env)?,
				multiple: self.multiple,
				limit: self.limit,
			}));
		}

		let source = self.attr.as_deref().map(Source::parse).unwrap_or_default();
		let transform = self.transform.as_ref().map(|def| def.resolve(env)).transpose()?;

		if self.multiple {
			let default = match &self.default {
				None => None,
				Some(Value::Array(items)) => Some(items.clone()),
				Some(_) => return Err(env.invalid("`default` of a multiple field must be an array")),
			};
			return Ok(Field::Multiple(MultipleField {
				selector: self.selector.clone(),
				source,
				limit: self.limit,
				default,
				transform,
			}));
		}

		Ok(Field::Single(SingleField {
			selector: self.selector.clone(),
			source,
			default: self.default.clone(),
			transform,
		}))
	}
}

/// A transform written as a name, an object, or an array composed left to right.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformDef {
	Spec(TransformSpec),
	Pipe(Vec<TransformDef>),
}

impl TransformDef {
	fn from_value(value: Value) -> Result<Self, serde_json::Error> {
		use serde::de::Error as _;

		match value {
			Value::String(name) => serde_json::from_value(serde_json::json!({ "name": name })).map(TransformDef::Spec),
			Value::Object(_) => serde_json::from_value(value).map(TransformDef::Spec),
			Value::Array(items) => items.into_iter().map(TransformDef::from_value).collect::<Result<_, _>>().map(TransformDef::Pipe),
			other => Err(serde_json::Error::custom(format_args!("expected a transform name, object or array, found `{other}`"))),
		}
	}
}

impl<'de> Deserialize<'de> for TransformDef {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let value = Value::deserialize(deserializer)?;
		TransformDef::from_value(value).map_err(de::Error::custom)
	}
}

impl Resolve for TransformDef {
	type Output = Transform;

	fn resolve(&self, env: &ResolveEnv<'_>) -> Result<Transform, SchemaError> {
		match self {
			TransformDef::Spec(spec) => spec.resolve(env),
			TransformDef::Pipe(steps) => {
				let steps = steps.iter().map(|step| step.resolve(env)).collect::<Result<Vec<_>, _>>()?;
				Ok(transform::pipe(steps))
			}
		}
	}
}

fn default_group() -> usize {
	1
}

/// Library transform selected by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum TransformSpec {
	Trim,
	Lowercase,
	Uppercase,
	Number,
	Integer,
	Boolean,
	Date,
	Unique,
	Required,
	Split {
		delimiter: String,
	},
	Url {
		#[serde(default)]
		base: Option<String>,
	},
	Regex {
		pattern: String,
		#[serde(default = "default_group")]
		group: usize,
	},
	Replace {
		pattern: String,
		#[serde(default)]
		replacement: String,
	},
	Join {
		#[serde(default)]
		separator: String,
	},
}

impl Resolve for TransformSpec {
	type Output = Transform;

	fn resolve(&self, env: &ResolveEnv<'_>) -> Result<Transform, SchemaError> {
		let invalid_regex = |pattern: &str, source: regex::Error| SchemaError::InvalidRegex {
			field: env.path.clone(),
			pattern: pattern.to_string(),
			source,
		};

		Ok(match self {
			TransformSpec::Trim => transform::trim(),
			TransformSpec::Lowercase => transform::lowercase(),
			TransformSpec::Uppercase => transform::uppercase(),
			TransformSpec::Number => transform::number(),
			TransformSpec::Integer => transform::integer(),
			TransformSpec::Boolean => transform::boolean(),
			TransformSpec::Date => transform::date(),
			TransformSpec::Unique => transform::unique(),
			TransformSpec::Required => transform::required(),
			TransformSpec::Split { delimiter } => {
				if delimiter.is_empty() {
					return Err(SchemaError::InvalidTransform {
						field: env.path.clone(),
						reason: "`split` needs a non-empty delimiter".to_string(),
					});
				}
				transform::split(delimiter)
			}
			TransformSpec::Url { base: Some(base) } => {
				let base = Url::parse(base).map_err(|source| SchemaError::InvalidBaseUrl {
					field: env.path.clone(),
					url: base.clone(),
					source,
				})?;
				transform::url(base)
			}
			TransformSpec::Url { base: None } => {
				let base = env.base_url.ok_or_else(|| SchemaError::MissingBaseUrl { field: env.path.clone() })?;
				transform::url(base.clone())
			}
			TransformSpec::Regex { pattern, group } => transform::regex(pattern, *group).map_err(|source| invalid_regex(pattern, source))?,
			TransformSpec::Replace { pattern, replacement } => transform::replace(pattern, replacement).map_err(|source| invalid_regex(pattern, source))?,
			TransformSpec::Join { separator } => transform::join(separator),
		})
	}
}
