//! Extraction schemas.
//!
//! A [`Schema`] is an ordered list of uniquely named [`Field`]s. Each field is
//! one of three closed shapes: a single value, a list of values, or a nested
//! sub-schema. Value options (`source`, `default`, `transform`) only exist on
//! the value shapes, so a nested field cannot carry them.

mod def;

pub use def::{FieldDef, FieldSpec, Resolve, ResolveEnv, SchemaDef, TransformDef, TransformSpec};
use serde_json::Value;

use crate::error::{Result, SchemaError};
use crate::transform::Transform;

/// Where a field's value is read from on a matched element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Source {
	/// Trimmed text content.
	#[default]
	Text,
	/// Inner markup.
	Html,
	/// An attribute value; a missing attribute reads as `null`.
	Attr(String),
}

impl Source {
	/// `"text"` and `"html"` are keywords; any other name is an attribute.
	pub fn parse(name: &str) -> Self {
		match name {
			"text" => Source::Text,
			"html" => Source::Html,
			attr => Source::Attr(attr.to_ascii_lowercase()),
		}
	}
}

/// First match of a selector, read as one value.
#[derive(Debug, Clone)]
pub struct SingleField {
	pub selector: String,
	pub source: Source,
	pub default: Option<Value>,
	pub transform: Option<Transform>,
}

impl SingleField {
	pub fn new(selector: impl Into<String>) -> Self {
		Self {
			selector: selector.into(),
			source: Source::Text,
			default: None,
			transform: None,
		}
	}

	pub fn source(mut self, source: Source) -> Self {
		self.source = source;
		self
	}

	pub fn attr(self, name: &str) -> Self {
		self.source(Source::parse(name))
	}

	pub fn html(self) -> Self {
		self.source(Source::Html)
	}

	/// Value used when the selector matches nothing.
	pub fn default(mut self, value: impl Into<Value>) -> Self {
		self.default = Some(value.into());
		self
	}

	pub fn transform(mut self, transform: Transform) -> Self {
		self.transform = Some(transform);
		self
	}
}

/// Every match of a selector, read as an array.
#[derive(Debug, Clone)]
pub struct MultipleField {
	pub selector: String,
	pub source: Source,
	pub limit: Option<usize>,
	pub default: Option<Vec<Value>>,
	/// Receives the whole array, not each item.
	pub transform: Option<Transform>,
}

impl MultipleField {
	pub fn new(selector: impl Into<String>) -> Self {
		Self {
			selector: selector.into(),
			source: Source::Text,
			limit: None,
			default: None,
			transform: None,
		}
	}

	pub fn source(mut self, source: Source) -> Self {
		self.source = source;
		self
	}

	pub fn attr(self, name: &str) -> Self {
		self.source(Source::parse(name))
	}

	pub fn html(self) -> Self {
		self.source(Source::Html)
	}

	pub fn limit(mut self, limit: usize) -> Self {
		self.limit = Some(limit);
		self
	}

	/// Array used when no match yields a value.
	pub fn default(mut self, values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
		self.default = Some(values.into_iter().map(Into::into).collect());
		self
	}

	pub fn transform(mut self, transform: Transform) -> Self {
		self.transform = Some(transform);
		self
	}
}

/// A sub-schema applied to the first match, or to every match when `multiple`.
#[derive(Debug, Clone)]
pub struct NestedField {
	pub selector: String,
	pub schema: Schema,
	pub multiple: bool,
	pub limit: Option<usize>,
}

impl NestedField {
	pub fn new(selector: impl Into<String>, schema: Schema) -> Self {
		Self {
			selector: selector.into(),
			schema,
			multiple: false,
			limit: None,
		}
	}

	pub fn multiple(mut self) -> Self {
		self.multiple = true;
		self
	}

	/// Caps the number of matches; implies `multiple`.
	pub fn limit(mut self, limit: usize) -> Self {
		self.multiple = true;
		self.limit = Some(limit);
		self
	}
}

/// Field descriptor.
#[derive(Debug, Clone)]
pub enum Field {
	Single(SingleField),
	Multiple(MultipleField),
	Nested(NestedField),
}

impl Field {
	/// Text of the first match.
	pub fn single(selector: impl Into<String>) -> SingleField {
		SingleField::new(selector)
	}

	/// Text of every match.
	pub fn multiple(selector: impl Into<String>) -> MultipleField {
		MultipleField::new(selector)
	}

	pub fn nested(selector: impl Into<String>, schema: Schema) -> NestedField {
		NestedField::new(selector, schema)
	}

	pub fn selector(&self) -> &str {
		match self {
			Field::Single(field) => &field.selector,
			Field::Multiple(field) => &field.selector,
			Field::Nested(field) => &field.selector,
		}
	}
}

impl From<SingleField> for Field {
	fn from(field: SingleField) -> Self {
		Field::Single(field)
	}
}

impl From<MultipleField> for Field {
	fn from(field: MultipleField) -> Self {
		Field::Multiple(field)
	}
}

impl From<NestedField> for Field {
	fn from(field: NestedField) -> Self {
		Field::Nested(field)
	}
}

impl From<&str> for Field {
	fn from(selector: &str) -> Self {
		Field::Single(SingleField::new(selector))
	}
}

/// Ordered mapping of field names to descriptors.
#[derive(Debug, Clone, Default)]
pub struct Schema {
	fields: Vec<(String, Field)>,
}

impl Schema {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `name`, replacing an existing field of that name in place.
	pub fn field(mut self, name: impl Into<String>, field: impl Into<Field>) -> Self {
		self.insert(name, field);
		self
	}

	pub fn insert(&mut self, name: impl Into<String>, field: impl Into<Field>) {
		let name = name.into();
		let field = field.into();
		match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
			Some(entry) => entry.1 = field,
			None => self.fields.push((name, field)),
		}
	}

	pub fn get(&self, name: &str) -> Option<&Field> {
		self.fields.iter().find(|(existing, _)| existing == name).map(|(_, field)| field)
	}

	/// Fields in declaration order.
	pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
		self.fields.iter().map(|(name, field)| (name.as_str(), field))
	}

	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	/// Loads a JSON schema definition. `url` transforms must name their base.
	pub fn from_json(json: &str) -> Result<Self> {
		Self::from_json_with_env(json, &ResolveEnv::default())
	}

	pub fn from_json_with_env(json: &str, env: &ResolveEnv<'_>) -> Result<Self> {
		let def: SchemaDef = serde_json::from_str(json)?;
		Ok(def.resolve(env)?)
	}

	/// Rejects empty selectors anywhere in the tree.
	pub fn validate(&self) -> std::result::Result<(), SchemaError> {
		self.validate_at("")
	}

	fn validate_at(&self, prefix: &str) -> std::result::Result<(), SchemaError> {
		for (name, field) in self.fields() {
			let path = def::field_path(prefix, name);
			if field.selector().trim().is_empty() {
				return Err(SchemaError::EmptySelector { field: path });
			}
			if let Field::Nested(nested) = field {
				nested.schema.validate_at(&path)?;
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn keeps_declaration_order_and_replaces_in_place() {
		let schema = Schema::new().field("b", "h2").field("a", "h1").field("b", Field::multiple("li"));
		let names: Vec<&str> = schema.fields().map(|(name, _)| name).collect();
		assert_eq!(names, vec!["b", "a"]);
		assert!(matches!(schema.get("b"), Some(Field::Multiple(_))));
	}

	#[test]
	fn builders_set_options() {
		let single = Field::single("a").attr("HREF").default("none");
		assert_eq!(single.source, Source::Attr("href".into()));
		assert_eq!(single.default, Some(json!("none")));

		let list = Field::multiple("li").html().limit(2).default(["x"]);
		assert_eq!(list.source, Source::Html);
		assert_eq!(list.limit, Some(2));
		assert_eq!(list.default, Some(vec![json!("x")]));

		let nested = Field::nested(".item", Schema::new()).limit(3);
		assert!(nested.multiple);
	}

	#[test]
	fn source_keywords() {
		assert_eq!(Source::parse("text"), Source::Text);
		assert_eq!(Source::parse("html"), Source::Html);
		assert_eq!(Source::parse("data-id"), Source::Attr("data-id".into()));
	}

	#[test]
	fn validate_reports_nested_path() {
		let schema = Schema::new().field("items", Field::nested(".item", Schema::new().field("name", " ")));
		let err = schema.validate().unwrap_err();
		assert_eq!(err.to_string(), "field `items.name`: selector is empty");
	}
}
