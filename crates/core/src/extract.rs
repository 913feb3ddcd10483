//! Schema-driven extraction.

use serde_json::{Map, Value};
use tracing::trace;

use crate::dom::{Element, Selectable};
use crate::error::ExtractError;
use crate::schema::{Field, MultipleField, NestedField, Schema, SingleField, Source};

/// Applies `schema` to `scope`, producing one JSON object keyed in field order.
///
/// The first failing field aborts extraction; its error carries every field
/// name from the outermost schema down.
pub fn extract<S: Selectable + ?Sized>(scope: &S, schema: &Schema) -> Result<Value, ExtractError> {
	let mut out = Map::with_capacity(schema.len());
	for (name, field) in schema.fields() {
		let value = extract_field(scope, field).map_err(|source| ExtractError::Field {
			name: name.to_string(),
			source: Box::new(source),
		})?;
		trace!(target = "quarry", field = name, null = value.is_null(), "field extracted");
		out.insert(name.to_string(), value);
	}
	Ok(Value::Object(out))
}

fn extract_field<S: Selectable + ?Sized>(scope: &S, field: &Field) -> Result<Value, ExtractError> {
	match field {
		Field::Single(field) => single(scope, field),
		Field::Multiple(field) => multiple(scope, field),
		Field::Nested(field) => nested(scope, field),
	}
}

fn read(element: &Element<'_>, source: &Source) -> Value {
	match source {
		Source::Text => Value::String(element.text()),
		Source::Html => Value::String(element.html()),
		Source::Attr(name) => element.attr(name).map_or(Value::Null, |value| Value::String(value.to_string())),
	}
}

fn single<S: Selectable + ?Sized>(scope: &S, field: &SingleField) -> Result<Value, ExtractError> {
	let raw = match scope.select_one(&field.selector) {
		Some(element) => read(&element, &field.source),
		None => field.default.clone().unwrap_or(Value::Null),
	};
	match &field.transform {
		Some(transform) => Ok(transform.apply(raw)?),
		None => Ok(raw),
	}
}

fn limited<'a>(mut matches: Vec<Element<'a>>, limit: Option<usize>) -> Vec<Element<'a>> {
	if let Some(limit) = limit {
		matches.truncate(limit);
	}
	matches
}

fn multiple<S: Selectable + ?Sized>(scope: &S, field: &MultipleField) -> Result<Value, ExtractError> {
	let matches = limited(scope.select(&field.selector), field.limit);
	let mut values: Vec<Value> = matches.iter().map(|element| read(element, &field.source)).filter(|value| !value.is_null()).collect();
	if values.is_empty() {
		values = field.default.clone().unwrap_or_default();
	}
	let raw = Value::Array(values);
	match &field.transform {
		Some(transform) => Ok(transform.apply(raw)?),
		None => Ok(raw),
	}
}

fn nested<S: Selectable + ?Sized>(scope: &S, field: &NestedField) -> Result<Value, ExtractError> {
	if !field.multiple {
		return match scope.select_one(&field.selector) {
			Some(element) => extract(&element, &field.schema),
			None => Ok(Value::Null),
		};
	}

	let items = limited(scope.select(&field.selector), field.limit)
		.iter()
		.map(|element| extract(element, &field.schema))
		.collect::<Result<Vec<_>, _>>()?;
	Ok(Value::Array(items))
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::dom::Document;
	use crate::error::TransformError;
	use crate::transform::{self, Transform};

	const SHOP: &str = r#"
<div class="shop">
  <h1> Corner Store </h1>
  <ul>
    <li class="item"><span class="name">Tea</span><span class="price">3.50</span><a href="/tea">x</a></li>
    <li class="item"><span class="name">Jam</span><span class="price">4</span><a>x</a></li>
    <li class="item"><span class="name">Oats</span><span class="price">2.25</span><a href="/oats">x</a></li>
  </ul>
</div>"#;

	#[test]
	fn single_reads_text_html_and_attr() {
		let doc = Document::parse(SHOP);
		let schema = Schema::new()
			.field("title", "h1")
			.field("first", Field::single(".item").html())
			.field("link", Field::single("a").attr("href"));
		let out = extract(&doc, &schema).unwrap();
		assert_eq!(out["title"], json!("Corner Store"));
		assert_eq!(out["first"], json!(r#"<span class="name">Tea</span><span class="price">3.50</span><a href="/tea">x</a>"#));
		assert_eq!(out["link"], json!("/tea"));
	}

	#[test]
	fn single_default_and_null() {
		let doc = Document::parse(SHOP);
		let schema = Schema::new().field("missing", Field::single("table").default("N/A")).field("absent", "table");
		assert_eq!(extract(&doc, &schema).unwrap(), json!({ "missing": "N/A", "absent": null }));
	}

	#[test]
	fn missing_attribute_on_found_element_is_null() {
		let doc = Document::parse(SHOP);
		let schema = Schema::new().field("id", Field::single("h1").attr("id").default("unused"));
		assert_eq!(extract(&doc, &schema).unwrap()["id"], Value::Null);
	}

	#[test]
	fn multiple_drops_nulls_and_respects_limit() {
		let doc = Document::parse(SHOP);
		let schema = Schema::new()
			.field("links", Field::multiple("a").attr("href"))
			.field("names", Field::multiple(".name").limit(2))
			.field("none", Field::multiple("table"))
			.field("fallback", Field::multiple("table").default(["-"]));
		assert_eq!(
			extract(&doc, &schema).unwrap(),
			json!({
				"links": ["/tea", "/oats"],
				"names": ["Tea", "Jam"],
				"none": [],
				"fallback": ["-"],
			})
		);
	}

	#[test]
	fn multiple_transform_receives_whole_array() {
		let doc = Document::parse(SHOP);
		let count = Transform::named("count", |value| Ok(json!(value.as_array().map_or(0, Vec::len))));
		let schema = Schema::new().field("count", Field::multiple(".item").transform(count));
		assert_eq!(extract(&doc, &schema).unwrap()["count"], json!(3));
	}

	#[test]
	fn nested_single_and_multiple() {
		let doc = Document::parse(SHOP);
		let item = Schema::new().field("name", ".name").field("price", Field::single(".price").transform(transform::number()));
		let schema = Schema::new()
			.field("first", Field::nested(".item", item.clone()))
			.field("items", Field::nested(".item", item).limit(2))
			.field("nothing", Field::nested("table", Schema::new().field("x", "td")))
			.field("nothing_list", Field::nested("table", Schema::new()).multiple());
		assert_eq!(
			extract(&doc, &schema).unwrap(),
			json!({
				"first": { "name": "Tea", "price": 3.5 },
				"items": [{ "name": "Tea", "price": 3.5 }, { "name": "Jam", "price": 4 }],
				"nothing": null,
				"nothing_list": [],
			})
		);
	}

	#[test]
	fn transform_failure_is_tagged_through_nesting() {
		let doc = Document::parse(SHOP);
		let reject = Transform::named("reject", |_| Err(TransformError::new("not a price")));
		let schema = Schema::new().field("items", Field::nested(".item", Schema::new().field("price", Field::single(".price").transform(reject))).multiple());
		let err = extract(&doc, &schema).unwrap_err();
		assert_eq!(err.to_string(), r#"Field "items": Field "price": Transform failed: not a price"#);
		assert_eq!(err.field_path(), vec!["items", "price"]);
	}

	#[test]
	fn transform_sees_default_value() {
		let doc = Document::parse(SHOP);
		let schema = Schema::new().field("shout", Field::single("table").default("quiet").transform(transform::uppercase()));
		assert_eq!(extract(&doc, &schema).unwrap()["shout"], json!("QUIET"));
	}

	#[test]
	fn element_scope_limits_search() {
		let doc = Document::parse(SHOP);
		let last = doc.select(".item").pop().unwrap();
		let out = extract(&last, &Schema::new().field("name", ".name")).unwrap();
		assert_eq!(out, json!({ "name": "Oats" }));
	}
}
