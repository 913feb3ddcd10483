//! Value transforms applied after extraction.
//!
//! A [`Transform`] is a shareable function from [`Value`] to [`Value`]. The
//! library constructors below are total: they never fail, pass `null`
//! through unchanged, and apply element-wise when handed an array. Failing
//! transforms come from user closures ([`Transform::new`]) or from
//! [`required`].

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;
use serde_json::{Number, Value};
use url::Url;

use crate::error::TransformError;

type TransformFn = dyn Fn(Value) -> Result<Value, TransformError> + Send + Sync;

/// A named, cloneable value transform.
#[derive(Clone)]
pub struct Transform {
	name: Arc<str>,
	func: Arc<TransformFn>,
}

impl fmt::Debug for Transform {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Transform").field(&self.name).finish()
	}
}

impl Transform {
	/// Wraps an arbitrary fallible function.
	pub fn new<F>(func: F) -> Self
	where
		F: Fn(Value) -> Result<Value, TransformError> + Send + Sync + 'static,
	{
		Self::named("custom", func)
	}

	pub fn named<F>(name: &str, func: F) -> Self
	where
		F: Fn(Value) -> Result<Value, TransformError> + Send + Sync + 'static,
	{
		Self {
			name: Arc::from(name),
			func: Arc::new(func),
		}
	}

	/// Wraps an infallible function.
	pub fn map<F>(name: &str, func: F) -> Self
	where
		F: Fn(Value) -> Value + Send + Sync + 'static,
	{
		Self::named(name, move |value| Ok(func(value)))
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn apply(&self, value: Value) -> Result<Value, TransformError> {
		(self.func)(value)
	}

	/// Runs `self`, then `next` on its output.
	pub fn then(self, next: Transform) -> Transform {
		let name = format!("{}|{}", self.name, next.name);
		Transform::named(&name, move |value| next.apply(self.apply(value)?))
	}
}

/// Builds a transform from a string function: `null` passes through, arrays map per element,
/// numbers and booleans are fed in their JSON text form, objects are left alone.
fn scalar<F>(name: &str, func: F) -> Transform
where
	F: Fn(&str) -> Value + Send + Sync + 'static,
{
	fn walk<F: Fn(&str) -> Value>(value: Value, func: &F) -> Value {
		match value {
			Value::String(text) => func(&text),
			Value::Number(number) => func(&number.to_string()),
			Value::Bool(flag) => func(if flag { "true" } else { "false" }),
			Value::Array(items) => Value::Array(items.into_iter().map(|item| walk(item, func)).collect()),
			other => other,
		}
	}

	Transform::map(name, move |value| walk(value, &func))
}

pub fn trim() -> Transform {
	scalar("trim", |text| Value::String(text.trim().to_string()))
}

pub fn lowercase() -> Transform {
	scalar("lowercase", |text| Value::String(text.to_lowercase()))
}

pub fn uppercase() -> Transform {
	scalar("uppercase", |text| Value::String(text.to_uppercase()))
}

static FLOAT_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?(\d+\.?\d*|\.\d+)").expect("FLOAT_PREFIX should compile"));
static INT_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+").expect("INT_PREFIX should compile"));

fn numeric_chars(text: &str) -> String {
	text.chars().filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-').collect()
}

/// Parses the leading decimal number after dropping every other character. `"$1,299.50"` → `1299.5`.
pub fn parse_number(text: &str) -> Option<f64> {
	let cleaned = numeric_chars(text);
	FLOAT_PREFIX.find(&cleaned)?.as_str().parse().ok()
}

/// Integer variant of [`parse_number`]: the fractional part is ignored.
pub fn parse_integer(text: &str) -> Option<i64> {
	let cleaned = numeric_chars(text);
	INT_PREFIX.find(&cleaned)?.as_str().parse().ok()
}

fn number_value(number: f64) -> Value {
	if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
		return Value::Number(Number::from(number as i64));
	}
	Number::from_f64(number).map_or(Value::Null, Value::Number)
}

pub fn number() -> Transform {
	scalar("number", |text| parse_number(text).map_or(Value::Null, number_value))
}

pub fn integer() -> Transform {
	scalar("integer", |text| parse_integer(text).map_or(Value::Null, |n| Value::Number(n.into())))
}

const TRUTHY: &[&str] = &["true", "1", "yes", "on", "y"];

pub fn boolean() -> Transform {
	scalar("boolean", |text| {
		let text = text.trim();
		Value::Bool(TRUTHY.iter().any(|truthy| truthy.eq_ignore_ascii_case(text)))
	})
}

const DATETIME_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y/%m/%d %H:%M:%S", "%Y/%m/%d %H:%M"];
const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y"];

/// Normalizes a date or timestamp to ISO-8601.
///
/// Zoned timestamps become UTC RFC 3339 (`2024-05-01T10:00:00Z`), local
/// timestamps keep their wall-clock time, and plain dates become `YYYY-MM-DD`.
pub fn normalize_date(text: &str) -> Option<String> {
	let text = text.trim();
	if text.is_empty() {
		return None;
	}
	let zoned = DateTime::parse_from_rfc3339(text).or_else(|_| DateTime::parse_from_rfc2822(text));
	if let Ok(zoned) = zoned {
		return Some(zoned.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true));
	}
	if let Some(local) = DATETIME_LAYOUTS.iter().find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok()) {
		return Some(local.format("%Y-%m-%dT%H:%M:%S").to_string());
	}
	DATE_LAYOUTS
		.iter()
		.find_map(|layout| NaiveDate::parse_from_str(text, layout).ok())
		.map(|date| date.format("%Y-%m-%d").to_string())
}

pub fn date() -> Transform {
	scalar("date", |text| normalize_date(text).map_or(Value::Null, Value::String))
}

/// Splits on `delimiter`, trimming each item and dropping empty ones.
pub fn split(delimiter: &str) -> Transform {
	let delimiter = delimiter.to_string();
	scalar("split", move |text| {
		Value::Array(
			text.split(delimiter.as_str())
				.map(str::trim)
				.filter(|item| !item.is_empty())
				.map(|item| Value::String(item.to_string()))
				.collect(),
		)
	})
}

/// Resolves relative links against `base`. Values that do not form a URL are kept as they are.
pub fn url(base: Url) -> Transform {
	scalar("url", move |text| match base.join(text.trim()) {
		Ok(resolved) => Value::String(resolved.to_string()),
		Err(_) => Value::String(text.to_string()),
	})
}

/// Capture group `group` of the first match of `pattern`, or `null`.
pub fn regex(pattern: &str, group: usize) -> Result<Transform, regex::Error> {
	let re = Regex::new(pattern)?;
	Ok(scalar("regex", move |text| {
		re.captures(text)
			.and_then(|caps| caps.get(group))
			.map_or(Value::Null, |m| Value::String(m.as_str().to_string()))
	}))
}

/// Replaces every match of `pattern`; `$1`-style references are expanded.
pub fn replace(pattern: &str, replacement: &str) -> Result<Transform, regex::Error> {
	let re = Regex::new(pattern)?;
	let replacement = replacement.to_string();
	Ok(scalar("replace", move |text| Value::String(re.replace_all(text, replacement.as_str()).into_owned())))
}

/// Removes repeated array items, keeping first occurrences.
pub fn unique() -> Transform {
	Transform::map("unique", |value| match value {
		Value::Array(items) => {
			let mut seen = HashSet::new();
			Value::Array(items.into_iter().filter(|item| seen.insert(item.to_string())).collect())
		}
		other => other,
	})
}

/// Joins array items into one string; `null` items are skipped.
pub fn join(separator: &str) -> Transform {
	let separator = separator.to_string();
	Transform::map("join", move |value| match value {
		Value::Array(items) => {
			let parts: Vec<String> = items
				.into_iter()
				.filter(|item| !item.is_null())
				.map(|item| match item {
					Value::String(text) => text,
					other => other.to_string(),
				})
				.collect();
			Value::String(parts.join(&separator))
		}
		other => other,
	})
}

/// Fails on `null`, empty strings and empty arrays.
pub fn required() -> Transform {
	Transform::named("required", |value| {
		let missing = match &value {
			Value::Null => true,
			Value::String(text) => text.trim().is_empty(),
			Value::Array(items) => items.is_empty(),
			_ => false,
		};
		if missing { Err(TransformError::new("value is required")) } else { Ok(value) }
	})
}

/// Left-to-right composition.
pub fn pipe(transforms: impl IntoIterator<Item = Transform>) -> Transform {
	let transforms: Vec<Transform> = transforms.into_iter().collect();
	let name = transforms.iter().map(Transform::name).collect::<Vec<_>>().join("|");
	Transform::named(&name, move |value| transforms.iter().try_fold(value, |acc, transform| transform.apply(acc)))
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn string_transforms() {
		assert_eq!(trim().apply(json!("  a b  ")).unwrap(), json!("a b"));
		assert_eq!(lowercase().apply(json!("MiXeD")).unwrap(), json!("mixed"));
		assert_eq!(uppercase().apply(json!("MiXeD")).unwrap(), json!("MIXED"));
	}

	#[test]
	fn scalar_transforms_pass_null_and_map_arrays() {
		assert_eq!(trim().apply(Value::Null).unwrap(), Value::Null);
		assert_eq!(trim().apply(json!([" a ", " b"])).unwrap(), json!(["a", "b"]));
	}

	#[test]
	fn number_strips_noise() {
		assert_eq!(parse_number("$1,299.50"), Some(1299.5));
		assert_eq!(parse_number("-3.5 °C"), Some(-3.5));
		assert_eq!(parse_number("1.2.3"), Some(1.2));
		assert_eq!(parse_number("n/a"), None);
		assert_eq!(number().apply(json!("Price: 42 EUR")).unwrap(), json!(42));
		assert_eq!(number().apply(json!("0.25")).unwrap(), json!(0.25));
		assert_eq!(number().apply(json!("free")).unwrap(), Value::Null);
	}

	#[test]
	fn integer_truncates() {
		assert_eq!(parse_integer("12.9 items"), Some(12));
		assert_eq!(integer().apply(json!("Qty: 007")).unwrap(), json!(7));
		assert_eq!(integer().apply(json!("none")).unwrap(), Value::Null);
	}

	#[test]
	fn boolean_uses_truthy_set() {
		for truthy in ["true", "1", "YES", " on "] {
			assert_eq!(boolean().apply(json!(truthy)).unwrap(), json!(true), "{truthy}");
		}
		assert_eq!(boolean().apply(json!("nope")).unwrap(), json!(false));
	}

	#[test]
	fn dates_normalize_to_iso() {
		assert_eq!(normalize_date("2024-05-01T12:00:00+02:00").as_deref(), Some("2024-05-01T10:00:00Z"));
		assert_eq!(normalize_date("2024-05-01 08:30").as_deref(), Some("2024-05-01T08:30:00"));
		assert_eq!(normalize_date("May 3, 2023").as_deref(), Some("2023-05-03"));
		assert_eq!(normalize_date("03.05.2023").as_deref(), Some("2023-05-03"));
		assert_eq!(date().apply(json!("soon")).unwrap(), Value::Null);
	}

	#[test]
	fn split_trims_items() {
		assert_eq!(split(",").apply(json!(" a, b ,,c ")).unwrap(), json!(["a", "b", "c"]));
	}

	#[test]
	fn url_resolves_relative_links() {
		let base = Url::parse("https://example.com/catalog/page.html").unwrap();
		let resolve = url(base);
		assert_eq!(resolve.apply(json!("/img/a.png")).unwrap(), json!("https://example.com/img/a.png"));
		assert_eq!(resolve.apply(json!("item?id=2")).unwrap(), json!("https://example.com/catalog/item?id=2"));
		assert_eq!(resolve.apply(json!("https://cdn.test/x")).unwrap(), json!("https://cdn.test/x"));
	}

	#[test]
	fn regex_capture_and_replace() {
		let sku = regex(r"SKU-(\d+)", 1).unwrap();
		assert_eq!(sku.apply(json!("item SKU-123 blue")).unwrap(), json!("123"));
		assert_eq!(sku.apply(json!("no code")).unwrap(), Value::Null);

		let squash = replace(r"\s+", " ").unwrap();
		assert_eq!(squash.apply(json!("a \n\t b")).unwrap(), json!("a b"));
		assert!(regex("(", 0).is_err());
	}

	#[test]
	fn collection_transforms() {
		assert_eq!(unique().apply(json!(["a", "b", "a", 1, 1])).unwrap(), json!(["a", "b", 1]));
		assert_eq!(join(", ").apply(json!(["a", null, 2])).unwrap(), json!("a, 2"));
	}

	#[test]
	fn required_rejects_missing_values() {
		assert!(required().apply(json!("x")).is_ok());
		let err = required().apply(json!("  ")).unwrap_err();
		assert_eq!(err.message(), "value is required");
		assert!(required().apply(json!([])).is_err());
	}

	#[test]
	fn pipe_runs_left_to_right() {
		let chain = pipe([trim(), replace("-", "").unwrap(), integer()]);
		assert_eq!(chain.name(), "trim|replace|integer");
		assert_eq!(chain.apply(json!(" 1-000 ")).unwrap(), json!(1000));

		let chained = trim().then(uppercase());
		assert_eq!(chained.apply(json!(" ok ")).unwrap(), json!("OK"));
	}

	#[test]
	fn custom_transform_errors_propagate_through_pipe() {
		let fail = Transform::new(|_| Err(TransformError::new("boom")));
		let err = pipe([trim(), fail, uppercase()]).apply(json!("x")).unwrap_err();
		assert_eq!(err.to_string(), "boom");
	}
}
