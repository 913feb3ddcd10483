//! Error types for schema loading and extraction.
//!
//! Parsing and querying never fail. The only runtime failure is a transform
//! returning an error, which is tagged with every field name on the way out.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for the `quarry` crate.
#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	Schema(#[from] SchemaError),

	#[error(transparent)]
	Extract(#[from] ExtractError),

	#[error("invalid schema JSON: {0}")]
	Json(#[from] serde_json::Error),
}

/// Failure reported by a [`Transform`](crate::transform::Transform).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransformError {
	message: String,
}

impl TransformError {
	pub fn new(message: impl std::fmt::Display) -> Self {
		Self { message: message.to_string() }
	}

	pub fn message(&self) -> &str {
		&self.message
	}
}

/// Error raised while extracting a schema.
#[derive(Debug, Error)]
pub enum ExtractError {
	/// Wraps the failure of one field, so the full field path can be recovered.
	#[error("Field \"{name}\": {source}")]
	Field {
		name: String,
		#[source]
		source: Box<ExtractError>,
	},

	#[error("Transform failed: {0}")]
	Transform(#[from] TransformError),
}

impl ExtractError {
	/// Field names from the outermost schema down to the failing field.
	pub fn field_path(&self) -> Vec<&str> {
		let mut path = Vec::new();
		let mut current = self;
		while let ExtractError::Field { name, source } = current {
			path.push(name.as_str());
			current = source;
		}
		path
	}

	/// The transform failure at the bottom of the chain.
	pub fn transform_error(&self) -> &TransformError {
		match self {
			ExtractError::Field { source, .. } => source.transform_error(),
			ExtractError::Transform(err) => err,
		}
	}
}

/// A schema definition that cannot be turned into a [`Schema`](crate::schema::Schema).
#[derive(Debug, Error)]
pub enum SchemaError {
	#[error("field `{field}`: selector is empty")]
	EmptySelector { field: String },

	#[error("field `{field}`: {reason}")]
	InvalidField { field: String, reason: String },

	#[error("field `{field}`: invalid transform: {reason}")]
	InvalidTransform { field: String, reason: String },

	#[error("field `{field}`: invalid regex `{pattern}`: {source}")]
	InvalidRegex {
		field: String,
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("field `{field}`: invalid base URL `{url}`: {source}")]
	InvalidBaseUrl {
		field: String,
		url: String,
		#[source]
		source: url::ParseError,
	},

	#[error("field `{field}`: `url` transform needs a base URL")]
	MissingBaseUrl { field: String },
}
