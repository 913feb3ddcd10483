//! Fluent scraper combining fetch, parse and extraction.

use quarry::schema::ResolveEnv;
use quarry::{Document, Schema, Value};
use tracing::{debug, info};
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::fetch::{FetchOptions, Fetcher};

/// Builder that holds at most one document and one schema.
///
/// ```ignore
/// let data = Scraper::new()
/// 	.fetch("https://example.com/list")
/// 	.await?
/// 	.schema(schema)
/// 	.run()?;
/// ```
#[derive(Debug, Default)]
pub struct Scraper {
	fetcher: Fetcher,
	options: FetchOptions,
	document: Option<Document>,
	base_url: Option<Url>,
	schema: Option<Schema>,
}

impl Scraper {
	pub fn new() -> Self {
		Self::default()
	}

	/// Shares `fetcher`'s client pool.
	pub fn with_fetcher(fetcher: Fetcher) -> Self {
		Self {
			fetcher,
			..Self::default()
		}
	}

	pub fn options(mut self, options: FetchOptions) -> Self {
		self.options = options;
		self
	}

	/// Parses `markup` as the current document.
	pub fn html(mut self, markup: &str) -> Self {
		self.document = Some(Document::parse(markup));
		self
	}

	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);
		self
	}

	pub fn schema(mut self, schema: Schema) -> Self {
		self.schema = Some(schema);
		self
	}

	/// Loads a JSON schema, resolving `url` transforms against the current base URL.
	pub fn schema_json(mut self, json: &str) -> Result<Self> {
		let env = match &self.base_url {
			Some(base) => ResolveEnv::with_base_url(base),
			None => ResolveEnv::new(),
		};
		self.schema = Some(Schema::from_json_with_env(json, &env)?);
		Ok(self)
	}

	/// Fetches `url`, rejecting non-2xx responses, and parses the body.
	///
	/// The final URL after redirects becomes the base URL.
	pub async fn fetch(mut self, url: &str) -> Result<Self> {
		let response = self.fetcher.fetch(url, &self.options).await?;
		if !response.is_success() {
			return Err(ScrapeError::Status {
				url: response.url().to_string(),
				status: response.status(),
			});
		}

		let final_url = response.url().clone();
		let body = response.text().await?;
		info!(target = "quarry", url = %final_url, bytes = body.len(), "page fetched");

		self.document = Some(Document::parse(&body));
		self.base_url = Some(final_url);
		Ok(self)
	}

	pub fn document(&self) -> Option<&Document> {
		self.document.as_ref()
	}

	pub fn current_base_url(&self) -> Option<&Url> {
		self.base_url.as_ref()
	}

	pub fn extract(&self) -> Result<Value> {
		let document = self.document.as_ref().ok_or(ScrapeError::NoDocument)?;
		let schema = self.schema.as_ref().ok_or(ScrapeError::NoSchema)?;
		debug!(target = "quarry", fields = schema.len(), "extracting");
		Ok(quarry::extract(document, schema)?)
	}

	/// Like [`extract`](Self::extract), but fails with [`ScrapeError::NoData`]
	/// when every top-level value is empty.
	pub fn run(&self) -> Result<Value> {
		let data = self.extract()?;
		let empty = data.as_object().is_none_or(|fields| fields.values().all(is_empty_value));
		if empty {
			return Err(ScrapeError::NoData);
		}
		Ok(data)
	}
}

fn is_empty_value(value: &Value) -> bool {
	match value {
		Value::Null => true,
		Value::Array(items) => items.is_empty(),
		Value::Object(fields) => fields.is_empty(),
		_ => false,
	}
}
