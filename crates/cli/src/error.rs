use std::path::PathBuf;

use quarry_runtime::{FetchError, ScrapeError};
use serde_json::{Value, json};
use thiserror::Error;

use crate::output::ErrorCode;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("failed to read {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid config {}: {source}", path.display())]
	Config {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error("no element matches `{0}`")]
	NotFound(String),

	#[error(transparent)]
	Schema(#[from] quarry::Error),

	#[error(transparent)]
	Extract(#[from] quarry::ExtractError),

	#[error(transparent)]
	Scrape(#[from] ScrapeError),
}

impl From<FetchError> for CliError {
	fn from(err: FetchError) -> Self {
		CliError::Scrape(ScrapeError::Fetch(err))
	}
}

fn fetch_code(err: &FetchError) -> ErrorCode {
	match err {
		FetchError::InvalidUrl { .. } | FetchError::UnsupportedScheme(_) | FetchError::InvalidHeader { .. } | FetchError::InvalidProxy { .. } => ErrorCode::InvalidInput,
		FetchError::Request { source, .. } | FetchError::RetriesExhausted { source, .. } | FetchError::Body(source) if source.is_timeout() => ErrorCode::Timeout,
		_ => ErrorCode::FetchFailed,
	}
}

fn field_path_details(err: &quarry::ExtractError) -> Value {
	json!({
		"fieldPath": err.field_path(),
		"cause": err.transform_error().message(),
	})
}

impl CliError {
	pub fn code(&self) -> ErrorCode {
		match self {
			CliError::Io { .. } => ErrorCode::IoError,
			CliError::Config { .. } | CliError::InvalidInput(_) => ErrorCode::InvalidInput,
			CliError::NotFound(_) => ErrorCode::SelectorNotFound,
			CliError::Schema(quarry::Error::Extract(_)) | CliError::Extract(_) => ErrorCode::ExtractionFailed,
			CliError::Schema(_) => ErrorCode::SchemaInvalid,
			CliError::Scrape(err) => match err {
				ScrapeError::Fetch(err) => fetch_code(err),
				ScrapeError::Status { .. } => ErrorCode::HttpStatus,
				ScrapeError::NoData => ErrorCode::NoData,
				ScrapeError::Schema(quarry::Error::Extract(_)) | ScrapeError::Extract(_) => ErrorCode::ExtractionFailed,
				ScrapeError::Schema(_) => ErrorCode::SchemaInvalid,
				ScrapeError::NoDocument | ScrapeError::NoSchema => ErrorCode::InternalError,
			},
		}
	}

	/// Machine-readable context for the error envelope.
	pub fn details(&self) -> Option<Value> {
		match self {
			CliError::Extract(err) | CliError::Scrape(ScrapeError::Extract(err)) => Some(field_path_details(err)),
			CliError::Scrape(ScrapeError::Status { url, status }) => Some(json!({ "url": url, "status": status })),
			_ => None,
		}
	}
}
