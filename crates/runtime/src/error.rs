use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Failure of the HTTP fetch collaborator.
#[derive(Debug, Error)]
pub enum FetchError {
	#[error("invalid URL `{url}`: {source}")]
	InvalidUrl {
		url: String,
		#[source]
		source: url::ParseError,
	},

	#[error("unsupported URL scheme `{0}` (expected http or https)")]
	UnsupportedScheme(String),

	#[error("invalid proxy `{proxy}`: {source}")]
	InvalidProxy {
		proxy: String,
		#[source]
		source: reqwest::Error,
	},

	#[error("invalid header `{name}`")]
	InvalidHeader { name: String },

	#[error("failed to build HTTP client: {0}")]
	Client(#[source] reqwest::Error),

	#[error("request to {url} failed: {source}")]
	Request {
		url: String,
		#[source]
		source: reqwest::Error,
	},

	#[error("request to {url} failed after {attempts} attempts: {source}")]
	RetriesExhausted {
		url: String,
		attempts: u32,
		#[source]
		source: reqwest::Error,
	},

	#[error("failed to read response body: {0}")]
	Body(#[source] reqwest::Error),

	#[error("response body is not valid JSON: {0}")]
	Json(#[from] serde_json::Error),
}

/// Failure of a [`Scraper`](crate::Scraper) step.
#[derive(Debug, Error)]
pub enum ScrapeError {
	#[error(transparent)]
	Fetch(#[from] FetchError),

	#[error("{url} responded with HTTP {status}")]
	Status { url: String, status: u16 },

	#[error("no document loaded: call html() or fetch() first")]
	NoDocument,

	#[error("no schema set: call schema() first")]
	NoSchema,

	#[error("extraction produced no data")]
	NoData,

	#[error(transparent)]
	Schema(#[from] quarry::Error),

	#[error(transparent)]
	Extract(#[from] quarry::ExtractError),
}
