//! HTTP fetch collaborator with bounded retries.
//!
//! One request is in flight per [`Fetcher::fetch`] call. Transport errors,
//! `429` and `5xx` responses are retried with exponential backoff; any other
//! response is returned as-is so the caller sees the real status.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
pub use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use reqwest::header::{HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::FetchError;

const USER_AGENT: &str = concat!("quarry/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BASE_MS: u64 = 250;
pub const DEFAULT_RETRY_CEILING_MS: u64 = 8_000;

/// HTTP method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	#[default]
	Get,
	Head,
	Post,
	Put,
	Patch,
	Delete,
}

impl From<Method> for reqwest::Method {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => reqwest::Method::GET,
			Method::Head => reqwest::Method::HEAD,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
		}
	}
}

/// Per-call request settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct FetchOptions {
	pub method: Method,
	pub headers: BTreeMap<String, String>,
	pub body: Option<String>,
	pub timeout_ms: u64,
	/// Extra attempts after the first one.
	pub retries: u32,
	pub proxy: Option<String>,
	pub retry_base_ms: u64,
	pub retry_ceiling_ms: u64,
}

impl Default for FetchOptions {
	fn default() -> Self {
		Self {
			method: Method::Get,
			headers: BTreeMap::new(),
			body: None,
			timeout_ms: DEFAULT_TIMEOUT_MS,
			retries: DEFAULT_RETRIES,
			proxy: None,
			retry_base_ms: DEFAULT_RETRY_BASE_MS,
			retry_ceiling_ms: DEFAULT_RETRY_CEILING_MS,
		}
	}
}

impl FetchOptions {
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;
		self
	}

	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());
		self
	}

	pub fn body(mut self, body: impl Into<String>) -> Self {
		self.body = Some(body.into());
		self
	}

	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout_ms = timeout.as_millis().try_into().unwrap_or(u64::MAX);
		self
	}

	pub fn retries(mut self, retries: u32) -> Self {
		self.retries = retries;
		self
	}

	pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
		self.proxy = Some(proxy.into());
		self
	}

	pub fn backoff(mut self, base: Duration, ceiling: Duration) -> Self {
		self.retry_base_ms = base.as_millis().try_into().unwrap_or(u64::MAX);
		self.retry_ceiling_ms = ceiling.as_millis().try_into().unwrap_or(u64::MAX);
		self
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_ms)
	}

	fn retry_delay(&self, attempt: u32) -> Duration {
		backoff_delay(attempt, Duration::from_millis(self.retry_base_ms), Duration::from_millis(self.retry_ceiling_ms))
	}
}

/// `min(base * 2^attempt, ceiling)`, saturating.
pub fn backoff_delay(attempt: u32, base: Duration, ceiling: Duration) -> Duration {
	let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
	base.saturating_mul(factor).min(ceiling)
}

fn is_retryable(status: StatusCode) -> bool {
	status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, FetchError> {
	let mut map = HeaderMap::with_capacity(headers.len());
	for (name, value) in headers {
		let invalid = || FetchError::InvalidHeader { name: name.clone() };
		let header = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
		let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
		map.insert(header, value);
	}
	Ok(map)
}

/// HTTP clients keyed by proxy endpoint, `None` meaning a direct connection.
#[derive(Debug, Default)]
pub struct ClientPool {
	clients: Mutex<HashMap<Option<String>, reqwest::Client>>,
}

impl ClientPool {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the pooled client for `proxy`, building it on first use.
	pub fn client(&self, proxy: Option<&str>) -> Result<reqwest::Client, FetchError> {
		let key = proxy.map(str::to_string);
		let mut clients = self.clients.lock();
		if let Some(client) = clients.get(&key) {
			return Ok(client.clone());
		}

		let builder = reqwest::Client::builder().user_agent(USER_AGENT);
		let builder = match proxy {
			Some(proxy) => {
				let config = reqwest::Proxy::all(proxy).map_err(|source| FetchError::InvalidProxy {
					proxy: proxy.to_string(),
					source,
				})?;
				builder.proxy(config)
			}
			// Direct connections ignore proxy environment variables.
			None => builder.no_proxy(),
		};
		let client = builder.build().map_err(FetchError::Client)?;
		debug!(target = "quarry", proxy = proxy.unwrap_or("direct"), "created HTTP client");
		clients.insert(key, client.clone());
		Ok(client)
	}

	pub fn len(&self) -> usize {
		self.clients.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.clients.lock().is_empty()
	}
}

/// Cloneable fetcher sharing one [`ClientPool`].
#[derive(Debug, Clone, Default)]
pub struct Fetcher {
	pool: Arc<ClientPool>,
}

impl Fetcher {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn pool(&self) -> &ClientPool {
		&self.pool
	}

	pub async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<Response, FetchError> {
		let target = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
			url: url.to_string(),
			source,
		})?;
		if !matches!(target.scheme(), "http" | "https") {
			return Err(FetchError::UnsupportedScheme(target.scheme().to_string()));
		}

		let client = self.pool.client(options.proxy.as_deref())?;
		let headers = header_map(&options.headers)?;
		let attempts = options.retries.saturating_add(1);

		let mut attempt = 0u32;
		loop {
			let last = attempt + 1 >= attempts;
			let mut request = client
				.request(options.method.into(), target.clone())
				.headers(headers.clone())
				.timeout(options.request_timeout());
			if let Some(body) = &options.body {
				request = request.body(body.clone());
			}

			info!(target = "quarry", url = %target, attempt = attempt + 1, attempts, "fetching");
			match request.send().await {
				Ok(response) if last || !is_retryable(response.status()) => {
					debug!(target = "quarry", url = %target, status = response.status().as_u16(), "response received");
					return Ok(Response::new(response));
				}
				Ok(response) => {
					warn!(target = "quarry", url = %target, status = response.status().as_u16(), "retryable status");
				}
				Err(source) if source.is_builder() => {
					return Err(FetchError::Request {
						url: target.to_string(),
						source,
					});
				}
				Err(source) if last => {
					return Err(FetchError::RetriesExhausted {
						url: target.to_string(),
						attempts,
						source,
					});
				}
				Err(source) => {
					warn!(target = "quarry", url = %target, error = %source, "request failed");
				}
			}

			let delay = options.retry_delay(attempt);
			debug!(target = "quarry", delay_ms = delay.as_millis() as u64, "backing off");
			tokio::time::sleep(delay).await;
			attempt += 1;
		}
	}
}

/// Response with status and headers available up front and a body read on demand.
#[derive(Debug)]
pub struct Response {
	inner: reqwest::Response,
}

impl Response {
	fn new(inner: reqwest::Response) -> Self {
		Self { inner }
	}

	pub fn status(&self) -> u16 {
		self.inner.status().as_u16()
	}

	pub fn is_success(&self) -> bool {
		self.inner.status().is_success()
	}

	pub fn headers(&self) -> &HeaderMap {
		self.inner.headers()
	}

	pub fn header(&self, name: &str) -> Option<&str> {
		self.inner.headers().get(name).and_then(|value| value.to_str().ok())
	}

	/// Final URL after redirects.
	pub fn url(&self) -> &Url {
		self.inner.url()
	}

	pub async fn text(self) -> Result<String, FetchError> {
		self.inner.text().await.map_err(FetchError::Body)
	}

	pub async fn json<T: DeserializeOwned>(self) -> Result<T, FetchError> {
		let bytes = self.inner.bytes().await.map_err(FetchError::Body)?;
		Ok(serde_json::from_slice(&bytes)?)
	}

	pub async fn bytes(self) -> Result<Vec<u8>, FetchError> {
		Ok(self.inner.bytes().await.map_err(FetchError::Body)?.to_vec())
	}
}
