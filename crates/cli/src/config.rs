//! Config file loading and flag merging.
//!
//! ```json
//! { "fetch": { "timeoutMs": 10000, "retries": 3, "headers": { "accept-language": "en" } }, "format": "json" }
//! ```
//!
//! Command-line flags override file values; `-H` headers are added on top of
//! file headers.

use std::path::Path;

use quarry_runtime::FetchOptions;
use serde::Deserialize;

use crate::cli::Cli;
use crate::error::{CliError, Result};
use crate::output::{EffectiveConfig, OutputFormat};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CliConfig {
	#[serde(default)]
	pub fetch: FetchOptions,
	#[serde(default)]
	pub format: Option<OutputFormat>,
}

impl CliConfig {
	pub fn load(path: &Path) -> Result<Self> {
		let raw = std::fs::read_to_string(path).map_err(|source| CliError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		serde_json::from_str(&raw).map_err(|source| CliError::Config {
			path: path.to_path_buf(),
			source,
		})
	}
}

/// Settings in effect for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
	pub format: OutputFormat,
	pub fetch: FetchOptions,
}

impl Settings {
	pub fn resolve(cli: &Cli) -> Result<Self> {
		let config = match &cli.config {
			Some(path) => CliConfig::load(path)?,
			None => CliConfig::default(),
		};

		let mut fetch = config.fetch;
		if let Some(timeout_ms) = cli.timeout_ms {
			fetch.timeout_ms = timeout_ms;
		}
		if let Some(retries) = cli.retries {
			fetch.retries = retries;
		}
		if let Some(proxy) = &cli.proxy {
			fetch.proxy = Some(proxy.clone());
		}
		for header in &cli.headers {
			let (name, value) = parse_header(header)?;
			fetch.headers.insert(name, value);
		}

		Ok(Self {
			format: cli.format.or(config.format).unwrap_or_default(),
			fetch,
		})
	}

	pub fn effective(&self) -> EffectiveConfig {
		EffectiveConfig {
			timeout_ms: self.fetch.timeout_ms,
			retries: self.fetch.retries,
			proxy: self.fetch.proxy.clone(),
			headers: self.fetch.headers.keys().cloned().collect(),
		}
	}
}

/// Splits `Name: value`.
pub fn parse_header(raw: &str) -> Result<(String, String)> {
	match raw.split_once(':') {
		Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.trim().to_string())),
		_ => Err(CliError::InvalidInput(format!("header `{raw}` must look like `Name: value`"))),
	}
}
