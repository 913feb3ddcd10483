//! Where a command reads its markup from.

use std::path::PathBuf;

use quarry_runtime::Scraper;
use tokio::io::AsyncReadExt;
use tracing::debug;
use url::Url;

use crate::commands::def::ExecCtx;
use crate::error::{CliError, Result};

/// An `http(s)` URL, a file path, or `-` for stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
	Url(Url),
	File(PathBuf),
	Stdin,
}

impl Input {
	pub fn parse(raw: &str) -> Result<Self> {
		if raw == "-" {
			return Ok(Input::Stdin);
		}
		if raw.starts_with("http://") || raw.starts_with("https://") {
			return Url::parse(raw)
				.map(Input::Url)
				.map_err(|err| CliError::InvalidInput(format!("invalid URL `{raw}`: {err}")));
		}
		if raw.is_empty() {
			return Err(CliError::InvalidInput("source is empty".to_string()));
		}
		Ok(Input::File(PathBuf::from(raw)))
	}

	pub fn describe(&self) -> String {
		match self {
			Input::Url(url) => url.to_string(),
			Input::File(path) => path.display().to_string(),
			Input::Stdin => "-".to_string(),
		}
	}

	/// A scraper holding the parsed document. URL inputs also set the base URL.
	pub async fn load(&self, ctx: &ExecCtx<'_>) -> Result<Scraper> {
		let scraper = Scraper::with_fetcher(ctx.fetcher.clone()).options(ctx.fetch.clone());
		match self {
			Input::Url(url) => Ok(scraper.fetch(url.as_str()).await?),
			Input::File(path) => {
				let markup = tokio::fs::read_to_string(path).await.map_err(|source| CliError::Io { path: path.clone(), source })?;
				debug!(target = "quarry", path = %path.display(), bytes = markup.len(), "read markup file");
				Ok(scraper.html(&markup))
			}
			Input::Stdin => {
				let mut markup = String::new();
				tokio::io::stdin().read_to_string(&mut markup).await.map_err(|source| CliError::Io {
					path: PathBuf::from("-"),
					source,
				})?;
				debug!(target = "quarry", bytes = markup.len(), "read markup from stdin");
				Ok(scraper.html(&markup))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classifies_sources() {
		assert_eq!(Input::parse("-").unwrap(), Input::Stdin);
		assert_eq!(Input::parse("pages/a.html").unwrap(), Input::File(PathBuf::from("pages/a.html")));
		assert!(matches!(Input::parse("https://example.com/x").unwrap(), Input::Url(url) if url.path() == "/x"));
		assert!(Input::parse("http://").is_err());
		assert!(Input::parse("").is_err());
	}

	#[test]
	fn describe_round_trips_display() {
		assert_eq!(Input::parse("https://example.com").unwrap().describe(), "https://example.com/");
		assert_eq!(Input::Stdin.describe(), "-");
	}
}
