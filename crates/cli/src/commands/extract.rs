//! `quarry extract`: apply a JSON schema file to a page.

use std::path::PathBuf;

use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use url::Url;

use crate::commands::def::{CommandOutcome, ExecCtx, Resolve};
use crate::error::{CliError, Result};
use crate::input::Input;
use crate::output::{CommandInputs, DiagnosticLevel};

#[derive(Debug, Clone, Args, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRaw {
	/// URL, file path, or `-` for stdin
	pub source: String,

	/// JSON schema file
	#[arg(short, long, value_name = "FILE")]
	pub schema: PathBuf,

	/// Base URL for `url` transforms (defaults to the fetched URL)
	#[arg(short, long, value_name = "URL")]
	#[serde(default)]
	pub base: Option<String>,

	/// Fail when every top-level field comes back empty
	#[arg(long)]
	#[serde(default)]
	pub require_data: bool,
}

#[derive(Debug, Clone)]
pub struct ExtractResolved {
	pub input: Input,
	pub schema: PathBuf,
	pub base: Option<Url>,
	pub require_data: bool,
}

impl Resolve for ExtractRaw {
	type Output = ExtractResolved;

	fn resolve(self) -> Result<Self::Output> {
		let base = self
			.base
			.map(|base| Url::parse(&base).map_err(|err| CliError::InvalidInput(format!("invalid base URL `{base}`: {err}"))))
			.transpose()?;
		Ok(ExtractResolved {
			input: Input::parse(&self.source)?,
			schema: self.schema,
			base,
			require_data: self.require_data,
		})
	}
}

fn all_empty(data: &Value) -> bool {
	data.as_object().is_none_or(|fields| {
		fields.values().all(|value| match value {
			Value::Null => true,
			Value::Array(items) => items.is_empty(),
			Value::Object(fields) => fields.is_empty(),
			_ => false,
		})
	})
}

pub(crate) async fn execute(args: ExtractResolved, ctx: &ExecCtx<'_>) -> Result<CommandOutcome> {
	let schema_json = tokio::fs::read_to_string(&args.schema).await.map_err(|source| CliError::Io {
		path: args.schema.clone(),
		source,
	})?;

	let mut scraper = args.input.load(ctx).await?;
	if let Some(base) = args.base {
		scraper = scraper.base_url(base);
	}
	let scraper = scraper.schema_json(&schema_json)?;
	let data = if args.require_data { scraper.run()? } else { scraper.extract()? };
	info!(target = "quarry", source = %args.input.describe(), "extraction finished");

	let inputs = CommandInputs {
		source: Some(args.input.describe()),
		schema: Some(args.schema),
		base_url: scraper.current_base_url().map(Url::to_string),
		..Default::default()
	};
	let empty = all_empty(&data);
	let outcome = CommandOutcome::new(inputs, data);
	Ok(if empty {
		outcome.diagnostic(DiagnosticLevel::Warning, "every field came back empty")
	} else {
		outcome
	})
}
