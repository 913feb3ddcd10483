//! `quarry title`: text of the first `title` element.

use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::commands::def::{CommandOutcome, ExecCtx, Resolve};
use crate::error::{CliError, Result};
use crate::input::Input;
use crate::output::CommandInputs;

#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct TitleRaw {
	/// URL, file path, or `-` for stdin
	pub source: String,
}

impl Resolve for TitleRaw {
	type Output = Input;

	fn resolve(self) -> Result<Input> {
		Input::parse(&self.source)
	}
}

pub(crate) async fn execute(input: Input, ctx: &ExecCtx<'_>) -> Result<CommandOutcome> {
	let scraper = input.load(ctx).await?;
	let title = scraper.document().and_then(|document| document.title()).ok_or_else(|| CliError::NotFound("title".to_string()))?;

	let inputs = CommandInputs {
		source: Some(input.describe()),
		..Default::default()
	};
	Ok(CommandOutcome::new(inputs, json!({ "title": title })))
}
