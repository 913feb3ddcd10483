//! `quarry select`: values of every element matching a selector.

use clap::Args;
use quarry::{MultipleField, Schema};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::commands::def::{CommandOutcome, ExecCtx, Resolve};
use crate::error::{CliError, Result};
use crate::input::Input;
use crate::output::{CommandInputs, DiagnosticLevel};

#[derive(Debug, Clone, Args, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectRaw {
	/// URL, file path, or `-` for stdin
	pub source: String,

	/// Descendant selector, e.g. `ul.results li a`
	pub selector: String,

	/// What to read from each match: `text`, `html`, or an attribute name
	#[arg(short, long, default_value = "text")]
	#[serde(default = "default_attr")]
	pub attr: String,

	/// Maximum number of values to return
	#[arg(short, long)]
	#[serde(default)]
	pub limit: Option<usize>,
}

fn default_attr() -> String {
	"text".to_string()
}

#[derive(Debug, Clone)]
pub struct SelectResolved {
	pub input: Input,
	pub selector: String,
	pub field: MultipleField,
}

impl Resolve for SelectRaw {
	type Output = SelectResolved;

	fn resolve(self) -> Result<Self::Output> {
		if self.selector.trim().is_empty() {
			return Err(CliError::InvalidInput("selector is empty".to_string()));
		}
		let mut field = MultipleField::new(self.selector.as_str()).attr(&self.attr);
		field.limit = self.limit;
		Ok(SelectResolved {
			input: Input::parse(&self.source)?,
			selector: self.selector,
			field,
		})
	}
}

pub(crate) async fn execute(args: SelectResolved, ctx: &ExecCtx<'_>) -> Result<CommandOutcome> {
	let scraper = args.input.load(ctx).await?;
	let document = scraper.document().ok_or(quarry_runtime::ScrapeError::NoDocument)?;

	let matched = document.select(&args.selector).len();
	let schema = Schema::new().field("items", args.field);
	let mut data = quarry::extract(document, &schema)?;
	let items = data["items"].take();

	let inputs = CommandInputs {
		source: Some(args.input.describe()),
		selector: Some(args.selector),
		..Default::default()
	};
	let outcome = CommandOutcome::new(inputs, json!({ "matched": matched, "items": items }));
	Ok(if matched == 0 {
		outcome.diagnostic(DiagnosticLevel::Info, "no elements matched")
	} else {
		outcome
	})
}
