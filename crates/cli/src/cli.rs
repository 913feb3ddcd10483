use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::commands::extract::ExtractRaw;
use crate::commands::select::SelectRaw;
use crate::commands::title::TitleRaw;
use crate::output::OutputFormat;
use crate::styles::cli_styles;

#[derive(Parser, Debug)]
#[command(name = "quarry")]
#[command(about = "Schema-driven HTML extraction from the command line")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, global = true, action = ArgAction::Count)]
	pub verbose: u8,

	/// Output format (defaults to the config file value, then toon)
	#[arg(short, long, global = true, value_enum)]
	pub format: Option<OutputFormat>,

	/// JSON config file with `fetch` options and a default `format`
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Per-request timeout in milliseconds
	#[arg(long, global = true, value_name = "MS")]
	pub timeout_ms: Option<u64>,

	/// Extra attempts for transport errors, 429 and 5xx responses
	#[arg(long, global = true, value_name = "N")]
	pub retries: Option<u32>,

	/// Proxy URL for all requests
	#[arg(long, global = true, value_name = "URL")]
	pub proxy: Option<String>,

	/// Extra request header `Name: value` (repeatable)
	#[arg(short = 'H', long = "header", global = true, value_name = "HEADER")]
	pub headers: Vec<String>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Extract structured data using a JSON schema file
	#[command(alias = "ex")]
	Extract(ExtractRaw),

	/// List values of the elements matching a selector
	#[command(alias = "sel")]
	Select(SelectRaw),

	/// Print the document title
	Title(TitleRaw),
}

impl Commands {
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Extract(_) => "extract",
			Commands::Select(_) => "select",
			Commands::Title(_) => "title",
		}
	}
}
