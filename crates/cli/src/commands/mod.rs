pub(crate) mod def;
pub mod extract;
pub mod select;
pub mod title;

use std::time::Instant;

use quarry_runtime::Fetcher;
use serde_json::Value;
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::config::Settings;
use crate::error::Result;
use crate::output::{OutputFormat, ResultBuilder, print_result};
use def::{CommandOutcome, ExecCtx, Resolve};

pub async fn dispatch(cli: Cli) -> Result<()> {
	let started = Instant::now();
	let name = cli.command.name();
	let settings = match Settings::resolve(&cli) {
		Ok(settings) => settings,
		Err(err) => return report(name, cli.format.unwrap_or_default(), started, None, Err(err)),
	};
	debug!(target = "quarry", command = name, format = ?settings.format, "dispatching");

	let fetcher = Fetcher::new();
	let ctx = ExecCtx {
		fetcher: &fetcher,
		fetch: &settings.fetch,
	};
	let outcome = execute(cli.command, &ctx).await;
	report(name, settings.format, started, Some(&settings), outcome)
}

async fn execute(command: Commands, ctx: &ExecCtx<'_>) -> Result<CommandOutcome> {
	match command {
		Commands::Extract(raw) => extract::execute(raw.resolve()?, ctx).await,
		Commands::Select(raw) => select::execute(raw.resolve()?, ctx).await,
		Commands::Title(raw) => title::execute(raw.resolve()?, ctx).await,
	}
}

fn report(name: &str, format: OutputFormat, started: Instant, settings: Option<&Settings>, outcome: Result<CommandOutcome>) -> Result<()> {
	let mut builder = ResultBuilder::<Value>::new(name).started_at(started);
	if let Some(settings) = settings {
		builder = builder.config(settings.effective());
	}

	match outcome {
		Ok(outcome) => {
			let result = builder.inputs(outcome.inputs).data(outcome.data).diagnostics(outcome.diagnostics).build();
			print_result(&result, format);
			Ok(())
		}
		Err(err) => {
			let result = builder.error(err.code(), err.to_string(), err.details()).build();
			print_result(&result, format);
			Err(err)
		}
	}
}
