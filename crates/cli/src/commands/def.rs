//! Shared command plumbing.

use quarry_runtime::{FetchOptions, Fetcher};
use serde_json::Value;

use crate::error::Result;
use crate::output::{CommandInputs, Diagnostic, DiagnosticLevel};

/// Validates raw CLI arguments.
pub(crate) trait Resolve {
	type Output;

	fn resolve(self) -> Result<Self::Output>;
}

/// State shared by every command of one invocation.
pub(crate) struct ExecCtx<'a> {
	pub fetcher: &'a Fetcher,
	pub fetch: &'a FetchOptions,
}

/// Successful command result before it is wrapped in the envelope.
#[derive(Debug)]
pub(crate) struct CommandOutcome {
	pub inputs: CommandInputs,
	pub data: Value,
	pub diagnostics: Vec<Diagnostic>,
}

impl CommandOutcome {
	pub fn new(inputs: CommandInputs, data: Value) -> Self {
		Self {
			inputs,
			data,
			diagnostics: Vec::new(),
		}
	}

	pub fn diagnostic(mut self, level: DiagnosticLevel, message: impl Into<String>) -> Self {
		self.diagnostics.push(Diagnostic {
			level,
			message: message.into(),
		});
		self
	}
}
