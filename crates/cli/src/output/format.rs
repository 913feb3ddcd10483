use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output format for CLI results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
	/// TOON output (default, compact and token-efficient)
	#[default]
	Toon,
	/// Pretty-printed JSON
	Json,
	/// One JSON document per line
	Ndjson,
	/// Human-readable text
	Text,
}

impl OutputFormat {
	/// Machine encoding of `value`. `Text` has its own layout and returns `None`.
	pub fn encode(self, value: &Value) -> Option<String> {
		match self {
			OutputFormat::Toon => Some(toon::encode(value, None).to_string()),
			OutputFormat::Json => serde_json::to_string_pretty(value).ok(),
			OutputFormat::Ndjson => serde_json::to_string(value).ok(),
			OutputFormat::Text => None,
		}
	}
}
