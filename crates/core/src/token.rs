//! Streaming HTML tokenizer.
//!
//! A single forward scan turns markup into [`Token`]s. The tokenizer is a
//! recovery-first lexer: it never fails, and malformed fragments either
//! degrade to a best-effort token or are dropped.
//!
//! Deliberate simplifications:
//! * no entity decoding, text and attribute values are kept verbatim
//! * comments and declarations (`<!DOCTYPE ...>`) produce no tokens
//! * `script`/`style` bodies are skipped up to the literal closing tag

use tracing::trace;

/// Elements that never have content and therefore never open a scope.
pub const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Returns `true` for tag names in the fixed void-element set.
/// `script` and `style`: content up to the closing tag is skipped.
pub fn is_raw_text_element(tag: &str) -> bool {
	RAW_TEXT_ELEMENTS.contains(&tag)
}

pub fn is_void_element(tag: &str) -> bool {
	VOID_ELEMENTS.iter().any(|void| void.eq_ignore_ascii_case(tag))
}

/// Attribute mapping of an element or tag token.
///
/// Keys are unique and lowercased by the tokenizer. Source order is kept for
/// stable serialization, but equality ignores it.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
	entries: Vec<(String, String)>,
}

impl Attributes {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts or replaces `name`. A replaced entry keeps its original position.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		let name = name.into();
		let value = value.into();
		match self.entries.iter_mut().find(|(key, _)| *key == name) {
			Some(entry) => entry.1 = value,
			None => self.entries.push((name, value)),
		}
	}

	pub fn get(&self, name: &str) -> Option<&str> {
		self.entries.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
	}

	pub fn contains(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.entries.iter().map(|(key, value)| (key.as_str(), value.as_str()))
	}
}

impl PartialEq for Attributes {
	fn eq(&self, other: &Self) -> bool {
		self.len() == other.len() && self.iter().all(|(name, value)| other.get(name) == Some(value))
	}
}

impl Eq for Attributes {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut attributes = Attributes::new();
		for (name, value) in iter {
			attributes.insert(name, value);
		}
		attributes
	}
}

/// Lexical unit produced by [`tokenize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
	/// Raw text between tags, never empty.
	Text(String),
	/// Opening tag that starts a new scope.
	Open { tag: String, attributes: Attributes },
	/// Tag with a trailing `/` or a void element.
	SelfClosing { tag: String, attributes: Attributes },
	/// Closing tag; the name is lowercased.
	Close(String),
}

/// Tokenizes `markup` in one forward pass.
pub fn tokenize(markup: &str) -> Vec<Token> {
	let mut tokens = Vec::new();
	// ASCII lowercasing keeps byte offsets, so the copy can be searched in place of `markup`.
	let mut lowered: Option<String> = None;
	let len = markup.len();
	let mut pos = 0;

	while pos < len {
		let Some(lt_rel) = markup[pos..].find('<') else {
			tokens.push(Token::Text(markup[pos..].to_string()));
			break;
		};
		let lt = pos + lt_rel;
		if lt > pos {
			tokens.push(Token::Text(markup[pos..lt].to_string()));
		}

		let Some(gt_rel) = markup[lt + 1..].find('>') else {
			break;
		};
		let gt = lt + 1 + gt_rel;
		let raw = &markup[lt + 1..gt];
		let body = raw.trim();
		let body_start = lt + 1 + (raw.len() - raw.trim_start().len());
		pos = gt + 1;

		if body.starts_with("!--") {
			// The comment may contain '>', so resume after the real terminator when there is one.
			if let Some(end) = markup[body_start + 3..].find("-->") {
				pos = body_start + 3 + end + 3;
			}
			continue;
		}
		if body.starts_with('!') {
			continue;
		}
		if let Some(rest) = body.strip_prefix('/') {
			let name = tag_name_prefix(rest.trim_start());
			if !name.is_empty() {
				tokens.push(Token::Close(name.to_ascii_lowercase()));
			}
			continue;
		}

		let name = tag_name_prefix(body);
		if name.is_empty() {
			continue;
		}
		let tag = name.to_ascii_lowercase();
		let self_closing = body.ends_with('/');

		if !self_closing && is_raw_text_element(&tag) {
			let lowered = lowered.get_or_insert_with(|| markup.to_ascii_lowercase());
			let closing = format!("</{tag}>");
			pos = match lowered[pos..].find(&closing) {
				Some(end) => pos + end + closing.len(),
				None => len,
			};
			continue;
		}

		let rest = &body[name.len()..];
		let rest = rest.strip_suffix('/').unwrap_or(rest);
		let attributes = parse_attributes(rest);

		if self_closing || is_void_element(&tag) {
			tokens.push(Token::SelfClosing { tag, attributes });
		} else {
			tokens.push(Token::Open { tag, attributes });
		}
	}

	trace!(target = "quarry", bytes = len, tokens = tokens.len(), "tokenized markup");
	tokens
}

fn is_tag_name_byte(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b':' | b'-')
}

fn tag_name_prefix(input: &str) -> &str {
	let end = input.bytes().position(|byte| !is_tag_name_byte(byte)).unwrap_or(input.len());
	&input[..end]
}

fn parse_attributes(input: &str) -> Attributes {
	let bytes = input.as_bytes();
	let len = bytes.len();
	let mut attributes = Attributes::new();
	let mut i = 0;

	while i < len {
		while i < len && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
			i += 1;
		}
		if i >= len {
			break;
		}

		let name_start = i;
		while i < len && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' {
			i += 1;
		}
		if i == name_start {
			// Stray '=' with no name in front of it.
			i += 1;
			continue;
		}
		let name = input[name_start..i].to_ascii_lowercase();

		let mut cursor = i;
		while cursor < len && bytes[cursor].is_ascii_whitespace() {
			cursor += 1;
		}
		if cursor >= len || bytes[cursor] != b'=' {
			attributes.insert(name, "");
			continue;
		}

		i = cursor + 1;
		while i < len && bytes[i].is_ascii_whitespace() {
			i += 1;
		}
		if i >= len {
			attributes.insert(name, "");
			break;
		}

		let value = match bytes[i] {
			quote @ (b'"' | b'\'') => {
				let value_start = i + 1;
				let value_end = input[value_start..].find(quote as char).map_or(len, |end| value_start + end);
				i = (value_end + 1).min(len);
				&input[value_start..value_end]
			}
			_ => {
				let value_start = i;
				while i < len && !bytes[i].is_ascii_whitespace() {
					i += 1;
				}
				&input[value_start..i]
			}
		};
		attributes.insert(name, value);
	}

	attributes
}
