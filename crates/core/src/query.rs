//! Selector compilation and matching.
//!
//! Supported grammar is a whitespace-separated chain of simple fragments
//! joined by the descendant combinator:
//!
//! * `#id` exact `id` attribute match
//! * `.class` membership in the whitespace-split `class` attribute
//! * `[name]` / `[name=value]` attribute presence or exact value, value optionally quoted
//! * anything else is an ASCII case-insensitive tag name
//!
//! Matching walks the tree with an explicit stack of `(node, fragment)`
//! states. Every child is retried against the same fragment whether or not it
//! matched, so a fragment may be satisfied at any depth below the previous one.

use std::collections::HashSet;

use tracing::trace;

use crate::tree::{Node, NodeId, Tree};

/// Predicate compiled from one selector fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
	Id(String),
	Class(String),
	Attribute { name: String, value: Option<String> },
	Tag(String),
}

impl Matcher {
	/// Compiles a single fragment. Never fails; unknown shapes fall back to a tag match.
	pub fn compile(fragment: &str) -> Self {
		if let Some(id) = fragment.strip_prefix('#') {
			return Matcher::Id(id.to_string());
		}
		if let Some(class) = fragment.strip_prefix('.') {
			return Matcher::Class(class.to_string());
		}
		if let Some(inner) = fragment.strip_prefix('[') {
			let inner = inner.strip_suffix(']').unwrap_or(inner);
			return match inner.split_once('=') {
				Some((name, value)) => Matcher::Attribute {
					name: name.trim().to_ascii_lowercase(),
					value: Some(unquote(value.trim()).to_string()),
				},
				None => Matcher::Attribute {
					name: inner.trim().to_ascii_lowercase(),
					value: None,
				},
			};
		}
		Matcher::Tag(fragment.to_ascii_lowercase())
	}

	pub fn matches(&self, node: &Node) -> bool {
		if !node.is_element() {
			return false;
		}
		match self {
			Matcher::Id(id) => node.attr("id") == Some(id.as_str()),
			Matcher::Class(class) => node.class_list().iter().any(|candidate| candidate == class),
			Matcher::Attribute { name, value: None } => node.attributes().contains(name),
			Matcher::Attribute { name, value: Some(value) } => node.attr(name) == Some(value.as_str()),
			Matcher::Tag(tag) => node.tag().eq_ignore_ascii_case(tag),
		}
	}
}

fn unquote(value: &str) -> &str {
	for quote in ['"', '\''] {
		if let Some(inner) = value.strip_prefix(quote).and_then(|rest| rest.strip_suffix(quote)) {
			return inner;
		}
	}
	value
}

/// Ordered fragment chain of a descendant selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledSelector {
	matchers: Vec<Matcher>,
}

impl CompiledSelector {
	pub fn parse(selector: &str) -> Self {
		let matchers = selector.split_whitespace().map(Matcher::compile).collect();
		Self { matchers }
	}

	pub fn matchers(&self) -> &[Matcher] {
		&self.matchers
	}

	pub fn is_empty(&self) -> bool {
		self.matchers.is_empty()
	}

	/// Matching descendants of `scope` in document order, each reported once.
	pub fn query(&self, tree: &Tree, scope: NodeId) -> Vec<NodeId> {
		let Some(last) = self.matchers.len().checked_sub(1) else {
			return Vec::new();
		};

		let mut stack = vec![(scope, 0usize)];
		let mut visited: HashSet<(NodeId, usize)> = HashSet::new();
		let mut recorded: HashSet<NodeId> = HashSet::new();
		let mut results = Vec::new();

		while let Some((node, index)) = stack.pop() {
			let matcher = &self.matchers[index];
			for &child in tree[node].children() {
				let child_node = &tree[child];
				let has_children = !child_node.children().is_empty();

				if matcher.matches(child_node) {
					if index == last {
						if recorded.insert(child) {
							results.push(child);
						}
					} else if has_children && visited.insert((child, index + 1)) {
						stack.push((child, index + 1));
					}
				}
				if has_children && visited.insert((child, index)) {
					stack.push((child, index));
				}
			}
		}

		// Arena order is document order.
		results.sort_unstable();
		trace!(target = "quarry", fragments = self.matchers.len(), results = results.len(), "selector query");
		results
	}
}

/// Compiles `selector` into its fragment chain.
pub fn compile_selector(selector: &str) -> CompiledSelector {
	CompiledSelector::parse(selector)
}

/// Runs `selector` against the descendants of `scope`.
pub fn query(tree: &Tree, scope: NodeId, selector: &str) -> Vec<NodeId> {
	compile_selector(selector).query(tree, scope)
}
