//! Arena-backed document tree.
//!
//! Nodes live in a single `Vec` owned by [`Tree`] and refer to each other by
//! [`NodeId`]. Children are owned by position in the arena; the parent link
//! is a plain index, so the structure has no reference cycles.
//!
//! Nodes are appended in token order, which makes arena order identical to
//! document (pre-)order. The query engine relies on this to sort results.

use std::ops::Index;
use std::sync::OnceLock;

use tracing::debug;

use crate::token::{Attributes, Token, is_raw_text_element, is_void_element, tokenize};

/// Tag of the synthetic document root.
pub const ROOT_TAG: &str = "document";

/// Index of a node inside its owning [`Tree`].
///
/// Ids are only meaningful for the tree that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
	pub fn index(self) -> usize {
		self.0
	}
}

/// One vertex of the document: an element or a text leaf.
#[derive(Debug, Clone)]
pub struct Node {
	tag: String,
	attributes: Attributes,
	children: Vec<NodeId>,
	text: String,
	parent: Option<NodeId>,
	class_list: OnceLock<Vec<String>>,
}

impl Node {
	fn element(tag: String, attributes: Attributes, parent: Option<NodeId>) -> Self {
		Self {
			tag,
			attributes,
			children: Vec::new(),
			text: String::new(),
			parent,
			class_list: OnceLock::new(),
		}
	}

	fn text_leaf(text: String, parent: NodeId) -> Self {
		Self {
			tag: String::new(),
			attributes: Attributes::new(),
			children: Vec::new(),
			text,
			parent: Some(parent),
			class_list: OnceLock::new(),
		}
	}

	/// Lowercased tag name; empty for text leaves.
	pub fn tag(&self) -> &str {
		&self.tag
	}

	pub fn attributes(&self) -> &Attributes {
		&self.attributes
	}

	pub fn attr(&self, name: &str) -> Option<&str> {
		self.attributes.get(name)
	}

	pub fn children(&self) -> &[NodeId] {
		&self.children
	}

	/// Leaf text; empty for elements.
	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn parent(&self) -> Option<NodeId> {
		self.parent
	}

	pub fn is_text(&self) -> bool {
		self.tag.is_empty()
	}

	pub fn is_element(&self) -> bool {
		!self.tag.is_empty()
	}

	/// Whitespace-split `class` attribute, computed on first use.
	pub fn class_list(&self) -> &[String] {
		self.class_list.get_or_init(|| {
			self.attributes
				.get("class")
				.map(|classes| classes.split_whitespace().map(str::to_string).collect())
				.unwrap_or_default()
		})
	}
}

/// Parsed document: the node arena rooted at a synthetic `document` element.
#[derive(Debug, Clone)]
pub struct Tree {
	nodes: Vec<Node>,
}

impl Default for Tree {
	fn default() -> Self {
		Self::new()
	}
}

impl Tree {
	pub const ROOT: NodeId = NodeId(0);

	/// Empty tree holding only the root.
	pub fn new() -> Self {
		Self {
			nodes: vec![Node::element(ROOT_TAG.to_string(), Attributes::new(), None)],
		}
	}

	/// Tokenizes and builds `markup` in one step.
	pub fn parse(markup: &str) -> Self {
		build_tree(tokenize(markup))
	}

	pub fn root(&self) -> NodeId {
		Self::ROOT
	}

	/// Number of nodes including the root.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// A tree always contains its root, so this only reports `true` for trees without content.
	pub fn is_empty(&self) -> bool {
		self.nodes.len() == 1
	}

	pub fn get(&self, id: NodeId) -> Option<&Node> {
		self.nodes.get(id.0)
	}

	fn push(&mut self, node: Node) -> NodeId {
		let id = NodeId(self.nodes.len());
		let parent = node.parent;
		self.nodes.push(node);
		if let Some(parent) = parent {
			self.nodes[parent.0].children.push(id);
		}
		id
	}

	fn append_element(&mut self, parent: NodeId, tag: String, attributes: Attributes) -> NodeId {
		self.push(Node::element(tag, attributes, Some(parent)))
	}

	fn append_text(&mut self, parent: NodeId, text: String) -> NodeId {
		self.push(Node::text_leaf(text, parent))
	}

	/// Pre-order descendants of `id`, excluding `id` itself.
	pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
		let stack = self[id].children.iter().rev().copied().collect();
		Descendants { tree: self, stack }
	}

	/// Ancestors of `id` from its parent up to the root.
	pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
		std::iter::successors(self[id].parent, move |current| self[*current].parent)
	}

	/// Own text for a leaf, otherwise the concatenation of all descendant leaves. Untrimmed.
	pub fn text_content(&self, id: NodeId) -> String {
		let node = &self[id];
		if node.is_text() {
			return node.text.clone();
		}
		self.descendants(id).map(|child| &self[child]).filter(|child| child.is_text()).map(|child| child.text.as_str()).collect()
	}

	/// Markup of the children of `id`.
	pub fn inner_html(&self, id: NodeId) -> String {
		let mut out = String::new();
		self.write_nodes(self[id].children.iter().rev().copied().collect(), &mut out);
		out
	}

	/// Markup of `id` itself. The synthetic root serializes as its content only.
	///
	/// Attribute values are written verbatim between double quotes, or single
	/// quotes when the value holds a `"`. A value containing both quote
	/// characters cannot be represented and does not re-parse to the same
	/// attributes. Empty `script` and `style` elements are written as `<tag/>`.
	pub fn outer_html(&self, id: NodeId) -> String {
		if id == Self::ROOT {
			return self.inner_html(id);
		}
		let mut out = String::new();
		self.write_nodes(vec![id], &mut out);
		out
	}

	fn write_nodes(&self, roots: Vec<NodeId>, out: &mut String) {
		enum Step {
			Enter(NodeId),
			Exit(NodeId),
		}

		let mut stack: Vec<Step> = roots.into_iter().map(Step::Enter).collect();
		while let Some(step) = stack.pop() {
			match step {
				Step::Enter(id) => {
					let node = &self[id];
					if node.is_text() {
						out.push_str(&node.text);
						continue;
					}
					out.push('<');
					out.push_str(&node.tag);
					for (name, value) in node.attributes.iter() {
						let quote = if value.contains('"') && !value.contains('\'') { '\'' } else { '"' };
						out.push(' ');
						out.push_str(name);
						out.push('=');
						out.push(quote);
						out.push_str(value);
						out.push(quote);
					}
					if node.children.is_empty() && is_raw_text_element(&node.tag) {
						out.push_str("/>");
						continue;
					}
					out.push('>');
					if node.children.is_empty() && is_void_element(&node.tag) {
						continue;
					}
					stack.push(Step::Exit(id));
					stack.extend(node.children.iter().rev().map(|child| Step::Enter(*child)));
				}
				Step::Exit(id) => {
					out.push_str("</");
					out.push_str(&self[id].tag);
					out.push('>');
				}
			}
		}
	}
}

impl Index<NodeId> for Tree {
	type Output = Node;

	fn index(&self, id: NodeId) -> &Node {
		&self.nodes[id.0]
	}
}

/// Iterator returned by [`Tree::descendants`].
pub struct Descendants<'a> {
	tree: &'a Tree,
	stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
	type Item = NodeId;

	fn next(&mut self) -> Option<NodeId> {
		let id = self.stack.pop()?;
		self.stack.extend(self.tree[id].children.iter().rev().copied());
		Some(id)
	}
}

/// Builds a tree from a token stream with a stack of open elements.
///
/// Close tokens only pop when they match the current element; anything else
/// is ignored. Elements still open at the end stay attached where they are.
pub fn build_tree(tokens: impl IntoIterator<Item = Token>) -> Tree {
	let mut tree = Tree::new();
	let mut open = vec![Tree::ROOT];

	for token in tokens {
		let top = open.last().copied().unwrap_or(Tree::ROOT);
		match token {
			Token::Text(text) => {
				if !text.is_empty() {
					tree.append_text(top, text);
				}
			}
			Token::Open { tag, attributes } => {
				if !tag.is_empty() {
					let id = tree.append_element(top, tag, attributes);
					open.push(id);
				}
			}
			Token::SelfClosing { tag, attributes } => {
				if !tag.is_empty() {
					tree.append_element(top, tag, attributes);
				}
			}
			Token::Close(tag) => {
				if open.len() > 1 && tree[top].tag.eq_ignore_ascii_case(&tag) {
					open.pop();
				}
			}
		}
	}

	debug!(target = "quarry", nodes = tree.len(), unclosed = open.len() - 1, "built document tree");
	tree
}
