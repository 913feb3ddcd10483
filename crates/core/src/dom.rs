//! Read-only element handles over a parsed [`Tree`].
//!
//! [`Document`] owns a tree; [`Element`] is a cheap `Copy` handle into it.
//! Both implement [`Selectable`], the capability surface the extraction
//! engine is written against.

use std::collections::BTreeMap;

use crate::query::{CompiledSelector, compile_selector};
use crate::tree::{Node, NodeId, Tree};

/// Capability contract consumed by the extraction engine.
pub trait Selectable {
	/// All matches of `selector` below this scope, in document order.
	fn select(&self, selector: &str) -> Vec<Element<'_>>;

	/// First match of `selector`, `None` when nothing matches.
	fn select_one(&self, selector: &str) -> Option<Element<'_>> {
		self.select(selector).into_iter().next()
	}

	/// Trimmed text content.
	fn text(&self) -> String;

	/// Inner markup.
	fn html(&self) -> String;

	fn attr(&self, name: &str) -> Option<&str>;
}

/// Handle to one node of a tree.
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
	tree: &'a Tree,
	id: NodeId,
}

impl PartialEq for Element<'_> {
	fn eq(&self, other: &Self) -> bool {
		std::ptr::eq(self.tree, other.tree) && self.id == other.id
	}
}

impl Eq for Element<'_> {}

impl<'a> Element<'a> {
	pub fn new(tree: &'a Tree, id: NodeId) -> Self {
		Self { tree, id }
	}

	pub fn id(&self) -> NodeId {
		self.id
	}

	pub fn tree(&self) -> &'a Tree {
		self.tree
	}

	pub fn node(&self) -> &'a Node {
		&self.tree[self.id]
	}

	pub fn tag(&self) -> &'a str {
		self.node().tag()
	}

	/// Own text for a leaf, otherwise all descendant text concatenated. Trimmed.
	pub fn text(&self) -> String {
		self.tree.text_content(self.id).trim().to_string()
	}

	/// Children serialized back to markup, without re-escaping.
	pub fn html(&self) -> String {
		self.tree.inner_html(self.id)
	}

	pub fn outer_html(&self) -> String {
		self.tree.outer_html(self.id)
	}

	pub fn attr(&self, name: &str) -> Option<&'a str> {
		self.node().attr(name)
	}

	/// Snapshot of every attribute.
	pub fn attrs(&self) -> BTreeMap<String, String> {
		self.node().attributes().iter().map(|(name, value)| (name.to_string(), value.to_string())).collect()
	}

	pub fn parent(&self) -> Option<Element<'a>> {
		self.node().parent().map(|id| Element::new(self.tree, id))
	}

	/// Element children, text leaves skipped.
	pub fn children(&self) -> impl Iterator<Item = Element<'a>> + 'a {
		let tree = self.tree;
		self.node().children().iter().filter(move |id| tree[**id].is_element()).map(move |id| Element::new(tree, *id))
	}

	pub fn select(&self, selector: &str) -> Vec<Element<'a>> {
		self.select_compiled(&compile_selector(selector))
	}

	pub fn select_compiled(&self, selector: &CompiledSelector) -> Vec<Element<'a>> {
		selector.query(self.tree, self.id).into_iter().map(|id| Element::new(self.tree, id)).collect()
	}

	pub fn select_one(&self, selector: &str) -> Option<Element<'a>> {
		self.select(selector).into_iter().next()
	}
}

impl Selectable for Element<'_> {
	fn select(&self, selector: &str) -> Vec<Element<'_>> {
		Element::select(self, selector)
	}

	fn text(&self) -> String {
		Element::text(self)
	}

	fn html(&self) -> String {
		Element::html(self)
	}

	fn attr(&self, name: &str) -> Option<&str> {
		Element::attr(self, name)
	}
}

/// A parsed HTML document.
#[derive(Debug, Clone, Default)]
pub struct Document {
	tree: Tree,
}

impl Document {
	pub fn parse(markup: &str) -> Self {
		Self { tree: Tree::parse(markup) }
	}

	pub fn from_tree(tree: Tree) -> Self {
		Self { tree }
	}

	pub fn tree(&self) -> &Tree {
		&self.tree
	}

	/// The synthetic `document` root element.
	pub fn root(&self) -> Element<'_> {
		Element::new(&self.tree, Tree::ROOT)
	}

	/// Text of the first `title` element.
	pub fn title(&self) -> Option<String> {
		self.root().select_one("title").map(|title| title.text())
	}

	/// The whole document serialized back to markup.
	pub fn html(&self) -> String {
		self.tree.outer_html(Tree::ROOT)
	}

	pub fn text(&self) -> String {
		self.root().text()
	}

	pub fn select(&self, selector: &str) -> Vec<Element<'_>> {
		self.root().select(selector)
	}

	pub fn select_one(&self, selector: &str) -> Option<Element<'_>> {
		self.root().select_one(selector)
	}
}

impl Selectable for Document {
	fn select(&self, selector: &str) -> Vec<Element<'_>> {
		Document::select(self, selector)
	}

	fn text(&self) -> String {
		Document::text(self)
	}

	fn html(&self) -> String {
		Document::html(self)
	}

	fn attr(&self, _name: &str) -> Option<&str> {
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title> Listing </title></head>
<body>
  <div id="main" class="card featured" data-rank="1">
    <h2>  First <em>item</em> </h2>
    <a href="/one">more</a>
  </div>
</body></html>"#;

	#[test]
	fn title_is_trimmed_text_of_first_title() {
		let doc = Document::parse(PAGE);
		assert_eq!(doc.title(), Some("Listing".to_string()));
		assert_eq!(Document::parse("<p>no head</p>").title(), None);
	}

	#[test]
	fn text_concatenates_descendants_and_trims() {
		let doc = Document::parse(PAGE);
		let heading = doc.select_one("h2").unwrap();
		assert_eq!(heading.text(), "First item");
	}

	#[test]
	fn html_returns_inner_markup() {
		let doc = Document::parse(PAGE);
		let heading = doc.select_one("#main h2").unwrap();
		assert_eq!(heading.html(), "  First <em>item</em> ");
		assert_eq!(heading.outer_html(), "<h2>  First <em>item</em> </h2>");
	}

	#[test]
	fn attributes_are_exposed() {
		let doc = Document::parse(PAGE);
		let card = doc.select_one(".card").unwrap();
		assert_eq!(card.attr("data-rank"), Some("1"));
		assert_eq!(card.attr("missing"), None);
		let attrs = card.attrs();
		assert_eq!(attrs.len(), 3);
		assert_eq!(attrs["class"], "card featured");
	}

	#[test]
	fn select_one_returns_none_when_missing() {
		let doc = Document::parse(PAGE);
		assert!(doc.select_one("table").is_none());
		assert!(doc.select("table").is_empty());
	}

	#[test]
	fn element_select_is_scoped() {
		let doc = Document::parse("<div id=a><p>1</p></div><div id=b><p>2</p><p>3</p></div>");
		let b = doc.select_one("#b").unwrap();
		let texts: Vec<String> = b.select("p").iter().map(|p| p.text()).collect();
		assert_eq!(texts, vec!["2", "3"]);
		assert_eq!(b.children().count(), 2);
		assert_eq!(b.parent().map(|parent| parent.tag()), Some("document"));
	}

	#[test]
	fn works_through_the_trait() {
		fn first_text(scope: &impl Selectable, selector: &str) -> Option<String> {
			scope.select_one(selector).map(|found| Selectable::text(&found))
		}

		let doc = Document::parse(PAGE);
		assert_eq!(first_text(&doc, "a"), Some("more".to_string()));
		let card = doc.select_one("#main").unwrap();
		assert_eq!(first_text(&card, "em"), Some("item".to_string()));
	}
}
