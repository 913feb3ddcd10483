//! Schema-driven HTML extraction.
//!
//! Markup goes through three synchronous stages that never fail:
//!
//! * [`token`]: a forgiving tokenizer producing a flat token stream
//! * [`tree`]: an arena tree built from that stream, with the synthetic
//!   `document` root at [`Tree::ROOT`]
//! * [`query`]: a descendant-combinator selector engine
//!
//! [`Document`] and [`Element`] wrap the tree behind the [`Selectable`]
//! capability, and [`extract()`] applies a [`Schema`] to any selectable scope,
//! producing a [`Value`] keyed in field order.
//!
//! ```ignore
//! use quarry::{Document, Field, Schema, extract, transform};
//!
//! let doc = Document::parse(html);
//! let schema = Schema::new()
//! 	.field("title", "h1")
//! 	.field("prices", Field::multiple(".price").transform(transform::number()));
//! let data = extract(&doc, &schema)?;
//! ```

pub mod dom;
pub mod error;
pub mod extract;
pub mod query;
pub mod schema;
pub mod token;
pub mod transform;
pub mod tree;

pub use dom::{Document, Element, Selectable};
pub use error::{Error, ExtractError, Result, SchemaError, TransformError};
pub use extract::extract;
pub use query::{CompiledSelector, compile_selector, query};
pub use schema::{Field, MultipleField, NestedField, Schema, SingleField, Source};
pub use serde_json::Value;
pub use token::{Token, tokenize};
pub use transform::Transform;
pub use tree::{NodeId, Tree, build_tree};
