//! Mutable document tree used by the docstitch template engine.
//!
//! The tree is an arena of WordprocessingML-shaped elements (body,
//! paragraphs, runs, text leaves, tables) addressed by [`NodeId`]. On top of
//! plain navigation and mutation it offers the split/join edits that template
//! compilation needs, plus a compact markup reader and writer.

pub mod document;
pub mod edit;
pub mod error;
pub mod markup;
pub mod node;

pub use document::Document;
pub use error::{DomError, MarkupError};
pub use node::{NodeData, NodeId, NodeKind};
