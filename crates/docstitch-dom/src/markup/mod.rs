//! XML notation for document trees, read and written with `quick-xml`.
//!
//! The reader accepts a single root element with nested elements, quoted
//! attributes, character data inside text leaves (`t`), comments, CDATA and
//! a prolog (declaration, doctype, processing instructions). Only the five
//! predefined XML entities and character references are resolved.
//! Whitespace between elements is formatting and is dropped; any other
//! character data outside a text leaf is rejected. The writer emits the same
//! notation on one line, so `to_markup(&parse(s)?, root)` reproduces `s` for
//! canonical input.

mod reader;
mod writer;

pub use reader::parse;
pub use writer::to_markup;
