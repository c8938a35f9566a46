//! Tag-based template compilation for structured rich documents.
//!
//! Templates are [`docstitch_dom::Document`] trees whose text contains tags
//! such as `{name}` or `{#items}...{/items}`. A [`TemplateHandler`] finds the
//! tags, even when their text is split across several runs, and replaces
//! them with data from a [`ScopeValue`].

pub mod compilation;
pub mod error;
pub mod handler;
pub mod plugins;
pub mod value;

pub use compilation::{
    PathPart, ResolveError, ScopeData, ScopeDataArgs, ScopeDataResolver, Tag, TagDisposition,
    TemplateCompiler,
};
pub use error::TemplateError;
pub use handler::{DocumentPart, TemplateHandler, TemplateOptions};
pub use plugins::{LoopPlugin, TemplateContext, TemplatePlugin, TextPlugin, create_default_plugins};
pub use value::{ScopeValue, TypedContent};
