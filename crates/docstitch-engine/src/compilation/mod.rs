//! Template compilation.
//!
//! A run has three passes over a subtree:
//!
//! 1. [`DelimiterSearcher`] finds tag delimiters in the text leaves, even when
//!    a delimiter is split across several leaves.
//! 2. [`TagParser`] pairs the delimiters into [`Tag`]s and rewrites the tree so
//!    each tag owns exactly one text leaf.
//! 3. [`TemplateCompiler`] resolves every tag against [`ScopeData`] and hands
//!    it to the plugin registered for its content type.

pub mod compiler;
pub mod delimiters;
pub mod parser;
pub mod scope;
pub mod tag;

pub use compiler::{CompilerOptions, TemplateCompiler};
pub use delimiters::{DelimiterMark, DelimiterSearcher};
pub use parser::TagParser;
pub use scope::{
    PathPart, ResolveError, ScopeData, ScopeDataArgs, ScopeDataResolver, default_resolver,
};
pub use tag::{Tag, TagDisposition};
