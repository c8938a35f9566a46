use docstitch_config::ConfigError;
use docstitch_dom::DomError;

use crate::compilation::ResolveError;

/// Everything that can abort a template compilation.
///
/// A failure leaves the document in whatever state the pipeline had reached;
/// callers that need all-or-nothing behaviour should compile a clone.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Close delimiter without a matching start delimiter in {text:?}")]
    MissingStartDelimiter { text: String },

    #[error("Start delimiter without a matching close delimiter in {text:?}")]
    MissingCloseDelimiter { text: String },

    #[error("Tag '{name}' is never closed")]
    UnclosedTag { name: String },

    #[error("Tag '{name}' is closed but was never opened")]
    UnopenedTag { name: String },

    #[error("Content type '{content_type}' of tag {raw_text:?} at path '{path}' has no plugin")]
    UnknownContentType {
        content_type: String,
        raw_text: String,
        path: String,
    },

    #[error("Document is nested deeper than the maximum of {max_depth} levels")]
    MaxDepthExceeded { max_depth: usize },

    #[error("Failed to resolve data at path '{path}': {source}")]
    Resolve { path: String, source: ResolveError },

    #[error("Plugin for content type '{0}' registered twice")]
    DuplicateContentType(String),

    #[error("At least one plugin is required")]
    NoPlugins,

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Document edit failed: {0}")]
    Dom(#[from] DomError),

    #[error("Failed to build tag pattern: {0}")]
    InvalidTagPattern(#[from] regex::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
