//! Tag replacement plugins.
//!
//! The compiler picks a plugin by content type: `text` for self-closed tags
//! and `loop` for open/close pairs unless the resolved value is typed
//! content naming another plugin.

pub mod loops;
pub mod text;

use async_trait::async_trait;
use docstitch_dom::Document;

use crate::compilation::{ScopeData, Tag, TemplateCompiler};
use crate::error::TemplateError;

pub use loops::LoopPlugin;
pub use text::TextPlugin;

/// Everything a plugin may touch while replacing a tag.
pub struct TemplateContext<'a> {
    pub document: &'a mut Document,
    /// The compiler running this pass, for plugins that compile nested
    /// content.
    pub compiler: &'a TemplateCompiler,
    /// Name of the document part being compiled, when there is one.
    pub part: Option<&'a str>,
}

/// Replaces the tags of one content type.
///
/// Replacement is async so a plugin can await external content (a remote
/// image, a sub-document) before editing the tree. The document stays
/// exclusively borrowed through `context` for the whole call.
#[async_trait]
pub trait TemplatePlugin: Send + Sync {
    fn content_type(&self) -> &str;

    /// Replaces a self-closed tag. `data` points at the tag's value.
    async fn simple_tag_replacement(
        &self,
        _tag: &Tag,
        _data: &mut ScopeData,
        _context: &mut TemplateContext<'_>,
    ) -> Result<(), TemplateError> {
        Ok(())
    }

    /// Replaces an open tag, its matching close tag (last in `tags`) and
    /// everything between them.
    async fn container_tag_replacement(
        &self,
        _tags: &[Tag],
        _data: &mut ScopeData,
        _context: &mut TemplateContext<'_>,
    ) -> Result<(), TemplateError> {
        Ok(())
    }
}

pub fn create_default_plugins() -> Vec<Box<dyn TemplatePlugin>> {
    vec![Box::new(LoopPlugin::new()), Box::new(TextPlugin)]
}
