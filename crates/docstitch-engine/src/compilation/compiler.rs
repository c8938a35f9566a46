use std::collections::HashMap;

use docstitch_config::TemplateConfig;
use docstitch_dom::{Document, NodeId};

use super::delimiters::DelimiterSearcher;
use super::parser::TagParser;
use super::scope::{PathPart, ScopeData};
use super::tag::{Tag, TagDisposition};
use crate::error::TemplateError;
use crate::plugins::{TemplateContext, TemplatePlugin};
use crate::value::ScopeValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    pub default_content_type: String,
    pub container_content_type: String,
    pub skip_empty_tags: bool,
}

impl From<&TemplateConfig> for CompilerOptions {
    fn from(config: &TemplateConfig) -> Self {
        Self {
            default_content_type: config.default_content_type.clone(),
            container_content_type: config.container_content_type.clone(),
            skip_empty_tags: config.skip_empty_tags,
        }
    }
}

/// Runs the delimiter search, tag parsing and tag replacement passes over a
/// subtree.
///
/// Loop plugins call back into [`TemplateCompiler::compile`] for every
/// repetition they produce, so one compiler serves a whole nested run.
pub struct TemplateCompiler {
    searcher: DelimiterSearcher,
    parser: TagParser,
    plugins: HashMap<String, Box<dyn TemplatePlugin>>,
    options: CompilerOptions,
}

impl TemplateCompiler {
    pub fn new(
        searcher: DelimiterSearcher,
        parser: TagParser,
        plugins: Vec<Box<dyn TemplatePlugin>>,
        options: CompilerOptions,
    ) -> Result<Self, TemplateError> {
        let mut lookup = HashMap::new();
        for plugin in plugins {
            let content_type = plugin.content_type().to_string();
            if lookup.contains_key(&content_type) {
                return Err(TemplateError::DuplicateContentType(content_type));
            }
            lookup.insert(content_type, plugin);
        }
        Ok(Self {
            searcher,
            parser,
            plugins: lookup,
            options,
        })
    }

    /// Finds and normalizes the tags below `root` without replacing them.
    pub fn parse_tags(&self, doc: &mut Document, root: NodeId) -> Result<Vec<Tag>, TemplateError> {
        let mut marks = self.searcher.find_delimiters(doc, root)?;
        self.parser.parse(doc, &mut marks)
    }

    /// Replaces every tag below `root` using `data`.
    ///
    /// Plugins run one at a time in document order, each awaited before the
    /// next tag is looked at.
    pub async fn compile(
        &self,
        root: NodeId,
        data: &mut ScopeData,
        context: &mut TemplateContext<'_>,
    ) -> Result<(), TemplateError> {
        let tags = self.parse_tags(context.document, root)?;
        self.do_tag_replacements(&tags, data, context).await
    }

    async fn do_tag_replacements(
        &self,
        tags: &[Tag],
        data: &mut ScopeData,
        context: &mut TemplateContext<'_>,
    ) -> Result<(), TemplateError> {
        let mut tag_index = 0;
        while tag_index < tags.len() {
            let tag = &tags[tag_index];
            data.path_push(PathPart::Tag(tag.clone()));

            let value = data.get_scope_data()?;
            let content_type = self.detect_content_type(tag, &value);
            let plugin = self.plugins.get(content_type).ok_or_else(|| {
                TemplateError::UnknownContentType {
                    content_type: content_type.to_string(),
                    raw_text: tag.raw_text.clone(),
                    path: data.path_string(),
                }
            })?;
            log::trace!(
                "tag {:?} at '{}' handled as '{}'",
                tag.raw_text,
                data.path_string(),
                content_type
            );

            match tag.disposition {
                TagDisposition::SelfClosed => {
                    if !(self.options.skip_empty_tags && value.to_string().is_empty()) {
                        plugin.simple_tag_replacement(tag, data, context).await?;
                    }
                }
                TagDisposition::Open => {
                    let close_index = find_close_tag_index(tag_index, tags)?;
                    plugin
                        .container_tag_replacement(&tags[tag_index..=close_index], data, context)
                        .await?;
                    tag_index = close_index;
                }
                TagDisposition::Close => {
                    return Err(TemplateError::UnopenedTag {
                        name: tag.name_or_empty().to_string(),
                    });
                }
            }

            data.path_pop();
            tag_index += 1;
        }
        Ok(())
    }

    fn detect_content_type<'s>(&'s self, tag: &Tag, value: &'s ScopeValue) -> &'s str {
        if let Some(content_type) = value.content_type() {
            return content_type;
        }
        match tag.disposition {
            TagDisposition::Open | TagDisposition::Close => &self.options.container_content_type,
            TagDisposition::SelfClosed => &self.options.default_content_type,
        }
    }
}

/// Index of the close tag matching the open tag at `from`. Names are not
/// compared, only nesting depth.
fn find_close_tag_index(from: usize, tags: &[Tag]) -> Result<usize, TemplateError> {
    let mut open_tags = 0usize;
    for (i, tag) in tags.iter().enumerate().skip(from) {
        match tag.disposition {
            TagDisposition::Open => open_tags += 1,
            TagDisposition::Close => {
                if open_tags == 0 {
                    return Err(TemplateError::UnopenedTag {
                        name: tag.name_or_empty().to_string(),
                    });
                }
                open_tags -= 1;
                if open_tags == 0 {
                    return Ok(i);
                }
            }
            TagDisposition::SelfClosed => {}
        }
    }
    Err(TemplateError::UnclosedTag {
        name: tags[from].name_or_empty().to_string(),
    })
}
