//! Loops and conditions.
//!
//! `{#items}...{/items}` repeats its content once per element when `items`
//! is a sequence. Any other value is a condition: the content is kept once
//! when the value is truthy and dropped otherwise.

mod list;
mod paragraph;
mod strategy;
mod table;

pub use list::LoopListStrategy;
pub use paragraph::LoopParagraphStrategy;
pub use strategy::{LoopStrategy, SplitBeforeResult};
pub use table::LoopTableStrategy;

use async_trait::async_trait;
use docstitch_dom::{Document, NodeId};

use super::{TemplateContext, TemplatePlugin};
use crate::compilation::{PathPart, ScopeData, Tag};
use crate::error::TemplateError;

pub const LOOP_CONTENT_TYPE: &str = "loop";

/// Name of the temporary element each repetition is compiled under.
const WRAPPER_ELEMENT: &str = "sdtContent";

pub struct LoopPlugin {
    strategies: Vec<Box<dyn LoopStrategy>>,
}

impl LoopPlugin {
    /// Table rows first, then list items, then plain paragraphs.
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(LoopTableStrategy),
                Box::new(LoopListStrategy),
                Box::new(LoopParagraphStrategy),
            ],
        }
    }
}

impl Default for LoopPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TemplatePlugin for LoopPlugin {
    fn content_type(&self) -> &str {
        LOOP_CONTENT_TYPE
    }

    async fn container_tag_replacement(
        &self,
        tags: &[Tag],
        data: &mut ScopeData,
        context: &mut TemplateContext<'_>,
    ) -> Result<(), TemplateError> {
        let (Some(open), Some(close)) = (tags.first(), tags.last()) else {
            return Ok(());
        };

        let value = data.get_scope_data()?;
        let (is_condition, times) = match value.as_sequence() {
            Some(items) => (false, items.len()),
            None => (true, usize::from(value.is_truthy())),
        };

        let strategy = self
            .strategies
            .iter()
            .find(|s| s.is_applicable(context.document, open, close))
            .ok_or_else(|| {
                TemplateError::Internal(format!("No loop strategy found for tag {:?}", open.raw_text))
            })?;
        log::debug!(
            "loop '{}' at '{}': {} strategy, {} iteration(s)",
            open.name_or_empty(),
            data.path_string(),
            strategy.name(),
            times
        );

        let split = strategy.split_before(context.document, open, close)?;
        let repeated = repeat(context.document, &split.nodes_to_repeat, times);
        let compiled =
            compile_groups(is_condition, repeated, open.text_node, data, context).await?;
        strategy.merge_back(context.document, compiled, split.first_node, split.last_node)
    }
}

/// `times` deep copies of `nodes`, one group per copy.
fn repeat(doc: &mut Document, nodes: &[NodeId], times: usize) -> Vec<Vec<NodeId>> {
    if nodes.is_empty() {
        return Vec::new();
    }
    (0..times)
        .map(|_| nodes.iter().map(|&node| doc.clone_node(node, true)).collect())
        .collect()
}

/// Compiles each group under its own wrapper element and returns the
/// compiled nodes, detached again.
async fn compile_groups(
    is_condition: bool,
    groups: Vec<Vec<NodeId>>,
    reference: NodeId,
    data: &mut ScopeData,
    context: &mut TemplateContext<'_>,
) -> Result<Vec<Vec<NodeId>>, TemplateError> {
    let compiler = context.compiler;
    let mut compiled = Vec::with_capacity(groups.len());

    for (index, group) in groups.into_iter().enumerate() {
        let wrapper = context.document.create_like(reference, WRAPPER_ELEMENT);
        for node in group {
            context.document.append_child(wrapper, node);
        }

        let condition_part = update_path_before(is_condition, data, index)?;
        // Boxed, since compiling the group can reach this loop plugin again.
        Box::pin(compiler.compile(wrapper, data, context)).await?;
        update_path_after(data, condition_part);

        let children = context.document.children(wrapper).to_vec();
        for &child in &children {
            context.document.remove(child);
        }
        compiled.push(children);
    }
    Ok(compiled)
}

/// A condition does not add a nesting level, so its own path part comes off
/// while its content compiles. A sequence adds the element index.
fn update_path_before(
    is_condition: bool,
    data: &mut ScopeData,
    index: usize,
) -> Result<Option<PathPart>, TemplateError> {
    if !is_condition {
        data.path_push(PathPart::Index(index));
        return Ok(None);
    }
    if index > 0 {
        return Err(TemplateError::Internal(format!(
            "Unexpected group index {} for condition at path '{}'",
            index,
            data.path_string()
        )));
    }
    data.path_pop().map(Some).ok_or_else(|| {
        TemplateError::Internal("condition compiled with an empty data path".to_string())
    })
}

fn update_path_after(data: &mut ScopeData, condition_part: Option<PathPart>) {
    match condition_part {
        Some(part) => data.path_push(part),
        None => {
            data.path_pop();
        }
    }
}
