use docstitch_dom::{Document, NodeId};

use super::strategy::{LoopStrategy, SplitBeforeResult, merge_units, split_units};
use crate::compilation::Tag;
use crate::error::TemplateError;

/// Repeats whole list items, from the open tag's paragraph to the close
/// tag's paragraph.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoopListStrategy;

impl LoopListStrategy {
    fn paragraphs(doc: &Document, open: &Tag, close: &Tag) -> Option<(NodeId, NodeId)> {
        let first = doc.containing_paragraph(open.text_node)?;
        let last = doc.containing_paragraph(close.text_node)?;
        (doc.parent(first)? == doc.parent(last)?).then_some((first, last))
    }
}

impl LoopStrategy for LoopListStrategy {
    fn name(&self) -> &'static str {
        "list"
    }

    fn is_applicable(&self, doc: &Document, open: &Tag, close: &Tag) -> bool {
        match Self::paragraphs(doc, open, close) {
            Some((first, _)) => doc.is_list_paragraph(first),
            None => false,
        }
    }

    fn split_before(
        &self,
        doc: &mut Document,
        open: &Tag,
        close: &Tag,
    ) -> Result<SplitBeforeResult, TemplateError> {
        let (first, last) = Self::paragraphs(doc, open, close).ok_or_else(|| {
            TemplateError::Internal(format!(
                "tags {:?} and {:?} are not in sibling paragraphs",
                open.raw_text, close.raw_text
            ))
        })?;
        split_units(doc, open, close, first, last)
    }

    fn merge_back(
        &self,
        doc: &mut Document,
        groups: Vec<Vec<NodeId>>,
        first_node: NodeId,
        last_node: NodeId,
    ) -> Result<(), TemplateError> {
        merge_units(doc, groups, first_node, last_node)
    }
}
