use docstitch_dom::{Document, NodeId, NodeKind};

use super::strategy::{LoopStrategy, SplitBeforeResult, merge_units, split_units};
use crate::compilation::Tag;
use crate::error::TemplateError;

/// Repeats whole table rows, from the open tag's row to the close tag's row.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoopTableStrategy;

impl LoopTableStrategy {
    fn rows(doc: &Document, open: &Tag, close: &Tag) -> Option<(NodeId, NodeId)> {
        let first = doc.containing_table_row(open.text_node)?;
        let last = doc.containing_table_row(close.text_node)?;
        (doc.parent(first)? == doc.parent(last)?).then_some((first, last))
    }
}

impl LoopStrategy for LoopTableStrategy {
    fn name(&self) -> &'static str {
        "table"
    }

    fn is_applicable(&self, doc: &Document, open: &Tag, close: &Tag) -> bool {
        let in_cell = doc
            .containing_paragraph(open.text_node)
            .and_then(|paragraph| doc.parent(paragraph))
            .is_some_and(|parent| doc.kind(parent) == NodeKind::TableCell);
        in_cell && Self::rows(doc, open, close).is_some()
    }

    fn split_before(
        &self,
        doc: &mut Document,
        open: &Tag,
        close: &Tag,
    ) -> Result<SplitBeforeResult, TemplateError> {
        let (first, last) = Self::rows(doc, open, close).ok_or_else(|| {
            TemplateError::Internal(format!(
                "tags {:?} and {:?} are not in rows of one table",
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
