use docstitch_dom::{Document, NodeId};

use crate::compilation::Tag;
use crate::error::TemplateError;

/// What a strategy cut out of the document for repetition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitBeforeResult {
    /// Stays in the document and marks where the loop output starts.
    pub first_node: NodeId,
    /// Detached originals; every repetition is a deep clone of these.
    pub nodes_to_repeat: Vec<NodeId>,
    /// Stays in the document and marks where the loop output ends.
    pub last_node: NodeId,
}

/// One way of turning the content between an open and a close tag into a
/// repeatable unit and stitching the compiled copies back in.
pub trait LoopStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_applicable(&self, doc: &Document, open: &Tag, close: &Tag) -> bool;

    fn split_before(
        &self,
        doc: &mut Document,
        open: &Tag,
        close: &Tag,
    ) -> Result<SplitBeforeResult, TemplateError>;

    fn merge_back(
        &self,
        doc: &mut Document,
        groups: Vec<Vec<NodeId>>,
        first_node: NodeId,
        last_node: NodeId,
    ) -> Result<(), TemplateError>;
}

/// Removes a tag's text leaf, and its run when nothing else is left in it.
pub(super) fn remove_tag_leaf(doc: &mut Document, leaf: NodeId) {
    let run = doc.containing_run(leaf);
    doc.remove(leaf);
    if let Some(run) = run
        && doc.is_empty_run(run)
    {
        doc.remove(run);
    }
}

/// Split for strategies that repeat whole sibling units (rows, list items).
///
/// The tag leaves are dropped first so the clones never see them. `first`
/// and `last` stay attached as anchors; everything strictly between them is
/// detached.
pub(super) fn split_units(
    doc: &mut Document,
    open: &Tag,
    close: &Tag,
    first: NodeId,
    last: NodeId,
) -> Result<SplitBeforeResult, TemplateError> {
    let units = doc.siblings_in_range(first, last)?;
    remove_tag_leaf(doc, open.text_node);
    remove_tag_leaf(doc, close.text_node);
    doc.remove_siblings(first, last)?;

    Ok(SplitBeforeResult {
        first_node: first,
        nodes_to_repeat: units,
        last_node: last,
    })
}

/// Inserts every compiled unit before `last`, then drops both anchors.
pub(super) fn merge_units(
    doc: &mut Document,
    groups: Vec<Vec<NodeId>>,
    first: NodeId,
    last: NodeId,
) -> Result<(), TemplateError> {
    for node in groups.into_iter().flatten() {
        doc.insert_before(last, node)?;
    }
    doc.remove(first);
    if last != first {
        doc.remove(last);
    }
    Ok(())
}
