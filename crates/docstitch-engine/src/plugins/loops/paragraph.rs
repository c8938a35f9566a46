use docstitch_dom::{Document, NodeId};

use super::strategy::{LoopStrategy, SplitBeforeResult};
use crate::compilation::Tag;
use crate::error::TemplateError;

/// Repeats the content between two tags, which may sit anywhere inside
/// their paragraphs.
///
/// The open tag's paragraph and the close tag's paragraph are both split at
/// the tag. What precedes the open tag and what follows the close tag stay
/// in place as anchors; the rest is repeated, and the first and last
/// paragraph of every copy are joined to their neighbours so inline loops
/// stay inline.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoopParagraphStrategy;

impl LoopStrategy for LoopParagraphStrategy {
    fn name(&self) -> &'static str {
        "paragraph"
    }

    fn is_applicable(&self, _doc: &Document, _open: &Tag, _close: &Tag) -> bool {
        true
    }

    fn split_before(
        &self,
        doc: &mut Document,
        open: &Tag,
        close: &Tag,
    ) -> Result<SplitBeforeResult, TemplateError> {
        let first_paragraph = containing_paragraph(doc, open)?;
        let last_paragraph = containing_paragraph(doc, close)?;
        let same = first_paragraph == last_paragraph;

        let (first_node, after_first) =
            doc.split_paragraph_by_text_node(first_paragraph, open.text_node, true)?;
        let last_paragraph = if same { after_first } else { last_paragraph };

        let (before_last, last_node) =
            doc.split_paragraph_by_text_node(last_paragraph, close.text_node, true)?;

        let nodes_to_repeat = if same {
            doc.remove(before_last);
            vec![before_last]
        } else {
            doc.remove(after_first);
            doc.remove(before_last);
            let mut nodes = vec![after_first];
            nodes.extend(doc.remove_siblings(first_node, last_node)?);
            nodes.push(before_last);
            nodes
        };

        Ok(SplitBeforeResult {
            first_node,
            nodes_to_repeat,
            last_node,
        })
    }

    fn merge_back(
        &self,
        doc: &mut Document,
        groups: Vec<Vec<NodeId>>,
        first_node: NodeId,
        last_node: NodeId,
    ) -> Result<(), TemplateError> {
        let mut merge_to = first_node;
        for group in groups {
            let Some((&head, rest)) = group.split_first() else {
                continue;
            };
            doc.join_paragraphs(merge_to, head);
            for &paragraph in rest {
                doc.insert_before(last_node, paragraph)?;
                merge_to = paragraph;
            }
        }

        doc.join_paragraphs(merge_to, last_node);
        doc.remove(last_node);
        Ok(())
    }
}

fn containing_paragraph(doc: &Document, tag: &Tag) -> Result<NodeId, TemplateError> {
    doc.containing_paragraph(tag.text_node).ok_or_else(|| {
        TemplateError::Internal(format!("tag {:?} is not inside a paragraph", tag.raw_text))
    })
}
