//! Split and join helpers for text leaves and paragraphs.
//!
//! These are the structural edits the template engine performs while it
//! isolates tag text and cuts loop bodies out of the surrounding document.
//! Every helper keeps the tree balanced: runs stay inside paragraphs, text
//! leaves stay inside runs, and property holders (`pPr`, `rPr`) are copied
//! rather than moved so both halves of a split keep their styling.

use crate::document::Document;
use crate::error::DomError;
use crate::node::{NodeId, NodeKind};

impl Document {
    /// Splits a text leaf at byte `index`, returning the new leaf.
    ///
    /// With `add_before` the new leaf is inserted before `text` and holds
    /// `text[..index]`; otherwise it is inserted after and holds
    /// `text[index..]`. Both halves are marked whitespace-preserving so a
    /// space that ends up at an edge stays visible.
    pub fn split_text_node(
        &mut self,
        text: NodeId,
        index: usize,
        add_before: bool,
    ) -> Result<NodeId, DomError> {
        if !self.is_text(text) {
            return Err(DomError::NotText(text));
        }
        let content = self.text(text).to_string();
        if !content.is_char_boundary(index) {
            return Err(DomError::InvalidSplit {
                index,
                len: content.len(),
            });
        }
        let (head, tail) = content.split_at(index);

        let new_node = self.clone_node(text, false);
        self.set_preserve_space(text);
        self.set_preserve_space(new_node);
        if add_before {
            self.insert_before(text, new_node)?;
            self.set_text(new_node, head);
            self.set_text(text, tail);
        } else {
            self.insert_after(text, new_node)?;
            self.set_text(text, head);
            self.set_text(new_node, tail);
        }
        Ok(new_node)
    }

    /// Moves the text of every leaf from `from` to `to` (inclusive) into
    /// `from` and drops the emptied leaves and runs.
    pub fn join_text_nodes_range(&mut self, from: NodeId, to: NodeId) -> Result<(), DomError> {
        if from == to {
            return Ok(());
        }
        for node in [from, to] {
            if !self.is_text(node) {
                return Err(DomError::NotText(node));
            }
        }
        let paragraph = self
            .containing_paragraph(from)
            .ok_or(DomError::JoinAcrossParagraphs)?;
        if self.containing_paragraph(to) != Some(paragraph) {
            return Err(DomError::JoinAcrossParagraphs);
        }

        let order = self.descendants(paragraph);
        let start = order.iter().position(|&n| n == from);
        let end = order.iter().position(|&n| n == to);
        let (Some(start), Some(end)) = (start, end) else {
            return Err(DomError::InvalidRange { from, to });
        };
        if end < start {
            return Err(DomError::InvalidRange { from, to });
        }

        let leaves: Vec<NodeId> = order[start..=end]
            .iter()
            .copied()
            .filter(|&n| self.is_text(n))
            .collect();
        let first_run = self.containing_run(from);
        let mut joined = String::new();
        let mut preserve = false;
        for &leaf in &leaves {
            joined.push_str(self.text(leaf));
            preserve |= self.preserves_space(leaf);
        }

        for &leaf in &leaves[1..] {
            let run = self.containing_run(leaf);
            self.remove(leaf);
            if let Some(run) = run
                && Some(run) != first_run
                && self.only_properties(run)
            {
                self.remove(run);
            }
        }

        log::trace!("joined {} text leaves into {:?}", leaves.len(), from);
        self.set_text(from, joined);
        if preserve {
            self.set_preserve_space(from);
        }
        Ok(())
    }

    /// Splits `paragraph` around the leaf `text`.
    ///
    /// Returns `(left, right)`, where `right` is the original paragraph node
    /// and `left` a new one inserted before it holding everything that
    /// preceded `text`. Unless `remove_text` is set, `text` is the first leaf
    /// of `right`. Every container between the leaf and the paragraph is
    /// split the same way, and runs left without content are dropped.
    pub fn split_paragraph_by_text_node(
        &mut self,
        paragraph: NodeId,
        text: NodeId,
        remove_text: bool,
    ) -> Result<(NodeId, NodeId), DomError> {
        if !self.is_text(text) {
            return Err(DomError::NotText(text));
        }
        if self.containing_paragraph(text) != Some(paragraph) {
            return Err(DomError::NotInParagraph {
                node: text,
                paragraph,
            });
        }
        self.containing_run(text).ok_or(DomError::MissingRun(text))?;

        let mut halves = Vec::new();
        let mut child = text;
        let mut level = self.parent(text).ok_or(DomError::Detached(text))?;
        let left_paragraph = loop {
            let left = self.clone_node(level, false);
            self.insert_before(level, left)?;
            for sibling in self.children(level).to_vec() {
                if sibling == child {
                    break;
                }
                if self.kind(sibling).is_properties() {
                    let copy = self.clone_node(sibling, true);
                    self.append_child(left, copy);
                } else {
                    self.append_child(left, sibling);
                }
            }
            if level == paragraph {
                break left;
            }
            halves.push((left, level));
            child = level;
            level = self.parent(level).ok_or(DomError::Detached(level))?;
        };

        if remove_text {
            self.remove(text);
        }

        for (left, right) in halves {
            for node in [left, right] {
                if self.is_hollow(node) {
                    self.remove(node);
                }
            }
        }

        Ok((left_paragraph, paragraph))
    }

    /// Moves every child of `second` except its properties to the end of
    /// `first`.
    pub fn join_paragraphs(&mut self, first: NodeId, second: NodeId) {
        if first == second {
            return;
        }
        for child in self.children(second).to_vec() {
            if self.kind(child) != NodeKind::ParagraphProperties {
                self.append_child(first, child);
            }
        }
    }

    /// Siblings from `first` to `last`, both included.
    pub fn siblings_in_range(&self, first: NodeId, last: NodeId) -> Result<Vec<NodeId>, DomError> {
        let (parent, start, end) = self.sibling_span(first, last)?;
        if end < start {
            return Err(DomError::NotSiblings);
        }
        Ok(self.children(parent)[start..=end].to_vec())
    }

    /// Detaches the siblings strictly between `from` and `to` and returns
    /// them in document order.
    pub fn remove_siblings(&mut self, from: NodeId, to: NodeId) -> Result<Vec<NodeId>, DomError> {
        if from == to {
            return Ok(Vec::new());
        }
        let (parent, start, end) = self.sibling_span(from, to)?;
        if end < start {
            return Err(DomError::NotSiblings);
        }
        let removed = self.children(parent)[start + 1..end].to_vec();
        for &node in &removed {
            self.remove(node);
        }
        Ok(removed)
    }

    /// A run with nothing but properties and empty text leaves.
    /// Nodes that are not runs are never empty runs.
    pub fn is_empty_run(&self, id: NodeId) -> bool {
        self.is_run(id)
            && self.children(id).iter().all(|&child| match self.kind(child) {
                NodeKind::RunProperties => true,
                NodeKind::Text => self.text(child).is_empty(),
                _ => false,
            })
    }

    fn only_properties(&self, id: NodeId) -> bool {
        self.children(id)
            .iter()
            .all(|&child| self.kind(child).is_properties())
    }

    fn is_hollow(&self, id: NodeId) -> bool {
        if self.is_run(id) {
            self.is_empty_run(id)
        } else {
            self.only_properties(id)
        }
    }

    fn sibling_span(&self, a: NodeId, b: NodeId) -> Result<(NodeId, usize, usize), DomError> {
        let parent = self.parent(a).ok_or(DomError::NotSiblings)?;
        if self.parent(b) != Some(parent) {
            return Err(DomError::NotSiblings);
        }
        let start = self.index_in_parent(a).ok_or(DomError::NotSiblings)?;
        let end = self.index_in_parent(b).ok_or(DomError::NotSiblings)?;
        Ok((parent, start, end))
    }
}
