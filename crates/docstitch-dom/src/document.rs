use crate::error::DomError;
use crate::node::{NodeData, NodeId, NodeKind, prefix};

const SPACE_ATTR: &str = "xml:space";
const PRESERVE: &str = "preserve";

/// Arena-backed element tree.
///
/// Nodes are never freed. Removing a node only detaches it from its parent,
/// which keeps every [`NodeId`] handed out so far valid.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Document {
    /// Creates a document holding a single root element.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![NodeData::new(root_name.into())],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of arena slots, including detached nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    // ---- creation ----

    /// Creates a detached element.
    pub fn create_element(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData::new(name.into()));
        id
    }

    /// Creates a detached element named `local`, using the namespace prefix
    /// of `reference` (so `w:t` next to `w:br`).
    pub fn create_like(&mut self, reference: NodeId, local: &str) -> NodeId {
        let name = match prefix(&self.node(reference).name) {
            Some(prefix) => format!("{prefix}:{local}"),
            None => local.to_string(),
        };
        self.create_element(name)
    }

    /// Copies `id` into a new detached node. A deep clone copies the whole
    /// subtree; a shallow one copies only the name, attributes and text.
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> NodeId {
        let source = self.node(id);
        let mut copy = NodeData::new(source.name.clone());
        copy.attrs = source.attrs.clone();
        copy.text = source.text.clone();
        let children = if deep { source.children.clone() } else { Vec::new() };

        let copy_id = NodeId(self.nodes.len());
        self.nodes.push(copy);
        for child in children {
            let child_copy = self.clone_node(child, true);
            self.append_child(copy_id, child_copy);
        }
        copy_id
    }

    // ---- queries ----

    pub fn name(&self, id: NodeId) -> &str {
        &self.node(id).name
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.kind(id) == NodeKind::Text
    }

    pub fn is_paragraph(&self, id: NodeId) -> bool {
        self.kind(id) == NodeKind::Paragraph
    }

    pub fn is_run(&self, id: NodeId) -> bool {
        self.kind(id) == NodeKind::Run
    }

    pub fn text(&self, id: NodeId) -> &str {
        &self.node(id).text
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.node_mut(id).text = text.into();
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)
            .attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        let attrs = &mut self.node_mut(id).attrs;
        match attrs.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => attrs.push((name.to_string(), value)),
        }
    }

    /// True when the leaf keeps leading and trailing whitespace.
    pub fn preserves_space(&self, id: NodeId) -> bool {
        self.attr(id, SPACE_ATTR) == Some(PRESERVE)
    }

    pub fn set_preserve_space(&mut self, id: NodeId) {
        self.set_attr(id, SPACE_ATTR, PRESERVE);
    }

    /// Concatenated text of every leaf below `id`. Breaks count as newlines.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            match self.kind(node) {
                NodeKind::Text => out.push_str(self.text(node)),
                NodeKind::Break => out.push('\n'),
                _ => {}
            }
        }
        out
    }

    // ---- navigation ----

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// Position of `id` among its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    /// Nearest node of `kind` among `id` and its ancestors.
    pub fn closest(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.kind(node) == kind {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    pub fn containing_paragraph(&self, id: NodeId) -> Option<NodeId> {
        self.closest(id, NodeKind::Paragraph)
    }

    pub fn containing_run(&self, id: NodeId) -> Option<NodeId> {
        self.closest(id, NodeKind::Run)
    }

    pub fn containing_table_row(&self, id: NodeId) -> Option<NodeId> {
        self.closest(id, NodeKind::TableRow)
    }

    /// First direct child of `kind`.
    pub fn child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| self.kind(child) == kind)
    }

    /// A paragraph is a list item when its properties carry numbering.
    pub fn is_list_paragraph(&self, id: NodeId) -> bool {
        self.child_of_kind(id, NodeKind::ParagraphProperties)
            .and_then(|props| self.child_of_kind(props, NodeKind::Numbering))
            .is_some()
    }

    /// `id` followed by all its descendants in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev());
        }
        out
    }

    // ---- mutation ----

    /// Detaches `id` from its parent. Detached nodes are left untouched.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.node_mut(parent).children.retain(|&child| child != id);
            self.node_mut(id).parent = None;
        }
    }

    /// Moves `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.remove(child);
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
    }

    /// Moves `node` to sit immediately before `reference`.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) -> Result<(), DomError> {
        self.insert_at_offset(reference, node, 0)
    }

    /// Moves `node` to sit immediately after `reference`.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> Result<(), DomError> {
        self.insert_at_offset(reference, node, 1)
    }

    fn insert_at_offset(
        &mut self,
        reference: NodeId,
        node: NodeId,
        offset: usize,
    ) -> Result<(), DomError> {
        let parent = self.parent(reference).ok_or(DomError::Detached(reference))?;
        self.remove(node);
        let index = self
            .index_in_parent(reference)
            .ok_or(DomError::Detached(reference))?;
        self.node_mut(parent).children.insert(index + offset, node);
        self.node_mut(node).parent = Some(parent);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paragraph_with_runs(doc: &mut Document, texts: &[&str]) -> (NodeId, Vec<NodeId>) {
        let p = doc.create_element("w:p");
        let root = doc.root();
        doc.append_child(root, p);
        let mut leaves = Vec::new();
        for text in texts {
            let r = doc.create_element("w:r");
            let t = doc.create_element("w:t");
            doc.set_text(t, *text);
            doc.append_child(r, t);
            doc.append_child(p, r);
            leaves.push(t);
        }
        (p, leaves)
    }

    #[test]
    fn test_navigation_follows_child_order() {
        let mut doc = Document::new("w:body");
        let (p, leaves) = paragraph_with_runs(&mut doc, &["a", "b", "c"]);
        let runs = doc.children(p).to_vec();

        assert_eq!(doc.next_sibling(runs[0]), Some(runs[1]));
        assert_eq!(doc.previous_sibling(runs[0]), None);
        assert_eq!(doc.previous_sibling(runs[2]), Some(runs[1]));
        assert_eq!(doc.containing_paragraph(leaves[1]), Some(p));
        assert_eq!(doc.containing_run(leaves[1]), Some(runs[1]));
        assert_eq!(doc.text_content(p), "abc");
    }

    #[test]
    fn test_insert_before_and_after_move_detached_nodes() {
        let mut doc = Document::new("w:body");
        let (p, _) = paragraph_with_runs(&mut doc, &["a", "c"]);
        let runs = doc.children(p).to_vec();

        let (_, extra) = paragraph_with_runs(&mut doc, &["b"]);
        let b_run = doc.parent(extra[0]).unwrap();
        doc.insert_after(runs[0], b_run).unwrap();
        assert_eq!(doc.text_content(p), "abc");

        let z = doc.clone_node(b_run, true);
        doc.insert_before(runs[0], z).unwrap();
        assert_eq!(doc.text_content(p), "babc");
    }

    #[test]
    fn test_insert_relative_to_detached_node_fails() {
        let mut doc = Document::new("w:body");
        let lonely = doc.create_element("w:p");
        let other = doc.create_element("w:p");
        assert_eq!(
            doc.insert_before(lonely, other),
            Err(DomError::Detached(lonely))
        );
    }

    #[test]
    fn test_remove_detaches_but_keeps_subtree() {
        let mut doc = Document::new("w:body");
        let (p, leaves) = paragraph_with_runs(&mut doc, &["x"]);
        doc.remove(p);

        assert_eq!(doc.parent(p), None);
        assert!(doc.children(doc.root()).is_empty());
        assert_eq!(doc.containing_paragraph(leaves[0]), Some(p));
    }

    #[test]
    fn test_deep_clone_copies_structure_not_identity() {
        let mut doc = Document::new("w:body");
        let (p, leaves) = paragraph_with_runs(&mut doc, &["hello"]);
        doc.set_preserve_space(leaves[0]);

        let copy = doc.clone_node(p, true);
        assert_ne!(copy, p);
        assert_eq!(doc.parent(copy), None);
        assert_eq!(doc.text_content(copy), "hello");

        let copied_leaf = doc.descendants(copy)[2];
        assert!(doc.preserves_space(copied_leaf));
        doc.set_text(copied_leaf, "changed");
        assert_eq!(doc.text(leaves[0]), "hello");
    }

    #[test]
    fn test_shallow_clone_drops_children() {
        let mut doc = Document::new("w:body");
        let (p, _) = paragraph_with_runs(&mut doc, &["hello"]);
        doc.set_attr(p, "w:rsidR", "00AB");
        let copy = doc.clone_node(p, false);

        assert!(doc.children(copy).is_empty());
        assert_eq!(doc.attr(copy, "w:rsidR"), Some("00AB"));
    }

    #[test]
    fn test_list_paragraph_needs_numbering_in_properties() {
        let mut doc = Document::new("w:body");
        let (p, _) = paragraph_with_runs(&mut doc, &["item"]);
        assert!(!doc.is_list_paragraph(p));

        let props = doc.create_element("w:pPr");
        let num = doc.create_element("w:numPr");
        doc.append_child(props, num);
        let first = doc.first_child(p).unwrap();
        doc.insert_before(first, props).unwrap();
        assert!(doc.is_list_paragraph(p));
    }

    #[test]
    fn test_create_like_reuses_prefix() {
        let mut doc = Document::new("w:body");
        let (_, leaves) = paragraph_with_runs(&mut doc, &["x"]);
        let br = doc.create_like(leaves[0], "br");
        assert_eq!(doc.name(br), "w:br");
        assert_eq!(doc.kind(br), NodeKind::Break);

        let mut plain = Document::new("body");
        let root = plain.root();
        let t = plain.create_like(root, "t");
        assert_eq!(plain.name(t), "t");
    }

    #[test]
    fn test_set_attr_overwrites_existing_value() {
        let mut doc = Document::new("w:body");
        let root = doc.root();
        doc.set_attr(root, "a", "1");
        doc.set_attr(root, "a", "2");
        assert_eq!(doc.node(root).attrs, vec![("a".to_string(), "2".to_string())]);
    }
}
