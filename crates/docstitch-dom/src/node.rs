/// Stable handle to a node in a [`crate::Document`] arena.
///
/// Handles stay valid after a node is detached, so a removed subtree can be
/// re-inserted or cloned later in the same document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena index, mostly useful for debugging output.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Structural role of a node, derived from its local element name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Body,
    Paragraph,
    ParagraphProperties,
    Numbering,
    Run,
    RunProperties,
    Text,
    Break,
    Table,
    TableRow,
    TableCell,
    Element,
}

impl NodeKind {
    /// Classify an element name such as `w:p` or `r`. The namespace prefix
    /// is ignored.
    pub fn classify(name: &str) -> Self {
        match local_name(name) {
            "body" => NodeKind::Body,
            "p" => NodeKind::Paragraph,
            "pPr" => NodeKind::ParagraphProperties,
            "numPr" => NodeKind::Numbering,
            "r" => NodeKind::Run,
            "rPr" => NodeKind::RunProperties,
            "t" => NodeKind::Text,
            "br" => NodeKind::Break,
            "tbl" => NodeKind::Table,
            "tr" => NodeKind::TableRow,
            "tc" => NodeKind::TableCell,
            _ => NodeKind::Element,
        }
    }

    /// Property holders travel with their owner when it is split.
    pub fn is_properties(self) -> bool {
        matches!(
            self,
            NodeKind::ParagraphProperties | NodeKind::RunProperties
        )
    }
}

/// Local part of a possibly prefixed element name.
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

/// Namespace prefix of an element name, without the colon.
pub fn prefix(name: &str) -> Option<&str> {
    name.split_once(':').map(|(prefix, _)| prefix)
}

/// A single arena slot.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Element name as written, including any prefix.
    pub name: String,
    pub kind: NodeKind,
    /// Attributes in document order.
    pub attrs: Vec<(String, String)>,
    /// Character data. Only text leaves carry any.
    pub text: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl NodeData {
    pub(crate) fn new(name: String) -> Self {
        let kind = NodeKind::classify(&name);
        Self {
            name,
            kind,
            attrs: Vec::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("w:p", NodeKind::Paragraph)]
    #[case("p", NodeKind::Paragraph)]
    #[case("w:pPr", NodeKind::ParagraphProperties)]
    #[case("w:numPr", NodeKind::Numbering)]
    #[case("w:r", NodeKind::Run)]
    #[case("w:rPr", NodeKind::RunProperties)]
    #[case("w:t", NodeKind::Text)]
    #[case("w:br", NodeKind::Break)]
    #[case("w:tbl", NodeKind::Table)]
    #[case("w:tr", NodeKind::TableRow)]
    #[case("w:tc", NodeKind::TableCell)]
    #[case("w:body", NodeKind::Body)]
    #[case("w:hyperlink", NodeKind::Element)]
    fn test_classifies_by_local_name(#[case] name: &str, #[case] expected: NodeKind) {
        assert_eq!(NodeKind::classify(name), expected);
    }

    #[test]
    fn test_splits_prefix_from_local_name() {
        assert_eq!(local_name("w:t"), "t");
        assert_eq!(local_name("t"), "t");
        assert_eq!(prefix("w:t"), Some("w"));
        assert_eq!(prefix("t"), None);
    }
}
