use crate::NodeId;

/// Failures raised by tree edits.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DomError {
    #[error("Node {0:?} has no parent")]
    Detached(NodeId),
    #[error("Node {0:?} is not a text leaf")]
    NotText(NodeId),
    #[error("Node {0:?} is not inside a run")]
    MissingRun(NodeId),
    #[error("Node {node:?} is not a descendant of paragraph {paragraph:?}")]
    NotInParagraph { node: NodeId, paragraph: NodeId },
    #[error("Can not join text nodes from separate paragraphs")]
    JoinAcrossParagraphs,
    #[error("Text node {to:?} does not follow {from:?}")]
    InvalidRange { from: NodeId, to: NodeId },
    #[error("Nodes are not siblings")]
    NotSiblings,
    #[error("Split index {index} is not a character boundary of a {len} byte text")]
    InvalidSplit { index: usize, len: usize },
}

/// Failures raised while reading or writing markup.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MarkupError {
    #[error("Malformed markup at byte {pos}: {message}")]
    Syntax { pos: usize, message: String },
    #[error("Unknown entity '&{name};' at byte {pos}")]
    UnknownEntity { name: String, pos: usize },
    #[error("Unexpected end of input at byte {0}")]
    UnexpectedEof(usize),
    #[error("Text outside a text element at byte {0}")]
    StrayText(usize),
    #[error("Content after the root element at byte {0}")]
    TrailingContent(usize),
    #[error("Input has no root element")]
    MissingRoot,
    #[error("Failed to write markup: {0}")]
    Write(String),
}
