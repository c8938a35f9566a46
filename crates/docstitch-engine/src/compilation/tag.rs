use docstitch_dom::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagDisposition {
    Open,
    Close,
    SelfClosed,
}

/// A parsed tag. `text_node` holds exactly `raw_text` and nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: Option<String>,
    pub raw_text: String,
    pub disposition: TagDisposition,
    pub text_node: NodeId,
}

impl Tag {
    /// The tag name, or "" for an unnamed tag.
    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}
