use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::document::Document;
use crate::error::MarkupError;
use crate::node::{NodeId, NodeKind};

/// Serialize `id` and its subtree. Elements without content are written in
/// the self-closing form.
pub fn to_markup(doc: &Document, id: NodeId) -> Result<String, MarkupError> {
    let mut writer = Writer::new(Vec::new());
    write_node(doc, id, &mut writer)?;
    String::from_utf8(writer.into_inner()).map_err(|e| MarkupError::Write(e.to_string()))
}

fn write_node(doc: &Document, id: NodeId, writer: &mut Writer<Vec<u8>>) -> Result<(), MarkupError> {
    let node = doc.node(id);
    let mut start = BytesStart::new(node.name.as_str());
    for (key, value) in &node.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    let has_text = node.kind == NodeKind::Text && !node.text.is_empty();
    if node.children.is_empty() && !has_text {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    if has_text {
        let escaped = partial_escape(node.text.as_str());
        emit(writer, Event::Text(BytesText::from_escaped(escaped)))?;
    }
    for &child in &node.children {
        write_node(doc, child, writer)?;
    }
    emit(writer, Event::End(BytesEnd::new(node.name.as_str())))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), MarkupError> {
    writer
        .write_event(event)
        .map_err(|e| MarkupError::Write(e.to_string()))
}
