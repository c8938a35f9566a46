use std::fmt::Display;
use std::str;

use quick_xml::Reader;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesStart, Event};

use crate::document::Document;
use crate::error::MarkupError;
use crate::node::NodeId;

/// Read a markup string into a new [`Document`] rooted at its single
/// top-level element.
pub fn parse(input: &str) -> Result<Document, MarkupError> {
    let mut reader = Reader::from_str(input);
    let mut builder = TreeBuilder::default();

    loop {
        let pos = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| syntax(reader.error_position() as usize, e))?;

        match event {
            Event::Start(start) => builder.start(&start, pos, false)?,
            Event::Empty(start) => builder.start(&start, pos, true)?,
            Event::End(_) => builder.end(pos)?,
            Event::Text(text) => {
                let text = text.decode().map_err(|e| syntax(pos, e))?;
                builder.text(&text, pos)?;
            }
            Event::CData(data) => builder.text(utf8(data.as_ref(), pos)?, pos)?,
            Event::GeneralRef(reference) => {
                let name = reference.decode().map_err(|e| syntax(pos, e))?;
                builder.text(&resolve_entity(&name, pos)?, pos)?;
            }
            Event::Eof => break,
            // Declaration, doctype, comments and processing instructions
            _ => {}
        }
    }

    let doc = builder.finish(input.len())?;
    log::trace!("parsed markup into {} nodes", doc.len());
    Ok(doc)
}

/// An element whose end tag has not been read yet.
struct OpenElement {
    id: NodeId,
    /// Character data collected so far, kept only for text leaves.
    text: String,
}

/// Turns the reader's event stream into a [`Document`].
#[derive(Default)]
struct TreeBuilder {
    doc: Option<Document>,
    open: Vec<OpenElement>,
}

impl TreeBuilder {
    fn start(
        &mut self,
        start: &BytesStart<'_>,
        pos: usize,
        self_closing: bool,
    ) -> Result<(), MarkupError> {
        let name = utf8(start.name().as_ref(), pos)?.to_string();
        let attrs = read_attributes(start, pos)?;

        let id = if let Some(doc) = self.doc.as_mut() {
            let parent = self
                .open
                .last()
                .ok_or(MarkupError::TrailingContent(pos))?;
            let child = doc.create_element(name);
            doc.append_child(parent.id, child);
            set_attributes(doc, child, attrs);
            child
        } else {
            let mut doc = Document::new(name);
            let root = doc.root();
            set_attributes(&mut doc, root, attrs);
            self.doc = Some(doc);
            root
        };

        if !self_closing {
            self.open.push(OpenElement {
                id,
                text: String::new(),
            });
        }
        Ok(())
    }

    fn end(&mut self, pos: usize) -> Result<(), MarkupError> {
        let element = self
            .open
            .pop()
            .ok_or_else(|| syntax(pos, "end tag without a start tag"))?;
        if let Some(doc) = self.doc.as_mut()
            && doc.is_text(element.id)
        {
            doc.set_text(element.id, element.text);
        }
        Ok(())
    }

    fn text(&mut self, text: &str, pos: usize) -> Result<(), MarkupError> {
        if let Some(doc) = &self.doc
            && let Some(element) = self.open.last_mut()
            && doc.is_text(element.id)
        {
            element.text.push_str(text);
            return Ok(());
        }

        if text.trim().is_empty() {
            return Ok(());
        }
        if self.doc.is_some() && self.open.is_empty() {
            return Err(MarkupError::TrailingContent(pos));
        }
        Err(MarkupError::StrayText(pos))
    }

    fn finish(self, end: usize) -> Result<Document, MarkupError> {
        if !self.open.is_empty() {
            return Err(MarkupError::UnexpectedEof(end));
        }
        self.doc.ok_or(MarkupError::MissingRoot)
    }
}

fn read_attributes(start: &BytesStart<'_>, pos: usize) -> Result<Vec<(String, String)>, MarkupError> {
    start
        .attributes()
        .map(|attr| {
            let attr = attr.map_err(|e| syntax(pos, e))?;
            let key = utf8(attr.key.as_ref(), pos)?.to_string();
            let value = attr.unescape_value().map_err(|e| syntax(pos, e))?;
            Ok((key, value.into_owned()))
        })
        .collect()
}

fn set_attributes(doc: &mut Document, id: NodeId, attrs: Vec<(String, String)>) {
    for (key, value) in attrs {
        doc.set_attr(id, &key, value);
    }
}

/// Resolves a predefined XML entity or a character reference. HTML-only
/// names such as `nbsp` are not XML and are rejected.
fn resolve_entity(name: &str, pos: usize) -> Result<String, MarkupError> {
    if let Some(resolved) = resolve_xml_entity(name) {
        return Ok(resolved.to_string());
    }

    let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        name.strip_prefix('#').and_then(|dec| dec.parse::<u32>().ok())
    };
    code.and_then(char::from_u32)
        .map(String::from)
        .ok_or_else(|| MarkupError::UnknownEntity {
            name: name.to_string(),
            pos,
        })
}

fn utf8(bytes: &[u8], pos: usize) -> Result<&str, MarkupError> {
    str::from_utf8(bytes).map_err(|e| syntax(pos, e))
}

fn syntax(pos: usize, error: impl Display) -> MarkupError {
    MarkupError::Syntax {
        pos,
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::to_markup;
    use crate::node::NodeKind;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_reads_nested_elements() {
        let doc = parse(
            r#"<?xml version="1.0"?>
            <w:body>
              <!-- leading comment -->
              <w:p>
                <w:r><w:t xml:space="preserve"> Hi &amp; bye </w:t></w:r>
              </w:p>
            </w:body>"#,
        )
        .unwrap();

        let root = doc.root();
        assert_eq!(doc.kind(root), NodeKind::Body);
        let p = doc.children(root)[0];
        assert_eq!(doc.kind(p), NodeKind::Paragraph);
        let t = doc.descendants(p)[2];
        assert_eq!(doc.text(t), " Hi & bye ");
        assert!(doc.preserves_space(t));
    }

    #[test]
    fn test_text_keeps_cdata_and_skips_comments() {
        let doc = parse("<t>a<!-- gone --><![CDATA[<b>]]>c</t>").unwrap();
        assert_eq!(doc.text(doc.root()), "a<b>c");
    }

    #[test]
    fn test_single_quoted_attributes() {
        let doc = parse("<p a='1' b = \"x&lt;y\"/>").unwrap();
        assert_eq!(doc.attr(doc.root(), "a"), Some("1"));
        assert_eq!(doc.attr(doc.root(), "b"), Some("x<y"));
    }

    #[test]
    fn test_doctype_before_root_is_skipped() {
        let doc = parse("<!DOCTYPE body><body/>").unwrap();
        assert_eq!(doc.kind(doc.root()), NodeKind::Body);
        assert!(doc.children(doc.root()).is_empty());
    }

    #[rstest]
    #[case("a&#233;b", "a\u{e9}b")]
    #[case("a&#xE9;b", "a\u{e9}b")]
    #[case("&lt;&gt;&amp;&quot;&apos;", "<>&\"'")]
    fn test_character_references_resolve(#[case] raw: &str, #[case] expected: &str) {
        let doc = parse(&format!("<t>{raw}</t>")).unwrap();
        assert_eq!(doc.text(doc.root()), expected);
    }

    #[test]
    fn test_html_entities_are_not_xml() {
        let result = parse("<body><p><r><t>a&nbsp;b</t></r></p></body>");
        assert!(matches!(
            result,
            Err(MarkupError::UnknownEntity { name, .. }) if name == "nbsp"
        ));
    }

    #[rstest]
    #[case("<body><p><r><t>{name}</t></r></p></body>")]
    #[case("<w:body><w:p><w:pPr><w:numPr/></w:pPr><w:r><w:t xml:space=\"preserve\"> x </w:t></w:r></w:p></w:body>")]
    #[case("<body><tbl><tr><tc><p/></tc></tr></tbl></body>")]
    #[case("<body><p><r><t>a</t><br/><t>b</t></r></p></body>")]
    fn test_canonical_markup_roundtrips(#[case] input: &str) {
        let doc = parse(input).unwrap();
        assert_eq!(to_markup(&doc, doc.root()).unwrap(), input, "Roundtrip failed for: {:?}", input);
    }

    #[rstest]
    #[case("", MarkupError::MissingRoot)]
    #[case("   ", MarkupError::MissingRoot)]
    #[case("<body>", MarkupError::UnexpectedEof(6))]
    #[case("<body>loose</body>", MarkupError::StrayText(6))]
    #[case("<body/><body/>", MarkupError::TrailingContent(7))]
    #[case("<body/>tail", MarkupError::TrailingContent(7))]
    #[case("text", MarkupError::StrayText(0))]
    fn test_rejects_malformed_input(#[case] input: &str, #[case] expected: MarkupError) {
        assert_eq!(parse(input).unwrap_err(), expected);
    }

    #[rstest]
    #[case("<body><p></body>")]
    #[case("<body a=1/>")]
    fn test_reports_xml_syntax_errors(#[case] input: &str) {
        assert!(matches!(parse(input), Err(MarkupError::Syntax { .. })));
    }
}
