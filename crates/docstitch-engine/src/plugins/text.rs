use async_trait::async_trait;
use docstitch_dom::{Document, NodeId};

use super::{TemplateContext, TemplatePlugin};
use crate::compilation::{ScopeData, Tag};
use crate::error::TemplateError;

/// Writes the value's string form in place of the tag.
///
/// Each line after the first goes into its own text leaf, preceded by a
/// break, inside the run that held the tag.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextPlugin;

#[async_trait]
impl TemplatePlugin for TextPlugin {
    fn content_type(&self) -> &str {
        "text"
    }

    async fn simple_tag_replacement(
        &self,
        tag: &Tag,
        data: &mut ScopeData,
        context: &mut TemplateContext<'_>,
    ) -> Result<(), TemplateError> {
        let value = data.get_scope_data()?.to_string();
        let lines: Vec<&str> = value
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();

        match lines.as_slice() {
            [] => replace_single_line(context.document, tag.text_node, ""),
            [line] => replace_single_line(context.document, tag.text_node, line),
            _ => replace_multi_line(context.document, tag.text_node, &lines)?,
        }
        Ok(())
    }
}

fn replace_single_line(doc: &mut Document, text_node: NodeId, text: &str) {
    doc.set_text(text_node, text);
    doc.set_preserve_space(text_node);
}

fn replace_multi_line(
    doc: &mut Document,
    text_node: NodeId,
    lines: &[&str],
) -> Result<(), TemplateError> {
    replace_single_line(doc, text_node, lines[0]);

    let mut anchor = text_node;
    for line in &lines[1..] {
        let line_break = doc.create_like(text_node, "br");
        doc.insert_after(anchor, line_break)?;

        let leaf = doc.create_like(text_node, "t");
        replace_single_line(doc, leaf, line);
        doc.insert_after(line_break, leaf)?;
        anchor = leaf;
    }
    log::trace!("wrote {} lines into {:?}", lines.len(), text_node);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{TemplateHandler, TemplateOptions};
    use crate::value::ScopeValue;
    use docstitch_dom::markup::{parse, to_markup};
    use insta::assert_snapshot;
    use rstest::rstest;

    async fn render(markup: &str, data: ScopeValue) -> String {
        let handler = TemplateHandler::new(TemplateOptions::default()).unwrap();
        let mut doc = parse(markup).unwrap();
        handler.process(&mut doc, data).await.unwrap();
        to_markup(&doc, doc.root()).unwrap()
    }

    #[tokio::test]
    async fn test_replaces_single_line() {
        let out = render(
            "<p><r><t>Hello {name}!</t></r></p>",
            ScopeValue::map([("name", "World")]),
        )
        .await;
        assert_snapshot!(out, @r#"<p><r><t xml:space="preserve">Hello </t><t xml:space="preserve">World</t><t xml:space="preserve">!</t></r></p>"#);
    }

    #[tokio::test]
    async fn test_keeps_edge_whitespace() {
        let out = render(
            "<p><r><t>{name}</t></r></p>",
            ScopeValue::map([("name", "  padded  ")]),
        )
        .await;
        assert_snapshot!(out, @r#"<p><r><t xml:space="preserve">  padded  </t></r></p>"#);
    }

    #[tokio::test]
    async fn test_missing_value_renders_empty() {
        let out = render("<p><r><t>{name}</t></r></p>", ScopeValue::map([("other", "x")])).await;
        assert_snapshot!(out, @r#"<p><r><t xml:space="preserve"/></r></p>"#);
    }

    #[tokio::test]
    async fn test_multi_line_adds_breaks_in_same_run() {
        let out = render(
            "<w:p><w:r><w:t>{lines}</w:t></w:r></w:p>",
            ScopeValue::map([("lines", "one\ntwo\nthree")]),
        )
        .await;
        assert_snapshot!(out, @r#"<w:p><w:r><w:t xml:space="preserve">one</w:t><w:br/><w:t xml:space="preserve">two</w:t><w:br/><w:t xml:space="preserve">three</w:t></w:r></w:p>"#);
    }

    #[rstest]
    #[case("a\r\nb")]
    #[case("a\nb")]
    #[tokio::test]
    async fn test_carriage_returns_are_dropped(#[case] value: &str) {
        let out = render(
            "<p><r><t>{v}</t></r></p>",
            ScopeValue::map([("v", value)]),
        )
        .await;
        insta::allow_duplicates! {
            assert_snapshot!(out, @r#"<p><r><t xml:space="preserve">a</t><br/><t xml:space="preserve">b</t></r></p>"#);
        }
    }

    #[tokio::test]
    async fn test_trailing_newline_adds_empty_line() {
        let out = render(
            "<p><r><t>{v}</t></r></p>",
            ScopeValue::map([("v", "end\n")]),
        )
        .await;
        assert_snapshot!(out, @r#"<p><r><t xml:space="preserve">end</t><br/><t xml:space="preserve"/></r></p>"#);
    }
}
