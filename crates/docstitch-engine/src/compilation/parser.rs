use docstitch_config::Delimiters;
use docstitch_dom::Document;
use regex::Regex;

use super::delimiters::DelimiterMark;
use super::tag::{Tag, TagDisposition};
use crate::error::TemplateError;

/// Turns delimiter marks into tags, isolating each tag's text in its own
/// text leaf along the way.
#[derive(Debug, Clone)]
pub struct TagParser {
    delimiters: Delimiters,
    tag_pattern: Regex,
}

impl TagParser {
    pub fn new(delimiters: &Delimiters) -> Result<Self, TemplateError> {
        let tag_pattern = Regex::new(&format!(
            "(?s)^{}(.*?){}",
            regex::escape(&delimiters.tag_start),
            regex::escape(&delimiters.tag_end)
        ))?;
        Ok(Self {
            delimiters: delimiters.clone(),
            tag_pattern,
        })
    }

    /// Pairs up `marks` and returns the tags in document order. Marks are
    /// updated in place as leaves are split and joined.
    pub fn parse(
        &self,
        doc: &mut Document,
        marks: &mut [DelimiterMark],
    ) -> Result<Vec<Tag>, TemplateError> {
        let mut tags = Vec::new();
        let mut opened: Option<usize> = None;

        for i in 0..marks.len() {
            let mark = marks[i];

            if mark.is_open {
                if let Some(open_index) = opened {
                    return Err(TemplateError::MissingCloseDelimiter {
                        text: doc.text(marks[open_index].text_node).to_string(),
                    });
                }
                opened = Some(i);
                continue;
            }

            let Some(open_index) = opened.take() else {
                return Err(TemplateError::MissingStartDelimiter {
                    text: doc.text(mark.text_node).to_string(),
                });
            };

            let open_node = marks[open_index].text_node;
            if doc.containing_paragraph(open_node) != doc.containing_paragraph(mark.text_node) {
                return Err(TemplateError::MissingCloseDelimiter {
                    text: doc.text(open_node).to_string(),
                });
            }

            self.normalize_tag_nodes(doc, open_index, i, marks)?;
            let tag = self.process_tag(doc, &marks[open_index])?;
            log::trace!("parsed tag {:?}", tag.raw_text);
            tags.push(tag);
        }

        if let Some(open_index) = opened {
            return Err(TemplateError::MissingCloseDelimiter {
                text: doc.text(marks[open_index].text_node).to_string(),
            });
        }

        log::debug!("parsed {} tags", tags.len());
        Ok(tags)
    }

    /// Moves the tag's text into a leaf of its own.
    ///
    /// `"some text {some tag} more text"` becomes the leaves
    /// `["some text ", "{some tag}", " more text"]`.
    fn normalize_tag_nodes(
        &self,
        doc: &mut Document,
        open_index: usize,
        close_index: usize,
        marks: &mut [DelimiterMark],
    ) -> Result<(), TemplateError> {
        let open = marks[open_index];
        let close = marks[close_index];
        let end_len = self.delimiters.tag_end.len();

        let mut start_node = open.text_node;
        let mut end_node = close.text_node;
        let same_node = start_node == end_node;
        let mut close_offset = close.index;

        // trim start
        if open.index > 0 {
            doc.split_text_node(start_node, open.index, true)?;
            if same_node {
                close_offset -= open.index;
            }
        }

        // trim end
        if close_offset + end_len < doc.text(end_node).len() {
            end_node = doc.split_text_node(end_node, close_offset + end_len, true)?;
            if same_node {
                start_node = end_node;
            }
        }

        if start_node != end_node {
            doc.join_text_nodes_range(start_node, end_node)?;
        }

        // later marks still index into the leaves as they were before the split
        for mark in marks.iter_mut().skip(close_index + 1) {
            let mut updated = false;
            if mark.text_node == open.text_node {
                mark.index -= open.index;
                updated = true;
            }
            if mark.text_node == close.text_node {
                mark.index -= close_offset + end_len;
                updated = true;
            }
            if !updated {
                break;
            }
        }

        marks[open_index].text_node = start_node;
        marks[open_index].index = 0;
        marks[close_index].text_node = start_node;
        marks[close_index].index = doc.text(start_node).len() - end_len;
        Ok(())
    }

    fn process_tag(&self, doc: &Document, open: &DelimiterMark) -> Result<Tag, TemplateError> {
        let raw_text = doc.text(open.text_node).to_string();
        let content = self
            .tag_pattern
            .captures(&raw_text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .ok_or_else(|| {
                TemplateError::Internal(format!("tag text {raw_text:?} is not delimited"))
            })?;

        let (disposition, name) = if content.is_empty() {
            (TagDisposition::SelfClosed, None)
        } else if let Some(rest) = content.strip_prefix(&self.delimiters.container_tag_open) {
            (TagDisposition::Open, Some(rest.trim().to_string()))
        } else if let Some(rest) = content.strip_prefix(&self.delimiters.container_tag_close) {
            (TagDisposition::Close, Some(rest.trim().to_string()))
        } else {
            (TagDisposition::SelfClosed, Some(content.to_string()))
        };

        Ok(Tag {
            name,
            raw_text,
            disposition,
            text_node: open.text_node,
        })
    }
}
