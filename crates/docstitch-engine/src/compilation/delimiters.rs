use docstitch_config::Delimiters;
use docstitch_dom::{Document, NodeId};

use crate::error::TemplateError;

/// One located start or end delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterMark {
    pub is_open: bool,
    /// Byte offset of the delimiter's first character in `text_node`.
    pub index: usize,
    pub text_node: NodeId,
}

/// Progress of the current delimiter match attempt.
#[derive(Debug, Default)]
struct MatchState {
    /// Bytes of the sought delimiter matched so far.
    delimiter_index: usize,
    /// Text leaves touched since the attempt began.
    open_nodes: Vec<NodeId>,
    /// Offset in `open_nodes[0]` where the attempt began.
    first_match_index: Option<usize>,
}

impl MatchState {
    fn reset(&mut self) {
        self.delimiter_index = 0;
        self.open_nodes.clear();
        self.first_match_index = None;
    }
}

/// Counts element nesting below the search root.
#[derive(Debug)]
struct DepthTracker {
    depth: usize,
    max_depth: usize,
}

impl DepthTracker {
    fn new(max_depth: usize) -> Self {
        Self {
            depth: 0,
            max_depth,
        }
    }

    fn increment(&mut self) -> Result<(), TemplateError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(TemplateError::MaxDepthExceeded {
                max_depth: self.max_depth,
            });
        }
        Ok(())
    }

    fn decrement(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn set(&mut self, depth: usize) {
        self.depth = depth;
    }
}

/// Finds start and end delimiters in the text leaves below a node, even when
/// a delimiter is spread over several leaves.
///
/// Matching is a plain character-by-character comparison. Delimiters are a
/// few characters long, so nothing smarter pays off.
#[derive(Debug, Clone)]
pub struct DelimiterSearcher {
    start_delimiter: String,
    end_delimiter: String,
    max_depth: usize,
}

impl DelimiterSearcher {
    /// Fails when a delimiter is empty or padded with whitespace.
    pub fn new(delimiters: &Delimiters, max_depth: usize) -> Result<Self, TemplateError> {
        delimiters.validate()?;
        Ok(Self {
            start_delimiter: delimiters.tag_start.clone(),
            end_delimiter: delimiters.tag_end.clone(),
            max_depth,
        })
    }

    /// Returns the delimiter marks below `root` in document order.
    ///
    /// A delimiter split across leaves is merged into the first of them, so
    /// every returned mark lies wholly inside one leaf. Partial matches never
    /// carry across a paragraph.
    pub fn find_delimiters(
        &self,
        doc: &mut Document,
        root: NodeId,
    ) -> Result<Vec<DelimiterMark>, TemplateError> {
        let mut delimiters = Vec::new();
        let mut state = MatchState::default();
        let mut depth = DepthTracker::new(self.max_depth);
        let mut look_for_open = true;
        let mut current = Some(root);

        while let Some(mut node) = current {
            if doc.is_paragraph(node) {
                state.reset();
            }

            if !should_search(doc, node) {
                current = next_node(doc, root, node, &mut depth)?;
                continue;
            }

            state.open_nodes.push(node);
            let mut text_index = 0;
            while text_index < doc.text(node).len() {
                let pattern = if look_for_open {
                    self.start_delimiter.as_bytes()
                } else {
                    self.end_delimiter.as_bytes()
                };
                let byte = doc.text(node).as_bytes()[text_index];

                if byte != pattern[state.delimiter_index] {
                    (node, text_index) =
                        rewind(doc, root, node, text_index, &mut state, &mut depth);
                    text_index += 1;
                    continue;
                }

                if state.first_match_index.is_none() {
                    state.first_match_index = Some(text_index);
                }

                if state.delimiter_index != pattern.len() - 1 {
                    state.delimiter_index += 1;
                    text_index += 1;
                    continue;
                }

                (node, text_index) = full_match(
                    doc,
                    root,
                    node,
                    text_index,
                    look_for_open,
                    &mut state,
                    &mut depth,
                    &mut delimiters,
                )?;
                look_for_open = !look_for_open;
                text_index += 1;
            }

            current = next_node(doc, root, node, &mut depth)?;
        }

        log::debug!("found {} delimiters", delimiters.len());
        Ok(delimiters)
    }
}

fn should_search(doc: &Document, node: NodeId) -> bool {
    doc.is_text(node) && !doc.text(node).is_empty() && doc.parent(node).is_some()
}

/// Handles a mismatch. A partial match is abandoned by going back to where
/// it began, so a delimiter prefix that repeats (`{!` against `{{!`) is
/// retried one character later.
fn rewind(
    doc: &Document,
    root: NodeId,
    node: NodeId,
    text_index: usize,
    state: &mut MatchState,
    depth: &mut DepthTracker,
) -> (NodeId, usize) {
    let (mut node, mut text_index) = (node, text_index);
    if let Some(first_index) = state.first_match_index
        && let Some(&first_node) = state.open_nodes.first()
    {
        if first_node != node {
            log::trace!("rewinding delimiter match to {first_node:?}");
            depth.set(depth_below(doc, root, first_node));
        }
        node = first_node;
        text_index = first_index;
    }

    state.reset();
    if text_index + 1 < doc.text(node).len() {
        state.open_nodes.push(node);
    }
    (node, text_index)
}

/// Records a completed delimiter. When it spans several leaves they are
/// joined first and the scan position is moved into the joined leaf.
#[allow(clippy::too_many_arguments)]
fn full_match(
    doc: &mut Document,
    root: NodeId,
    node: NodeId,
    text_index: usize,
    is_open: bool,
    state: &mut MatchState,
    depth: &mut DepthTracker,
    delimiters: &mut Vec<DelimiterMark>,
) -> Result<(NodeId, usize), TemplateError> {
    let (mut node, mut text_index) = (node, text_index);
    let first_node = state.open_nodes.first().copied().unwrap_or(node);

    if state.open_nodes.len() > 1 {
        let last_len = doc.text(node).len();
        doc.join_text_nodes_range(first_node, node)?;
        text_index += doc.text(first_node).len() - last_len;
        node = first_node;
        depth.set(depth_below(doc, root, first_node));
    }

    delimiters.push(DelimiterMark {
        is_open,
        index: state.first_match_index.unwrap_or(text_index),
        text_node: first_node,
    });

    state.reset();
    if text_index + 1 < doc.text(node).len() {
        state.open_nodes.push(node);
    }
    Ok((node, text_index))
}

/// Pre-order successor of `node` that stays inside `root`.
fn next_node(
    doc: &Document,
    root: NodeId,
    node: NodeId,
    depth: &mut DepthTracker,
) -> Result<Option<NodeId>, TemplateError> {
    if let Some(child) = doc.first_child(node) {
        depth.increment()?;
        return Ok(Some(child));
    }

    let mut node = node;
    while node != root {
        if let Some(sibling) = doc.next_sibling(node) {
            return Ok(Some(sibling));
        }
        let Some(parent) = doc.parent(node) else {
            break;
        };
        depth.decrement();
        node = parent;
    }
    Ok(None)
}

fn depth_below(doc: &Document, root: NodeId, node: NodeId) -> usize {
    let mut depth = 0;
    let mut current = node;
    while current != root {
        match doc.parent(current) {
            Some(parent) => {
                depth += 1;
                current = parent;
            }
            None => break,
        }
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstitch_dom::markup::{parse, to_markup};
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn searcher(start: &str, end: &str) -> DelimiterSearcher {
        DelimiterSearcher {
            start_delimiter: start.to_string(),
            end_delimiter: end.to_string(),
            max_depth: 20,
        }
    }

    fn leaves(doc: &Document) -> Vec<NodeId> {
        doc.descendants(doc.root())
            .into_iter()
            .filter(|&n| doc.is_text(n))
            .collect()
    }

    /// (is_open, index, position of the leaf among the original leaves)
    fn describe(marks: &[DelimiterMark], original: &[NodeId]) -> Vec<(bool, usize, usize)> {
        marks
            .iter()
            .map(|m| {
                let leaf = original.iter().position(|&n| n == m.text_node).unwrap();
                (m.is_open, m.index, leaf)
            })
            .collect()
    }

    fn find(markup: &str, start: &str, end: &str) -> (Document, Vec<NodeId>, Vec<DelimiterMark>) {
        let mut doc = parse(markup).unwrap();
        let original = leaves(&doc);
        let root = doc.root();
        let marks = searcher(start, end).find_delimiters(&mut doc, root).unwrap();
        (doc, original, marks)
    }

    #[test]
    fn test_single_character_delimiters_in_one_node() {
        let (_, original, marks) =
            find("<body><p><r><t>{#loop}{/loop}</t></r></p></body>", "{", "}");
        assert_eq!(
            describe(&marks, &original),
            vec![(true, 0, 0), (false, 6, 0), (true, 7, 0), (false, 13, 0)]
        );
    }

    #[test]
    fn test_two_character_delimiters() {
        let (_, original, marks) =
            find("<body><p><r><t>{{#loop}}{{/loop}}</t></r></p></body>", "{{", "}}");
        assert_eq!(
            describe(&marks, &original),
            vec![(true, 0, 0), (false, 7, 0), (true, 9, 0), (false, 16, 0)]
        );
    }

    #[test]
    fn test_repeated_prefix_is_retried() {
        // Given a start delimiter whose first character also precedes it
        let (_, original, marks) = find(
            "<body><p><r><t>{{!#loop!}}{{!/loop!}}</t></r></p></body>",
            "{!",
            "!}",
        );

        // Then the match starts on the second brace
        assert_eq!(
            describe(&marks, &original),
            vec![(true, 1, 0), (false, 8, 0), (true, 12, 0), (false, 19, 0)]
        );
    }

    #[test]
    fn test_tag_split_across_runs() {
        let (_, original, marks) = find(
            "<body><p><r><t>{#lo</t></r><r><t>op}</t></r></p></body>",
            "{",
            "}",
        );
        assert_eq!(describe(&marks, &original), vec![(true, 0, 0), (false, 2, 1)]);
    }

    #[test]
    fn test_delimiters_in_their_own_runs() {
        let (_, original, marks) = find(
            "<body><p><r><t>{</t></r><r><t>tag</t></r><r><t>}</t></r></p></body>",
            "{",
            "}",
        );
        assert_eq!(describe(&marks, &original), vec![(true, 0, 0), (false, 0, 2)]);
    }

    #[test]
    fn test_multi_node_delimiters_are_joined() {
        // Given three-character delimiters spread over four runs
        let (doc, original, marks) = find(
            "<body><p><r><t>{</t></r><r><t>{{tag}</t></r><r><t>}</t></r><r><t>}</t></r></p></body>",
            "{{{",
            "}}}",
        );

        // Then both marks point into the first leaf, which now holds everything
        assert_eq!(describe(&marks, &original), vec![(true, 0, 0), (false, 6, 0)]);
        assert_eq!(doc.text(original[0]), "{{{tag}}}");
        assert_snapshot!(to_markup(&doc, doc.root()).unwrap(), @"<body><p><r><t>{{{tag}}}</t></r></p></body>");
    }

    #[test]
    fn test_rewind_crosses_node_boundary() {
        // "{" ends the first leaf, "{!" starts the second
        let (_, original, marks) = find(
            "<body><p><r><t>a{</t></r><r><t>{!x!}</t></r></p></body>",
            "{!",
            "!}",
        );
        assert_eq!(describe(&marks, &original), vec![(true, 0, 1), (false, 3, 1)]);
    }

    #[test]
    fn test_partial_match_does_not_cross_paragraphs() {
        let (_, _, marks) = find(
            "<body><p><r><t>{</t></r></p><p><r><t>!x</t></r></p></body>",
            "{!",
            "!}",
        );
        assert!(marks.is_empty());
    }

    #[test]
    fn test_skips_non_text_and_empty_nodes() {
        let (_, original, marks) = find(
            "<body><p><r><t></t><br/><t>{a}</t></r><bookmarkStart/></p></body>",
            "{",
            "}",
        );
        assert_eq!(describe(&marks, &original), vec![(true, 0, 1), (false, 2, 1)]);
    }

    #[test]
    fn test_search_stays_inside_root() {
        let mut doc =
            parse("<body><p><r><t>{a}</t></r></p><p><r><t>{b}</t></r></p></body>").unwrap();
        let second = doc.children(doc.root())[1];
        let marks = searcher("{", "}").find_delimiters(&mut doc, second).unwrap();

        assert_eq!(marks.len(), 2);
        assert_eq!(doc.text(marks[0].text_node), "{b}");
    }

    #[test]
    fn test_depth_limit_is_enforced() {
        let mut doc = parse("<body><p><r><t>{a}</t></r></p></body>").unwrap();
        let root = doc.root();
        let shallow = DelimiterSearcher {
            max_depth: 2,
            ..searcher("{", "}")
        };

        let result = shallow.find_delimiters(&mut doc, root);

        assert!(matches!(
            result,
            Err(TemplateError::MaxDepthExceeded { max_depth: 2 })
        ));
    }

    #[test]
    fn test_depth_limit_allows_exact_depth() {
        let mut doc = parse("<body><p><r><t>{a}</t></r></p></body>").unwrap();
        let root = doc.root();
        let exact = DelimiterSearcher {
            max_depth: 3,
            ..searcher("{", "}")
        };
        assert_eq!(exact.find_delimiters(&mut doc, root).unwrap().len(), 2);
    }

    #[test]
    fn test_joined_delimiter_keeps_depth_of_first_leaf() {
        // Given a start delimiter that begins inside a hyperlink and ends in
        // a plain run, followed by a paragraph whose text sits five levels down
        let mut doc = parse(
            "<body><p><hyperlink><r><t>a{</t></r></hyperlink><r><t>{b}}</t></r></p>\
             <p><sdt><sdtContent><r><t>x</t></r></sdtContent></sdt></p></body>",
        )
        .unwrap();
        let root = doc.root();
        let limited = DelimiterSearcher {
            max_depth: 4,
            ..searcher("{{", "}}")
        };

        // Then the second paragraph is measured from the joined leaf's real depth
        let result = limited.find_delimiters(&mut doc, root);
        assert!(matches!(
            result,
            Err(TemplateError::MaxDepthExceeded { max_depth: 4 })
        ));
    }

    #[rstest]
    #[case("", "}")]
    #[case("{", "")]
    #[case(" {", "}")]
    fn test_invalid_delimiters_are_rejected(#[case] start: &str, #[case] end: &str) {
        let delimiters = Delimiters {
            tag_start: start.to_string(),
            tag_end: end.to_string(),
            ..Delimiters::default()
        };
        assert!(matches!(
            DelimiterSearcher::new(&delimiters, 20),
            Err(TemplateError::Config(_))
        ));
    }

    #[test]
    fn test_multibyte_text_uses_byte_offsets() {
        let (_, original, marks) =
            find("<body><p><r><t>é{x}</t></r></p></body>", "{", "}");
        assert_eq!(describe(&marks, &original), vec![(true, 2, 0), (false, 4, 0)]);
    }
}
