use std::collections::HashMap;

use crate::config::Config;
use crate::tree::{Element, Node};

/// Unicode LINE SEPARATOR. The layout tool treats it as a forced line break
/// inside one paragraph.
pub const LINE_SEPARATOR: char = '\u{2028}';

/// How much each character is worth as a break point. Lower breaks first.
#[derive(Debug, Clone)]
pub struct BreakWeights {
    weights: HashMap<char, usize>,
}

impl BreakWeights {
    pub fn from_config(config: &Config) -> Self {
        let code = &config.code;
        let mut weights = HashMap::new();
        for (key, &weight) in &code.weights {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => {
                    weights.insert(ch, weight);
                }
                _ => log::warn!("Ignoring break weight for {:?}: not a single character", key),
            }
        }
        for ch in code.word_breaks.chars() {
            weights.insert(ch, code.max_line_width);
        }
        Self { weights }
    }

    pub fn get(&self, ch: char) -> Option<usize> {
        self.weights.get(&ch).copied()
    }
}

/// Chooses where to break over-long lines.
#[derive(Debug, Clone)]
pub struct LineBreakPlanner {
    max_width: usize,
    weights: BreakWeights,
}

impl LineBreakPlanner {
    pub fn new(max_width: usize, weights: BreakWeights) -> Self {
        Self {
            // Room for at least the continuation glyph and one character
            max_width: max_width.max(2),
            weights,
        }
    }

    /// Offsets (in characters from the start of `line`) at which to break.
    /// The first segment holds at most `max_width` characters, later ones one
    /// less to leave room for the continuation glyph.
    pub fn plan(&self, line: &str) -> Vec<usize> {
        let chars: Vec<char> = line.chars().collect();
        let mut breaks = Vec::new();
        let mut start = 0;
        let mut reserved = 0;

        while chars.len() - start > self.max_width - reserved {
            start += self.find_best_break(&chars[start..], self.max_width - reserved);
            breaks.push(start);
            reserved = 1;
        }

        breaks
    }

    /// Search backward from `estimate` for the cheapest break. Finding a
    /// cheaper candidate raises the search floor by that candidate's weight,
    /// so an expensive break can't win from far away.
    fn find_best_break(&self, line: &[char], estimate: usize) -> usize {
        let mut break_at = estimate;
        let mut best = usize::MAX;
        let mut floor = self.max_width / 2;
        let mut pos = estimate;

        while pos > floor {
            if let Some(weight) = self.weights.get(line[pos - 1]) {
                if weight < best {
                    best = weight;
                    break_at = pos;
                    floor = floor.max(pos.saturating_sub(weight));
                }
            }
            pos -= 1;
        }

        break_at
    }
}

/// Applies planned breaks to a block, inserting continuation and visible
/// space markers. Breaks are planned on the flattened text of the block and
/// mapped back onto its text nodes, so inline markup (highlight runs, line
/// numbers) is split at the right character without being disturbed.
#[derive(Debug, Clone)]
pub struct LineWrapper {
    planner: LineBreakPlanner,
    marker_tag: String,
    continuation_glyph: String,
    space_glyph: String,
}

impl LineWrapper {
    pub fn new(planner: LineBreakPlanner, config: &Config) -> Self {
        Self {
            planner,
            marker_tag: config.tags.marker.clone(),
            continuation_glyph: config.code.continuation_glyph.clone(),
            space_glyph: config.code.space_glyph.clone(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let planner = LineBreakPlanner::new(
            config.code.max_line_width,
            BreakWeights::from_config(config),
        );
        Self::new(planner, config)
    }

    /// Absolute break offsets into the flattened text, ascending.
    pub fn changeset(&self, text: &str) -> Vec<usize> {
        let mut changeset = Vec::new();
        let mut line_start = 0;
        for line in text.split('\n') {
            changeset.extend(self.planner.plan(line).into_iter().map(|b| line_start + b));
            // newline included
            line_start += line.chars().count() + 1;
        }
        changeset
    }

    /// Wrap every over-long line of `block`.
    pub fn apply(&self, block: Element) -> Element {
        let fragments: Vec<Vec<char>> = block
            .text_fragments()
            .into_iter()
            .map(|text| text.chars().collect())
            .collect();
        let flattened: String = fragments.iter().flatten().collect();
        if flattened.is_empty() {
            return block;
        }

        let changeset = self.changeset(&flattened);
        if changeset.is_empty() {
            return block;
        }
        log::debug!("Wrapping <{}> at {} points", block.name, changeset.len());

        let mut replacements = self.split_fragments(&fragments, &changeset).into_iter();
        block.map_fragments(|_, _| replacements.next().unwrap_or_default())
    }

    /// Work out the replacement nodes for every fragment. Fragments and
    /// breaks are walked from the end so that offsets computed on the
    /// original text stay valid.
    fn split_fragments(&self, fragments: &[Vec<char>], changeset: &[usize]) -> Vec<Vec<Node>> {
        let mut starts = Vec::with_capacity(fragments.len());
        let mut running = 0;
        for fragment in fragments {
            starts.push(running);
            running += fragment.len();
        }

        let mut out = vec![Vec::new(); fragments.len()];
        let mut next = changeset.len();
        // A trailing space owed by an earlier fragment
        let mut carry_space = false;

        for idx in (0..fragments.len()).rev() {
            let fragment = &fragments[idx];
            let start = starts[idx];
            let mut pieces = Vec::new();
            let mut line_end = fragment.len();

            if carry_space && !fragment.is_empty() {
                line_end -= 1;
                carry_space = false;
            }

            while next > 0 && changeset[next - 1] >= start {
                let offset = changeset[next - 1] - start;
                push_text(&mut pieces, &fragment[offset..line_end.max(offset)]);
                pieces.push(self.marker(&self.continuation_glyph));
                pieces.push(Node::Text(LINE_SEPARATOR.to_string()));

                let space = if offset > 0 {
                    fragment[offset - 1] == ' '
                } else {
                    // The break sits on a fragment boundary
                    fragments[..idx]
                        .iter()
                        .rev()
                        .find(|f| !f.is_empty())
                        .is_some_and(|f| f.last() == Some(&' '))
                };
                if space {
                    pieces.push(self.marker(&self.space_glyph));
                }

                if offset > 0 {
                    line_end = offset - usize::from(space);
                } else {
                    line_end = 0;
                    carry_space = space;
                }
                next -= 1;
            }

            push_text(&mut pieces, &fragment[..line_end]);
            pieces.reverse();
            out[idx] = pieces;
        }

        out
    }

    fn marker(&self, glyph: &str) -> Node {
        Element::with_text(self.marker_tag.as_str(), glyph).into()
    }
}

fn push_text(pieces: &mut Vec<Node>, chars: &[char]) {
    if !chars.is_empty() {
        pieces.push(Node::Text(chars.iter().collect()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::nodes_to_markup;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn wrapper(max_width: usize) -> LineWrapper {
        let mut config = Config::default();
        config.code.max_line_width = max_width;
        config.tags.marker = "m".to_string();
        LineWrapper::from_config(&config)
    }

    fn planner(max_width: usize) -> LineBreakPlanner {
        let mut config = Config::default();
        config.code.max_line_width = max_width;
        LineBreakPlanner::new(max_width, BreakWeights::from_config(&config))
    }

    fn block(html: &str) -> Element {
        let tree = parse(&format!("<pre>{html}</pre>")).unwrap();
        match tree.nodes.into_iter().next() {
            Some(Node::Element(pre)) => pre,
            other => panic!("expected <pre>, got {other:?}"),
        }
    }

    fn render(element: &Element) -> String {
        let mut out = String::new();
        nodes_to_markup(&element.children, &mut out);
        out
    }

    /// Rendered lines, counting each marker as one column.
    fn display_lines(element: &Element) -> Vec<String> {
        let mut text = String::new();
        for node in &element.children {
            display(node, &mut text);
        }
        text.split(['\n', LINE_SEPARATOR]).map(str::to_string).collect()
    }

    fn display(node: &Node, out: &mut String) {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) if e.name == "m" => out.push('#'),
            Node::Element(e) => e.children.iter().for_each(|c| display(c, out)),
        }
    }

    /// Text with markers stripped and split lines rejoined.
    fn restored(element: &Element) -> String {
        fn walk(node: &Node, out: &mut String) {
            match node {
                Node::Text(t) => out.extend(t.chars().filter(|&c| c != LINE_SEPARATOR)),
                Node::Element(e) if e.name == "m" => {
                    if e.text() == "\u{2423}" {
                        out.push(' ');
                    }
                }
                Node::Element(e) => e.children.iter().for_each(|c| walk(c, out)),
            }
        }
        let mut out = String::new();
        element.children.iter().for_each(|c| walk(c, &mut out));
        out
    }

    #[test]
    fn short_lines_need_no_breaks() {
        assert_eq!(planner(10).plan("0123456789"), Vec::<usize>::new());
        assert_eq!(planner(10).plan(""), Vec::<usize>::new());
    }

    #[test]
    fn prefers_spaces() {
        let line = "let a = foo(bar, baz)";
        assert_eq!(planner(10).plan(line), vec![8, 17]);
    }

    #[test]
    fn falls_back_to_mid_token_split() {
        assert_eq!(planner(10).plan("abcdefghijklmnopqrstuvwxyz"), vec![10, 19]);
    }

    #[test]
    fn cheaper_candidate_raises_floor() {
        // The `+` is found first and lifts the floor to 15, so the space at 12
        // is never considered even though it weighs less
        let line = "aaaaaaaaaaaa bbbb+ccccccccc";
        assert_eq!(planner(20).plan(line), vec![18]);
    }

    #[rstest]
    #[case("x = 1")]
    #[case("if (first_condition && second_condition || third_condition) { return value; }")]
    #[case("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")]
    #[case("short\nprint(\"a rather long string literal that will not fit on one line\")\nend")]
    fn width_bound_and_content_preserved(#[case] code: &str) {
        let wrapper = wrapper(20);
        let before = block(&html_escape::encode_text(code));
        let flattened = before.text();
        let after = wrapper.apply(before);
        for line in display_lines(&after) {
            assert!(line.chars().count() <= 20, "line too long: {line:?}");
        }
        assert_eq!(restored(&after), flattened);
    }

    #[test]
    fn inserts_markers_at_break() {
        let wrapped = wrapper(10).apply(block("one two three"));
        assert_eq!(
            render(&wrapped),
            "one two<m>\u{2423}</m>\u{2028}<m>\u{21aa}</m>three"
        );
    }

    #[test]
    fn breaks_inside_inline_markup() {
        let wrapped = wrapper(10).apply(block("abc<b>defghijklmno</b>"));
        assert_eq!(
            render(&wrapped),
            "abc<b>defghij\u{2028}<m>\u{21aa}</m>klmno</b>"
        );
    }

    #[test]
    fn space_before_boundary_break_moves_back() {
        // The break lands where <b> starts; the space that ends the line lives
        // in the preceding text node
        let wrapped = wrapper(10).apply(block("abcdefghi <b>jklmnop</b>"));
        assert_eq!(
            render(&wrapped),
            "abcdefghi<b><m>\u{2423}</m>\u{2028}<m>\u{21aa}</m>jklmnop</b>"
        );
    }

    #[test]
    fn single_space_fragment_does_not_eat_neighbor() {
        let wrapped = wrapper(10).apply(block("abcdefghi<i> </i><b>jklmnop</b>"));
        assert_eq!(restored(&wrapped), "abcdefghi jklmnop");
    }

    #[test]
    fn empty_block_is_unchanged() {
        let empty = Element::new("pre");
        assert_eq!(wrapper(10).apply(empty.clone()), empty);
    }
}
