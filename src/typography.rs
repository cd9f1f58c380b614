use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::tree::{ContentTree, Element, Node, TextContext, Verbatim};
use crate::wrap::LINE_SEPARATOR;

static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)`(.+?)`").unwrap());
static NUMERIC_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d) ?--? ?(\d)").unwrap());
static EXTRA_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([.,;?!‽]) +").unwrap());
static FOOTNOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(\d*)\]").unwrap());

/// Dash spellings that become an em dash, applied in order.
const EM_DASHES: &[&str] = &[" - ", " --- ", "---", " -- ", "--", " \u{2014} "];

/// `\r\n` to `\n`, verbatim text included.
pub fn normalize_newlines(tree: &mut ContentTree) {
    tree.for_each_text_mut(&Verbatim::none(), |text, _| {
        if text.contains("\r\n") {
            *text = text.replace("\r\n", "\n");
        }
    });
}

/// Backtick spans become `code` elements.
pub fn replace_inline_code(tree: &mut ContentTree, verbatim: &Verbatim) {
    tree.flat_map_text(verbatim, |text, is_verbatim| {
        if is_verbatim {
            return vec![Node::Text(text)];
        }
        split_matches(text, &INLINE_CODE, |caps| {
            Element::with_text("code", &caps[1]).into()
        })
    });
}

/// Single newlines become line separators so a paragraph stays one
/// paragraph. Runs of newlines are paragraph breaks and stay. Inside
/// verbatim content every newline becomes a line separator.
pub fn replace_newlines(tree: &mut ContentTree, verbatim: &Verbatim) {
    tree.for_each_text_in_context_mut(verbatim, |text, context| {
        if !text.contains('\n') {
            return;
        }
        *text = if context.verbatim {
            text.replace('\n', &LINE_SEPARATOR.to_string())
        } else {
            join_lines(text, context)
        };
    });
}

fn join_lines(text: &str, context: TextContext) -> String {
    let mut parts = split_single_newlines(text);
    let mut prefix = "";
    let mut suffix = "";

    // A newline right after or before an element separates blocks
    if parts.len() > 1 && parts[0].is_empty() && context.element_before {
        parts.remove(0);
        prefix = "\n";
    }
    if parts.len() > 1 && parts.last() == Some(&"") && context.element_after {
        parts.pop();
        suffix = "\n";
    }

    format!("{}{}{}", prefix, parts.join(&LINE_SEPARATOR.to_string()), suffix)
}

/// Split on newlines that have no newline on either side.
fn split_single_newlines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;

    for (idx, &byte) in bytes.iter().enumerate() {
        let single = byte == b'\n'
            && (idx == 0 || bytes[idx - 1] != b'\n')
            && bytes.get(idx + 1) != Some(&b'\n');
        if single {
            parts.push(&text[start..idx]);
            start = idx + 1;
        }
    }
    parts.push(&text[start..]);
    parts
}

pub fn replace_ellipses(tree: &mut ContentTree, verbatim: &Verbatim) {
    rewrite_prose(tree, verbatim, |text| text.replace("...", "\u{2026}"));
}

pub fn replace_dashes(tree: &mut ContentTree, verbatim: &Verbatim) {
    rewrite_prose(tree, verbatim, dashes);
}

/// Hyphens between digits become en dashes; spaced or doubled hyphens become
/// an em dash with one space either side.
pub fn dashes(text: &str) -> String {
    let mut text = text.to_string();
    // Matches can share a digit ("1-2-3"), so repeat until none are left
    while NUMERIC_RANGE.is_match(&text) {
        text = NUMERIC_RANGE
            .replace_all(&text, "${1}\u{2013}${2}")
            .into_owned();
    }
    for dash in EM_DASHES {
        text = text.replace(dash, "\u{2014}");
    }
    text.replace('\u{2014}', " \u{2014} ")
}

/// Runs of spaces after sentence punctuation collapse to one.
pub fn remove_extraneous_spaces(tree: &mut ContentTree, verbatim: &Verbatim) {
    rewrite_prose(tree, verbatim, |text| {
        EXTRA_SPACES.replace_all(text, "${1} ").into_owned()
    });
}

/// `[n]` and `[]` markers become footnote reference elements.
///
/// Numbering starts at 1 for each tree. An empty marker takes the next
/// number; an explicit number is used as written and only advances the count
/// when it is the number that would have come next.
pub fn add_footnotes(tree: &mut ContentTree, verbatim: &Verbatim, tag: &str) {
    let mut next = 1usize;
    tree.flat_map_text(verbatim, |text, is_verbatim| {
        if is_verbatim {
            return vec![Node::Text(text)];
        }
        split_matches(text, &FOOTNOTE, |caps| {
            let digits = &caps[1];
            let number = if digits.is_empty() {
                next
            } else {
                match digits.parse::<usize>() {
                    Ok(number) => number,
                    Err(_) => return Node::text(&caps[0]),
                }
            };
            if digits.is_empty() || number == next {
                next += 1;
            }
            Element::with_text(tag, number.to_string()).into()
        })
    });
}

fn rewrite_prose<F>(tree: &mut ContentTree, verbatim: &Verbatim, f: F)
where
    F: Fn(&str) -> String,
{
    tree.for_each_text_mut(verbatim, |text, is_verbatim| {
        if !is_verbatim {
            *text = f(text);
        }
    });
}

/// Replace every match of `pattern` with the node built by `f`, keeping the
/// text in between.
fn split_matches<F>(text: String, pattern: &Regex, mut f: F) -> Vec<Node>
where
    F: FnMut(&Captures) -> Node,
{
    let mut nodes = Vec::new();
    let mut last = 0;

    for caps in pattern.captures_iter(&text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            nodes.push(Node::text(&text[last..whole.start()]));
        }
        nodes.push(f(&caps));
        last = whole.end();
    }

    if last == 0 && nodes.is_empty() {
        return vec![Node::Text(text)];
    }
    if last < text.len() {
        nodes.push(Node::text(&text[last..]));
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::tree_to_markup;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn verbatim() -> Verbatim {
        Verbatim::new(&["pre".to_string(), "code".to_string()])
    }

    fn run(html: &str, pass: impl FnOnce(&mut ContentTree, &Verbatim)) -> String {
        let mut tree = parse(html).unwrap();
        pass(&mut tree, &verbatim());
        tree_to_markup(&tree)
    }

    #[test]
    fn crlf_is_normalized_everywhere() {
        let mut tree = ContentTree::new(vec![
            Node::text("a\r\nb"),
            Element::with_text("pre", "c\r\nd").into(),
        ]);
        normalize_newlines(&mut tree);
        assert_eq!(tree.text(), "a\nbc\nd");
    }

    #[test]
    fn inline_code() {
        assert_eq!(
            run("<p>call `f(x)` or `g`</p>", replace_inline_code),
            "<p>call <code>f(x)</code> or <code>g</code></p>"
        );
        assert_eq!(run("<pre>`x`</pre>", replace_inline_code), "<pre>`x`</pre>");
        assert_eq!(run("<p>a ` b</p>", replace_inline_code), "<p>a ` b</p>");
    }

    #[rstest]
    #[case("a\nb", vec!["a", "b"])]
    #[case("a\n\nb", vec!["a\n\nb"])]
    #[case("\na\n", vec!["", "a", ""])]
    #[case("a", vec!["a"])]
    fn single_newlines(#[case] text: &str, #[case] expected: Vec<&str>) {
        assert_eq!(split_single_newlines(text), expected);
    }

    #[test]
    fn newlines_inside_paragraphs() {
        assert_eq!(
            run("<p>one\ntwo\n\nthree</p>", replace_newlines),
            "<p>one\u{2028}two\n\nthree</p>"
        );
    }

    #[test]
    fn newlines_next_to_elements_stay() {
        assert_eq!(
            run("<p>a</p>\n<p>b</p>", replace_newlines),
            "<p>a</p>\n<p>b</p>"
        );
        assert_eq!(
            run("<p><em>a</em>\nb\nc</p>", replace_newlines),
            "<p><em>a</em>\nb\u{2028}c</p>"
        );
    }

    #[test]
    fn newlines_in_code_become_separators() {
        assert_eq!(
            run("<pre>a\nb\n\nc</pre>", replace_newlines),
            "<pre>a\u{2028}b\u{2028}\u{2028}c</pre>"
        );
    }

    #[test]
    fn ellipses() {
        assert_eq!(
            run("<p>wait...</p><pre>a...</pre>", replace_ellipses),
            "<p>wait\u{2026}</p><pre>a...</pre>"
        );
    }

    #[rstest]
    #[case("pages 1-2", "pages 1\u{2013}2")]
    #[case("1 - 2", "1\u{2013}2")]
    #[case("1--2-3", "1\u{2013}2\u{2013}3")]
    #[case("well - no", "well \u{2014} no")]
    #[case("well--no", "well \u{2014} no")]
    #[case("well --- no", "well \u{2014} no")]
    #[case("well \u{2014} no", "well \u{2014} no")]
    #[case("x-ray", "x-ray")]
    fn dash_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(dashes(input), expected);
    }

    #[test]
    fn dashes_skip_code() {
        assert_eq!(
            run("<p>a -- b</p><code>i--</code>", replace_dashes),
            "<p>a \u{2014} b</p><code>i--</code>"
        );
    }

    #[test]
    fn extraneous_spaces() {
        assert_eq!(
            run("<p>One.   Two,  three!  x  y</p>", remove_extraneous_spaces),
            "<p>One. Two, three! x  y</p>"
        );
    }

    #[test]
    fn footnotes_are_numbered() {
        assert_eq!(
            run("<p>a[] b[] c[5] d[3] e[]</p>", |tree, v| add_footnotes(tree, v, "sup")),
            "<p>a<sup>1</sup> b<sup>2</sup> c<sup>5</sup> d<sup>3</sup> e<sup>4</sup></p>"
        );
    }

    #[test]
    fn footnote_numbering_spans_paragraphs() {
        assert_eq!(
            run(
                "<p>a[1]</p><pre>x[]</pre><p>b[]</p>",
                |tree, v| add_footnotes(tree, v, "sup")
            ),
            "<p>a<sup>1</sup></p><pre>x[]</pre><p>b<sup>2</sup></p>"
        );
    }
}
