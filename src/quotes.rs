use crate::tree::{ContentTree, Verbatim};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteDirection {
    Left,
    Right,
    Straight,
}

/// Quotes open after these
const LEFT_PUNCTUATION: &[char] = &['(', '{', '<'];
/// ...and close before any of these
const RIGHT_PUNCTUATION: &[char] = &[')', '}', '>', '.', ',', '?', '!', ':', ';'];

/// Decide which way a quote faces from the characters around it. `None`
/// means the quote is at the start or end of the text run.
pub fn classify(before: Option<char>, after: Option<char>) -> QuoteDirection {
    let Some(before) = before else {
        return QuoteDirection::Left;
    };
    let Some(after) = after else {
        return QuoteDirection::Right;
    };

    if before.is_whitespace() {
        return QuoteDirection::Left;
    }
    if after.is_whitespace() {
        return QuoteDirection::Right;
    }

    if LEFT_PUNCTUATION.contains(&before) {
        return QuoteDirection::Left;
    }
    if RIGHT_PUNCTUATION.contains(&after) {
        return QuoteDirection::Right;
    }

    // Apostrophes in contractions
    if before.is_ascii_alphabetic() && after.is_ascii_alphabetic() {
        return QuoteDirection::Right;
    }

    QuoteDirection::Straight
}

pub fn double_quote(direction: QuoteDirection) -> char {
    match direction {
        QuoteDirection::Left => '\u{201c}',
        QuoteDirection::Right => '\u{201d}',
        QuoteDirection::Straight => '"',
    }
}

pub fn single_quote(direction: QuoteDirection) -> char {
    match direction {
        QuoteDirection::Left => '\u{2018}',
        QuoteDirection::Right => '\u{2019}',
        QuoteDirection::Straight => '\'',
    }
}

/// Replace the ASCII quotes of a single text run.
///
/// Each quote is classified from its immediate neighbors only. Opening and
/// closing quotes are never paired, so nested quotes of the same kind are
/// best effort.
pub fn replace_quotes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());

    for (idx, &ch) in chars.iter().enumerate() {
        if ch != '"' && ch != '\'' {
            out.push(ch);
            continue;
        }
        let before = idx.checked_sub(1).map(|i| chars[i]);
        let after = chars.get(idx + 1).copied();
        let direction = classify(before, after);
        out.push(if ch == '"' {
            double_quote(direction)
        } else {
            single_quote(direction)
        });
    }

    out
}

/// Apply smart quotes to every non-verbatim text node of the tree.
///
/// A quote at the edge of a text node is classified against the neighboring
/// text nodes, so `"<em>word</em>"` gets an opening quote even though the
/// first quote ends its own node. Neighbors are only borrowed for context;
/// each node is rewritten from the original snapshot.
pub fn rewrite(tree: &mut ContentTree, verbatim: &Verbatim) {
    let fragments: Vec<(String, bool)> = tree
        .text_fragments(verbatim)
        .into_iter()
        .map(|(text, is_verbatim)| (text.to_string(), is_verbatim))
        .collect();

    let replaced: Vec<Option<String>> = (0..fragments.len())
        .map(|idx| rewrite_fragment(&fragments, idx))
        .collect();

    let mut idx = 0;
    tree.for_each_text_mut(verbatim, |text, _| {
        if let Some(Some(new_text)) = replaced.get(idx) {
            *text = new_text.clone();
        }
        idx += 1;
    });
}

fn rewrite_fragment(fragments: &[(String, bool)], idx: usize) -> Option<String> {
    let (text, is_verbatim) = &fragments[idx];
    if *is_verbatim || !(text.contains('"') || text.contains('\'')) {
        return None;
    }

    let before = fragments[..idx]
        .iter()
        .rev()
        .find(|(t, _)| !t.is_empty())
        .filter(|(_, v)| !v)
        .and_then(|(t, _)| t.chars().last());
    let after = fragments[idx + 1..]
        .iter()
        .find(|(t, _)| !t.is_empty())
        .filter(|(_, v)| !v)
        .and_then(|(t, _)| t.chars().next());

    let mut glued = String::with_capacity(text.len() + 8);
    glued.extend(before);
    glued.push_str(text);
    glued.extend(after);

    let mut chars: Vec<char> = replace_quotes(&glued).chars().collect();
    if after.is_some() {
        chars.pop();
    }
    if before.is_some() {
        chars.remove(0);
    }
    Some(chars.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::tree_to_markup;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(None, Some('a'), QuoteDirection::Left)]
    #[case(Some('a'), None, QuoteDirection::Right)]
    #[case(None, None, QuoteDirection::Left)]
    #[case(Some(' '), Some('.'), QuoteDirection::Left)]
    #[case(Some('a'), Some(' '), QuoteDirection::Right)]
    #[case(Some('('), Some('a'), QuoteDirection::Left)]
    #[case(Some('a'), Some(';'), QuoteDirection::Right)]
    #[case(Some('('), Some(')'), QuoteDirection::Left)]
    #[case(Some('n'), Some('t'), QuoteDirection::Right)]
    #[case(Some('1'), Some('2'), QuoteDirection::Straight)]
    #[case(Some('a'), Some('2'), QuoteDirection::Straight)]
    fn classify_rules(
        #[case] before: Option<char>,
        #[case] after: Option<char>,
        #[case] expected: QuoteDirection,
    ) {
        assert_eq!(classify(before, after), expected);
    }

    #[rstest]
    #[case("He said, \"no\".", "He said, “no”.")]
    #[case("\"Weird, right?\", he said.", "“Weird, right?”, he said.")]
    #[case("Said he, \"Weird, right?\"", "Said he, “Weird, right?”")]
    #[case("\"a\", \"a\", \"a\"", "“a”, “a”, “a”")]
    #[case("\"He said, \"pog\"?\"", "“He said, “pog”?”")]
    #[case("He said, \"why\"?", "He said, “why”?")]
    #[case("He said, \"why\"!", "He said, “why”!")]
    #[case("didn't", "didn’t")]
    #[case("'tis the 'season'", "‘tis the ‘season’")]
    #[case("Whoms'tve's.", "Whoms’tve’s.")]
    #[case("3\"4", "3\"4")]
    fn replace_quotes_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(replace_quotes(input), expected);
    }

    fn rewrite_html(html: &str) -> String {
        let mut tree = parse(html).unwrap();
        rewrite(&mut tree, &Verbatim::new(&["pre".to_string(), "code".to_string()]));
        tree_to_markup(&tree)
    }

    #[test]
    fn quotes_across_element_boundaries() {
        assert_eq!(
            rewrite_html("prefers \"<em>great literature</em>.\""),
            "prefers “<em>great literature</em>.”"
        );
    }

    #[test]
    fn node_count_is_unchanged() {
        let html = "a \"<strong>b</strong>\" c";
        let before = parse(html).unwrap();
        let mut after = before.clone();
        rewrite(&mut after, &Verbatim::none());
        assert_eq!(before.nodes.len(), after.nodes.len());
        assert_eq!(tree_to_markup(&after), "a “<strong>b</strong>” c");
    }

    #[test]
    fn verbatim_text_is_untouched() {
        assert_eq!(
            rewrite_html("<p>say \"hi\"</p><pre>print(\"hi\")</pre>"),
            "<p>say “hi”</p><pre>print(\"hi\")</pre>"
        );
    }

    #[test]
    fn verbatim_neighbors_are_not_glued() {
        // The quote after the code span has no usable left neighbor
        assert_eq!(
            rewrite_html("<p><code>x</code>\"y\"</p>"),
            "<p><code>x</code>“y”</p>"
        );
    }

    #[test]
    fn empty_neighbors_are_skipped() {
        let mut tree = ContentTree::new(vec![
            crate::tree::Node::text("a"),
            crate::tree::Node::text(""),
            crate::tree::Node::text("\" b"),
        ]);
        rewrite(&mut tree, &Verbatim::none());
        assert_eq!(tree.text(), "a” b");
    }
}
