use crate::tree::{ContentTree, Element, Node};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Serialize a content tree back to markup.
pub fn tree_to_markup(tree: &ContentTree) -> String {
    let mut out = String::new();
    nodes_to_markup(&tree.nodes, &mut out);
    out
}

/// Serialize the children of an element, without the element's own tags.
pub fn inner_markup(element: &Element) -> String {
    let mut out = String::new();
    nodes_to_markup(&element.children, &mut out);
    out
}

pub fn nodes_to_markup(nodes: &[Node], out: &mut String) {
    for node in nodes {
        node_to_markup(node, out);
    }
}

fn node_to_markup(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => {
            html_escape::encode_text_to_string(text, out);
        }
        Node::Element(element) => element_to_markup(element, out),
    }
}

fn element_to_markup(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (name, value) in &element.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        html_escape::encode_double_quoted_attribute_to_string(value, out);
        out.push('"');
    }

    if element.children.is_empty() && VOID_ELEMENTS.contains(&element.name.as_str()) {
        out.push_str("/>");
        return;
    }

    out.push('>');
    nodes_to_markup(&element.children, out);
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn roundtrip(html: &str) -> String {
        tree_to_markup(&parse(html).unwrap())
    }

    #[test]
    fn nested_inline() {
        assert_eq!(
            roundtrip("<p>a <em>b <strong>c</strong></em></p>"),
            "<p>a <em>b <strong>c</strong></em></p>"
        );
    }

    #[test]
    fn escapes_text_and_attributes() {
        assert_eq!(roundtrip("<p>a &lt; b &amp; c</p>"), "<p>a &lt; b &amp; c</p>");
        assert_eq!(
            roundtrip("<a title=\"say &quot;hi&quot;\">x</a>"),
            "<a title=\"say &quot;hi&quot;\">x</a>"
        );
    }

    #[test]
    fn void_elements_self_close() {
        assert_eq!(roundtrip("a<br>b"), "a<br/>b");
        assert_eq!(
            roundtrip("<img src=\"x.png\">"),
            "<img src=\"x.png\"/>"
        );
    }

    #[test]
    fn inner_markup_skips_own_tags() {
        let element = Element::with_text("pre", "x < y");
        assert_eq!(inner_markup(&element), "x &lt; y");
    }
}
