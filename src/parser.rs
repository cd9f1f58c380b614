use std::rc::Rc;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Node as DomNode, NodeData, RcDom};

use crate::error::{Error, Result};
use crate::tree::{ContentTree, Element, Node};

/// Parse article HTML into a content tree.
///
/// The HTML is parsed as a document; only the children of `<body>` are kept,
/// so the implied `html`/`head`/`body` wrappers never reach the output.
pub fn parse(html: &str) -> Result<ContentTree> {
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(Error::Html)?;

    let nodes = match find_body(&dom.document) {
        Some(body) => convert_children(&body),
        None => convert_children(&dom.document),
    };
    Ok(ContentTree::new(nodes))
}

fn find_body(node: &Rc<DomNode>) -> Option<Rc<DomNode>> {
    if let NodeData::Element { ref name, .. } = node.data {
        if name.local.as_ref() == "body" {
            return Some(Rc::clone(node));
        }
    }
    node.children.borrow().iter().find_map(find_body)
}

fn convert_children(node: &Rc<DomNode>) -> Vec<Node> {
    let mut out = Vec::new();
    for child in node.children.borrow().iter() {
        convert_node(child, &mut out);
    }
    out
}

fn convert_node(node: &Rc<DomNode>, out: &mut Vec<Node>) {
    match node.data {
        NodeData::Text { ref contents } => {
            let text = contents.borrow().to_string();
            // html5ever already merges adjacent text, but conversions may not
            if let Some(Node::Text(prev)) = out.last_mut() {
                prev.push_str(&text);
            } else {
                out.push(Node::Text(text));
            }
        }
        NodeData::Element {
            ref name,
            ref attrs,
            ..
        } => {
            let attrs = attrs
                .borrow()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect();
            out.push(Node::Element(Element {
                name: name.local.to_string(),
                attrs,
                children: convert_children(node),
            }));
        }
        NodeData::Document => {
            for child in node.children.borrow().iter() {
                convert_node(child, out);
            }
        }
        // Comments, doctypes and processing instructions are dropped
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keeps_body_content_only() {
        let tree = parse("<p>Hello <em>world</em></p>").unwrap();
        assert_eq!(tree.nodes.len(), 1);
        let Node::Element(p) = &tree.nodes[0] else {
            panic!("expected <p>");
        };
        assert_eq!(p.name, "p");
        assert_eq!(p.text(), "Hello world");
    }

    #[test]
    fn bare_text_and_attributes() {
        let tree = parse("see <a href=\"https://example.com\">here</a>").unwrap();
        assert_eq!(tree.text(), "see here");
        let Node::Element(a) = &tree.nodes[1] else {
            panic!("expected <a>");
        };
        assert_eq!(
            a.attrs,
            vec![("href".to_string(), "https://example.com".to_string())]
        );
    }

    #[test]
    fn custom_tags_survive() {
        let tree = parse("<pre><code><mathnews--code-em>x</mathnews--code-em></code></pre>").unwrap();
        let Node::Element(pre) = &tree.nodes[0] else {
            panic!("expected <pre>");
        };
        let Node::Element(code) = &pre.children[0] else {
            panic!("expected <code>");
        };
        let Node::Element(run) = &code.children[0] else {
            panic!("expected run");
        };
        assert_eq!(run.name, "mathnews--code-em");
    }

    #[test]
    fn comments_are_dropped() {
        let tree = parse("a<!-- more -->b").unwrap();
        assert_eq!(tree.nodes, vec![Node::text("ab")]);
    }
}
