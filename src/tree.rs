/// A node of article content: an element or a run of text.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// An element with its attributes in source order
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// An element holding a single text node.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.children.push(Node::text(text));
        element
    }

    /// Concatenated text of every descendant text node.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Text nodes of this element in document order.
    pub fn text_fragments(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_fragments(&self.children, &mut out);
        out
    }

    /// Rebuild the element, replacing the `n`th text node (in document
    /// order) with the nodes returned by `f(n, text)`.
    pub fn map_fragments<F>(self, mut f: F) -> Self
    where
        F: FnMut(usize, String) -> Vec<Node>,
    {
        let mut index = 0;
        let mut visit = |text: String, _verbatim: bool| {
            let nodes = f(index, text);
            index += 1;
            nodes
        };
        let children = map_text_nodes(self.children, false, &Verbatim::none(), &mut visit);
        Self { children, ..self }
    }
}

/// Names of elements whose content is reproduced verbatim.
#[derive(Debug, Clone)]
pub struct Verbatim {
    tags: Vec<String>,
}

impl Verbatim {
    pub fn new(tags: &[String]) -> Self {
        Self {
            tags: tags.iter().map(|t| t.to_ascii_lowercase()).collect(),
        }
    }

    pub fn none() -> Self {
        Self { tags: Vec::new() }
    }

    pub fn is_verbatim(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(name))
    }
}

/// Where a text node sits: inside verbatim content or not, and whether an
/// element comes anywhere before or after it among its siblings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextContext {
    pub verbatim: bool,
    pub element_before: bool,
    pub element_after: bool,
}

/// The parsed content of one article.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentTree {
    pub nodes: Vec<Node>,
}

impl ContentTree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.nodes, &mut out);
        out
    }

    /// Every text node in document order, with whether it sits inside a
    /// verbatim element.
    pub fn text_fragments(&self, verbatim: &Verbatim) -> Vec<(&str, bool)> {
        let mut out = Vec::new();
        collect_flagged(&self.nodes, false, verbatim, &mut out);
        out
    }

    /// Rewrite text nodes in place. `f` receives the text and whether it is
    /// verbatim. The node count never changes.
    pub fn for_each_text_mut<F>(&mut self, verbatim: &Verbatim, mut f: F)
    where
        F: FnMut(&mut String, bool),
    {
        walk_text_mut(&mut self.nodes, false, verbatim, &mut f);
    }

    /// Like `for_each_text_mut`, with the sibling context of each node.
    pub fn for_each_text_in_context_mut<F>(&mut self, verbatim: &Verbatim, mut f: F)
    where
        F: FnMut(&mut String, TextContext),
    {
        walk_context_mut(&mut self.nodes, false, verbatim, &mut f);
    }

    /// Replace every text node with the sequence returned by `f`, preserving
    /// document order. `f` is called in document order.
    pub fn flat_map_text<F>(&mut self, verbatim: &Verbatim, mut f: F)
    where
        F: FnMut(String, bool) -> Vec<Node>,
    {
        let nodes = std::mem::take(&mut self.nodes);
        self.nodes = map_text_nodes(nodes, false, verbatim, &mut f);
    }

    /// Visit every element after its children, with whether it or any
    /// ancestor is verbatim. `f` may replace the element outright.
    pub fn for_each_element_mut<F>(&mut self, verbatim: &Verbatim, mut f: F)
    where
        F: FnMut(&mut Element, bool),
    {
        walk_elements_mut(&mut self.nodes, false, verbatim, &mut f);
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => collect_text(&element.children, out),
        }
    }
}

fn collect_fragments<'a>(nodes: &'a [Node], out: &mut Vec<&'a str>) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push(text),
            Node::Element(element) => collect_fragments(&element.children, out),
        }
    }
}

fn collect_flagged<'a>(
    nodes: &'a [Node],
    in_verbatim: bool,
    verbatim: &Verbatim,
    out: &mut Vec<(&'a str, bool)>,
) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push((text, in_verbatim)),
            Node::Element(element) => {
                let inside = in_verbatim || verbatim.is_verbatim(&element.name);
                collect_flagged(&element.children, inside, verbatim, out);
            }
        }
    }
}

fn walk_text_mut(
    nodes: &mut [Node],
    in_verbatim: bool,
    verbatim: &Verbatim,
    f: &mut dyn FnMut(&mut String, bool),
) {
    for node in nodes {
        match node {
            Node::Text(text) => f(text, in_verbatim),
            Node::Element(element) => {
                let inside = in_verbatim || verbatim.is_verbatim(&element.name);
                walk_text_mut(&mut element.children, inside, verbatim, f);
            }
        }
    }
}

fn walk_context_mut(
    nodes: &mut [Node],
    in_verbatim: bool,
    verbatim: &Verbatim,
    f: &mut dyn FnMut(&mut String, TextContext),
) {
    let is_element = |node: &Node| matches!(node, Node::Element(_));
    let first_element = nodes.iter().position(is_element);
    let last_element = nodes.iter().rposition(is_element);

    for (idx, node) in nodes.iter_mut().enumerate() {
        match node {
            Node::Text(text) => {
                let context = TextContext {
                    verbatim: in_verbatim,
                    element_before: first_element.is_some_and(|first| first < idx),
                    element_after: last_element.is_some_and(|last| last > idx),
                };
                f(text, context);
            }
            Node::Element(element) => {
                let inside = in_verbatim || verbatim.is_verbatim(&element.name);
                walk_context_mut(&mut element.children, inside, verbatim, f);
            }
        }
    }
}

fn walk_elements_mut(
    nodes: &mut [Node],
    in_verbatim: bool,
    verbatim: &Verbatim,
    f: &mut dyn FnMut(&mut Element, bool),
) {
    for node in nodes {
        if let Node::Element(element) = node {
            let inside = in_verbatim || verbatim.is_verbatim(&element.name);
            walk_elements_mut(&mut element.children, inside, verbatim, f);
            f(element, inside);
        }
    }
}

fn map_text_nodes(
    nodes: Vec<Node>,
    in_verbatim: bool,
    verbatim: &Verbatim,
    f: &mut dyn FnMut(String, bool) -> Vec<Node>,
) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Text(text) => out.extend(f(text, in_verbatim)),
            Node::Element(mut element) => {
                let inside = in_verbatim || verbatim.is_verbatim(&element.name);
                let children = std::mem::take(&mut element.children);
                element.children = map_text_nodes(children, inside, verbatim, f);
                out.push(Node::Element(element));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> ContentTree {
        let mut p = Element::new("p");
        p.children.push(Node::text("one "));
        p.children.push(Element::with_text("em", "two").into());
        p.children.push(Node::text(" three"));
        let pre = Element::with_text("pre", "four");
        ContentTree::new(vec![p.into(), pre.into()])
    }

    #[test]
    fn text_fragments_flag_verbatim() {
        let tree = sample();
        let verbatim = Verbatim::new(&["pre".to_string()]);
        assert_eq!(
            tree.text_fragments(&verbatim),
            vec![
                ("one ", false),
                ("two", false),
                (" three", false),
                ("four", true)
            ]
        );
        assert_eq!(tree.text(), "one two threefour");
    }

    #[test]
    fn flat_map_text_splits_fragments_in_order() {
        let mut tree = sample();
        tree.flat_map_text(&Verbatim::none(), |text, _| {
            if text == "two" {
                vec![
                    Node::text("t"),
                    Element::with_text("b", "w").into(),
                    Node::text("o"),
                ]
            } else {
                vec![Node::Text(text)]
            }
        });
        assert_eq!(tree.text(), "one two threefour");
        let Node::Element(p) = &tree.nodes[0] else {
            panic!("expected element");
        };
        let Node::Element(em) = &p.children[1] else {
            panic!("expected element");
        };
        assert_eq!(em.children.len(), 3);
    }

    #[test]
    fn elements_are_visited_after_children() {
        let mut tree = sample();
        let mut seen = Vec::new();
        tree.for_each_element_mut(&Verbatim::new(&["pre".to_string()]), |el, verbatim| {
            seen.push((el.name.clone(), verbatim));
        });
        assert_eq!(
            seen,
            vec![
                ("em".to_string(), false),
                ("p".to_string(), false),
                ("pre".to_string(), true)
            ]
        );
    }

    #[test]
    fn text_context_sees_element_siblings() {
        let mut tree = sample();
        let mut seen = Vec::new();
        tree.for_each_text_in_context_mut(&Verbatim::new(&["pre".to_string()]), |text, cx| {
            seen.push((text.clone(), cx.element_before, cx.element_after, cx.verbatim));
        });
        assert_eq!(
            seen,
            vec![
                ("one ".to_string(), false, true, false),
                ("two".to_string(), false, false, false),
                (" three".to_string(), true, false, false),
                ("four".to_string(), false, false, true),
            ]
        );
    }

    #[test]
    fn map_fragments_indexes_in_document_order() {
        let Node::Element(p) = sample().nodes.remove(0) else {
            panic!("expected element");
        };
        let p = p.map_fragments(|i, text| vec![Node::Text(format!("{i}{text}"))]);
        assert_eq!(p.text(), "0one 1two2 three");
    }
}
