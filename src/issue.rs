use crate::dump::{DumpItem, read_items};
use crate::error::{Error, Result};
use crate::markup::nodes_to_markup;
use crate::parser::parse;
use crate::tree::ContentTree;

/// Exports carry no usable author, so every article gets this one.
pub const UNKNOWN_AUTHOR: &str = "UNKNOWN AUTHOR";

#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub title: String,
    pub author: String,
    pub content: ContentTree,
}

impl Article {
    /// Build an article from the `index`th item of a dump.
    pub fn from_item(index: usize, item: DumpItem) -> Result<Self> {
        let html = item.content.ok_or(Error::MissingField {
            item: index,
            field: "content:encoded",
        })?;
        Ok(Self {
            title: item.title.unwrap_or_default(),
            author: UNKNOWN_AUTHOR.to_string(),
            content: parse(&html)?,
        })
    }
}

/// Every article of `xml` tagged with `issue`, in dump order. An unreadable
/// dump is an error; an item that can't become an article is logged and
/// left out.
pub fn articles_for_issue(xml: &str, issue: &str) -> Result<Vec<Article>> {
    let articles = read_items(xml)?
        .into_iter()
        .enumerate()
        .filter(|(_, item)| item.is_for_issue(issue))
        .filter_map(|(index, item)| {
            let title = item.title.clone().unwrap_or_default();
            match Article::from_item(index, item) {
                Ok(article) => Some(article),
                Err(e) => {
                    log::error!("Skipping \"{}\": {}", title, e);
                    None
                }
            }
        })
        .collect();
    Ok(articles)
}

/// Serialize articles into an `<issue>` document, one line per article
/// element.
pub fn issue_to_xml(articles: &[Article]) -> String {
    let mut out = String::from("<issue>");
    for article in articles {
        article_to_xml(article, &mut out);
    }
    out.push_str("</issue>");
    tidy(&out)
}

fn article_to_xml(article: &Article, out: &mut String) {
    out.push_str("<article><title>");
    html_escape::encode_text_to_string(&article.title, out);
    out.push_str("</title><content>");
    nodes_to_markup(&article.content.nodes, out);
    out.push_str("</content></article>");
}

/// Drop blank lines and put each article, title and content on its own
/// line. Newlines just inside a list would import as empty items.
fn tidy(xml: &str) -> String {
    let mut out = xml
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .replace("</article><article>", "</article>\n<article>")
        .replace("</title><content>", "</title>\n<content>");

    for list in ["ul", "ol"] {
        out = out
            .replace(&format!("<{}>\n", list), &format!("<{}>", list))
            .replace(&format!("\n</{}>", list), &format!("</{}>", list));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Element, Node};
    use pretty_assertions::assert_eq;

    fn article(title: &str, html: &str) -> Article {
        Article {
            title: title.to_string(),
            author: UNKNOWN_AUTHOR.to_string(),
            content: parse(html).unwrap(),
        }
    }

    #[test]
    fn articles_are_separated_by_newlines() {
        let xml = issue_to_xml(&[article("One", "<p>a</p>"), article("Two", "<p>b</p>")]);
        assert_eq!(
            xml,
            concat!(
                "<issue><article><title>One</title>\n<content><p>a</p></content></article>\n",
                "<article><title>Two</title>\n<content><p>b</p></content></article></issue>"
            )
        );
    }

    #[test]
    fn title_is_escaped() {
        let xml = issue_to_xml(&[article("Fish & <Chips>", "")]);
        assert!(xml.contains("<title>Fish &amp; &lt;Chips&gt;</title>"));
    }

    #[test]
    fn blank_lines_and_list_padding_are_removed() {
        let xml = issue_to_xml(&[article("L", "<ul>\n<li>x</li>\n \n<li>y</li>\n</ul>")]);
        assert_eq!(
            xml,
            "<issue><article><title>L</title>\n<content><ul><li>x</li>\n<li>y</li></ul></content></article></issue>"
        );
    }

    #[test]
    fn empty_issue() {
        assert_eq!(issue_to_xml(&[]), "<issue></issue>");
    }

    #[test]
    fn missing_content_is_an_error() {
        let item = DumpItem {
            title: Some("t".to_string()),
            content: None,
            tags: vec![],
        };
        assert!(matches!(
            Article::from_item(3, item),
            Err(Error::MissingField { item: 3, .. })
        ));
    }

    #[test]
    fn item_without_content_is_skipped() {
        let xml = concat!(
            "<rss><channel>",
            "<item><title>Kept</title><content:encoded>&lt;p&gt;fine&lt;/p&gt;</content:encoded>",
            "<category domain=\"post_tag\">v1</category></item>",
            "<item><title>Dropped</title>",
            "<category domain=\"post_tag\">v1</category></item>",
            "</channel></rss>"
        );
        let articles = articles_for_issue(xml, "v1").unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Kept");
    }

    #[test]
    fn missing_title_is_empty() {
        let item = DumpItem {
            title: None,
            content: Some("<b>x</b>".to_string()),
            tags: vec![],
        };
        let article = Article::from_item(0, item).unwrap();
        assert_eq!(article.title, "");
        assert_eq!(
            article.content.nodes,
            vec![Node::Element(Element::with_text("b", "x"))]
        );
    }
}
