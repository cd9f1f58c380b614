mod code;
mod config;
mod dump;
mod error;
mod highlight;
mod issue;
mod lexer;
mod markup;
mod parser;
mod pipeline;
mod quotes;
mod tree;
mod typography;
mod wrap;

pub use code::{CodeFormatter, CodeOptions};
pub use config::{CodeConfig, Config, HighlightConfig, TagsConfig, TypographyConfig};
pub use dump::{DumpItem, read_items};
pub use error::{Error, Result};
pub use highlight::{RunStyle, StyleTable, TokenKind, TokenRunEncoder, TokenStyle};
pub use issue::{Article, UNKNOWN_AUTHOR, articles_for_issue, issue_to_xml};
pub use lexer::{Lexer, SyntectLexer};
pub use markup::tree_to_markup;
pub use pipeline::Pipeline;
pub use quotes::{QuoteDirection, classify as classify_quote, replace_quotes};
pub use tree::{ContentTree, Element, Node};
pub use wrap::{BreakWeights, LINE_SEPARATOR, LineBreakPlanner, LineWrapper};

/// Parse article HTML into a content tree.
pub fn parse(html: &str) -> Result<ContentTree> {
    parser::parse(html)
}

/// Run every post-processing pass over one article.
pub fn process_article(article: &mut Article, pipeline: &Pipeline) -> Result<()> {
    log::info!("Processing \"{}\" by {}", article.title, article.author);
    pipeline.run(&mut article.content)
}

/// Export the articles of `issue` from a WordPress dump as an issue
/// document. An article that fails to process is logged and left out.
pub fn export_issue(xml: &str, issue: &str, config: &Config) -> Result<String> {
    log::info!("Filtering articles for {}", issue);
    let articles = articles_for_issue(xml, issue)?;
    if articles.is_empty() {
        log::warn!("No articles tagged {}", issue);
    }

    let pipeline = Pipeline::new(config);
    let mut processed = Vec::with_capacity(articles.len());
    for mut article in articles {
        match process_article(&mut article, &pipeline) {
            Ok(()) => processed.push(article),
            Err(e) => log::error!("Skipping \"{}\": {}", article.title, e),
        }
    }

    log::info!("Writing {} articles", processed.len());
    Ok(issue_to_xml(&processed))
}
