//! Code blocks: option headers, highlighting, line numbers and wrapping.
//!
//! A `pre` block may start with an option header, one `:name: value` per
//! line followed by a blank line:
//!
//! ```text
//! :language: python
//! :linenos:
//!
//! def f(x):
//!     return x
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::{Config, TagsConfig};
use crate::error::Result;
use crate::highlight::TokenRunEncoder;
use crate::lexer::{Lexer, SyntectLexer};
use crate::markup::inner_markup;
use crate::parser::parse;
use crate::tree::{ContentTree, Element, Node, Verbatim};
use crate::wrap::LineWrapper;

static OPTIONS_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\s*:\S+?:[ \t]*[^\n]*\n)+[ \t]*\n+").unwrap());
static OPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":(\S+?):[ \t]*([^\n]*)").unwrap());

/// Options from a code block header. A name given without a value is a flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeOptions {
    options: BTreeMap<String, Option<String>>,
}

impl CodeOptions {
    /// Split a leading option header off `contents`. Contents without a
    /// header come back whole with no options.
    pub fn parse(contents: &str) -> (Self, &str) {
        let Some(block) = OPTIONS_BLOCK.find(contents) else {
            return (Self::default(), contents);
        };

        let options = OPTION
            .captures_iter(block.as_str())
            .map(|caps| {
                let value = caps[2].trim();
                let value = (!value.is_empty()).then(|| value.to_string());
                (caps[1].to_string(), value)
            })
            .collect();
        (Self { options }, &contents[block.end()..])
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.options.get(name).and_then(|value| value.as_deref())
    }

    pub fn is_set(&self, name: &str) -> bool {
        match self.options.get(name) {
            Some(None) => true,
            Some(Some(value)) => !matches!(value.to_ascii_lowercase().as_str(), "false" | "no" | "0"),
            None => false,
        }
    }

    pub fn language(&self) -> Option<&str> {
        self.get("language").or_else(|| self.get("lang"))
    }

    pub fn linenos(&self) -> bool {
        self.is_set("linenos")
    }
}

/// Rewrites every `pre` block of an article into highlighted, numbered and
/// wrapped code.
pub struct CodeFormatter {
    lexer: Box<dyn Lexer>,
    encoder: TokenRunEncoder,
    wrapper: LineWrapper,
    tags: TagsConfig,
    highlight: bool,
}

impl CodeFormatter {
    pub fn new(lexer: Box<dyn Lexer>, config: &Config) -> Self {
        Self {
            lexer,
            encoder: TokenRunEncoder::from_config(config),
            wrapper: LineWrapper::from_config(config),
            tags: config.tags.clone(),
            highlight: config.highlight.enabled,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Box::new(SyntectLexer), config)
    }

    pub fn format_blocks(&self, tree: &mut ContentTree) -> Result<()> {
        let mut result = Ok(());
        tree.for_each_element_mut(&Verbatim::none(), |element, _| {
            if result.is_err() || !element.name.eq_ignore_ascii_case("pre") {
                return;
            }
            match self.format_block(element) {
                Ok(block) => *element = block,
                Err(e) => result = Err(e),
            }
        });
        result
    }

    /// Format a single `pre` element.
    pub fn format_block(&self, pre: &Element) -> Result<Element> {
        let contents = match pre.children.as_slice() {
            [Node::Element(code)] if code.name.eq_ignore_ascii_case("code") => inner_markup(code),
            _ => inner_markup(pre),
        };
        let (options, body) = CodeOptions::parse(&contents);

        let mut markup = match options.language() {
            Some(language) if self.highlight => self.highlight(body, language)?,
            _ => body.to_string(),
        };
        if options.linenos() {
            markup = self.number_lines(&markup);
        }

        let rebuilt = parse(&format!("<pre><code>{}</code></pre>", markup))?;
        let Some(block) = rebuilt.nodes.into_iter().find_map(|node| match node {
            Node::Element(element) if element.name == "pre" => Some(element),
            _ => None,
        }) else {
            log::warn!("Code block did not survive rebuilding, leaving it as is");
            return Ok(pre.clone());
        };

        Ok(self.wrapper.apply(block))
    }

    fn highlight(&self, markup: &str, language: &str) -> Result<String> {
        let text = parse(markup)?.text();
        // The lexers expect every line to end in a newline
        let source = format!("{}\n", text.trim());

        match self.lexer.tokenize(&source, language) {
            Some(tokens) => {
                log::debug!("Highlighted {} code ({} tokens)", language, tokens.len());
                Ok(self.encoder.encode(tokens).trim_end().to_string())
            }
            None => {
                log::debug!("No highlighter for {:?}, leaving block plain", language);
                Ok(markup.to_string())
            }
        }
    }

    /// Wrap the first line and the remaining lines in their own tags, so the
    /// layout can restart numbering at each block.
    fn number_lines(&self, markup: &str) -> String {
        let start = &self.tags.lineno_start;
        let rest = &self.tags.lineno;
        match markup.split_once('\n') {
            Some((first, others)) => {
                format!("<{start}>{first}</{start}>\n<{rest}>{others}</{rest}>")
            }
            None => format!("<{start}>{markup}</{start}>"),
        }
    }
}

/// Turn hand-written emphasis inside code into highlight run tags.
pub fn convert_manual_highlighting(tree: &mut ContentTree, verbatim: &Verbatim, tags: &TagsConfig) {
    tree.for_each_element_mut(verbatim, |element, inside| {
        if !inside {
            return;
        }
        let suffix = match element.name.to_ascii_lowercase().as_str() {
            "strong" | "b" => "strong",
            "em" | "i" => "em",
            "u" => "u",
            _ => return,
        };
        element.name = tags.highlight(suffix);
    });
}
