use std::collections::HashMap;

use crate::config::{Config, TagsConfig};

/// Lexical category of a token. Every category has a parent except `Text`,
/// so walking `parent()` always ends at the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Text,
    Whitespace,
    Error,
    Other,

    Keyword,
    KeywordConstant,
    KeywordDeclaration,
    KeywordNamespace,
    KeywordPseudo,
    KeywordReserved,
    KeywordType,

    Name,
    NameAttribute,
    NameBuiltin,
    NameBuiltinPseudo,
    NameClass,
    NameConstant,
    NameDecorator,
    NameEntity,
    NameException,
    NameFunction,
    NameLabel,
    NameNamespace,
    NameTag,
    NameVariable,

    Literal,
    String,
    StringChar,
    StringDoc,
    StringDouble,
    StringEscape,
    StringInterpol,
    StringRegex,
    StringSingle,
    StringSymbol,
    Number,
    NumberFloat,
    NumberHex,
    NumberInteger,

    Operator,
    OperatorWord,
    Punctuation,

    Comment,
    CommentHashbang,
    CommentMultiline,
    CommentPreproc,
    CommentSingle,
    CommentSpecial,

    Generic,
    GenericDeleted,
    GenericEmph,
    GenericEmphStrong,
    GenericError,
    GenericHeading,
    GenericInserted,
    GenericOutput,
    GenericPrompt,
    GenericStrong,
    GenericSubheading,
    GenericTraceback,
}

const NAMES: &[(TokenKind, &str)] = &[
    (TokenKind::Text, "Text"),
    (TokenKind::Whitespace, "Whitespace"),
    (TokenKind::Error, "Error"),
    (TokenKind::Other, "Other"),
    (TokenKind::Keyword, "Keyword"),
    (TokenKind::KeywordConstant, "Keyword.Constant"),
    (TokenKind::KeywordDeclaration, "Keyword.Declaration"),
    (TokenKind::KeywordNamespace, "Keyword.Namespace"),
    (TokenKind::KeywordPseudo, "Keyword.Pseudo"),
    (TokenKind::KeywordReserved, "Keyword.Reserved"),
    (TokenKind::KeywordType, "Keyword.Type"),
    (TokenKind::Name, "Name"),
    (TokenKind::NameAttribute, "Name.Attribute"),
    (TokenKind::NameBuiltin, "Name.Builtin"),
    (TokenKind::NameBuiltinPseudo, "Name.Builtin.Pseudo"),
    (TokenKind::NameClass, "Name.Class"),
    (TokenKind::NameConstant, "Name.Constant"),
    (TokenKind::NameDecorator, "Name.Decorator"),
    (TokenKind::NameEntity, "Name.Entity"),
    (TokenKind::NameException, "Name.Exception"),
    (TokenKind::NameFunction, "Name.Function"),
    (TokenKind::NameLabel, "Name.Label"),
    (TokenKind::NameNamespace, "Name.Namespace"),
    (TokenKind::NameTag, "Name.Tag"),
    (TokenKind::NameVariable, "Name.Variable"),
    (TokenKind::Literal, "Literal"),
    (TokenKind::String, "String"),
    (TokenKind::StringChar, "String.Char"),
    (TokenKind::StringDoc, "String.Doc"),
    (TokenKind::StringDouble, "String.Double"),
    (TokenKind::StringEscape, "String.Escape"),
    (TokenKind::StringInterpol, "String.Interpol"),
    (TokenKind::StringRegex, "String.Regex"),
    (TokenKind::StringSingle, "String.Single"),
    (TokenKind::StringSymbol, "String.Symbol"),
    (TokenKind::Number, "Number"),
    (TokenKind::NumberFloat, "Number.Float"),
    (TokenKind::NumberHex, "Number.Hex"),
    (TokenKind::NumberInteger, "Number.Integer"),
    (TokenKind::Operator, "Operator"),
    (TokenKind::OperatorWord, "Operator.Word"),
    (TokenKind::Punctuation, "Punctuation"),
    (TokenKind::Comment, "Comment"),
    (TokenKind::CommentHashbang, "Comment.Hashbang"),
    (TokenKind::CommentMultiline, "Comment.Multiline"),
    (TokenKind::CommentPreproc, "Comment.Preproc"),
    (TokenKind::CommentSingle, "Comment.Single"),
    (TokenKind::CommentSpecial, "Comment.Special"),
    (TokenKind::Generic, "Generic"),
    (TokenKind::GenericDeleted, "Generic.Deleted"),
    (TokenKind::GenericEmph, "Generic.Emph"),
    (TokenKind::GenericEmphStrong, "Generic.EmphStrong"),
    (TokenKind::GenericError, "Generic.Error"),
    (TokenKind::GenericHeading, "Generic.Heading"),
    (TokenKind::GenericInserted, "Generic.Inserted"),
    (TokenKind::GenericOutput, "Generic.Output"),
    (TokenKind::GenericPrompt, "Generic.Prompt"),
    (TokenKind::GenericStrong, "Generic.Strong"),
    (TokenKind::GenericSubheading, "Generic.Subheading"),
    (TokenKind::GenericTraceback, "Generic.Traceback"),
];

impl TokenKind {
    pub fn parent(self) -> Option<TokenKind> {
        use TokenKind::*;

        let parent = match self {
            Text => return None,
            Whitespace | Error | Other | Keyword | Name | Literal | Operator | Punctuation
            | Comment | Generic => Text,
            KeywordConstant | KeywordDeclaration | KeywordNamespace | KeywordPseudo
            | KeywordReserved | KeywordType => Keyword,
            NameBuiltinPseudo => NameBuiltin,
            NameAttribute | NameBuiltin | NameClass | NameConstant | NameDecorator
            | NameEntity | NameException | NameFunction | NameLabel | NameNamespace | NameTag
            | NameVariable => Name,
            String | Number => Literal,
            StringChar | StringDoc | StringDouble | StringEscape | StringInterpol
            | StringRegex | StringSingle | StringSymbol => String,
            NumberFloat | NumberHex | NumberInteger => Number,
            OperatorWord => Operator,
            CommentHashbang | CommentMultiline | CommentPreproc | CommentSingle
            | CommentSpecial => Comment,
            GenericDeleted | GenericEmph | GenericEmphStrong | GenericError | GenericHeading
            | GenericInserted | GenericOutput | GenericPrompt | GenericStrong
            | GenericSubheading | GenericTraceback => Generic,
        };
        Some(parent)
    }

    /// Dotted name as used in configuration, e.g. `Keyword.Type`.
    pub fn from_name(name: &str) -> Option<TokenKind> {
        NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(kind, _)| *kind)
    }
}

/// Font attributes of a token category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub border: bool,
}

impl TokenStyle {
    /// Parse a space separated style string such as `"bold italic"`.
    pub fn parse(text: &str) -> Self {
        let mut style = Self::default();
        for word in text.split_whitespace() {
            match word {
                "bold" => style.bold = true,
                "italic" => style.italic = true,
                "underline" => style.underline = true,
                "border" => style.border = true,
                "nobold" => style.bold = false,
                "noitalic" => style.italic = false,
                "nounderline" => style.underline = false,
                other => log::warn!("Unknown style attribute {:?} ignored", other),
            }
        }
        style
    }
}

/// The markup a style renders as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunStyle {
    #[default]
    Plain,
    Bold,
    Italic,
    BoldItalic,
    Underline,
}

impl From<TokenStyle> for RunStyle {
    fn from(style: TokenStyle) -> Self {
        if style.bold && style.italic {
            RunStyle::BoldItalic
        } else if style.bold {
            RunStyle::Bold
        } else if style.italic {
            RunStyle::Italic
        } else if style.underline || style.border {
            RunStyle::Underline
        } else {
            RunStyle::Plain
        }
    }
}

impl RunStyle {
    /// Suffix of the highlight tag, or `None` for unstyled text.
    pub fn tag_suffix(self) -> Option<&'static str> {
        match self {
            RunStyle::Plain => None,
            RunStyle::Bold => Some("strong"),
            RunStyle::Italic => Some("em"),
            RunStyle::BoldItalic => Some("em2"),
            RunStyle::Underline => Some("u"),
        }
    }
}

/// Styles for the token categories that have one. Always holds an entry for
/// the root category, so every token resolves.
#[derive(Debug, Clone)]
pub struct StyleTable {
    styles: HashMap<TokenKind, RunStyle>,
}

impl StyleTable {
    pub fn new(styles: impl IntoIterator<Item = (TokenKind, RunStyle)>) -> Self {
        let mut styles: HashMap<_, _> = styles.into_iter().collect();
        styles.entry(TokenKind::Text).or_insert(RunStyle::Plain);
        Self { styles }
    }

    pub fn from_config(config: &Config) -> Self {
        let entries = config
            .highlight
            .styles
            .iter()
            .filter_map(|(name, style)| match TokenKind::from_name(name) {
                Some(kind) => Some((kind, TokenStyle::parse(style).into())),
                None => {
                    log::warn!("Unknown token category {:?} in highlight styles", name);
                    None
                }
            });
        Self::new(entries)
    }

    /// Style of the nearest category (the token's own, or an ancestor's)
    /// that has an entry.
    pub fn resolve(&self, kind: TokenKind) -> RunStyle {
        let mut current = kind;
        loop {
            if let Some(style) = self.styles.get(&current) {
                return *style;
            }
            match current.parent() {
                Some(parent) => current = parent,
                // `new` always installs the root
                None => return RunStyle::Plain,
            }
        }
    }
}

/// Turns a token stream into markup, merging consecutive tokens that render
/// the same way into one run.
#[derive(Debug, Clone)]
pub struct TokenRunEncoder {
    table: StyleTable,
    tags: TagsConfig,
}

impl TokenRunEncoder {
    pub fn new(table: StyleTable, tags: TagsConfig) -> Self {
        Self { table, tags }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(StyleTable::from_config(config), config.tags.clone())
    }

    pub fn encode<I, S>(&self, tokens: I) -> String
    where
        I: IntoIterator<Item = (TokenKind, S)>,
        S: AsRef<str>,
    {
        let mut out = String::new();
        let mut pending = String::new();
        let mut pending_style = None;

        for (kind, text) in tokens {
            let text = text.as_ref();
            if text.is_empty() {
                continue;
            }
            let style = self.table.resolve(kind);
            if pending_style != Some(style) {
                if let Some(previous) = pending_style {
                    self.flush(previous, &pending, &mut out);
                }
                pending.clear();
                pending_style = Some(style);
            }
            html_escape::encode_text_to_string(text, &mut pending);
        }

        if let Some(style) = pending_style {
            self.flush(style, &pending, &mut out);
        }
        out
    }

    fn flush(&self, style: RunStyle, text: &str, out: &mut String) {
        match style.tag_suffix() {
            Some(suffix) => {
                let tag = self.tags.highlight(suffix);
                out.push('<');
                out.push_str(&tag);
                out.push('>');
                out.push_str(text);
                out.push_str("</");
                out.push_str(&tag);
                out.push('>');
            }
            None => out.push_str(text),
        }
    }
}
