use std::sync::LazyLock;

use syntect::parsing::{ParseState, Scope, ScopeStack, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::highlight::TokenKind;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// Splits source code into classified tokens.
pub trait Lexer {
    /// Tokenize `text` as `language`. Returns `None` when the language is
    /// unknown or the text can't be lexed; callers leave the code as is.
    fn tokenize(&self, text: &str, language: &str) -> Option<Vec<(TokenKind, String)>>;
}

/// Lexer backed by syntect's bundled Sublime Text grammars. Languages are
/// looked up by name or file extension (`python`, `py`, `rust`, `rs`, ...).
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntectLexer;

impl Lexer for SyntectLexer {
    fn tokenize(&self, text: &str, language: &str) -> Option<Vec<(TokenKind, String)>> {
        let syntax = SYNTAX_SET.find_syntax_by_token(language)?;
        let mut state = ParseState::new(syntax);
        let mut stack = ScopeStack::new();
        let mut tokens = Vec::new();

        for line in LinesWithEndings::from(text) {
            let ops = match state.parse_line(line, &SYNTAX_SET) {
                Ok(ops) => ops,
                Err(e) => {
                    log::warn!("Cannot lex {} code: {}", language, e);
                    return None;
                }
            };

            // Each op applies at its byte offset; the text in between carries
            // the scopes in effect at its start
            let mut start = 0;
            for (offset, op) in &ops {
                if *offset > start {
                    tokens.push((classify(stack.as_slice()), line[start..*offset].to_string()));
                    start = *offset;
                }
                if let Err(e) = stack.apply(op) {
                    log::warn!("Cannot lex {} code: {:?}", language, e);
                    return None;
                }
            }
            if start < line.len() {
                tokens.push((classify(stack.as_slice()), line[start..].to_string()));
            }
        }

        Some(tokens)
    }
}

/// Scope prefixes and the token category they stand for, most specific
/// first. `None` defers to the enclosing scope, so the quotes of a string
/// are styled with the string.
const SCOPE_KINDS: &[(&str, Option<TokenKind>)] = &[
    ("punctuation.definition.string", None),
    ("punctuation.definition.comment", None),
    ("punctuation.definition.character", None),
    ("comment.block.documentation", Some(TokenKind::StringDoc)),
    ("comment.line", Some(TokenKind::CommentSingle)),
    ("comment.block", Some(TokenKind::CommentMultiline)),
    ("comment", Some(TokenKind::Comment)),
    ("string.quoted.double", Some(TokenKind::StringDouble)),
    ("string.quoted.single", Some(TokenKind::StringSingle)),
    ("string.regexp", Some(TokenKind::StringRegex)),
    ("string.interpolated", Some(TokenKind::StringInterpol)),
    ("string", Some(TokenKind::String)),
    ("constant.character.escape", Some(TokenKind::StringEscape)),
    ("constant.character", Some(TokenKind::StringChar)),
    ("constant.numeric.float", Some(TokenKind::NumberFloat)),
    ("constant.numeric.integer.hexadecimal", Some(TokenKind::NumberHex)),
    ("constant.numeric.integer", Some(TokenKind::NumberInteger)),
    ("constant.numeric", Some(TokenKind::Number)),
    ("constant.language", Some(TokenKind::KeywordConstant)),
    ("constant.other.symbol", Some(TokenKind::StringSymbol)),
    ("constant", Some(TokenKind::NameConstant)),
    ("keyword.operator.word", Some(TokenKind::OperatorWord)),
    ("keyword.operator.logical", Some(TokenKind::OperatorWord)),
    ("keyword.operator", Some(TokenKind::Operator)),
    ("keyword.control.import", Some(TokenKind::KeywordNamespace)),
    ("keyword.declaration", Some(TokenKind::KeywordDeclaration)),
    ("keyword", Some(TokenKind::Keyword)),
    ("storage.type.function", Some(TokenKind::KeywordDeclaration)),
    ("storage.type.class", Some(TokenKind::KeywordDeclaration)),
    ("storage.modifier", Some(TokenKind::KeywordDeclaration)),
    ("storage.type", Some(TokenKind::KeywordType)),
    ("storage", Some(TokenKind::Keyword)),
    ("entity.name.function", Some(TokenKind::NameFunction)),
    ("entity.name.class", Some(TokenKind::NameClass)),
    ("entity.name.struct", Some(TokenKind::NameClass)),
    ("entity.name.enum", Some(TokenKind::NameClass)),
    ("entity.name.trait", Some(TokenKind::NameClass)),
    ("entity.name.type", Some(TokenKind::NameClass)),
    ("entity.name.namespace", Some(TokenKind::NameNamespace)),
    ("entity.name.tag", Some(TokenKind::NameTag)),
    ("entity.name.label", Some(TokenKind::NameLabel)),
    ("entity.name.constant", Some(TokenKind::NameConstant)),
    ("entity.name", Some(TokenKind::Name)),
    ("entity.other.attribute-name", Some(TokenKind::NameAttribute)),
    ("entity.other.inherited-class", Some(TokenKind::NameClass)),
    ("support.function", Some(TokenKind::NameBuiltin)),
    ("support.constant", Some(TokenKind::NameConstant)),
    ("support", Some(TokenKind::NameBuiltin)),
    ("variable.language", Some(TokenKind::NameBuiltinPseudo)),
    ("variable.function", Some(TokenKind::NameFunction)),
    ("variable.annotation", Some(TokenKind::NameDecorator)),
    ("variable", Some(TokenKind::NameVariable)),
    ("punctuation", Some(TokenKind::Punctuation)),
    ("invalid", Some(TokenKind::Error)),
    ("markup.heading", Some(TokenKind::GenericHeading)),
    ("markup.bold", Some(TokenKind::GenericStrong)),
    ("markup.italic", Some(TokenKind::GenericEmph)),
    ("markup.inserted", Some(TokenKind::GenericInserted)),
    ("markup.deleted", Some(TokenKind::GenericDeleted)),
    ("meta.preprocessor", Some(TokenKind::CommentPreproc)),
];

/// Category of the innermost scope that has one.
fn classify(stack: &[Scope]) -> TokenKind {
    stack
        .iter()
        .rev()
        .find_map(|scope| scope_kind(&scope.build_string()))
        .unwrap_or(TokenKind::Text)
}

/// `None` both for scopes with no entry and for explicit deferrals.
fn scope_kind(scope: &str) -> Option<TokenKind> {
    SCOPE_KINDS
        .iter()
        .find(|(prefix, _)| has_prefix(scope, prefix))
        .and_then(|(_, kind)| *kind)
}

/// Prefix match on whole dotted segments: `string` matches
/// `string.quoted.double` but not `stringify`.
fn has_prefix(scope: &str, prefix: &str) -> bool {
    scope
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}
