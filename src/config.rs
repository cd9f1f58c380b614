use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{Error, Result};

static DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub typography: TypographyConfig,
    pub code: CodeConfig,
    pub highlight: HighlightConfig,
    pub tags: TagsConfig,
}

/// Toggles for the prose passes. Verbatim content is never touched by these.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TypographyConfig {
    pub inline_code: bool,
    pub ellipses: bool,
    pub dashes: bool,
    pub smart_quotes: bool,
    pub collapse_spaces: bool,
    pub footnotes: bool,
}

impl Default for TypographyConfig {
    fn default() -> Self {
        Self {
            inline_code: true,
            ellipses: true,
            dashes: true,
            smart_quotes: true,
            collapse_spaces: true,
            footnotes: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CodeConfig {
    /// Width of a code block line in monospace columns.
    pub max_line_width: usize,
    pub continuation_glyph: String,
    pub space_glyph: String,
    /// Elements whose content is kept verbatim.
    pub verbatim_tags: Vec<String>,
    /// Break-candidate characters and their weights; lower breaks first.
    pub weights: BTreeMap<String, usize>,
    /// Characters that only break when nothing else is available. They weigh
    /// as much as a full line.
    pub word_breaks: String,
}

impl Default for CodeConfig {
    fn default() -> Self {
        let weights = [
            (" ", 0),
            (",", 0),
            (";", 0),
            ("%", 2),
            ("^", 2),
            ("/", 3),
            ("&", 3),
            ("|", 3),
            ("+", 3),
            ("-", 3),
            ("*", 3),
            ("=", 4),
            ("}", 4),
            ("{", 5),
            (")", 5),
            ("]", 5),
            (">", 5),
            ("(", 6),
            ("[", 6),
            ("<", 6),
        ]
        .into_iter()
        .map(|(c, w)| (c.to_string(), w))
        .collect();

        Self {
            max_line_width: 48,
            continuation_glyph: "\u{21aa}".to_string(),
            space_glyph: "\u{2423}".to_string(),
            verbatim_tags: vec!["pre".to_string(), "code".to_string()],
            weights,
            word_breaks: "_.!?".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HighlightConfig {
    pub enabled: bool,
    /// Token category name (e.g. `Keyword.Type`) to a style string such as
    /// `"bold italic"`. An empty string means plain text.
    pub styles: BTreeMap<String, String>,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        let styles = [
            ("Text", ""),
            ("Comment", "italic"),
            ("Comment.Preproc", ""),
            ("Keyword", "bold"),
            ("Keyword.Pseudo", ""),
            ("Keyword.Type", ""),
            ("Operator.Word", "bold"),
            ("Name.Class", "bold"),
            ("Name.Namespace", "bold"),
            ("Name.Exception", "bold"),
            ("Name.Entity", "bold"),
            ("Name.Tag", "bold"),
            ("String", "italic"),
            ("String.Interpol", "bold italic"),
            ("String.Escape", "bold italic"),
            ("Generic.Heading", "bold"),
            ("Generic.Subheading", "bold"),
            ("Generic.Emph", "italic"),
            ("Generic.Strong", "bold"),
            ("Generic.EmphStrong", "bold italic"),
            ("Generic.Prompt", "bold"),
            ("Error", "border"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            enabled: true,
            styles,
        }
    }
}

/// Tag names understood by the layout tool's import.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TagsConfig {
    pub highlight_prefix: String,
    pub marker: String,
    pub lineno_start: String,
    pub lineno: String,
    pub footnote: String,
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            highlight_prefix: "mathnews--code-".to_string(),
            marker: "mathnews-pre--ruby".to_string(),
            lineno_start: "mathnews-pre--lineno-start".to_string(),
            lineno: "mathnews-pre--lineno".to_string(),
            footnote: "sup".to_string(),
        }
    }
}

impl TagsConfig {
    /// Tag name for a highlight run, e.g. `mathnews--code-strong`.
    pub fn highlight(&self, suffix: &str) -> String {
        format!("{}{}", self.highlight_prefix, suffix)
    }
}

impl Config {
    /// The defaults shipped in `default_config.toml`.
    pub fn compiled_default() -> Self {
        // build.rs has already rejected a default file that doesn't parse
        toml::from_str(DEFAULT_CONFIG).unwrap_or_default()
    }

    /// Load config from a TOML file, or return the compiled defaults if the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|source| Error::Config {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                Ok(Self::compiled_default())
            }
            Err(source) => Err(Error::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
