use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("malformed XML dump: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("cannot parse article HTML: {0}")]
    Html(#[source] std::io::Error),

    #[error("item {item} has no <{field}>")]
    MissingField { item: usize, field: &'static str },
}
