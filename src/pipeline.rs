use crate::code::{CodeFormatter, convert_manual_highlighting};
use crate::config::Config;
use crate::error::Result;
use crate::quotes;
use crate::tree::{ContentTree, Verbatim};
use crate::typography;

type Pass = fn(&Pipeline, &mut ContentTree) -> Result<()>;

/// Post-processing passes in the order they run. Later passes rely on the
/// earlier ones: inline code must exist before the prose passes skip it, and
/// code blocks are wrapped before newlines turn into separators.
const PASSES: &[(&str, Pass)] = &[
    ("normalize_newlines", normalize_newlines),
    ("replace_inline_code", replace_inline_code),
    ("convert_manual_highlighting", manual_highlighting),
    ("format_code_blocks", format_code_blocks),
    ("replace_newlines", replace_newlines),
    ("replace_ellipses", replace_ellipses),
    ("replace_dashes", replace_dashes),
    ("add_smart_quotes", add_smart_quotes),
    ("remove_extraneous_spaces", remove_extraneous_spaces),
    ("add_footnotes", add_footnotes),
];

/// Runs every post-processing pass over an article.
pub struct Pipeline {
    config: Config,
    verbatim: Verbatim,
    code: CodeFormatter,
}

impl Pipeline {
    pub fn new(config: &Config) -> Self {
        Self::with_formatter(config, CodeFormatter::from_config(config))
    }

    pub fn with_formatter(config: &Config, code: CodeFormatter) -> Self {
        Self {
            config: config.clone(),
            verbatim: Verbatim::new(&config.code.verbatim_tags),
            code,
        }
    }

    pub fn run(&self, tree: &mut ContentTree) -> Result<()> {
        for (name, pass) in PASSES {
            log::info!("Post-process pass: {}", name);
            pass(self, tree)?;
        }
        Ok(())
    }
}

fn normalize_newlines(_: &Pipeline, tree: &mut ContentTree) -> Result<()> {
    typography::normalize_newlines(tree);
    Ok(())
}

fn replace_inline_code(p: &Pipeline, tree: &mut ContentTree) -> Result<()> {
    if p.config.typography.inline_code {
        typography::replace_inline_code(tree, &p.verbatim);
    }
    Ok(())
}

fn manual_highlighting(p: &Pipeline, tree: &mut ContentTree) -> Result<()> {
    convert_manual_highlighting(tree, &p.verbatim, &p.config.tags);
    Ok(())
}

fn format_code_blocks(p: &Pipeline, tree: &mut ContentTree) -> Result<()> {
    p.code.format_blocks(tree)
}

fn replace_newlines(p: &Pipeline, tree: &mut ContentTree) -> Result<()> {
    typography::replace_newlines(tree, &p.verbatim);
    Ok(())
}

fn replace_ellipses(p: &Pipeline, tree: &mut ContentTree) -> Result<()> {
    if p.config.typography.ellipses {
        typography::replace_ellipses(tree, &p.verbatim);
    }
    Ok(())
}

fn replace_dashes(p: &Pipeline, tree: &mut ContentTree) -> Result<()> {
    if p.config.typography.dashes {
        typography::replace_dashes(tree, &p.verbatim);
    }
    Ok(())
}

fn add_smart_quotes(p: &Pipeline, tree: &mut ContentTree) -> Result<()> {
    if p.config.typography.smart_quotes {
        quotes::rewrite(tree, &p.verbatim);
    }
    Ok(())
}

fn remove_extraneous_spaces(p: &Pipeline, tree: &mut ContentTree) -> Result<()> {
    if p.config.typography.collapse_spaces {
        typography::remove_extraneous_spaces(tree, &p.verbatim);
    }
    Ok(())
}

fn add_footnotes(p: &Pipeline, tree: &mut ContentTree) -> Result<()> {
    if p.config.typography.footnotes {
        typography::add_footnotes(tree, &p.verbatim, &p.config.tags.footnote);
    }
    Ok(())
}
