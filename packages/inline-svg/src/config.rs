use std::collections::HashMap;
use std::path::PathBuf;

/// How a loaded SVG is embedded into the declaration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputEncoding {
    /// `url("data:image/svg+xml;charset=utf-8,<percent-encoded markup>")`
    #[default]
    DataUrl,
    /// `url(<raw markup>)`
    Literal,
}

/// Options for one inlining pass.
#[derive(Debug, Clone)]
pub struct Config {
    /// Additional search roots, consulted in order after the stylesheet's
    /// own directory.
    pub roots: Vec<PathBuf>,
    /// Alias table: when a reference's first path component matches a key,
    /// the component is rewritten to the mapped directory before resolution.
    pub aliases: HashMap<String, PathBuf>,
    pub encoding: OutputEncoding,
    /// Collapse whitespace-only text between elements in the loaded SVG.
    pub optimize: bool,
    /// File-extension allowlist (compared case-insensitively).
    pub extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            aliases: HashMap::new(),
            encoding: OutputEncoding::default(),
            optimize: false,
            extensions: vec!["svg".to_string()],
        }
    }
}
