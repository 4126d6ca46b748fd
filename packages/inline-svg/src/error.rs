//! Error taxonomy for the inlining pass.
//!
//! Every variant is non-fatal: the orchestrator converts each into a
//! [`Warning`](crate::Warning) attached to the node that caused it and leaves
//! that node exactly as written. The pass itself has no failure path.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InlineError {
    /// The `@svg-load` parameter text does not match `<name> <reference>`.
    #[error("malformed @svg-load directive: {0}")]
    MalformedDirective(String),

    /// A declaration value containing inline calls could not be tokenized,
    /// or a call's argument list is invalid.
    #[error("malformed declaration value: {0}")]
    MalformedValue(String),

    /// No configured root, alias, or base-relative candidate names an
    /// existing readable file.
    #[error("cannot resolve \"{0}\"")]
    UnresolvedReference(String),

    /// Reading or transforming the resolved file failed.
    #[error("failed to load {}: {source}", path.display())]
    LoadFailure {
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    /// `svg-ref(name)` names a directive that was not defined earlier in
    /// document order.
    #[error("\"{0}\" svg is not defined")]
    UndefinedName(String),
}

/// Failure inside the loader proper.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("read error: {0}")]
    Read(#[from] std::io::Error),

    #[error("invalid svg: {0}")]
    Parse(#[from] roxmltree::Error),

    /// The file parsed as XML but its root element is not `<svg>`.
    #[error("not an svg document")]
    NotSvg,
}
