//! Reference resolution: map `(base file, reference, config)` to a concrete
//! file path.
//!
//! Resolution order: alias table, already-absolute paths, relative to the
//! stylesheet's directory, then each configured root. The first candidate
//! that is an existing regular file wins. The resolver only stats candidate
//! paths; it never reads them.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::InlineError;

/// A target reference split into its path part and query-style modifiers.
/// Modifier syntax: `path.svg?select=<selector>,<selector>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reference {
    pub path: String,
    pub select: Vec<String>,
}

pub(crate) fn split_modifiers(raw: &str) -> Reference {
    let Some((path, query)) = raw.split_once('?') else {
        return Reference {
            path: raw.to_string(),
            select: Vec::new(),
        };
    };

    let mut select = Vec::new();
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some(("select", value)) => {
                select.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string),
                );
            }
            _ => {
                tracing::debug!(modifier = pair, "ignoring unrecognized reference modifier");
            }
        }
    }

    Reference {
        path: path.to_string(),
        select,
    }
}

pub(crate) fn resolve(
    base_file: Option<&Path>,
    reference: &str,
    config: &Config,
) -> Result<PathBuf, InlineError> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(InlineError::UnresolvedReference(reference.to_string()));
    }

    if !extension_allowed(reference, config) {
        return Err(InlineError::UnresolvedReference(reference.to_string()));
    }

    for candidate in candidates(base_file, reference, config) {
        if is_readable_file(&candidate) {
            return Ok(candidate);
        }
    }

    Err(InlineError::UnresolvedReference(reference.to_string()))
}

fn candidates(base_file: Option<&Path>, reference: &str, config: &Config) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let path = Path::new(reference);

    // Alias rewrite is consulted before any other strategy.
    if let Some((first, rest)) = split_first_component(reference) {
        if let Some(target) = config.aliases.get(first) {
            out.push(match rest {
                Some(rest) => target.join(rest),
                None => target.clone(),
            });
        }
    }

    if path.is_absolute() {
        out.push(path.to_path_buf());
        return out;
    }

    if let Some(dir) = base_file.and_then(Path::parent) {
        out.push(dir.join(path));
    }
    for root in &config.roots {
        out.push(root.join(path));
    }
    out
}

fn split_first_component(reference: &str) -> Option<(&str, Option<&str>)> {
    let trimmed = reference.trim_start_matches('/');
    match trimmed.split_once('/') {
        Some((first, rest)) if !first.is_empty() => Some((first, Some(rest))),
        None if !trimmed.is_empty() => Some((trimmed, None)),
        _ => None,
    }
}

fn extension_allowed(reference: &str, config: &Config) -> bool {
    let Some(ext) = Path::new(reference).extension().and_then(|e| e.to_str()) else {
        return false;
    };
    config
        .extensions
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(ext))
}

fn is_readable_file(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}
