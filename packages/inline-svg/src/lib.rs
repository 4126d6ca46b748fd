//! Inline SVG files referenced from CSS.
//!
//! A single pass over a parsed stylesheet tree ([`css_tree::Root`]) that:
//!
//! 1. **Scans** the tree for `@svg-load` directives and for `svg-load()` /
//!    `svg-inline()` / `svg-ref()` calls inside declaration values,
//! 2. **Loads** every referenced file concurrently (one fetch per defined
//!    name, one per self-contained occurrence), restyling and encoding each
//!    per [`Config`],
//! 3. **Applies** the results after *all* loads have settled: directive
//!    nodes are removed, call sites are overwritten with `url(...)` values.
//!
//! Every failure is per-occurrence: it becomes a [`Warning`] attached to the
//! causing node, and that node is left exactly as written. The pass itself
//! never fails.
//!
//! ```no_run
//! # async fn demo() {
//! use inline_svg::{process, Config};
//!
//! let css = "a { background: svg-inline(\"icon.svg\"); }";
//! let mut root = css_tree::Root::parse_with_file(css, "styles/app.css").unwrap();
//! let output = process(&mut root, &Config::default()).await;
//! assert!(output.warnings.is_empty());
//! # }
//! ```

mod config;
mod directive;
mod error;
mod load;
mod resolve;
mod svg;
mod value;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use futures::future::join_all;

pub use config::{Config, OutputEncoding};
pub use css_tree;
pub use error::{InlineError, LoadError};
pub use load::{FsSource, SvgSource};

use css_tree::{Node, NodeId, Root, SourceLocation};

use crate::svg::SelectorFilter;
use crate::value::{InlineCall, ParsedValue, contains_call};

/// A non-fatal problem attached to the node that caused it.
#[derive(Debug, Clone)]
pub struct Warning {
    pub node: NodeId,
    pub location: Option<SourceLocation>,
    pub message: String,
}

/// A build-dependency record: `file` was inlined into the stylesheet
/// `parent`. Hosts feed these into incremental-build tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub file: PathBuf,
    pub parent: Option<PathBuf>,
}

/// Result of one pass: the tree itself is mutated in place.
#[derive(Debug, Default)]
pub struct Output {
    pub warnings: Vec<Warning>,
    pub dependencies: Vec<Dependency>,
}

/// One unit of concurrent work. Directives own removable records;
/// self-contained inline calls own non-removable ones. By-name occurrences
/// share the record of the directive they reference.
struct LoaderRecord {
    path: PathBuf,
    filters: Vec<SelectorFilter>,
    style: Option<String>,
    node: NodeId,
    location: Option<SourceLocation>,
    removable: bool,
}

/// One call site to overwrite: a slot in a parsed value, fed by a loader.
struct Inliner {
    loader: usize,
    value: usize,
    slot: usize,
}

struct ValueRecord {
    decl: NodeId,
    parsed: ParsedValue,
}

#[derive(Default)]
struct Scan {
    loaders: Vec<LoaderRecord>,
    inliners: Vec<Inliner>,
    values: Vec<ValueRecord>,
}

/// Run the pass with the default filesystem source.
pub async fn process(root: &mut Root, config: &Config) -> Output {
    process_with_source(root, config, &FsSource).await
}

/// Run the pass with a caller-supplied [`SvgSource`].
pub async fn process_with_source(
    root: &mut Root,
    config: &Config,
    source: &dyn SvgSource,
) -> Output {
    let mut output = Output::default();
    let mut scan = scan_tree(root, config, &mut output);

    tracing::debug!(
        loaders = scan.loaders.len(),
        inliners = scan.inliners.len(),
        "scan complete"
    );

    // Loading: dispatch in task order, settle all before touching the tree.
    // One task's failure never cancels the others.
    let loads = scan
        .loaders
        .iter()
        .map(|record| load::load(source, &record.path, &record.filters, record.style.as_deref(), config));
    let results = join_all(loads).await;

    let parent = root.file.clone();
    let mut payloads: Vec<Option<String>> = Vec::with_capacity(results.len());
    for (record, result) in scan.loaders.iter().zip(results) {
        match result {
            Ok(payload) => {
                tracing::debug!(file = %record.path.display(), "inlined svg");
                output.dependencies.push(Dependency {
                    file: record.path.clone(),
                    parent: parent.clone(),
                });
                payloads.push(Some(payload));
            }
            Err(source) => {
                tracing::warn!(file = %record.path.display(), error = %source, "svg load failed");
                let error = InlineError::LoadFailure {
                    path: record.path.clone(),
                    source,
                };
                output
                    .warnings
                    .push(warning(record.node, record.location, &error));
                payloads.push(None);
            }
        }
    }

    // Applying: three ordered sub-passes. Errored records leave their nodes
    // exactly as written.
    for (record, payload) in scan.loaders.iter().zip(&payloads) {
        if record.removable && payload.is_some() {
            root.remove(record.node);
        }
    }
    for inliner in &scan.inliners {
        if let Some(payload) = &payloads[inliner.loader] {
            scan.values[inliner.value]
                .parsed
                .fill(inliner.slot, format!("url({payload})"));
        }
    }
    for record in &scan.values {
        if record.parsed.any_filled() {
            if let Some(decl) = root.declaration_mut(record.decl) {
                decl.value = record.parsed.to_css_string();
            }
        }
    }

    output
}

/// Single forward walk: build the loader/inliner work lists and the named
/// registry. The registry is written only here and never after.
fn scan_tree(root: &Root, config: &Config, output: &mut Output) -> Scan {
    let base_file = root.file.clone();
    let base = base_file.as_deref();

    let mut scan = Scan::default();
    let mut registry: HashMap<String, usize> = HashMap::new();
    let warnings = &mut output.warnings;

    root.walk(&mut |node| match node {
        Node::AtRule(at) if at.name.eq_ignore_ascii_case("svg-load") => {
            match directive::parse_define(&at.params) {
                Ok(params) => {
                    let reference = resolve::split_modifiers(&params.reference);
                    let modifiers = directive::parse_modifiers(at.block.as_deref().unwrap_or(&[]));
                    let filters =
                        collect_filters(modifiers.select.iter().chain(reference.select.iter()));
                    match resolve::resolve(base, &reference.path, config) {
                        Ok(path) => {
                            registry.insert(params.name, scan.loaders.len());
                            scan.loaders.push(LoaderRecord {
                                path,
                                filters,
                                style: modifiers.style,
                                node: at.id,
                                location: at.location,
                                removable: true,
                            });
                        }
                        Err(error) => warnings.push(warning(at.id, at.location, &error)),
                    }
                }
                Err(error) => warnings.push(warning(at.id, at.location, &error)),
            }
        }
        Node::Declaration(decl) if contains_call(&decl.value) => {
            match ParsedValue::parse(&decl.value) {
                Ok(parsed) => {
                    let calls: Vec<(usize, InlineCall)> =
                        parsed.calls().map(|(slot, call)| (slot, call.clone())).collect();
                    let value_index = scan.values.len();
                    scan.values.push(ValueRecord {
                        decl: decl.id,
                        parsed,
                    });

                    for (slot, call) in calls {
                        match call {
                            InlineCall::Define {
                                name,
                                reference,
                                style,
                            } => add_self_contained(
                                &mut scan, &mut registry, warnings, base, config, decl.id,
                                decl.location, value_index, slot, Some(name), reference, style,
                            ),
                            InlineCall::Inline { reference, style } => add_self_contained(
                                &mut scan, &mut registry, warnings, base, config, decl.id,
                                decl.location, value_index, slot, None, reference, style,
                            ),
                            InlineCall::Ref { name } => match registry.get(&name) {
                                Some(&loader) => scan.inliners.push(Inliner {
                                    loader,
                                    value: value_index,
                                    slot,
                                }),
                                None => warnings.push(warning(
                                    decl.id,
                                    decl.location,
                                    &InlineError::UndefinedName(name),
                                )),
                            },
                        }
                    }
                }
                Err(error) => warnings.push(warning(decl.id, decl.location, &error)),
            }
        }
        _ => {}
    });

    scan
}

#[allow(clippy::too_many_arguments)]
fn add_self_contained(
    scan: &mut Scan,
    registry: &mut HashMap<String, usize>,
    warnings: &mut Vec<Warning>,
    base: Option<&Path>,
    config: &Config,
    node: NodeId,
    location: Option<SourceLocation>,
    value_index: usize,
    slot: usize,
    name: Option<String>,
    reference: String,
    style: Option<String>,
) {
    let reference = resolve::split_modifiers(&reference);
    let filters = collect_filters(reference.select.iter());
    match resolve::resolve(base, &reference.path, config) {
        Ok(path) => {
            let loader = scan.loaders.len();
            if let Some(name) = name {
                registry.insert(name, loader);
            }
            scan.loaders.push(LoaderRecord {
                path,
                filters,
                style,
                node,
                location,
                removable: false,
            });
            scan.inliners.push(Inliner {
                loader,
                value: value_index,
                slot,
            });
        }
        Err(error) => warnings.push(warning(node, location, &error)),
    }
}

fn collect_filters<'a>(selectors: impl Iterator<Item = &'a String>) -> Vec<SelectorFilter> {
    selectors
        .filter_map(|selector| {
            let filter = SelectorFilter::parse(selector);
            if filter.is_none() {
                tracing::debug!(selector, "skipping unsupported selector filter");
            }
            filter
        })
        .collect()
}

fn warning(node: NodeId, location: Option<SourceLocation>, error: &InlineError) -> Warning {
    Warning {
        node,
        location,
        message: error.to_string(),
    }
}
