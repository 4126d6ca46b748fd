//! Asynchronous loading of resolved SVG files.
//!
//! File access goes through the [`SvgSource`] trait so hosts and tests can
//! substitute their own reader; [`FsSource`] is the default and reads with
//! `tokio::fs`. Each call is idempotent and uncached; the orchestrator is
//! responsible for issuing one load per defined name.

use std::path::Path;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::config::{Config, OutputEncoding};
use crate::error::LoadError;
use crate::svg::{self, SelectorFilter};

/// Byte set percent-encoded in data URLs. Mirrors the characters that are
/// unsafe inside a double-quoted CSS `url()` payload.
const DATA_URL_ENCODE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'{')
    .add(b'}')
    .add(b'\'')
    .add(b'&')
    .add(b'\\');

/// Provider of SVG file content.
#[async_trait]
pub trait SvgSource: Send + Sync {
    async fn read(&self, path: &Path) -> std::io::Result<String>;
}

/// Default source: the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSource;

#[async_trait]
impl SvgSource for FsSource {
    async fn read(&self, path: &Path) -> std::io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}

/// Produce the final inlined payload for one occurrence: read, filter,
/// inject style, serialize, encode.
pub(crate) async fn load(
    source: &dyn SvgSource,
    path: &Path,
    filters: &[SelectorFilter],
    style: Option<&str>,
    config: &Config,
) -> Result<String, LoadError> {
    let text = source.read(path).await?;
    let markup = svg::rewrite(&text, filters, style, config.optimize)?;

    Ok(match config.encoding {
        OutputEncoding::Literal => markup,
        OutputEncoding::DataUrl => format!(
            "\"data:image/svg+xml;charset=utf-8,{}\"",
            utf8_percent_encode(&markup, DATA_URL_ENCODE)
        ),
    })
}
