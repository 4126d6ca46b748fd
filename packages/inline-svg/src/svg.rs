//! SVG document rewriting: selector filtering, style injection, and
//! re-serialization.
//!
//! Filtering understands simple compound selectors only: `tag`, `#id`,
//! `.class`, and combinations like `path.warn`. An element is kept when it
//! matches a filter, or when a matching element sits among its ancestors or
//! descendants (so matched subtrees stay intact and reachable). An empty
//! filter set keeps the whole document. Comments and processing
//! instructions are always dropped.

use crate::error::LoadError;

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorFilter {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl SelectorFilter {
    /// Parse a compound selector. Returns `None` for syntax outside the
    /// supported subset (combinators, attributes, pseudo-classes).
    pub fn parse(selector: &str) -> Option<Self> {
        let token = selector.trim();
        if token.is_empty() || token.contains(char::is_whitespace) {
            return None;
        }
        if token
            .contains(|c| matches!(c, ':' | '[' | ']' | '>' | '+' | '~' | ','))
        {
            return None;
        }
        if token == "*" {
            return Some(Self::default());
        }

        let bytes = token.as_bytes();
        let mut filter = Self::default();
        let mut i = 0usize;

        if is_ident_start(bytes[0]) {
            let start = i;
            while i < bytes.len() && is_ident_char(bytes[i]) {
                i += 1;
            }
            filter.tag = Some(token[start..i].to_string());
        }

        while i < bytes.len() {
            let marker = bytes[i];
            i += 1;
            let start = i;
            while i < bytes.len() && is_ident_char(bytes[i]) {
                i += 1;
            }
            if start == i {
                return None;
            }
            match marker {
                b'.' => filter.classes.push(token[start..i].to_string()),
                b'#' => {
                    if filter.id.is_some() {
                        return None;
                    }
                    filter.id = Some(token[start..i].to_string());
                }
                _ => return None,
            }
        }

        if filter == Self::default() {
            return None;
        }
        Some(filter)
    }

    fn matches(&self, node: roxmltree::Node<'_, '_>) -> bool {
        if let Some(tag) = &self.tag {
            if !node.tag_name().name().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if node.attribute("id") != Some(id.as_str()) {
                return false;
            }
        }
        for class in &self.classes {
            let Some(classes) = node.attribute("class") else {
                return false;
            };
            if !classes.split_whitespace().any(|c| c == class) {
                return false;
            }
        }
        true
    }
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_char(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, b'_' | b'-')
}

/// Load-side transform: parse, filter, inject style, serialize.
pub(crate) fn rewrite(
    svg: &str,
    filters: &[SelectorFilter],
    style: Option<&str>,
    optimize: bool,
) -> Result<String, LoadError> {
    let doc = roxmltree::Document::parse(svg)?;
    let root = doc.root_element();
    if !root.tag_name().name().eq_ignore_ascii_case("svg") {
        return Err(LoadError::NotSvg);
    }

    let mut out = String::with_capacity(svg.len());
    write_element(&mut out, root, filters, style, optimize, true);
    Ok(out)
}

fn kept(node: roxmltree::Node<'_, '_>, filters: &[SelectorFilter]) -> bool {
    if filters.is_empty() {
        return true;
    }
    let matches = |n: roxmltree::Node<'_, '_>| filters.iter().any(|f| f.matches(n));
    // ancestors() and descendants() both include the node itself.
    node.ancestors().filter(|n| n.is_element()).any(matches)
        || node.descendants().filter(|n| n.is_element()).any(matches)
}

fn write_element(
    out: &mut String,
    node: roxmltree::Node<'_, '_>,
    filters: &[SelectorFilter],
    style: Option<&str>,
    optimize: bool,
    is_root: bool,
) {
    out.push('<');
    let tag = qualified_name(node);
    out.push_str(&tag);

    if is_root {
        for ns in node.namespaces() {
            if ns.uri() == XML_NS {
                continue;
            }
            match ns.name() {
                Some(prefix) => {
                    out.push_str(&format!(" xmlns:{prefix}=\"{}\"", ns.uri()));
                }
                None => {
                    out.push_str(&format!(" xmlns=\"{}\"", ns.uri()));
                }
            }
        }
    }

    for attr in node.attributes() {
        let value = html_escape::encode_double_quoted_attribute(attr.value());
        match attr.namespace().and_then(|uri| node.lookup_prefix(uri)) {
            Some(prefix) => out.push_str(&format!(" {prefix}:{}=\"{value}\"", attr.name())),
            None => out.push_str(&format!(" {}=\"{value}\"", attr.name())),
        }
    }

    let injected = if is_root { style } else { None };
    let mut children = String::new();
    for child in node.children() {
        if child.is_element() {
            if kept(child, filters) {
                write_element(&mut children, child, filters, None, optimize, false);
            }
        } else if child.is_text() {
            let text = child.text().unwrap_or_default();
            if optimize && text.trim().is_empty() {
                continue;
            }
            children.push_str(&html_escape::encode_text(text));
        }
    }

    if injected.is_none() && children.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    if let Some(style) = injected {
        out.push_str("<style>");
        out.push_str(style);
        out.push_str("</style>");
    }
    out.push_str(&children);
    out.push_str(&format!("</{tag}>"));
}

fn qualified_name(node: roxmltree::Node<'_, '_>) -> String {
    let name = node.tag_name().name();
    match node
        .tag_name()
        .namespace()
        .and_then(|uri| node.lookup_prefix(uri))
    {
        Some(prefix) => format!("{prefix}:{name}"),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ICONS: &str = concat!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 10 10\">\n",
        "    <path class=\"warn\" d=\"M0 0\"/>\n",
        "    <g id=\"logo\"><circle r=\"4\"/></g>\n",
        "    <rect width=\"1\" height=\"1\"/>\n",
        "</svg>"
    );

    fn filters(selectors: &[&str]) -> Vec<SelectorFilter> {
        selectors
            .iter()
            .map(|s| SelectorFilter::parse(s).unwrap())
            .collect()
    }

    #[test]
    fn parses_supported_selector_subset() {
        assert!(SelectorFilter::parse("path").is_some());
        assert!(SelectorFilter::parse("#logo").is_some());
        assert!(SelectorFilter::parse(".warn").is_some());
        assert!(SelectorFilter::parse("path.warn").is_some());
        assert!(SelectorFilter::parse("*").is_some());

        assert!(SelectorFilter::parse("").is_none());
        assert!(SelectorFilter::parse("g circle").is_none());
        assert!(SelectorFilter::parse("path:hover").is_none());
        assert!(SelectorFilter::parse("[fill]").is_none());
    }

    #[test]
    fn empty_filter_set_keeps_everything() {
        let out = rewrite(ICONS, &[], None, true).unwrap();
        assert!(out.contains("<path"));
        assert!(out.contains("<circle"));
        assert!(out.contains("<rect"));
    }

    #[test]
    fn class_filter_restricts_elements() {
        let out = rewrite(ICONS, &filters(&[".warn"]), None, true).unwrap();
        assert!(out.contains("<path"));
        assert!(!out.contains("<circle"));
        assert!(!out.contains("<rect"));
    }

    #[test]
    fn id_filter_keeps_matched_subtree() {
        let out = rewrite(ICONS, &filters(&["#logo"]), None, true).unwrap();
        assert!(out.contains("<g id=\"logo\">"));
        assert!(out.contains("<circle"), "descendants of a match are kept");
        assert!(!out.contains("<path"));
    }

    #[test]
    fn style_is_injected_as_first_child_of_root() {
        let out = rewrite(ICONS, &[], Some("svg { fill: red; }"), true).unwrap();
        let open_end = out.find('>').unwrap();
        assert_eq!(
            &out[open_end + 1..open_end + 8],
            "<style>",
            "style block must directly follow the root open tag: {out}"
        );
        assert!(out.contains("<style>svg { fill: red; }</style>"));
    }

    #[test]
    fn optimize_collapses_inter_element_whitespace() {
        let pretty = rewrite(ICONS, &[], None, false).unwrap();
        let compact = rewrite(ICONS, &[], None, true).unwrap();
        assert!(pretty.contains('\n'));
        assert!(!compact.contains('\n'));
    }

    #[test]
    fn root_namespace_is_preserved() {
        let out = rewrite(ICONS, &[], None, true).unwrap();
        assert!(out.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
    }

    #[test]
    fn rejects_non_svg_documents() {
        assert!(matches!(
            rewrite("<html><body/></html>", &[], None, false),
            Err(LoadError::NotSvg)
        ));
        assert!(matches!(
            rewrite("not xml at all", &[], None, false),
            Err(LoadError::Parse(_))
        ));
    }

    #[test]
    fn escapes_text_and_attribute_content() {
        let svg = "<svg xmlns=\"http://www.w3.org/2000/svg\"><text data-x=\"a&quot;b\">1 &lt; 2</text></svg>";
        let out = rewrite(svg, &[], None, false).unwrap();
        assert!(out.contains("data-x=\"a&quot;b\""));
        assert!(out.contains("1 &lt; 2"));
    }
}
