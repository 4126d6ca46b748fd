//! Parsing of the `@svg-load` directive.
//!
//! The parameter text must match `<name> <reference>` where `<name>` is a
//! bare identifier and `<reference>` is a quoted string, a `url(...)` token,
//! or a bare path. The directive block contributes modifiers: a `select`
//! declaration lists selector filters, every other declaration or nested
//! rule becomes injected style text.

use cssparser::{ParseError, Parser, ParserInput, Token};
use css_tree::Node;

use crate::error::InlineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DefineParams {
    pub name: String,
    pub reference: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DirectiveModifiers {
    pub select: Vec<String>,
    pub style: Option<String>,
}

pub(crate) fn parse_define(params: &str) -> Result<DefineParams, InlineError> {
    let mut input = ParserInput::new(params);
    let mut parser = Parser::new(&mut input);

    let name = parser
        .expect_ident()
        .map_err(|_| malformed(params, "expected a name identifier"))?
        .as_ref()
        .to_string();

    let start = parser.position();
    let token = parser
        .next()
        .map_err(|_| malformed(params, "missing reference"))?
        .clone();

    let reference = match token {
        Token::QuotedString(s) | Token::UnquotedUrl(s) => {
            let reference = s.as_ref().to_string();
            expect_end(&mut parser, params)?;
            reference
        }
        Token::Function(f) if f.eq_ignore_ascii_case("url") => {
            let nested: Result<String, ParseError<'_, ()>> =
                parser.parse_nested_block(|p| Ok(p.expect_string()?.as_ref().to_string()));
            let reference = nested.map_err(|_| malformed(params, "invalid url() reference"))?;
            expect_end(&mut parser, params)?;
            reference
        }
        Token::BadString(_) | Token::BadUrl(_) => {
            return Err(malformed(params, "unbalanced quoting in reference"));
        }
        _ => {
            // Bare reference: take the raw remainder, which must be a single
            // whitespace-free path.
            loop {
                match parser.next_including_whitespace() {
                    Ok(Token::BadString(_)) | Ok(Token::BadUrl(_)) => {
                        return Err(malformed(params, "unbalanced quoting in reference"));
                    }
                    Ok(_) => {}
                    Err(_) => break,
                }
            }
            let raw = parser.slice_from(start).trim();
            if raw.is_empty() || raw.split_whitespace().count() != 1 {
                return Err(malformed(params, "expected a single reference"));
            }
            raw.to_string()
        }
    };

    if reference.trim().is_empty() {
        return Err(malformed(params, "empty reference"));
    }

    Ok(DefineParams { name, reference })
}

fn expect_end(parser: &mut Parser<'_, '_>, params: &str) -> Result<(), InlineError> {
    parser
        .expect_exhausted()
        .map_err(|_| malformed(params, "unexpected trailing content"))
}

fn malformed(params: &str, reason: &str) -> InlineError {
    InlineError::MalformedDirective(format!("{reason} in \"{params}\""))
}

/// Extract selector filters and style text from a directive block. Absence
/// of either is valid.
pub(crate) fn parse_modifiers(block: &[Node]) -> DirectiveModifiers {
    let mut select = Vec::new();
    let mut root_decls = String::new();
    let mut style = String::new();

    for node in block {
        match node {
            Node::Declaration(decl) if decl.property.eq_ignore_ascii_case("select") => {
                select.extend(
                    decl.value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string),
                );
            }
            Node::Declaration(decl) => {
                root_decls.push_str(&format!("{}: {}; ", decl.property, decl.value));
            }
            Node::Rule(rule) => {
                style.push_str(&format!("{} {{ ", rule.selector));
                for inner in &rule.nodes {
                    if let Node::Declaration(decl) = inner {
                        style.push_str(&format!("{}: {}; ", decl.property, decl.value));
                    }
                }
                style.push_str("} ");
            }
            Node::AtRule(_) => {}
        }
    }

    // Bare declarations apply to the root element.
    let mut combined = String::new();
    if !root_decls.is_empty() {
        combined.push_str(&format!("svg {{ {root_decls}}} "));
    }
    combined.push_str(&style);

    DirectiveModifiers {
        select,
        style: if combined.trim().is_empty() {
            None
        } else {
            Some(combined.trim_end().to_string())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use css_tree::{Declaration, Rule};

    #[test]
    fn parses_quoted_reference() {
        let params = parse_define("nav \"img/nav.svg\"").unwrap();
        assert_eq!(params.name, "nav");
        assert_eq!(params.reference, "img/nav.svg");
    }

    #[test]
    fn parses_url_and_bare_references() {
        let params = parse_define("icon url(img/icon.svg)").unwrap();
        assert_eq!(params.reference, "img/icon.svg");

        let params = parse_define("icon url(\"img/icon.svg\")").unwrap();
        assert_eq!(params.reference, "img/icon.svg");
    }

    #[test]
    fn whitespace_does_not_change_the_result() {
        for params in ["a \"b.svg\"", "  a   \"b.svg\"  ", "a\t\"b.svg\""] {
            let parsed = parse_define(params).unwrap();
            assert_eq!(parsed.name, "a", "params: {params:?}");
            assert_eq!(parsed.reference, "b.svg", "params: {params:?}");
        }
    }

    #[test]
    fn rejects_malformed_params() {
        for params in [
            "",
            "onlyname",
            "\"ref-without-name.svg\"",
            "name \"a.svg\" extra",
            "name a.svg b.svg",
        ] {
            assert!(
                matches!(parse_define(params), Err(InlineError::MalformedDirective(_))),
                "params: {params:?}"
            );
        }
    }

    #[test]
    fn modifiers_extract_select_and_style() {
        let block = vec![
            Node::Declaration(Declaration::new("select", "path, .warn")),
            Node::Declaration(Declaration::new("fill", "#cfc")),
            Node::Rule(Rule::new(
                "path:nth-child(2)",
                vec![Node::Declaration(Declaration::new("fill", "#ff0"))],
            )),
        ];

        let modifiers = parse_modifiers(&block);
        assert_eq!(modifiers.select, vec!["path", ".warn"]);
        assert_eq!(
            modifiers.style.as_deref(),
            Some("svg { fill: #cfc; } path:nth-child(2) { fill: #ff0; }")
        );
    }

    #[test]
    fn empty_block_yields_no_modifiers() {
        assert_eq!(parse_modifiers(&[]), DirectiveModifiers::default());
    }
}
