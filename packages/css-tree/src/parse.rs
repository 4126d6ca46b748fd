//! CSS parsing on top of `cssparser`'s rule/declaration traits.
//!
//! Preludes, at-rule params and declaration values are captured as raw source
//! slices rather than token streams. Consumers that care about value grammar
//! (e.g. inline function calls) re-tokenize the slice themselves.

use std::path::PathBuf;

use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, SourceLocation, StyleSheetParser,
    Token,
};
use thiserror::Error;

use crate::{AtRule, Declaration, Node, NodeId, Root, Rule};

/// A syntax error that aborted the parse.
#[derive(Debug, Clone, Error)]
#[error("CSS parse error at {line}:{column}: {message}")]
pub struct CssError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

pub(crate) fn parse(css: &str, file: Option<PathBuf>) -> Result<Root, CssError> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut tree_parser = TreeParser;

    let mut nodes = Vec::new();
    for result in StyleSheetParser::new(&mut parser, &mut tree_parser) {
        match result {
            Ok(node) => nodes.push(node),
            Err((error, _slice)) => return Err(css_error(&error)),
        }
    }

    Ok(Root { nodes, file })
}

fn css_error<E: std::fmt::Debug>(error: &ParseError<'_, E>) -> CssError {
    CssError {
        message: format!("{:?}", error.kind),
        line: error.location.line,
        column: error.location.column,
    }
}

/// Consume the rest of `input` and return it as trimmed raw source text.
/// Unconsumed nested blocks are skipped by the tokenizer, so the slice spans
/// complete `(...)` / `[...]` groups. Unterminated strings and urls surface
/// as `BadString` / `BadUrl` tokens and are rejected here.
fn raw_remainder<'i>(input: &mut Parser<'i, '_>) -> Result<&'i str, ParseError<'i, ()>> {
    let start = input.position();
    loop {
        match input.next_including_whitespace() {
            Ok(Token::BadString(_)) | Ok(Token::BadUrl(_)) => {
                return Err(input.new_custom_error(()));
            }
            Ok(_) => {}
            Err(_) => break,
        }
    }
    Ok(input.slice_from(start).trim())
}

struct TreeParser;

impl<'i> QualifiedRuleParser<'i> for TreeParser {
    type Prelude = (String, SourceLocation);
    type QualifiedRule = Node;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let location = input.current_source_location();
        let selector = raw_remainder(input)?;
        if selector.is_empty() {
            return Err(input.new_custom_error(()));
        }
        Ok((selector.to_string(), location))
    }

    fn parse_block<'t>(
        &mut self,
        (selector, location): Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let nodes = parse_body(input)?;
        Ok(Node::Rule(Rule {
            id: NodeId::next(),
            selector,
            nodes,
            location: Some(location),
        }))
    }
}

impl<'i> AtRuleParser<'i> for TreeParser {
    type Prelude = (String, String, SourceLocation);
    type AtRule = Node;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let location = input.current_source_location();
        let params = raw_remainder(input)?;
        Ok((name.as_ref().to_string(), params.to_string(), location))
    }

    fn parse_block<'t>(
        &mut self,
        (name, params, location): Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        let nodes = parse_body(input)?;
        Ok(Node::AtRule(AtRule {
            id: NodeId::next(),
            name,
            params,
            block: Some(nodes),
            location: Some(location),
        }))
    }

    fn rule_without_block(
        &mut self,
        (name, params, location): Self::Prelude,
        _start: &ParserState,
    ) -> Result<Self::AtRule, ()> {
        Ok(Node::AtRule(AtRule {
            id: NodeId::next(),
            name,
            params,
            block: None,
            location: Some(location),
        }))
    }
}

impl<'i> DeclarationParser<'i> for TreeParser {
    type Declaration = Node;
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let location = input.current_source_location();
        let value = raw_remainder(input)?;
        Ok(Node::Declaration(Declaration {
            id: NodeId::next(),
            property: name.as_ref().to_string(),
            value: value.to_string(),
            location: Some(location),
        }))
    }
}

impl<'i> RuleBodyItemParser<'i, Node, ()> for TreeParser {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        true
    }
}

fn parse_body<'i>(input: &mut Parser<'i, '_>) -> Result<Vec<Node>, ParseError<'i, ()>> {
    let mut body_parser = TreeParser;
    let mut nodes = Vec::new();
    let iter = RuleBodyParser::new(input, &mut body_parser);
    for result in iter {
        match result {
            Ok(node) => nodes.push(node),
            Err((error, _slice)) => return Err(error),
        }
    }
    Ok(nodes)
}
