//! Parsing of inline calls embedded in declaration values.
//!
//! A value is split into raw text spans interleaved with *slots*, one slot
//! per recognized call. Three call forms are recognized:
//!
//! - `svg-load(<name>, <reference> [, <style>])` — declares `<name>` and
//!   uses the reference in place,
//! - `svg-inline(<reference> [, <style>])` — self-contained inline load,
//! - `svg-ref(<name>)` — by-name use of an earlier definition.
//!
//! Unrecognized functions and arbitrary surrounding text pass through as raw
//! spans. A slot that is never filled serializes as its original source
//! text, so dropped or failed occurrences round-trip byte-identically.

use cssparser::{ParseError, ParseErrorKind, Parser, ParserInput, Token};

use crate::error::InlineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InlineCall {
    Define {
        name: String,
        reference: String,
        style: Option<String>,
    },
    Inline {
        reference: String,
        style: Option<String>,
    },
    Ref {
        name: String,
    },
}

#[derive(Debug)]
struct Slot {
    raw: String,
    call: InlineCall,
    filled: Option<String>,
}

#[derive(Debug)]
enum Segment {
    Raw(String),
    Slot(usize),
}

/// A declaration value parsed into an editable segment list.
#[derive(Debug)]
pub(crate) struct ParsedValue {
    segments: Vec<Segment>,
    slots: Vec<Slot>,
}

/// Cheap pre-filter, checked before running the full parser on a value.
pub(crate) fn contains_call(value: &str) -> bool {
    ["svg-load(", "svg-inline(", "svg-ref("]
        .iter()
        .any(|needle| value.contains(needle))
}

impl ParsedValue {
    pub fn parse(value: &str) -> Result<Self, InlineError> {
        let mut input = ParserInput::new(value);
        let mut parser = Parser::new(&mut input);

        let mut segments = Vec::new();
        let mut slots = Vec::new();
        let mut raw_start = parser.position();

        loop {
            let before = parser.position();
            let token = match parser.next_including_whitespace() {
                Ok(token) => token.clone(),
                Err(_) => break,
            };
            match token {
                Token::Function(ref name) => {
                    let Some(kind) = CallKind::from_name(name.as_ref()) else {
                        // Unrecognized function: its block is skipped by the
                        // tokenizer and surfaces in the next raw span.
                        continue;
                    };

                    let leading = parser.slice(raw_start..before);
                    if !leading.is_empty() {
                        segments.push(Segment::Raw(leading.to_string()));
                    }

                    let call = parser
                        .parse_nested_block(|p| parse_call(kind, p))
                        .map_err(|e| malformed_value(value, &e))?;

                    let raw = parser.slice_from(before);
                    if !raw.trim_end().ends_with(')') {
                        return Err(InlineError::MalformedValue(format!(
                            "missing closing parenthesis in \"{value}\""
                        )));
                    }

                    slots.push(Slot {
                        raw: raw.to_string(),
                        call,
                        filled: None,
                    });
                    segments.push(Segment::Slot(slots.len() - 1));
                    raw_start = parser.position();
                }
                Token::BadString(_) | Token::BadUrl(_) => {
                    return Err(InlineError::MalformedValue(format!(
                        "unbalanced quoting in \"{value}\""
                    )));
                }
                _ => {}
            }
        }

        let tail = parser.slice_from(raw_start);
        if !tail.is_empty() {
            segments.push(Segment::Raw(tail.to_string()));
        }

        Ok(Self { segments, slots })
    }

    /// The recognized calls, in source order. Indices are slot ids usable
    /// with [`fill`](Self::fill).
    pub fn calls(&self) -> impl Iterator<Item = (usize, &InlineCall)> {
        self.slots.iter().enumerate().map(|(i, s)| (i, &s.call))
    }

    /// Overwrite the slot's placeholder with replacement text.
    pub fn fill(&mut self, slot: usize, replacement: String) {
        self.slots[slot].filled = Some(replacement);
    }

    pub fn any_filled(&self) -> bool {
        self.slots.iter().any(|slot| slot.filled.is_some())
    }

    /// Re-serialize the value. Unfilled slots emit their original text.
    pub fn to_css_string(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Raw(text) => out.push_str(text),
                Segment::Slot(index) => {
                    let slot = &self.slots[*index];
                    out.push_str(slot.filled.as_deref().unwrap_or(&slot.raw));
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Define,
    Inline,
    Ref,
}

impl CallKind {
    fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("svg-load") {
            Some(Self::Define)
        } else if name.eq_ignore_ascii_case("svg-inline") {
            Some(Self::Inline)
        } else if name.eq_ignore_ascii_case("svg-ref") {
            Some(Self::Ref)
        } else {
            None
        }
    }
}

fn parse_call<'i>(
    kind: CallKind,
    p: &mut Parser<'i, '_>,
) -> Result<InlineCall, ParseError<'i, &'static str>> {
    match kind {
        CallKind::Define => {
            let name = p.expect_ident()?.as_ref().to_string();
            p.expect_comma()?;
            let reference = parse_reference(p)?;
            let style = parse_optional_style(p)?;
            p.expect_exhausted()?;
            Ok(InlineCall::Define {
                name,
                reference,
                style,
            })
        }
        CallKind::Inline => {
            let reference = parse_reference(p)?;
            let style = parse_optional_style(p)?;
            p.expect_exhausted()?;
            Ok(InlineCall::Inline { reference, style })
        }
        CallKind::Ref => {
            let location = p.current_source_location();
            match p.next()?.clone() {
                Token::Ident(name) => {
                    p.expect_exhausted()?;
                    Ok(InlineCall::Ref {
                        name: name.as_ref().to_string(),
                    })
                }
                Token::QuotedString(_) | Token::UnquotedUrl(_) => Err(location
                    .new_custom_error("svg-ref expects a name, not a reference")),
                token => Err(location.new_unexpected_token_error(token)),
            }
        }
    }
}

fn parse_reference<'i>(p: &mut Parser<'i, '_>) -> Result<String, ParseError<'i, &'static str>> {
    let location = p.current_source_location();
    match p.next()?.clone() {
        Token::QuotedString(s) | Token::UnquotedUrl(s) => Ok(s.as_ref().to_string()),
        Token::Ident(_) => Err(location.new_custom_error("reference must be quoted")),
        token => Err(location.new_unexpected_token_error(token)),
    }
}

fn parse_optional_style<'i>(
    p: &mut Parser<'i, '_>,
) -> Result<Option<String>, ParseError<'i, &'static str>> {
    if p.try_parse(|p| p.expect_comma()).is_err() {
        return Ok(None);
    }
    Ok(Some(p.expect_string()?.as_ref().to_string()))
}

fn malformed_value(value: &str, error: &ParseError<'_, &'static str>) -> InlineError {
    let reason = match &error.kind {
        ParseErrorKind::Custom(message) => (*message).to_string(),
        ParseErrorKind::Basic(basic) => format!("{basic:?}"),
    };
    InlineError::MalformedValue(format!("{reason} in \"{value}\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_all_three_forms() {
        let parsed =
            ParsedValue::parse("svg-load(a, \"a.svg\") svg-inline(\"b.svg\") svg-ref(a)").unwrap();
        let calls: Vec<_> = parsed.calls().map(|(_, c)| c.clone()).collect();
        assert_eq!(
            calls,
            vec![
                InlineCall::Define {
                    name: "a".to_string(),
                    reference: "a.svg".to_string(),
                    style: None,
                },
                InlineCall::Inline {
                    reference: "b.svg".to_string(),
                    style: None,
                },
                InlineCall::Ref {
                    name: "a".to_string(),
                },
            ]
        );
    }

    #[test]
    fn calls_interleaved_with_other_value_text() {
        let value = "no-repeat svg-inline(\"a.svg\") center / cover, url(x.png)";
        let parsed = ParsedValue::parse(value).unwrap();
        assert_eq!(parsed.calls().count(), 1);
        assert_eq!(parsed.to_css_string(), value);
    }

    #[test]
    fn filling_a_slot_replaces_only_that_call() {
        let mut parsed =
            ParsedValue::parse("svg-inline(\"a.svg\") svg-inline(\"b.svg\")").unwrap();
        parsed.fill(0, "url(<svg/>)".to_string());
        assert_eq!(
            parsed.to_css_string(),
            "url(<svg/>) svg-inline(\"b.svg\")"
        );
    }

    #[test]
    fn inline_call_carries_optional_style() {
        let parsed =
            ParsedValue::parse("svg-inline(\"a.svg\", \"path { fill: red; }\")").unwrap();
        let (_, call) = parsed.calls().next().unwrap();
        assert_eq!(
            *call,
            InlineCall::Inline {
                reference: "a.svg".to_string(),
                style: Some("path { fill: red; }".to_string()),
            }
        );
    }

    #[test]
    fn unrecognized_functions_pass_through() {
        let value = "linear-gradient(to right, red, blue)";
        let parsed = ParsedValue::parse(value).unwrap();
        assert_eq!(parsed.calls().count(), 0);
        assert_eq!(parsed.to_css_string(), value);
    }

    #[test]
    fn rejects_name_given_as_string() {
        let err = ParsedValue::parse("svg-ref(\"icon\")").unwrap_err();
        assert!(matches!(err, InlineError::MalformedValue(_)));
    }

    #[test]
    fn rejects_unbalanced_argument_lists() {
        assert!(ParsedValue::parse("svg-inline(\"a.svg\"").is_err());
        assert!(ParsedValue::parse("svg-inline(\"a.svg) no-repeat").is_err());
    }

    #[test]
    fn contains_call_is_a_cheap_prefilter() {
        assert!(contains_call("x svg-ref(a)"));
        assert!(!contains_call("url(svg-file.svg)"));
    }
}
