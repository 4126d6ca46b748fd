//! Canonical CSS text output.
//!
//! The tree does not retain inter-node whitespace or comments, so output is
//! normalized: four-space indentation, one declaration per line, `;` after
//! every declaration. Raw prelude/params/value text is emitted verbatim.

use std::fmt;

use crate::{Node, Root};

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_nodes(f, &self.nodes, 0)
    }
}

fn write_nodes(f: &mut fmt::Formatter<'_>, nodes: &[Node], depth: usize) -> fmt::Result {
    for node in nodes {
        write_indent(f, depth)?;
        match node {
            Node::Declaration(decl) => {
                writeln!(f, "{}: {};", decl.property, decl.value)?;
            }
            Node::Rule(rule) => {
                writeln!(f, "{} {{", rule.selector)?;
                write_nodes(f, &rule.nodes, depth + 1)?;
                write_indent(f, depth)?;
                writeln!(f, "}}")?;
            }
            Node::AtRule(at) => {
                if at.params.is_empty() {
                    write!(f, "@{}", at.name)?;
                } else {
                    write!(f, "@{} {}", at.name, at.params)?;
                }
                match &at.block {
                    Some(block) => {
                        writeln!(f, " {{")?;
                        write_nodes(f, block, depth + 1)?;
                        write_indent(f, depth)?;
                        writeln!(f, "}}")?;
                    }
                    None => writeln!(f, ";")?,
                }
            }
        }
    }
    Ok(())
}

fn write_indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str("    ")?;
    }
    Ok(())
}
