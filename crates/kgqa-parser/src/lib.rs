//! # kgqa-parser
//!
//! Template pattern parser using a pest PEG grammar.
//!
//! Question, query and answer patterns in the template catalog are plain
//! text with `%NAME%` placeholder tokens (`%ENT%`, `%ENT0%`, `%REL%`, ...).
//! Parsing them once at load time lets every later substitution run as a
//! single pass over [`Pattern`] segments.

pub mod ast;

use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

pub use ast::{Pattern, Resolve, Segment};

#[derive(Parser)]
#[grammar = "pattern.pest"]
struct PatternParser;

/// Errors raised while parsing a pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern syntax error: {0}")]
    Syntax(String),
}

/// Parse a pattern string into literal and placeholder segments.
///
/// # Errors
///
/// Returns [`PatternError::Syntax`] if the grammar rejects the input.
pub fn parse_pattern(src: &str) -> Result<Pattern, PatternError> {
    let pairs = PatternParser::parse(Rule::pattern, src)
        .map_err(|e| PatternError::Syntax(e.to_string()))?;

    let mut segments = Vec::new();
    for pattern in pairs {
        for pair in pattern.into_inner() {
            match pair.as_rule() {
                Rule::literal => segments.push(Segment::Literal(pair.as_str().to_string())),
                Rule::placeholder => {
                    if let Some(name) = pair.into_inner().next() {
                        segments.push(Segment::Placeholder(name.as_str().to_string()));
                    }
                }
                _ => {}
            }
        }
    }

    Ok(Pattern::from_segments(segments))
}

/// Whether `text` contains at least one well-formed `%NAME%` token.
#[must_use]
pub fn contains_placeholder(text: &str) -> bool {
    parse_pattern(text)
        .map(|p| !p.is_resolved())
        .unwrap_or(false)
}
