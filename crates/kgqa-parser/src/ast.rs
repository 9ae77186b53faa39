//! Parsed pattern types.
//!
//! A [`Pattern`] is produced by [`crate::parse_pattern`] and consumed by the
//! slot expander and the result projector. Substitution walks the segments
//! once; values are inserted as literal text and are never rescanned.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;

/// One piece of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Verbatim text.
    Literal(String),
    /// An open `%NAME%` token, stored without the surrounding `%`.
    Placeholder(String),
}

/// Source of values for placeholder names.
pub trait Resolve {
    /// Value for the placeholder `name` (without `%`), if bound.
    fn resolve(&self, name: &str) -> Option<&str>;
}

impl<S: BuildHasher> Resolve for HashMap<String, String, S> {
    fn resolve(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl Resolve for BTreeMap<String, String> {
    fn resolve(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// A template pattern: literal text interleaved with placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    /// Build a pattern from segments, merging adjacent literals.
    #[must_use]
    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Self {
        let mut merged: Vec<Segment> = Vec::new();
        for segment in segments {
            match segment {
                Segment::Literal(text) if text.is_empty() => {}
                Segment::Literal(text) => {
                    if let Some(Segment::Literal(last)) = merged.last_mut() {
                        last.push_str(&text);
                    } else {
                        merged.push(Segment::Literal(text));
                    }
                }
                placeholder => merged.push(placeholder),
            }
        }
        Self { segments: merged }
    }

    /// A pattern consisting of plain text only.
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Self::from_segments([Segment::Literal(text.into())])
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the open placeholders, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    #[must_use]
    pub fn has_placeholder(&self, name: &str) -> bool {
        self.placeholders().any(|p| p == name)
    }

    /// True when no placeholder is left open.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.placeholders().next().is_none()
    }

    /// Fill every placeholder `values` knows about, leaving the rest open.
    #[must_use]
    pub fn substitute<R: Resolve + ?Sized>(&self, values: &R) -> Pattern {
        Pattern::from_segments(self.segments.iter().map(|segment| match segment {
            Segment::Placeholder(name) => match values.resolve(name) {
                Some(value) => Segment::Literal(value.to_string()),
                None => segment.clone(),
            },
            Segment::Literal(_) => segment.clone(),
        }))
    }

    /// Render to text. Open placeholders are written back as `%NAME%`.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => f.write_str(text)?,
                Segment::Placeholder(name) => write!(f, "%{name}%")?,
            }
        }
        Ok(())
    }
}
