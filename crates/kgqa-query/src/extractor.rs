//! Mention extraction: finds schema terms inside a question.
//!
//! Each category gets one matcher compiled at load time from its terms:
//! an alternation of escaped literals ordered longest first. Matching is
//! leftmost-first and non-overlapping, so at any start position the longest
//! known term wins. Categories are matched independently of each other.

use std::collections::BTreeSet;

use regex::{Regex, RegexBuilder};

use kgqa_core::category::Category;
use kgqa_core::error::SchemaError;
use kgqa_core::schema::SchemaStore;

/// Schema terms found in one question, per category, in order of occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MentionSet {
    mentions: [Vec<String>; 4],
}

impl MentionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append mentions for a category.
    pub fn extend<I, T>(&mut self, category: Category, terms: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.mentions[category.index()].extend(terms.into_iter().map(Into::into));
    }

    #[must_use]
    pub fn get(&self, category: Category) -> &[String] {
        &self.mentions[category.index()]
    }

    #[must_use]
    pub fn count(&self, category: Category) -> usize {
        self.mentions[category.index()].len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mentions.iter().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &[String])> {
        Category::ALL
            .into_iter()
            .map(|c| (c, self.mentions[c.index()].as_slice()))
    }
}

/// Lexicon matcher built once from the schema store.
#[derive(Debug, Clone)]
pub struct MentionExtractor {
    matchers: [Option<Regex>; 4],
}

impl MentionExtractor {
    pub const DEFAULT_SIZE_LIMIT: usize = 64 * (1 << 20);

    /// # Errors
    ///
    /// Returns [`SchemaError::Matcher`] if a category's vocabulary is too
    /// large to compile.
    pub fn new(schema: &SchemaStore) -> Result<Self, SchemaError> {
        Self::with_size_limit(schema, Self::DEFAULT_SIZE_LIMIT)
    }

    /// Build matchers with an explicit compiled-size limit in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Matcher`] if a matcher exceeds `size_limit`.
    pub fn with_size_limit(schema: &SchemaStore, size_limit: usize) -> Result<Self, SchemaError> {
        let mut matchers: [Option<Regex>; 4] = Default::default();
        for category in Category::ALL {
            matchers[category.index()] = build_matcher(schema.terms(category), size_limit)
                .map_err(|e| SchemaError::Matcher {
                    category: category.to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(Self { matchers })
    }

    /// Extract every category's mentions from `question`.
    #[must_use]
    pub fn extract(&self, question: &str) -> MentionSet {
        let mut mentions = MentionSet::new();
        for category in Category::ALL {
            if let Some(matcher) = &self.matchers[category.index()] {
                mentions.extend(
                    category,
                    matcher.find_iter(question).map(|m| m.as_str()),
                );
            }
        }
        mentions
    }
}

fn build_matcher(terms: &BTreeSet<String>, size_limit: usize) -> Result<Option<Regex>, regex::Error> {
    if terms.is_empty() {
        return Ok(None);
    }

    let mut ordered: Vec<&String> = terms.iter().collect();
    ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let alternation = ordered
        .iter()
        .map(|term| regex::escape(term))
        .collect::<Vec<_>>()
        .join("|");

    RegexBuilder::new(&alternation)
        .size_limit(size_limit)
        .dfa_size_limit(size_limit)
        .build()
        .map(Some)
}
