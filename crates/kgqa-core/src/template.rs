//! Template catalog: parametrized (question, query, answer) patterns.
//!
//! The catalog is read from a CSV table with a header row:
//!
//! | question | query | slots | answer |
//! |---|---|---|---|
//! | `%ENT%的%ATT%是什么` | `SELECT value AS ANS FROM attributes WHERE ...` | `{"%ENT%":1,"%ATT%":1}` | `%ENT%的%ATT%是%ANS%` |
//!
//! `cypher` and `check` are accepted as column names for `query` and `slots`.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use kgqa_parser::{parse_pattern, Pattern, PatternError};
use serde::Deserialize;

use crate::category::{Category, SlotKey};
use crate::error::{SlotSpecError, TemplateError};

/// How many distinct mentions each category must supply.
///
/// Requirements are kept in [`Category`] order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotSpec {
    requirements: Vec<(Category, usize)>,
}

impl SlotSpec {
    #[must_use]
    pub fn new(requirements: impl IntoIterator<Item = (Category, usize)>) -> Self {
        let by_category: BTreeMap<Category, usize> = requirements.into_iter().collect();
        Self {
            requirements: by_category.into_iter().collect(),
        }
    }

    /// Parse the embedded JSON spec, e.g. `{"%ENT%": 2, "%REL%": 1}`.
    ///
    /// # Errors
    ///
    /// Returns [`SlotSpecError::NotAnObject`] if the input is not an object of
    /// non-negative integers, and [`SlotSpecError::UnknownCategory`] for keys
    /// outside the placeholder alphabet.
    pub fn parse(src: &str) -> Result<Self, SlotSpecError> {
        let raw: BTreeMap<String, usize> =
            serde_json::from_str(src).map_err(|e| SlotSpecError::NotAnObject(e.to_string()))?;
        let mut requirements = Vec::with_capacity(raw.len());
        for (key, count) in raw {
            let category = Category::from_placeholder(&key)
                .ok_or_else(|| SlotSpecError::UnknownCategory(key.clone()))?;
            requirements.push((category, count));
        }
        Ok(Self::new(requirements))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, usize)> + '_ {
        self.requirements.iter().copied()
    }

    /// Required count for `category` (0 when not required).
    #[must_use]
    pub fn required(&self, category: Category) -> usize {
        self.requirements
            .iter()
            .find(|(c, _)| *c == category)
            .map_or(0, |(_, n)| *n)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Every placeholder a binding under this spec fills.
    #[must_use]
    pub fn slot_keys(&self) -> Vec<SlotKey> {
        let mut keys = Vec::new();
        for (category, count) in self.iter() {
            match count {
                0 => {}
                1 => keys.push(SlotKey::single(category)),
                n => keys.extend((0..n).map(|i| SlotKey::numbered(category, i))),
            }
        }
        keys
    }
}

/// One catalog entry.
#[derive(Debug, Clone)]
pub struct Template {
    pub question: Pattern,
    pub query: Pattern,
    pub slots: SlotSpec,
    pub answer: Pattern,
}

impl Template {
    /// Parse the three patterns of a template.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if a pattern fails to parse.
    pub fn new(
        question: &str,
        query: &str,
        slots: SlotSpec,
        answer: &str,
    ) -> Result<Self, PatternError> {
        Ok(Self {
            question: parse_pattern(question)?,
            query: parse_pattern(query)?,
            slots,
            answer: parse_pattern(answer)?,
        })
    }

    /// Slot-shaped placeholders in the question or query that the spec never binds.
    ///
    /// The answer pattern is not checked: its open tokens are filled from
    /// result fields, which may share a name with a category (`%REL%`).
    #[must_use]
    pub fn unsupplied_slots(&self) -> Vec<String> {
        let supplied = self.slots.slot_keys();
        let mut missing: Vec<String> = self
            .question
            .placeholders()
            .chain(self.query.placeholders())
            .filter(|name| SlotKey::parse(name).is_some_and(|key| !supplied.contains(&key)))
            .map(str::to_string)
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }
}

#[derive(Debug, Deserialize)]
struct TemplateRow {
    question: String,
    #[serde(alias = "cypher")]
    query: String,
    #[serde(alias = "check")]
    slots: String,
    answer: String,
}

/// The ordered, immutable list of templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl TemplateCatalog {
    #[must_use]
    pub fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    /// Load the catalog from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Unreadable`] if the file cannot be opened and
    /// a row-level [`TemplateError`] for the first malformed row.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let file = std::fs::File::open(path).map_err(|e| TemplateError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let catalog = Self::from_reader(file)?;
        tracing::info!(
            path = %path.display(),
            templates = catalog.len(),
            "template catalog loaded"
        );
        Ok(catalog)
    }

    /// Read the catalog from any CSV source. Rows are numbered from 1,
    /// not counting the header.
    ///
    /// # Errors
    ///
    /// See [`TemplateCatalog::load`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TemplateError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| TemplateError::Malformed {
                row: 0,
                reason: format!("cannot read header: {e}"),
            })?
            .clone();

        let mut templates = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let row = i + 1;
            let record = record.map_err(|e| TemplateError::Malformed {
                row,
                reason: e.to_string(),
            })?;
            let raw: TemplateRow =
                record
                    .deserialize(Some(&headers))
                    .map_err(|e| TemplateError::Malformed {
                        row,
                        reason: e.to_string(),
                    })?;
            let slots =
                SlotSpec::parse(&raw.slots).map_err(|source| TemplateError::Slots { row, source })?;
            let template = Template::new(&raw.question, &raw.query, slots, &raw.answer)
                .map_err(|e| TemplateError::Malformed {
                    row,
                    reason: e.to_string(),
                })?;

            let unsupplied = template.unsupplied_slots();
            if !unsupplied.is_empty() {
                tracing::warn!(
                    row,
                    slots = ?unsupplied,
                    "template references slots its spec does not supply"
                );
            }
            templates.push(template);
        }

        Ok(Self { templates })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Template> {
        self.templates.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
