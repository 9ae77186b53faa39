//! Schema snapshot and the in-memory schema store.
//!
//! The snapshot is the JSON document written by ingest:
//! ```json
//! {
//!   "entities": ["周杰伦", "淡江中学"],
//!   "relations": ["毕业院校"],
//!   "labels": ["歌曲"],
//!   "attributes": ["NAME", "身高"],
//!   "generated_at": "2025-02-10T09:15:00Z"
//! }
//! ```
//! The legacy key `entitys` is accepted for `entities`.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::{KgqaError, SchemaError};

/// The schema snapshot document as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    #[serde(alias = "entitys")]
    pub entities: Vec<String>,
    pub relations: Vec<String>,
    pub labels: Vec<String>,
    pub attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

impl SchemaSnapshot {
    /// Read a snapshot from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Unreadable`] if the file cannot be read and
    /// [`SchemaError::Malformed`] if a field is missing or has the wrong shape.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let raw = std::fs::read_to_string(path).map_err(|e| SchemaError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&raw)
    }

    /// Parse a snapshot from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Malformed`] on invalid JSON or missing fields.
    pub fn from_json(raw: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(raw).map_err(|e| SchemaError::Malformed(e.to_string()))
    }

    /// Write the snapshot as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`KgqaError::Serialization`] or [`KgqaError::Io`] on failure.
    pub fn write(&self, path: &Path) -> Result<(), KgqaError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| KgqaError::Serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    #[must_use]
    pub fn terms(&self, category: Category) -> &[String] {
        match category {
            Category::Entity => &self.entities,
            Category::Relation => &self.relations,
            Category::Label => &self.labels,
            Category::Attribute => &self.attributes,
        }
    }
}

/// The closed vocabulary of known entities, relations, labels and attributes.
///
/// Immutable once built. Terms are de-duplicated; empty strings are dropped.
#[derive(Debug, Clone, Default)]
pub struct SchemaStore {
    terms: [BTreeSet<String>; 4],
}

impl SchemaStore {
    /// Build the store from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::PlaceholderInTerm`] if a term contains `%NAME%`
    /// token syntax, which would make instantiated patterns ambiguous.
    pub fn from_snapshot(snapshot: &SchemaSnapshot) -> Result<Self, SchemaError> {
        let mut store = Self::default();
        for category in Category::ALL {
            for term in snapshot.terms(category) {
                if term.is_empty() {
                    continue;
                }
                if kgqa_parser::contains_placeholder(term) {
                    return Err(SchemaError::PlaceholderInTerm {
                        category: category.to_string(),
                        term: term.clone(),
                    });
                }
                store.terms[category.index()].insert(term.clone());
            }
        }
        Ok(store)
    }

    /// Load and validate a snapshot file.
    ///
    /// # Errors
    ///
    /// See [`SchemaSnapshot::load`] and [`SchemaStore::from_snapshot`].
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let store = Self::from_snapshot(&SchemaSnapshot::load(path)?)?;
        tracing::info!(
            path = %path.display(),
            entities = store.len(Category::Entity),
            relations = store.len(Category::Relation),
            labels = store.len(Category::Label),
            attributes = store.len(Category::Attribute),
            "schema snapshot loaded"
        );
        Ok(store)
    }

    #[must_use]
    pub fn terms(&self, category: Category) -> &BTreeSet<String> {
        &self.terms[category.index()]
    }

    #[must_use]
    pub fn contains(&self, category: Category, term: &str) -> bool {
        self.terms[category.index()].contains(term)
    }

    #[must_use]
    pub fn len(&self, category: Category) -> usize {
        self.terms[category.index()].len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.iter().all(BTreeSet::is_empty)
    }
}
