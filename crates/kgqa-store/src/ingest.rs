//! Triple ingest: builds the graph tables and the schema snapshot.
//!
//! Input files hold one triple per line, tab separated:
//! - relation triples: `head<TAB>relation<TAB>tail`
//! - attribute triples: `entity<TAB>attribute<TAB>value`
//!
//! Head and entity names may carry a full-width bracket suffix such as
//! `发如雪（歌曲）`. The suffix is stripped, and if it mentions one of the
//! configured label words the cleaned entity gets that label.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use kgqa_core::error::{KgqaError, StoreError};
use kgqa_core::schema::SchemaSnapshot;

use crate::SqliteGraph;

/// Attribute added to every entity, holding the entity's own name.
pub const NAME_ATTRIBUTE: &str = "NAME";

/// One line of a triple file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

/// Read a tab-separated triple file. Blank lines are skipped.
///
/// # Errors
///
/// Returns [`KgqaError::Io`] if the file cannot be read and
/// [`KgqaError::Ingest`] for a line without exactly three fields.
pub fn read_triples(path: &Path) -> Result<Vec<Triple>, KgqaError> {
    let reader = BufReader::new(File::open(path)?);
    let mut triples = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let [subject, predicate, object] = fields.as_slice() else {
            return Err(KgqaError::Ingest(format!(
                "{}:{}: expected 3 tab-separated fields, found {}",
                path.display(),
                i + 1,
                fields.len()
            )));
        };
        triples.push(Triple {
            subject: (*subject).to_string(),
            predicate: (*predicate).to_string(),
            object: (*object).to_string(),
        });
    }

    Ok(triples)
}

/// Strips `（…）` suffixes and derives labels from them.
#[derive(Debug, Clone)]
pub struct LabelCleaner {
    labels: Vec<String>,
}

impl LabelCleaner {
    #[must_use]
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Clean a raw name. The bracketed span runs from the first `（` to the
    /// last `）` and must enclose at least one character. The first configured
    /// label word found inside it becomes the label.
    #[must_use]
    pub fn clean(&self, raw: &str) -> (String, Option<String>) {
        let Some(open) = raw.find('（') else {
            return (raw.to_string(), None);
        };
        let inner_start = open + '（'.len_utf8();
        let Some(close) = raw.rfind('）').filter(|&c| c > inner_start) else {
            return (raw.to_string(), None);
        };

        let inner = &raw[inner_start..close];
        let label = self
            .labels
            .iter()
            .find(|label| inner.contains(label.as_str()))
            .cloned();
        let cleaned = format!("{}{}", &raw[..open], &raw[close + '）'.len_utf8()..]);
        (cleaned, label)
    }
}

/// Cleaned, de-duplicated graph content ready to load.
#[derive(Debug, Clone, Default)]
pub struct GraphData {
    entities: BTreeSet<String>,
    labels: BTreeMap<String, String>,
    attributes: BTreeMap<String, BTreeMap<String, String>>,
    relations: Vec<(String, String, String)>,
}

impl GraphData {
    /// Build graph content from relation and attribute triples.
    ///
    /// Later attribute values for the same (entity, attribute) replace earlier ones.
    #[must_use]
    pub fn from_triples(relations: &[Triple], attributes: &[Triple], cleaner: &LabelCleaner) -> Self {
        let mut data = Self::default();
        let mut seen_edges = BTreeSet::new();

        for triple in relations {
            let head = data.add_entity(&triple.subject, cleaner);
            let tail = triple.object.clone();
            data.entities.insert(tail.clone());
            let edge = (head, triple.predicate.clone(), tail);
            if seen_edges.insert(edge.clone()) {
                data.relations.push(edge);
            }
        }

        for triple in attributes {
            let entity = data.add_entity(&triple.subject, cleaner);
            data.attributes
                .entry(entity)
                .or_default()
                .insert(triple.predicate.clone(), triple.object.clone());
        }

        let entities: Vec<String> = data.entities.iter().cloned().collect();
        for entity in entities {
            data.attributes
                .entry(entity.clone())
                .or_default()
                .insert(NAME_ATTRIBUTE.to_string(), entity);
        }

        data
    }

    fn add_entity(&mut self, raw: &str, cleaner: &LabelCleaner) -> String {
        let (name, label) = cleaner.clean(raw);
        if let Some(label) = label {
            self.labels.insert(name.clone(), label);
        }
        self.entities.insert(name.clone());
        name
    }

    /// The schema snapshot describing this content.
    #[must_use]
    pub fn snapshot(&self) -> SchemaSnapshot {
        let relations: BTreeSet<&String> = self.relations.iter().map(|(_, r, _)| r).collect();
        let labels: BTreeSet<&String> = self.labels.values().collect();
        let attributes: BTreeSet<&String> =
            self.attributes.values().flat_map(BTreeMap::keys).collect();

        SchemaSnapshot {
            entities: self.entities.iter().cloned().collect(),
            relations: relations.into_iter().cloned().collect(),
            labels: labels.into_iter().cloned().collect(),
            attributes: attributes.into_iter().cloned().collect(),
            generated_at: Some(Utc::now()),
        }
    }
}

/// Summary of a completed ingest.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub entities: usize,
    pub attributes: usize,
    pub relations: usize,
    pub labels: usize,
}

impl SqliteGraph {
    /// Load graph content in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] if any insert fails; nothing is committed then.
    pub fn load(&mut self, data: &GraphData) -> Result<IngestReport, StoreError> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| StoreError::Query(e.to_string()))?;

        {
            let mut insert_entity = tx
                .prepare(
                    "INSERT INTO entities (name, label) VALUES (?1, ?2)
                     ON CONFLICT(name) DO UPDATE SET label = COALESCE(excluded.label, entities.label)",
                )
                .map_err(|e| StoreError::Query(e.to_string()))?;
            for name in &data.entities {
                insert_entity
                    .execute(rusqlite::params![name, data.labels.get(name)])
                    .map_err(|e| StoreError::Query(e.to_string()))?;
            }

            let mut insert_attribute = tx
                .prepare(
                    "INSERT OR REPLACE INTO attributes (entity, attribute, value) VALUES (?1, ?2, ?3)",
                )
                .map_err(|e| StoreError::Query(e.to_string()))?;
            for (entity, values) in &data.attributes {
                for (attribute, value) in values {
                    insert_attribute
                        .execute(rusqlite::params![entity, attribute, value])
                        .map_err(|e| StoreError::Query(e.to_string()))?;
                }
            }

            let mut insert_relation = tx
                .prepare("INSERT OR IGNORE INTO relations (head, relation, tail) VALUES (?1, ?2, ?3)")
                .map_err(|e| StoreError::Query(e.to_string()))?;
            for (head, relation, tail) in &data.relations {
                insert_relation
                    .execute(rusqlite::params![head, relation, tail])
                    .map_err(|e| StoreError::Query(e.to_string()))?;
            }
        }

        tx.commit().map_err(|e| StoreError::Query(e.to_string()))?;

        let stats = self.stats()?;
        tracing::info!(
            entities = stats.entities,
            attributes = stats.attributes,
            relations = stats.relations,
            "graph loaded"
        );

        Ok(IngestReport {
            entities: stats.entities,
            attributes: stats.attributes,
            relations: stats.relations,
            labels: data.labels.len(),
        })
    }
}
