//! # kgqa-store
//!
//! SQLite-backed graph store for KGQA.
//!
//! The graph is kept in three tables:
//! - `entities(name, label)`: one row per node
//! - `attributes(entity, attribute, value)`: entity-attribute-value triples
//! - `relations(head, relation, tail)`: directed, typed edges
//!
//! Template queries are SQL over these tables. A column listed in the
//! relationship fields (default `REL`) that holds a JSON array of strings,
//! as produced by `json_group_array(relation)`, is returned as a
//! relationship value instead of a scalar.

pub mod ingest;

use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags};

use kgqa_core::error::StoreError;
use kgqa_core::store::{FieldValue, GraphStore, ResultRow};

pub use ingest::{GraphData, IngestReport, LabelCleaner, Triple};

/// A knowledge graph stored in SQLite.
pub struct SqliteGraph {
    conn: Connection,
    relationship_fields: Vec<String>,
}

impl SqliteGraph {
    /// Open or create a graph database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] if the database cannot be opened.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Open(e.to_string()))?;
        let graph = Self::with_connection(conn);
        graph.create_schema()?;
        Ok(graph)
    }

    /// Open an existing graph database without write access.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] if the file does not exist or cannot be opened.
    pub fn open_read_only(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| StoreError::Open(format!("{}: {e}", path.display())))?;
        Ok(Self::with_connection(conn))
    }

    /// Create an in-memory graph (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] if schema creation fails.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open(e.to_string()))?;
        let graph = Self::with_connection(conn);
        graph.create_schema()?;
        Ok(graph)
    }

    fn with_connection(conn: Connection) -> Self {
        Self {
            conn,
            relationship_fields: vec!["REL".to_string()],
        }
    }

    /// Replace the set of columns decoded as relationship values.
    #[must_use]
    pub fn with_relationship_fields(mut self, fields: Vec<String>) -> Self {
        self.relationship_fields = fields;
        self
    }

    fn create_schema(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS entities (
                name TEXT PRIMARY KEY,
                label TEXT
            );

            CREATE TABLE IF NOT EXISTS attributes (
                entity TEXT NOT NULL,
                attribute TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (entity, attribute)
            );

            CREATE TABLE IF NOT EXISTS relations (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                head TEXT NOT NULL,
                relation TEXT NOT NULL,
                tail TEXT NOT NULL,
                UNIQUE (head, relation, tail)
            );

            CREATE INDEX IF NOT EXISTS idx_relations_head ON relations(head);
            CREATE INDEX IF NOT EXISTS idx_relations_tail ON relations(tail);
            CREATE INDEX IF NOT EXISTS idx_entities_label ON entities(label);
            ",
            )
            .map_err(|e| StoreError::Open(e.to_string()))?;

        Ok(())
    }

    /// Insert a node. An existing label is kept when `label` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] if the insert fails.
    pub fn insert_entity(&self, name: &str, label: Option<&str>) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO entities (name, label) VALUES (?1, ?2)
                 ON CONFLICT(name) DO UPDATE SET label = COALESCE(excluded.label, entities.label)",
                params![name, label],
            )
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    /// Insert or overwrite an attribute value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] if the insert fails.
    pub fn insert_attribute(
        &self,
        entity: &str,
        attribute: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO attributes (entity, attribute, value) VALUES (?1, ?2, ?3)",
                params![entity, attribute, value],
            )
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    /// Insert an edge. Duplicate edges are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] if the insert fails.
    pub fn insert_relation(&self, head: &str, relation: &str, tail: &str) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO relations (head, relation, tail) VALUES (?1, ?2, ?3)",
                params![head, relation, tail],
            )
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    /// Number of rows in each graph table.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] if a count fails.
    pub fn stats(&self) -> Result<GraphStats, StoreError> {
        let count = |table: &str| -> Result<usize, StoreError> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })
                .map_err(|e| StoreError::Query(e.to_string()))?;
            Ok(usize::try_from(n).unwrap_or(0))
        };
        Ok(GraphStats {
            entities: count("entities")?,
            attributes: count("attributes")?,
            relations: count("relations")?,
        })
    }

    fn decode(&self, column: &str, value: ValueRef<'_>) -> FieldValue {
        let scalar = match value {
            ValueRef::Null => serde_json::Value::Null,
            ValueRef::Integer(i) => serde_json::Value::from(i),
            ValueRef::Real(f) => serde_json::Number::from_f64(f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            ValueRef::Text(t) => serde_json::Value::String(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => serde_json::Value::String(format!("<{} bytes>", b.len())),
        };

        if self.relationship_fields.iter().any(|f| f == column) {
            if let serde_json::Value::String(ref text) = scalar {
                if let Ok(types) = serde_json::from_str::<Vec<String>>(text) {
                    return FieldValue::Relationship(types);
                }
            }
        }
        FieldValue::Scalar(scalar)
    }
}

impl GraphStore for SqliteGraph {
    fn run(&self, query: &str) -> Result<Vec<ResultRow>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(query)
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt
            .query([])
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().map_err(|e| StoreError::Query(e.to_string()))? {
            let mut record = ResultRow::new();
            for (i, column) in columns.iter().enumerate() {
                let value = row
                    .get_ref(i)
                    .map_err(|e| StoreError::Query(e.to_string()))?;
                record
                    .fields
                    .insert(column.clone(), self.decode(column, value));
            }
            results.push(record);
        }

        Ok(results)
    }
}

/// Row counts of the graph tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphStats {
    pub entities: usize,
    pub attributes: usize,
    pub relations: usize,
}
