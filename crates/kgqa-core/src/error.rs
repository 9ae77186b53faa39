//! Error types for KGQA.

use thiserror::Error;

/// Top-level result type for KGQA operations.
pub type Result<T> = std::result::Result<T, KgqaError>;

/// Top-level error type for KGQA.
#[derive(Debug, Error)]
pub enum KgqaError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("config error: {0}")]
    Config(String),

    #[error("ingest error: {0}")]
    Ingest(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Errors related to the schema snapshot and the mention vocabulary.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("cannot read schema snapshot {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("malformed schema snapshot: {0}")]
    Malformed(String),

    #[error("{category} term '{term}' contains placeholder syntax")]
    PlaceholderInTerm { category: String, term: String },

    #[error("cannot build {category} mention matcher: {reason}")]
    Matcher { category: String, reason: String },
}

/// Errors in a slot requirement spec such as `{"%ENT%": 2}`.
#[derive(Debug, Error)]
pub enum SlotSpecError {
    #[error("slot spec must be a JSON object of counts: {0}")]
    NotAnObject(String),

    #[error("unknown placeholder category '{0}'")]
    UnknownCategory(String),
}

/// Errors related to loading the template catalog.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("cannot read template source {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("row {row}: {reason}")]
    Malformed { row: usize, reason: String },

    #[error("row {row}: {source}")]
    Slots {
        row: usize,
        #[source]
        source: SlotSpecError,
    },
}

/// Errors raised by a graph store while executing a query.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot open graph store: {0}")]
    Open(String),

    #[error("query failed: {0}")]
    Query(String),
}
