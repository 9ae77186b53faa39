//! The graph store boundary.
//!
//! The question-answering core only needs "run this query string, give me
//! back records". Everything else about the store is an implementation detail.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::StoreError;

/// A single field value in a result record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(serde_json::Value),
    /// All relationship-type names on a matched edge, in store order.
    Relationship(Vec<String>),
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Scalar(serde_json::Value::String(value.to_string()))
    }
}

/// A single record returned by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRow {
    pub fields: HashMap<String, FieldValue>,
}

impl ResultRow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// Executes opaque query strings in the store's native language.
pub trait GraphStore {
    /// Run `query` and return its records (possibly none).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails to execute the query.
    fn run(&self, query: &str) -> Result<Vec<ResultRow>, StoreError>;
}

impl<T: GraphStore + ?Sized> GraphStore for &T {
    fn run(&self, query: &str) -> Result<Vec<ResultRow>, StoreError> {
        (**self).run(query)
    }
}

impl<T: GraphStore + ?Sized> GraphStore for Box<T> {
    fn run(&self, query: &str) -> Result<Vec<ResultRow>, StoreError> {
        (**self).run(query)
    }
}

impl<T: GraphStore + ?Sized> GraphStore for Rc<T> {
    fn run(&self, query: &str) -> Result<Vec<ResultRow>, StoreError> {
        (**self).run(query)
    }
}

impl<T: GraphStore + ?Sized> GraphStore for Arc<T> {
    fn run(&self, query: &str) -> Result<Vec<ResultRow>, StoreError> {
        (**self).run(query)
    }
}
