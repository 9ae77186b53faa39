//! # kgqa-core
//!
//! Core types for the KGQA template-matching question answerer.
//!
//! This crate defines the foundational types used across all other KGQA crates:
//! - [`Category`] and [`SlotKey`]: the placeholder alphabet
//! - [`SchemaSnapshot`] / [`SchemaStore`]: the closed vocabulary of the graph
//! - [`Template`], [`SlotSpec`], [`TemplateCatalog`]: parametrized questions
//! - [`GraphStore`], [`ResultRow`], [`FieldValue`]: the store boundary
//! - [`Config`]: runtime configuration
//! - Error hierarchy ([`KgqaError`], [`SchemaError`], [`TemplateError`], [`StoreError`])

pub mod category;
pub mod config;
pub mod error;
pub mod schema;
pub mod store;
pub mod template;

pub use category::{Category, SlotKey};
pub use config::{Config, IngestConfig};
pub use error::{KgqaError, Result, SchemaError, SlotSpecError, StoreError, TemplateError};
pub use schema::{SchemaSnapshot, SchemaStore};
pub use store::{FieldValue, GraphStore, ResultRow};
pub use template::{SlotSpec, Template, TemplateCatalog};
