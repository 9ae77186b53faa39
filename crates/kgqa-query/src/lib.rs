//! # kgqa-query
//!
//! Template-matching question answering over a [`GraphStore`](kgqa_core::GraphStore).
//!
//! Includes:
//! - Mention extraction against the schema vocabulary
//! - Lazy slot expansion of feasible templates
//! - Similarity ranking (character Jaccard by default)
//! - Fallback execution and answer projection
//! - Report formatter (JSON, Table, Markdown)

pub mod engine;
pub mod executor;
pub mod expander;
pub mod extractor;
pub mod formatter;
pub mod projector;
pub mod ranker;

pub use engine::{Answer, Explanation, Knowledge, QaEngine};
pub use expander::{Binding, Candidate};
pub use extractor::{MentionExtractor, MentionSet};
pub use formatter::{format_report, OutputFormat, Report};
pub use ranker::{CharJaccard, RankedCandidate, Similarity};
