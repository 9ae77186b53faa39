//! The question-answering pipeline.
//!
//! `ask` runs: extract mentions → expand feasible templates → rank by
//! similarity → execute in rank order → project the first record into the
//! winning answer pattern.
//!
//! Loaded knowledge (schema, catalog, compiled matchers) sits behind an
//! `RwLock<Arc<_>>`. A question holds its own `Arc` for its whole run, so a
//! concurrent [`QaEngine::reload`] never mixes old and new knowledge
//! within one answer.

use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::debug;

use kgqa_core::error::{KgqaError, SchemaError};
use kgqa_core::schema::SchemaStore;
use kgqa_core::store::GraphStore;
use kgqa_core::template::TemplateCatalog;

use crate::executor;
use crate::expander;
use crate::extractor::{MentionExtractor, MentionSet};
use crate::projector;
use crate::ranker::{self, CharJaccard, RankedCandidate, Similarity};

/// Everything loaded from the schema snapshot and the template catalog.
#[derive(Debug, Clone)]
pub struct Knowledge {
    schema: SchemaStore,
    catalog: TemplateCatalog,
    extractor: MentionExtractor,
}

impl Knowledge {
    /// # Errors
    ///
    /// Returns [`SchemaError::Matcher`] if a mention matcher cannot be built.
    pub fn new(schema: SchemaStore, catalog: TemplateCatalog) -> Result<Self, SchemaError> {
        Self::with_size_limit(schema, catalog, MentionExtractor::DEFAULT_SIZE_LIMIT)
    }

    /// # Errors
    ///
    /// Returns [`SchemaError::Matcher`] if a mention matcher exceeds `size_limit`.
    pub fn with_size_limit(
        schema: SchemaStore,
        catalog: TemplateCatalog,
        size_limit: usize,
    ) -> Result<Self, SchemaError> {
        let extractor = MentionExtractor::with_size_limit(&schema, size_limit)?;
        Ok(Self {
            schema,
            catalog,
            extractor,
        })
    }

    /// Load the schema snapshot and the template catalog from disk.
    ///
    /// # Errors
    ///
    /// Returns [`KgqaError::Schema`] or [`KgqaError::Template`] for the
    /// first resource that fails to load.
    pub fn load(schema_path: &Path, templates_path: &Path, size_limit: usize) -> Result<Self, KgqaError> {
        let schema = SchemaStore::load(schema_path)?;
        let catalog = TemplateCatalog::load(templates_path)?;
        Ok(Self::with_size_limit(schema, catalog, size_limit)?)
    }

    #[must_use]
    pub fn schema(&self) -> &SchemaStore {
        &self.schema
    }

    #[must_use]
    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn extractor(&self) -> &MentionExtractor {
        &self.extractor
    }

    /// Extract, expand and rank candidates for `question`.
    #[must_use]
    pub fn explain(&self, question: &str, similarity: &dyn Similarity) -> Explanation {
        let mentions = self.extractor.extract(question);
        debug!(?mentions, "mentions extracted");

        let candidates = expander::expand_catalog(&self.catalog, &mentions);
        let ranked = ranker::rank(similarity, question, candidates);
        debug!(candidates = ranked.len(), "candidates ranked");

        Explanation { mentions, ranked }
    }
}

/// A projected answer and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub text: String,
    /// Instantiated question of the winning candidate.
    pub matched_question: String,
    pub query: String,
    pub score: f64,
    pub template: usize,
    pub attempts: usize,
}

/// The pipeline up to ranking, without touching the store.
#[derive(Debug, Clone)]
pub struct Explanation {
    pub mentions: MentionSet,
    pub ranked: Vec<RankedCandidate>,
}

pub struct QaEngine<S> {
    knowledge: RwLock<Arc<Knowledge>>,
    store: S,
    similarity: Box<dyn Similarity + Send + Sync>,
}

impl<S: GraphStore> QaEngine<S> {
    #[must_use]
    pub fn new(knowledge: Knowledge, store: S) -> Self {
        Self {
            knowledge: RwLock::new(Arc::new(knowledge)),
            store,
            similarity: Box::new(CharJaccard),
        }
    }

    /// Replace the ranking function.
    #[must_use]
    pub fn with_similarity(mut self, similarity: impl Similarity + Send + Sync + 'static) -> Self {
        self.similarity = Box::new(similarity);
        self
    }

    /// The knowledge questions are currently answered against.
    #[must_use]
    pub fn knowledge(&self) -> Arc<Knowledge> {
        let guard = self.knowledge.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Swap in new knowledge. Questions already running finish on the old one.
    pub fn reload(&self, knowledge: Knowledge) {
        let mut guard = self.knowledge.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(knowledge);
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Extract, expand and rank without executing anything.
    #[must_use]
    pub fn explain(&self, question: &str) -> Explanation {
        self.knowledge().explain(question, self.similarity.as_ref())
    }

    /// Answer a question.
    ///
    /// Returns `Ok(None)` when no template is feasible or every candidate
    /// query comes back empty.
    ///
    /// # Errors
    ///
    /// Returns [`KgqaError::Store`] if the store fails while executing a candidate.
    pub fn ask(&self, question: &str) -> Result<Option<Answer>, KgqaError> {
        let explanation = self.explain(question);
        if explanation.ranked.is_empty() {
            debug!(question, "no feasible template");
            return Ok(None);
        }

        let Some(hit) = executor::execute(&self.store, &explanation.ranked)? else {
            return Ok(None);
        };

        let winner = &hit.winner.candidate;
        Ok(Some(Answer {
            text: projector::project(&winner.answer, &hit.row),
            matched_question: winner.question.clone(),
            query: winner.query.clone(),
            score: hit.winner.score,
            template: winner.template,
            attempts: hit.attempts,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::tests::ScriptedStore;
    use kgqa_core::category::Category;
    use kgqa_core::schema::SchemaSnapshot;
    use kgqa_core::store::{FieldValue, ResultRow};
    use kgqa_core::template::{SlotSpec, Template};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn knowledge(entities: &[&str], relations: &[&str], templates: Vec<Template>) -> Knowledge {
        let snapshot = SchemaSnapshot {
            entities: strings(entities),
            relations: strings(relations),
            ..SchemaSnapshot::default()
        };
        Knowledge::new(
            SchemaStore::from_snapshot(&snapshot).unwrap(),
            TemplateCatalog::new(templates),
        )
        .unwrap()
    }

    fn relation_template() -> Template {
        Template::new(
            "%ENT0%和%ENT1%是什么关系",
            "REL %ENT0% %ENT1%",
            SlotSpec::new([(Category::Entity, 2)]),
            "%ENT0%和%ENT1%的关系是%REL%",
        )
        .unwrap()
    }

    #[test]
    fn answers_two_entity_relation_question() {
        let mut store = ScriptedStore::default();
        store.answers.insert(
            "REL X Y".to_string(),
            vec![ResultRow::new().with(
                "REL",
                FieldValue::Relationship(vec!["朋友".to_string(), "同事".to_string()]),
            )],
        );
        let engine = QaEngine::new(knowledge(&["X", "Y"], &[], vec![relation_template()]), store);

        let explanation = engine.explain("X和Y是什么关系");
        assert_eq!(explanation.ranked.len(), 1);
        assert_eq!(explanation.ranked[0].candidate.question, "X和Y是什么关系");

        let answer = engine.ask("X和Y是什么关系").unwrap().unwrap();
        assert_eq!(answer.text, "X和Y的关系是朋友");
        assert_eq!(answer.query, "REL X Y");
        assert_eq!(answer.attempts, 1);
        assert_eq!(answer.score, 1.0);
    }

    #[test]
    fn no_mentions_means_no_answer_and_no_queries() {
        let engine = QaEngine::new(
            knowledge(&["X", "Y"], &[], vec![relation_template()]),
            ScriptedStore::default(),
        );
        assert!(engine.ask("今天天气怎么样").unwrap().is_none());
        assert!(engine.store().executed.borrow().is_empty());
    }

    #[test]
    fn candidate_count_is_binomial() {
        let engine = QaEngine::new(
            knowledge(&["A", "B", "C", "D"], &[], vec![relation_template()]),
            ScriptedStore::default(),
        );
        let explanation = engine.explain("A B C D");
        assert_eq!(explanation.mentions.count(Category::Entity), 4);
        assert_eq!(explanation.ranked.len(), 6);
    }

    #[test]
    fn lower_ranked_candidate_answers_when_best_is_empty() {
        let forward = Template::new(
            "%ENT%的%REL%是谁",
            "FWD %ENT% %REL%",
            SlotSpec::new([(Category::Entity, 1), (Category::Relation, 1)]),
            "%ENT%的%REL%是%ANS%",
        )
        .unwrap();
        let reverse = Template::new(
            "%ENT%是谁的%REL%",
            "REV %ENT% %REL%",
            SlotSpec::new([(Category::Entity, 1), (Category::Relation, 1)]),
            "%ENT%是%ANS%的%REL%",
        )
        .unwrap();
        let mut store = ScriptedStore::default();
        store.answers.insert(
            "REV 方文山 作词".to_string(),
            vec![ResultRow::new().with("ANS", "发如雪")],
        );
        let engine = QaEngine::new(knowledge(&["方文山"], &["作词"], vec![forward, reverse]), store);

        let answer = engine.ask("方文山的作词是谁").unwrap().unwrap();
        assert_eq!(answer.text, "方文山是发如雪的作词");
        assert_eq!(answer.template, 1);
        assert_eq!(answer.attempts, 2);
        assert_eq!(
            *engine.store().executed.borrow(),
            vec!["FWD 方文山 作词", "REV 方文山 作词"]
        );
    }

    #[test]
    fn store_failure_is_an_error() {
        let store = ScriptedStore {
            failing: Some("REL X Y".to_string()),
            ..ScriptedStore::default()
        };
        let engine = QaEngine::new(knowledge(&["X", "Y"], &[], vec![relation_template()]), store);
        assert!(matches!(engine.ask("X和Y是什么关系"), Err(KgqaError::Store(_))));
    }

    #[test]
    fn reload_swaps_knowledge_for_new_questions() {
        let engine = QaEngine::new(knowledge(&["X"], &[], vec![]), ScriptedStore::default());
        let before = engine.knowledge();
        engine.reload(knowledge(&["X", "Y"], &[], vec![relation_template()]));

        assert_eq!(before.catalog().len(), 0);
        assert_eq!(engine.knowledge().catalog().len(), 1);
        assert_eq!(engine.explain("X和Y是什么关系").ranked.len(), 1);
    }

    #[test]
    fn custom_similarity_changes_order() {
        struct PreferC;
        impl Similarity for PreferC {
            fn score(&self, _: &str, candidate: &str) -> f64 {
                if candidate.contains('C') {
                    1.0
                } else {
                    0.0
                }
            }
        }
        let engine = QaEngine::new(
            knowledge(&["A", "B", "C"], &[], vec![relation_template()]),
            ScriptedStore::default(),
        )
        .with_similarity(PreferC);
        let ranked = engine.explain("A和B和C").ranked;
        let questions: Vec<&str> = ranked.iter().map(|r| r.candidate.question.as_str()).collect();
        assert_eq!(
            questions,
            vec!["A和C是什么关系", "B和C是什么关系", "A和B是什么关系"]
        );
    }

    #[test]
    fn answers_against_sqlite_graph() {
        use kgqa_store::{GraphData, LabelCleaner, SqliteGraph, Triple};

        let triple = |s: &str, p: &str, o: &str| Triple {
            subject: s.to_string(),
            predicate: p.to_string(),
            object: o.to_string(),
        };
        let data = GraphData::from_triples(
            &[
                triple("周杰伦", "毕业院校", "淡江中学"),
                triple("淡江中学", "知名校友", "周杰伦"),
            ],
            &[],
            &LabelCleaner::new(vec![]),
        );
        let mut graph = SqliteGraph::in_memory().unwrap();
        graph.load(&data).unwrap();

        let template = Template::new(
            "%ENT0%和%ENT1%是什么关系",
            "SELECT REL FROM (SELECT json_group_array(relation) AS REL, COUNT(*) AS n \
             FROM (SELECT relation FROM relations \
             WHERE (head = '%ENT0%' AND tail = '%ENT1%') OR (head = '%ENT1%' AND tail = '%ENT0%') \
             ORDER BY seq)) WHERE n > 0",
            SlotSpec::new([(Category::Entity, 2)]),
            "%ENT0%和%ENT1%的关系是%REL%",
        )
        .unwrap();
        let engine = QaEngine::new(knowledge(&["周杰伦", "淡江中学"], &[], vec![template]), graph);

        let answer = engine.ask("周杰伦和淡江中学是什么关系").unwrap().unwrap();
        assert_eq!(answer.text, "周杰伦和淡江中学的关系是毕业院校");
        assert!(engine.ask("淡江中学和昆凌是什么关系").unwrap().is_none());
    }

    #[test]
    fn apostrophe_in_entity_name_still_answers() {
        use kgqa_store::{GraphData, LabelCleaner, SqliteGraph, Triple};

        let data = GraphData::from_triples(
            &[],
            &[Triple {
                subject: "Don't Cry".to_string(),
                predicate: "作曲".to_string(),
                object: "Slash".to_string(),
            }],
            &LabelCleaner::new(vec![]),
        );
        let mut graph = SqliteGraph::in_memory().unwrap();
        graph.load(&data).unwrap();

        let schema = SchemaStore::from_snapshot(&data.snapshot()).unwrap();
        let template = Template::new(
            "%ENT%的%ATT%是什么",
            "SELECT value AS ANS FROM attributes WHERE entity = '%ENT%' AND attribute = '%ATT%'",
            SlotSpec::new([(Category::Entity, 1), (Category::Attribute, 1)]),
            "%ENT%的%ATT%是%ANS%",
        )
        .unwrap();
        let engine = QaEngine::new(
            Knowledge::new(schema, TemplateCatalog::new(vec![template])).unwrap(),
            graph,
        );

        let answer = engine.ask("Don't Cry的作曲是什么").unwrap().unwrap();
        assert_eq!(answer.text, "Don't Cry的作曲是Slash");
        assert!(answer.query.contains("'Don''t Cry'"));
    }
}
