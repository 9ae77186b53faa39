//! Candidate execution: runs ranked queries until one yields records.

use kgqa_core::error::StoreError;
use kgqa_core::store::{GraphStore, ResultRow};
use tracing::debug;

use crate::ranker::RankedCandidate;

/// The first candidate whose query returned at least one record.
#[derive(Debug, Clone)]
pub struct Hit<'a> {
    pub winner: &'a RankedCandidate,
    /// First record of the winning query.
    pub row: ResultRow,
    /// Records the winning query returned in total.
    pub total: usize,
    /// Queries run, including the winner.
    pub attempts: usize,
}

/// Run candidates in rank order and stop at the first non-empty result.
///
/// Candidates after the winner are never executed.
///
/// # Errors
///
/// A store failure aborts the walk and is returned as is.
pub fn execute<'a, S>(store: &S, ranked: &'a [RankedCandidate]) -> Result<Option<Hit<'a>>, StoreError>
where
    S: GraphStore + ?Sized,
{
    for (i, candidate) in ranked.iter().enumerate() {
        debug!(
            attempt = i + 1,
            score = candidate.score,
            template = candidate.candidate.template,
            query = %candidate.candidate.query,
            "executing candidate"
        );
        let rows = store.run(&candidate.candidate.query)?;
        let total = rows.len();
        if let Some(row) = rows.into_iter().next() {
            return Ok(Some(Hit {
                winner: candidate,
                row,
                total,
                attempts: i + 1,
            }));
        }
    }

    debug!(attempts = ranked.len(), "no candidate returned records");
    Ok(None)
}
