//! Candidate ranking by surface similarity to the user's question.

use std::collections::HashSet;

use crate::expander::Candidate;

/// Scores how close an instantiated question is to the user's question.
pub trait Similarity {
    /// A score in `[0, 1]`; higher is closer.
    fn score(&self, question: &str, candidate: &str) -> f64;
}

/// Jaccard index over the sets of characters of both strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharJaccard;

impl Similarity for CharJaccard {
    fn score(&self, question: &str, candidate: &str) -> f64 {
        jaccard(question, candidate)
    }
}

/// `|A ∩ B| / |A ∪ B|` over character sets. Two empty strings score 0.
#[must_use]
pub fn jaccard(a: &str, b: &str) -> f64 {
    let a: HashSet<char> = a.chars().collect();
    let b: HashSet<char> = b.chars().collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub score: f64,
    pub candidate: Candidate,
}

/// Score every candidate and sort by descending score.
///
/// The sort is stable: equal scores keep generation order.
pub fn rank<S>(
    similarity: &S,
    question: &str,
    candidates: impl IntoIterator<Item = Candidate>,
) -> Vec<RankedCandidate>
where
    S: Similarity + ?Sized,
{
    let mut ranked: Vec<RankedCandidate> = candidates
        .into_iter()
        .map(|candidate| RankedCandidate {
            score: similarity.score(question, &candidate.question),
            candidate,
        })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expander::Binding;
    use kgqa_parser::Pattern;
    use proptest::prelude::*;

    fn candidate(template: usize, question: &str) -> Candidate {
        Candidate {
            template,
            question: question.to_string(),
            query: String::new(),
            answer: Pattern::default(),
            binding: Binding::default(),
        }
    }

    #[test]
    fn jaccard_known_values() {
        assert_eq!(jaccard("abc", "abc"), 1.0);
        assert_eq!(jaccard("abc", "xyz"), 0.0);
        assert_eq!(jaccard("", ""), 0.0);
        assert_eq!(jaccard("ab", ""), 0.0);
        assert!((jaccard("abcd", "abxy") - 2.0 / 6.0).abs() < 1e-12);
        // Repeated characters count once.
        assert_eq!(jaccard("aaab", "ab"), 1.0);
    }

    #[test]
    fn rank_orders_by_score_and_keeps_ties_stable() {
        let ranked = rank(
            &CharJaccard,
            "abcd",
            vec![candidate(0, "xyz"), candidate(1, "abxy"), candidate(2, "abcd"), candidate(3, "abyx")],
        );
        let order: Vec<usize> = ranked.iter().map(|r| r.candidate.template).collect();
        assert_eq!(order, vec![2, 1, 3, 0]);
        assert_eq!(ranked[0].score, 1.0);
    }

    #[test]
    fn custom_similarity_is_used() {
        struct Length;
        impl Similarity for Length {
            fn score(&self, _: &str, candidate: &str) -> f64 {
                candidate.chars().count() as f64
            }
        }
        let ranked = rank(&Length, "", vec![candidate(0, "a"), candidate(1, "abc")]);
        assert_eq!(ranked[0].candidate.template, 1);
    }

    proptest! {
        #[test]
        fn jaccard_is_symmetric_and_bounded(a in "\\PC{0,12}", b in "\\PC{0,12}") {
            let ab = jaccard(&a, &b);
            prop_assert_eq!(ab, jaccard(&b, &a));
            prop_assert!((0.0..=1.0).contains(&ab));
        }

        #[test]
        fn jaccard_identity(a in "\\PC{1,12}") {
            prop_assert_eq!(jaccard(&a, &a), 1.0);
        }
    }
}
