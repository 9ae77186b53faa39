//! Slot expansion: binds mentions to template placeholders.
//!
//! For a template requiring `k` slots of a category with `m` mentions, every
//! `k`-combination of the mention positions is tried (in lexicographic order,
//! slot 0 taking the earliest mention). Categories are combined as a
//! Cartesian product with the last category varying fastest. Both come from
//! `itertools` adaptors and are lazy, so a template is expanded only as far
//! as it is consumed.

use std::collections::BTreeMap;
use std::iter::{self, Once};
use std::ops::Range;

use itertools::structs::{Combinations, MultiProduct};
use itertools::{Either, Itertools};

use kgqa_core::category::{Category, SlotKey};
use kgqa_core::template::{SlotSpec, Template, TemplateCatalog};
use kgqa_parser::{Pattern, Resolve};

use crate::extractor::MentionSet;

/// Placeholder values chosen for one candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binding {
    values: BTreeMap<SlotKey, String>,
}

impl Binding {
    pub fn insert(&mut self, key: SlotKey, value: impl Into<String>) {
        self.values.insert(key, value.into());
    }

    #[must_use]
    pub fn get(&self, key: &SlotKey) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SlotKey, &str)> {
        self.values.iter().map(|(k, v)| (k, v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Binding {
    /// The same binding with `'` doubled in every value, for substitution
    /// into single-quoted query literals.
    fn quote_escaped(&self) -> Binding {
        Binding {
            values: self
                .values
                .iter()
                .map(|(key, value)| (*key, value.replace('\'', "''")))
                .collect(),
        }
    }
}

impl Resolve for Binding {
    fn resolve(&self, name: &str) -> Option<&str> {
        SlotKey::parse(name).and_then(|key| self.get(&key))
    }
}

/// A template instantiated with one binding.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Position of the source template in the catalog.
    pub template: usize,
    pub question: String,
    pub query: String,
    /// Answer pattern with slots filled; result-field tokens stay open.
    pub answer: Pattern,
    pub binding: Binding,
}

/// Whether `mentions` supply enough terms for every requirement of `spec`.
#[must_use]
pub fn is_feasible(spec: &SlotSpec, mentions: &MentionSet) -> bool {
    spec.iter().all(|(category, k)| mentions.count(category) >= k)
}

/// Number of candidates [`expand`] yields: the product of `C(m, k)` per category.
///
/// Saturates at `usize::MAX`.
#[must_use]
pub fn expansion_size(spec: &SlotSpec, mentions: &MentionSet) -> usize {
    spec.iter().fold(1usize, |acc, (category, k)| {
        acc.saturating_mul(binomial(mentions.count(category), k))
    })
}

fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: usize = 1;
    for i in 0..k {
        // Exact at every step: result * (n - i) is divisible by (i + 1).
        result = match result.checked_mul(n - i) {
            Some(v) => v / (i + 1),
            None => return usize::MAX,
        };
    }
    result
}

/// Mention positions picked per category, one `Vec` per required category.
type Choices = Either<MultiProduct<Combinations<Range<usize>>>, Once<Vec<Vec<usize>>>>;

/// Every way to pick `k` of `n` mentions per category, given as `(n, k)`.
///
/// Combinations come in lexicographic order and the last category varies
/// fastest. No categories means exactly one empty choice.
fn choices(shape: impl IntoIterator<Item = (usize, usize)>) -> Choices {
    let per_category: Vec<_> = shape
        .into_iter()
        .map(|(n, k)| (0..n).combinations(k))
        .collect();
    if per_category.is_empty() {
        Either::Right(iter::once(Vec::new()))
    } else {
        Either::Left(per_category.into_iter().multi_cartesian_product())
    }
}

/// Lazy candidates for one template.
#[derive(Clone)]
pub struct Expansion<'a> {
    index: usize,
    template: &'a Template,
    pools: Vec<(Category, usize, &'a [String])>,
    choices: Choices,
}

impl<'a> Expansion<'a> {
    fn bind(&self, choice: &[Vec<usize>]) -> Binding {
        let mut binding = Binding::default();
        for (&(category, k, pool), picked) in self.pools.iter().zip(choice) {
            if k == 1 {
                binding.insert(SlotKey::single(category), pool[picked[0]].as_str());
            } else {
                for (slot, &mention) in picked.iter().enumerate() {
                    binding.insert(SlotKey::numbered(category, slot), pool[mention].as_str());
                }
            }
        }
        binding
    }
}

impl Iterator for Expansion<'_> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        let choice = self.choices.next()?;
        let binding = self.bind(&choice);
        Some(Candidate {
            template: self.index,
            question: self.template.question.substitute(&binding).render(),
            query: self
                .template
                .query
                .substitute(&binding.quote_escaped())
                .render(),
            answer: self.template.answer.substitute(&binding),
            binding,
        })
    }
}

/// Expand one template against the mentions, or `None` if it is infeasible.
#[must_use]
pub fn expand<'a>(
    index: usize,
    template: &'a Template,
    mentions: &'a MentionSet,
) -> Option<Expansion<'a>> {
    if !is_feasible(&template.slots, mentions) {
        return None;
    }

    let pools: Vec<(Category, usize, &[String])> = template
        .slots
        .iter()
        .map(|(category, k)| (category, k, mentions.get(category)))
        .collect();
    let choices = choices(pools.iter().map(|&(_, k, pool)| (pool.len(), k)));

    Some(Expansion {
        index,
        template,
        pools,
        choices,
    })
}

/// Candidates for every feasible template, in catalog order.
pub fn expand_catalog<'a>(
    catalog: &'a TemplateCatalog,
    mentions: &'a MentionSet,
) -> impl Iterator<Item = Candidate> + 'a {
    catalog
        .iter()
        .enumerate()
        .filter_map(move |(i, template)| expand(i, template, mentions))
        .flatten()
}
