//! Fair randomized assignment of a result pool across a domain pool.
//!
//! Both pools are shuffled, then domain items are taken front to back and
//! each receives a slice of the remaining results sized by [`distribute`].
//! Every result is handed out exactly once and every domain item receives
//! exactly one (possibly empty) list.

use std::hash::Hash;

use chl_core::{OverridePriority, OverrideTable};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// How many results the next domain item receives.
///
/// `domain_left` counts the item being served. With `r = q * n + m`
/// (`n = domain_left`), the item gets `q + 1` with probability `m / n` and
/// `q` otherwise. The remainder always stays within the same floor/ceiling
/// band, so exactly `m` items of the whole run get the ceiling and the last
/// item takes whatever is left.
pub fn distribute<R: Rng>(domain_left: usize, results_left: usize, rng: &mut R) -> usize {
    match domain_left {
        0 => 0,
        1 => results_left,
        n => {
            let base = results_left / n;
            let remainder = results_left % n;
            if remainder > 0 && rng.random_range(0..n) < remainder {
                base + 1
            } else {
                base
            }
        }
    }
}

/// Outcome of a populate call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Population {
    /// This many domain keys were written.
    Written(usize),
    /// The engine is disabled and wrote nothing.
    Disabled,
}

/// Seeded randomizer owned by one randomizer challenge.
#[derive(Debug, Clone)]
pub struct RandomizationEngine {
    rng: StdRng,
    disabled: bool,
}

impl RandomizationEngine {
    /// Create an engine with a deterministic stream.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            disabled: false,
        }
    }

    /// Whether an invariant failure has switched this engine off.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    #[cfg(test)]
    pub(crate) fn switch_off(&mut self) {
        self.disabled = true;
    }

    /// Build a fresh assignment. Returns `None` if results were left over,
    /// which cannot happen unless [`distribute`] is broken.
    pub fn assign<K: Clone, V: Clone>(&mut self, domain: &[K], results: &[V]) -> Option<Vec<(K, Vec<V>)>> {
        let mut domain = domain.to_vec();
        let mut results = results.to_vec();
        domain.shuffle(&mut self.rng);
        results.shuffle(&mut self.rng);

        let mut assignment = Vec::with_capacity(domain.len());
        let mut pending = results.into_iter();
        let mut results_left = pending.len();
        let mut domain_left = domain.len();

        for key in domain {
            let take = distribute(domain_left, results_left, &mut self.rng).min(results_left);
            let values: Vec<V> = pending.by_ref().take(take).collect();
            results_left -= values.len();
            domain_left -= 1;
            assignment.push((key, values));
        }

        if results_left > 0 && !assignment.is_empty() {
            return None;
        }
        Some(assignment)
    }

    /// Regenerate the assignment and write it into the Randomizer layer of
    /// `table`. Previous Randomizer layers for `domain` are replaced.
    ///
    /// On an invariant failure the engine disables itself and writes
    /// nothing. Debug builds panic instead.
    pub fn populate<K, V>(&mut self, table: &mut OverrideTable<K, V>, domain: &[K], results: &[V]) -> Population
    where
        K: Clone + Eq + Hash,
        V: Clone,
    {
        if self.disabled {
            tracing::warn!("randomization engine is disabled; skipping populate");
            return Population::Disabled;
        }

        let Some(assignment) = self.assign(domain, results) else {
            if cfg!(debug_assertions) {
                panic!("randomization left results unassigned");
            }
            tracing::error!(
                domain = domain.len(),
                results = results.len(),
                "randomization left results unassigned; disabling engine"
            );
            self.disabled = true;
            return Population::Disabled;
        };

        let written = assignment.len();
        for (key, values) in assignment {
            table.set(key, OverridePriority::Randomizer, values);
        }
        tracing::debug!(
            domain = domain.len(),
            results = results.len(),
            "randomized assignment written"
        );
        Population::Written(written)
    }

    /// Remove the Randomizer layers for `domain`. Other priorities and other
    /// keys are untouched.
    pub fn clear<K, V>(table: &mut OverrideTable<K, V>, domain: &[K]) -> usize
    where
        K: Eq + Hash,
    {
        let removed = table.reset_keys(OverridePriority::Randomizer, domain);
        tracing::debug!(removed, "randomized assignment cleared");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}{i}")).collect()
    }

    fn flatten(assignment: &[(String, Vec<String>)]) -> Vec<String> {
        let mut all: Vec<String> = assignment.iter().flat_map(|(_, v)| v.clone()).collect();
        all.sort();
        all
    }

    #[test]
    fn distribute_edges() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(distribute(0, 5, &mut rng), 0);
        assert_eq!(distribute(1, 5, &mut rng), 5);
        assert_eq!(distribute(4, 0, &mut rng), 0);
        assert_eq!(distribute(3, 6, &mut rng), 2);
    }

    #[test]
    fn distribute_stays_within_floor_and_ceiling() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let k = distribute(4, 10, &mut rng);
            assert!(k == 2 || k == 3, "got {k}");
        }
    }

    #[test]
    fn assignment_is_total_and_exact() {
        let domain = names("block", 7);
        let results = names("item", 23);
        let mut engine = RandomizationEngine::new(42);
        let assignment = engine.assign(&domain, &results).unwrap();

        assert_eq!(assignment.len(), 7);
        let mut keys: Vec<_> = assignment.iter().map(|(k, _)| k.clone()).collect();
        keys.sort();
        let mut expected_keys = domain.clone();
        expected_keys.sort();
        assert_eq!(keys, expected_keys);

        let mut expected = results.clone();
        expected.sort();
        assert_eq!(flatten(&assignment), expected);

        for (_, values) in &assignment {
            assert!(values.len() == 3 || values.len() == 4);
        }
    }

    #[test]
    fn fewer_results_than_domain() {
        let domain = names("block", 5);
        let results = names("item", 2);
        let mut engine = RandomizationEngine::new(3);
        let assignment = engine.assign(&domain, &results).unwrap();
        assert_eq!(assignment.len(), 5);
        assert_eq!(assignment.iter().filter(|(_, v)| v.len() == 1).count(), 2);
        assert_eq!(assignment.iter().filter(|(_, v)| v.is_empty()).count(), 3);
    }

    #[test]
    fn empty_results_map_to_empty_lists() {
        let domain = names("block", 3);
        let mut engine = RandomizationEngine::new(3);
        let assignment = engine.assign::<String, String>(&domain, &[]).unwrap();
        assert_eq!(assignment.len(), 3);
        assert!(assignment.iter().all(|(_, v)| v.is_empty()));
    }

    #[test]
    fn empty_domain_writes_nothing() {
        let mut table = OverrideTable::new();
        let domain: Vec<String> = Vec::new();
        let mut engine = RandomizationEngine::new(3);
        let written = engine.populate(&mut table, &domain, &names("item", 4));
        assert_eq!(written, Population::Written(0));
        assert!(table.is_empty());
    }

    #[test]
    fn same_seed_same_assignment() {
        let domain = names("block", 10);
        let results = names("item", 10);
        let a = RandomizationEngine::new(5).assign(&domain, &results);
        let b = RandomizationEngine::new(5).assign(&domain, &results);
        assert_eq!(a, b);
    }

    #[test]
    fn populate_and_clear_only_touch_randomizer_layer() {
        let domain = names("block", 3);
        let results = names("item", 3);
        let mut table = OverrideTable::new();
        table.set("block0".to_string(), OverridePriority::Explicit, vec!["gold".to_string()]);
        table.set("unrelated".to_string(), OverridePriority::Randomizer, vec![]);

        let mut engine = RandomizationEngine::new(11);
        assert_eq!(engine.populate(&mut table, &domain, &results), Population::Written(3));
        assert_eq!(table.count(OverridePriority::Randomizer), 4);
        assert_eq!(table.resolve(&"block0".to_string()), Some(&["gold".to_string()][..]));

        assert_eq!(RandomizationEngine::clear(&mut table, &domain), 3);
        assert_eq!(table.count(OverridePriority::Randomizer), 1);
        assert_eq!(
            table.layer(&"block0".to_string(), OverridePriority::Explicit),
            Some(&["gold".to_string()][..])
        );
    }
}
