//! Priority-layered overrides of game outcomes.
//!
//! Each key (a domain object such as a block kind) may carry one value list
//! per [`OverridePriority`]. Resolution always picks the highest layer, so an
//! explicitly set outcome shadows a randomized one, which in turn shadows a
//! default. Layers never merge.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// Precedence tier of an override layer. Later variants win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverridePriority {
    /// Baseline outcomes supplied at startup.
    Default,
    /// Outcomes written by a randomizer challenge.
    Randomizer,
    /// Outcomes set directly by a player or operator.
    Explicit,
}

/// A mapping from key to priority-tagged value lists.
#[derive(Debug, Clone)]
pub struct OverrideTable<K, V> {
    layers: HashMap<K, BTreeMap<OverridePriority, Vec<V>>>,
}

impl<K, V> Default for OverrideTable<K, V> {
    fn default() -> Self {
        Self {
            layers: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V> OverrideTable<K, V> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value list of one layer, replacing whatever that layer held.
    /// An empty list is a valid override ("yields nothing").
    pub fn set(&mut self, key: K, priority: OverridePriority, values: Vec<V>) {
        self.layers.entry(key).or_default().insert(priority, values);
    }

    /// Remove one layer of one key. Returns the removed values, if any.
    pub fn remove(&mut self, key: &K, priority: OverridePriority) -> Option<Vec<V>> {
        let layers = self.layers.get_mut(key)?;
        let removed = layers.remove(&priority);
        if layers.is_empty() {
            self.layers.remove(key);
        }
        removed
    }

    /// The effective value list for `key`: the layer with the highest
    /// priority, or `None` when the key has no override at all.
    pub fn resolve(&self, key: &K) -> Option<&[V]> {
        self.layers
            .get(key)
            .and_then(|layers| layers.values().next_back())
            .map(Vec::as_slice)
    }

    /// The value list of a single layer, ignoring precedence.
    pub fn layer(&self, key: &K, priority: OverridePriority) -> Option<&[V]> {
        self.layers
            .get(key)
            .and_then(|layers| layers.get(&priority))
            .map(Vec::as_slice)
    }

    /// Remove every layer tagged `priority`, for all keys.
    /// Returns the number of layers removed.
    pub fn reset(&mut self, priority: OverridePriority) -> usize {
        let mut removed = 0;
        self.layers.retain(|_, layers| {
            if layers.remove(&priority).is_some() {
                removed += 1;
            }
            !layers.is_empty()
        });
        removed
    }

    /// Remove the layers tagged `priority` for the given keys only.
    /// Returns the number of layers removed.
    pub fn reset_keys<'a, I>(&mut self, priority: OverridePriority, keys: I) -> usize
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        keys.into_iter()
            .filter(|key| self.remove(key, priority).is_some())
            .count()
    }

    /// Number of layers at `priority` across all keys.
    pub fn count(&self, priority: OverridePriority) -> usize {
        self.layers
            .values()
            .filter(|layers| layers.contains_key(&priority))
            .count()
    }

    /// Iterate over the keys and values of every layer at `priority`.
    pub fn entries_at(&self, priority: OverridePriority) -> impl Iterator<Item = (&K, &[V])> {
        self.layers.iter().filter_map(move |(key, layers)| {
            layers.get(&priority).map(|values| (key, values.as_slice()))
        })
    }

    /// Number of keys with at least one layer.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether no key has any layer.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> OverrideTable<&'static str, &'static str> {
        OverrideTable::new()
    }

    #[test]
    fn resolve_picks_highest_priority() {
        let mut t = table();
        t.set("stone", OverridePriority::Default, vec!["cobblestone"]);
        t.set("stone", OverridePriority::Randomizer, vec!["apple"]);
        assert_eq!(t.resolve(&"stone"), Some(&["apple"][..]));

        t.set("stone", OverridePriority::Explicit, vec!["diamond", "emerald"]);
        assert_eq!(t.resolve(&"stone"), Some(&["diamond", "emerald"][..]));
    }

    #[test]
    fn resolve_unknown_key_is_none() {
        let t = table();
        assert!(t.resolve(&"dirt").is_none());
    }

    #[test]
    fn empty_layer_still_shadows() {
        let mut t = table();
        t.set("stone", OverridePriority::Default, vec!["cobblestone"]);
        t.set("stone", OverridePriority::Randomizer, vec![]);
        assert_eq!(t.resolve(&"stone"), Some(&[][..]));
    }

    #[test]
    fn set_replaces_same_layer() {
        let mut t = table();
        t.set("stone", OverridePriority::Randomizer, vec!["apple"]);
        t.set("stone", OverridePriority::Randomizer, vec!["bread"]);
        assert_eq!(t.layer(&"stone", OverridePriority::Randomizer), Some(&["bread"][..]));
        assert_eq!(t.count(OverridePriority::Randomizer), 1);
    }

    #[test]
    fn reset_removes_only_that_priority() {
        let mut t = table();
        t.set("stone", OverridePriority::Explicit, vec!["diamond"]);
        t.set("stone", OverridePriority::Randomizer, vec!["apple"]);
        t.set("dirt", OverridePriority::Randomizer, vec!["stick"]);
        t.set("sand", OverridePriority::Default, vec!["sand"]);

        assert_eq!(t.reset(OverridePriority::Randomizer), 2);
        assert_eq!(t.count(OverridePriority::Randomizer), 0);
        assert_eq!(t.resolve(&"stone"), Some(&["diamond"][..]));
        assert_eq!(t.resolve(&"sand"), Some(&["sand"][..]));
        assert!(t.resolve(&"dirt").is_none());
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn reset_keys_is_scoped() {
        let mut t = table();
        t.set("stone", OverridePriority::Randomizer, vec!["apple"]);
        t.set("dirt", OverridePriority::Randomizer, vec!["stick"]);
        t.set("dirt", OverridePriority::Default, vec!["dirt"]);

        assert_eq!(t.reset_keys(OverridePriority::Randomizer, &["dirt", "gravel"]), 1);
        assert_eq!(t.resolve(&"stone"), Some(&["apple"][..]));
        assert_eq!(t.resolve(&"dirt"), Some(&["dirt"][..]));
    }

    #[test]
    fn remove_drops_empty_keys() {
        let mut t = table();
        t.set("stone", OverridePriority::Explicit, vec!["diamond"]);
        assert_eq!(t.remove(&"stone", OverridePriority::Explicit), Some(vec!["diamond"]));
        assert!(t.is_empty());
        assert!(t.remove(&"stone", OverridePriority::Explicit).is_none());
    }

    #[test]
    fn entries_at_lists_one_priority() {
        let mut t = table();
        t.set("stone", OverridePriority::Randomizer, vec!["apple"]);
        t.set("dirt", OverridePriority::Explicit, vec!["stick"]);
        let entries: Vec<_> = t.entries_at(OverridePriority::Randomizer).collect();
        assert_eq!(entries, vec![(&"stone", &["apple"][..])]);
    }
}
