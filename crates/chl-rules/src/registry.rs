//! The challenge catalog and its override table.

use std::collections::{BTreeMap, HashMap};

use chl_core::{DomainEvent, OverridePriority, OverrideTable, PlayerId, SessionClock};
use serde::{Deserialize, Serialize};

use crate::entry::{ChallengeEntry, ChallengeVariant, GoalState};
use crate::error::{RulesError, RulesResult};
use crate::goal::{self, GoalReached};
use crate::randomizer::{Population, RandomizationEngine};

/// Persisted settings of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingRecord {
    /// Whether the entry was enabled.
    pub enabled: bool,
    /// The entry's setting value.
    pub value: i32,
}

/// Persisted settings of the whole registry, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsSnapshot {
    /// Settings by challenge id.
    pub entries: BTreeMap<String, SettingRecord>,
}

impl SettingsSnapshot {
    /// Encode as JSON bytes.
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec_pretty(self).unwrap_or_default()
    }

    /// Decode from JSON bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Persisted goal progress, keyed by goal id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GamestateSnapshot {
    /// Progress by goal id.
    pub goals: BTreeMap<String, GoalState>,
}

impl GamestateSnapshot {
    /// Encode as JSON bytes.
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec_pretty(self).unwrap_or_default()
    }

    /// Decode from JSON bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Catalog of challenge entries in registration order.
///
/// Owns the override table that randomizers write into and one
/// [`RandomizationEngine`] per randomizer entry.
#[derive(Debug)]
pub struct ChallengeRegistry {
    entries: Vec<ChallengeEntry>,
    index: HashMap<String, usize>,
    engines: HashMap<String, RandomizationEngine>,
    overrides: OverrideTable<String, String>,
    seed: u64,
    evaluating: bool,
}

impl ChallengeRegistry {
    /// Create an empty registry. Randomizer seeds derive from `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            engines: HashMap::new(),
            overrides: OverrideTable::new(),
            seed,
            evaluating: true,
        }
    }

    /// Add an entry. An entry registered as enabled is activated right away.
    pub fn register(&mut self, entry: ChallengeEntry) -> RulesResult<()> {
        if self.index.contains_key(&entry.id) {
            return Err(RulesError::DuplicateId(entry.id));
        }
        let idx = self.entries.len();
        if entry.is_randomizer() {
            let seed = self.seed ^ (idx as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
            self.engines.insert(entry.id.clone(), RandomizationEngine::new(seed));
        }
        tracing::debug!(id = %entry.id, kind = entry.variant.tag(), "challenge registered");
        self.index.insert(entry.id.clone(), idx);
        let enabled = entry.enabled;
        self.entries.push(entry);
        if enabled {
            self.activate(idx);
        }
        Ok(())
    }

    /// Look up an entry.
    pub fn get(&self, id: &str) -> Option<&ChallengeEntry> {
        self.index.get(id).map(|&idx| &self.entries[idx])
    }

    /// All entries in registration order.
    pub fn entries(&self) -> &[ChallengeEntry] {
        &self.entries
    }

    /// Ids of goal entries, in registration order.
    pub fn goal_ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.is_goal())
            .map(|e| e.id.clone())
            .collect()
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Enable an entry. Randomizers populate their layer. Enabling an
    /// enabled entry does nothing. A randomizer whose engine has switched
    /// itself off stays disabled and yields [`RulesError::Unavailable`].
    pub fn enable(&mut self, id: &str) -> RulesResult<()> {
        let idx = self.position(id)?;
        if self.entries[idx].enabled {
            return Ok(());
        }
        self.entries[idx].enabled = true;
        self.activate(idx);
        if !self.entries[idx].enabled {
            return Err(RulesError::Unavailable(id.to_string()));
        }
        tracing::info!(id, "challenge enabled");
        Ok(())
    }

    /// Disable an entry. Randomizers clear their layer; goals forget their
    /// winner.
    pub fn disable(&mut self, id: &str) -> RulesResult<()> {
        let idx = self.position(id)?;
        if !self.entries[idx].enabled {
            return Ok(());
        }
        self.entries[idx].enabled = false;
        tracing::info!(id, "challenge disabled");
        self.deactivate(idx);
        Ok(())
    }

    /// Change an entry's setting value. Rejected values leave the entry
    /// untouched. An enabled randomizer regenerates its assignment.
    pub fn set_value(&mut self, id: &str, value: i32) -> RulesResult<()> {
        let idx = self.position(id)?;
        let entry = &mut self.entries[idx];
        if !entry.range.contains(value) {
            return Err(RulesError::OutOfRange {
                id: id.to_string(),
                value,
                min: entry.range.min,
                max: entry.range.max,
            });
        }
        entry.value = value;
        if entry.enabled && entry.is_randomizer() {
            self.deactivate(idx);
            self.activate(idx);
        }
        Ok(())
    }

    /// Snapshot `{id: (enabled, value)}` for every entry.
    pub fn save_settings(&self) -> SettingsSnapshot {
        SettingsSnapshot {
            entries: self
                .entries
                .iter()
                .map(|e| {
                    (
                        e.id.clone(),
                        SettingRecord {
                            enabled: e.enabled,
                            value: e.value,
                        },
                    )
                })
                .collect(),
        }
    }

    /// Apply persisted settings. Unknown ids and out-of-range values are
    /// logged and skipped.
    pub fn load_settings(&mut self, snapshot: &SettingsSnapshot) {
        for (id, record) in &snapshot.entries {
            let Some(&idx) = self.index.get(id) else {
                tracing::warn!(id = %id, "ignoring settings for unknown challenge");
                continue;
            };

            let entry = &mut self.entries[idx];
            let mut value_changed = false;
            if entry.range.contains(record.value) {
                value_changed = entry.value != record.value;
                entry.value = record.value;
            } else {
                tracing::warn!(
                    id = %id,
                    value = record.value,
                    min = entry.range.min,
                    max = entry.range.max,
                    "ignoring out-of-range persisted value"
                );
            }

            match (entry.enabled, record.enabled) {
                (false, true) => {
                    entry.enabled = true;
                    self.activate(idx);
                }
                (true, false) => {
                    entry.enabled = false;
                    self.deactivate(idx);
                }
                (true, true) if value_changed && entry.is_randomizer() => {
                    self.deactivate(idx);
                    self.activate(idx);
                }
                _ => {}
            }
        }
    }

    /// Snapshot the progress of every reached goal.
    pub fn save_gamestate(&self) -> GamestateSnapshot {
        GamestateSnapshot {
            goals: self
                .entries
                .iter()
                .filter_map(|e| e.goal_state().filter(|s| s.reached).map(|s| (e.id.clone(), s.clone())))
                .collect(),
        }
    }

    /// Apply persisted goal progress. Unknown ids and non-goal entries are
    /// logged and skipped.
    pub fn load_gamestate(&mut self, snapshot: &GamestateSnapshot) {
        for (id, state) in &snapshot.goals {
            let Some(&idx) = self.index.get(id) else {
                tracing::warn!(id = %id, "ignoring progress for unknown goal");
                continue;
            };
            match &mut self.entries[idx].variant {
                ChallengeVariant::Goal(spec) => spec.state = state.clone(),
                _ => tracing::warn!(id = %id, "ignoring progress for a challenge that is not a goal"),
            }
        }
    }

    /// Drop every randomized assignment without touching settings.
    pub fn clear_cache(&mut self) -> usize {
        let removed = self.overrides.reset(OverridePriority::Randomizer);
        tracing::debug!(removed, "randomization cache cleared");
        removed
    }

    /// The override table.
    pub fn overrides(&self) -> &OverrideTable<String, String> {
        &self.overrides
    }

    /// Mutable access to the override table, for explicit overrides.
    pub fn overrides_mut(&mut self) -> &mut OverrideTable<String, String> {
        &mut self.overrides
    }

    /// Whether goals are currently being evaluated.
    pub fn is_evaluating(&self) -> bool {
        self.evaluating
    }

    /// Stop evaluating goals until the next session reset.
    pub fn suspend_evaluation(&mut self) {
        if self.evaluating {
            tracing::debug!("goal evaluation suspended");
        }
        self.evaluating = false;
    }

    /// Forget every goal's progress and resume evaluation.
    pub fn on_session_reset(&mut self) {
        for entry in &mut self.entries {
            if let ChallengeVariant::Goal(spec) = &mut entry.variant {
                spec.state.clear();
            }
        }
        self.evaluating = true;
    }

    /// Evaluate one goal against an event.
    pub fn evaluate_goal(&mut self, id: &str, event: &DomainEvent, session: &mut SessionClock) -> Option<GoalReached> {
        if !self.evaluating {
            return None;
        }
        let idx = *self.index.get(id)?;
        goal::evaluate(&mut self.entries[idx], event, session)
    }

    /// Winners of every reached goal, in registration order.
    pub fn winners(&self) -> Vec<PlayerId> {
        self.entries.iter().filter_map(|e| e.winner().cloned()).collect()
    }

    fn position(&self, id: &str) -> RulesResult<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| RulesError::NotFound(id.to_string()))
    }

    fn activate(&mut self, idx: usize) {
        let entry = &mut self.entries[idx];
        let ChallengeVariant::Randomizer(spec) = &entry.variant else {
            return;
        };
        let Some(engine) = self.engines.get_mut(&entry.id) else {
            return;
        };
        if engine.populate(&mut self.overrides, &spec.domain, &spec.results) == Population::Disabled {
            tracing::warn!(id = %entry.id, "randomizer could not populate; disabling challenge");
            entry.enabled = false;
        }
    }

    fn deactivate(&mut self, idx: usize) {
        let entry = &mut self.entries[idx];
        match &mut entry.variant {
            ChallengeVariant::Randomizer(spec) => {
                RandomizationEngine::clear(&mut self.overrides, &spec.domain);
            }
            ChallengeVariant::Goal(spec) => spec.state.clear(),
            ChallengeVariant::Modifier(_) => {}
        }
    }
}
