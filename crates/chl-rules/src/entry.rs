//! Challenge entries: one registered game rule each.
//!
//! Behavior is selected by the [`ChallengeVariant`] tag and the data it
//! carries, not by a type per challenge. A goal is a predicate over domain
//! events, a randomizer is a pair of pools, a modifier is just a value.

use chl_core::{DomainEvent, Environment, EventKind, PlayerId};
use serde::{Deserialize, Serialize};

/// Inclusive range a setting value must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingRange {
    /// Lowest accepted value.
    pub min: i32,
    /// Highest accepted value.
    pub max: i32,
}

impl SettingRange {
    /// Create a range; the bounds are swapped if given in the wrong order.
    pub fn new(min: i32, max: i32) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Whether `value` lies within the range.
    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Condition a goal waits for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalPredicate {
    /// An entity of the given kind dies, optionally only in one environment.
    KillEntity {
        /// Entity kind, e.g. `"ender_dragon"`.
        entity: String,
        /// Restrict to this environment when set.
        environment: Option<Environment>,
    },
    /// A player obtains an item of the given kind.
    CollectItem {
        /// Item kind, e.g. `"diamond"`.
        item: String,
    },
}

impl GoalPredicate {
    /// Event kinds this predicate can ever match.
    pub fn event_kinds(&self) -> &'static [EventKind] {
        match self {
            Self::KillEntity { .. } => &[EventKind::EntityEliminated],
            Self::CollectItem { .. } => &[EventKind::ItemCollected],
        }
    }

    /// Whether the event satisfies this predicate.
    pub fn matches(&self, event: &DomainEvent) -> bool {
        match (self, event) {
            (
                Self::KillEntity {
                    entity,
                    environment,
                },
                DomainEvent::EntityEliminated {
                    entity: killed,
                    environment: at,
                    ..
                },
            ) => entity == killed && environment.is_none_or(|required| required == *at),
            (Self::CollectItem { item }, DomainEvent::ItemCollected { item: got, .. }) => {
                item == got
            }
            _ => false,
        }
    }
}

/// Per-session progress of a goal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalState {
    /// Set once the goal has been satisfied this session.
    pub reached: bool,
    /// The player credited with reaching it, if any.
    pub winner: Option<PlayerId>,
}

impl GoalState {
    /// Forget progress, making the goal live again.
    pub fn clear(&mut self) {
        self.reached = false;
        self.winner = None;
    }
}

/// Data of a goal challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalSpec {
    /// What ends the session.
    pub predicate: GoalPredicate,
    /// Progress this session.
    pub state: GoalState,
}

/// Data of a randomizer challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomizerSpec {
    /// Keys that receive a randomized outcome.
    pub domain: Vec<String>,
    /// Outcomes handed out across the domain, each exactly once.
    pub results: Vec<String>,
}

/// Data of a modifier challenge.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModifierSpec {
    /// Unit the value is expressed in, for display.
    pub unit: Option<String>,
}

/// The tagged behavior of a challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeVariant {
    /// Ends the session when its predicate matches.
    Goal(GoalSpec),
    /// Writes a randomized assignment into the override table while enabled.
    Randomizer(RandomizerSpec),
    /// A tunable value read by gameplay handlers.
    Modifier(ModifierSpec),
}

impl ChallengeVariant {
    /// Short name of the tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Goal(_) => "goal",
            Self::Randomizer(_) => "randomizer",
            Self::Modifier(_) => "modifier",
        }
    }
}

/// One registered game rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeEntry {
    /// Stable key used by settings and commands.
    pub id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Behavior and its data.
    pub variant: ChallengeVariant,
    /// Whether the rule is active.
    pub enabled: bool,
    /// Variant-specific setting value.
    pub value: i32,
    /// Accepted range of `value`.
    pub range: SettingRange,
}

impl ChallengeEntry {
    fn new(id: impl Into<String>, display_name: impl Into<String>, variant: ChallengeVariant) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            variant,
            enabled: false,
            value: 1,
            range: SettingRange::new(1, 1),
        }
    }

    /// A goal entry.
    pub fn goal(id: impl Into<String>, display_name: impl Into<String>, predicate: GoalPredicate) -> Self {
        Self::new(
            id,
            display_name,
            ChallengeVariant::Goal(GoalSpec {
                predicate,
                state: GoalState::default(),
            }),
        )
    }

    /// A randomizer entry over the given pools.
    pub fn randomizer(
        id: impl Into<String>,
        display_name: impl Into<String>,
        domain: Vec<String>,
        results: Vec<String>,
    ) -> Self {
        Self::new(
            id,
            display_name,
            ChallengeVariant::Randomizer(RandomizerSpec { domain, results }),
        )
    }

    /// A modifier entry with the given range and starting value.
    pub fn modifier(
        id: impl Into<String>,
        display_name: impl Into<String>,
        range: SettingRange,
        value: i32,
    ) -> Self {
        Self::new(id, display_name, ChallengeVariant::Modifier(ModifierSpec::default()))
            .with_range(range)
            .with_value(value)
    }

    /// Set the accepted range, clamping the current value into it.
    pub fn with_range(mut self, range: SettingRange) -> Self {
        self.range = range;
        self.value = self.value.clamp(range.min, range.max);
        self
    }

    /// Set the starting value, clamped to the range.
    pub fn with_value(mut self, value: i32) -> Self {
        self.value = value.clamp(self.range.min, self.range.max);
        self
    }

    /// Set the modifier unit. Ignored for other variants.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        if let ChallengeVariant::Modifier(spec) = &mut self.variant {
            spec.unit = Some(unit.into());
        }
        self
    }

    /// Set whether the entry starts enabled.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Goal progress, for goal entries.
    pub fn goal_state(&self) -> Option<&GoalState> {
        match &self.variant {
            ChallengeVariant::Goal(spec) => Some(&spec.state),
            _ => None,
        }
    }

    /// The recorded winner, for goal entries.
    pub fn winner(&self) -> Option<&PlayerId> {
        self.goal_state().and_then(|s| s.winner.as_ref())
    }

    /// Whether this is a goal entry.
    pub fn is_goal(&self) -> bool {
        matches!(self.variant, ChallengeVariant::Goal(_))
    }

    /// Whether this is a randomizer entry.
    pub fn is_randomizer(&self) -> bool {
        matches!(self.variant, ChallengeVariant::Randomizer(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kill(entity: &str, environment: Environment) -> DomainEvent {
        DomainEvent::EntityEliminated {
            entity: entity.into(),
            environment,
            killer: Some(PlayerId::new("steve")),
        }
    }

    #[test]
    fn range_contains_bounds() {
        let r = SettingRange::new(1, 20);
        assert!(r.contains(1));
        assert!(r.contains(20));
        assert!(!r.contains(0));
        assert!(!r.contains(21));
        assert_eq!(SettingRange::new(5, 2), SettingRange::new(2, 5));
    }

    #[test]
    fn kill_predicate_checks_entity_and_environment() {
        let dragon = GoalPredicate::KillEntity {
            entity: "ender_dragon".into(),
            environment: Some(Environment::End),
        };
        assert!(dragon.matches(&kill("ender_dragon", Environment::End)));
        assert!(!dragon.matches(&kill("ender_dragon", Environment::Overworld)));
        assert!(!dragon.matches(&kill("wither", Environment::End)));

        let anywhere = GoalPredicate::KillEntity {
            entity: "wither".into(),
            environment: None,
        };
        assert!(anywhere.matches(&kill("wither", Environment::Nether)));
    }

    #[test]
    fn predicate_ignores_other_event_kinds() {
        let collect = GoalPredicate::CollectItem {
            item: "diamond".into(),
        };
        assert!(!collect.matches(&kill("diamond", Environment::Overworld)));
        assert!(collect.matches(&DomainEvent::ItemCollected {
            item: "diamond".into(),
            player: PlayerId::new("alex"),
        }));
        assert_eq!(collect.event_kinds(), &[EventKind::ItemCollected]);
    }

    #[test]
    fn builders_clamp_value() {
        let m = ChallengeEntry::modifier("max_health", "Max Health", SettingRange::new(1, 40), 99);
        assert_eq!(m.value, 40);
        assert!(!m.enabled);
        assert_eq!(m.variant.tag(), "modifier");

        let m = m.with_unit("hearts").enabled(true);
        assert!(m.enabled);
        assert_eq!(
            m.variant,
            ChallengeVariant::Modifier(ModifierSpec {
                unit: Some("hearts".into())
            })
        );
    }

    #[test]
    fn goal_accessors() {
        let g = ChallengeEntry::goal(
            "collect_diamond",
            "Collect a Diamond",
            GoalPredicate::CollectItem {
                item: "diamond".into(),
            },
        );
        assert!(g.is_goal());
        assert!(!g.is_randomizer());
        assert_eq!(g.goal_state(), Some(&GoalState::default()));
        assert!(g.winner().is_none());
    }
}
