use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a player, as supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Wrap a host-supplied player identity.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The world dimension an event happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// The default world.
    Overworld,
    /// The nether dimension.
    Nether,
    /// The end dimension.
    End,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overworld => write!(f, "overworld"),
            Self::Nether => write!(f, "nether"),
            Self::End => write!(f, "end"),
        }
    }
}

/// Dispatch key for [`DomainEvent`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// See [`DomainEvent::EntityEliminated`].
    EntityEliminated,
    /// See [`DomainEvent::ItemCollected`].
    ItemCollected,
}

/// A typed notification from the host. Delivered only after the action it
/// reports has been committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    /// A living entity was killed.
    EntityEliminated {
        /// Kind of the killed entity, e.g. `"ender_dragon"`.
        entity: String,
        /// Where the entity died.
        environment: Environment,
        /// The player credited with the kill, if any.
        killer: Option<PlayerId>,
    },
    /// A player picked up or crafted an item.
    ItemCollected {
        /// Kind of the item, e.g. `"diamond"`.
        item: String,
        /// The player who obtained it.
        player: PlayerId,
    },
}

impl DomainEvent {
    /// The dispatch key of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::EntityEliminated { .. } => EventKind::EntityEliminated,
            Self::ItemCollected { .. } => EventKind::ItemCollected,
        }
    }

    /// The player this event credits, if any.
    pub fn actor(&self) -> Option<&PlayerId> {
        match self {
            Self::EntityEliminated { killer, .. } => killer.as_ref(),
            Self::ItemCollected { player, .. } => Some(player),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let kill = DomainEvent::EntityEliminated {
            entity: "wither".into(),
            environment: Environment::Overworld,
            killer: None,
        };
        assert_eq!(kill.kind(), EventKind::EntityEliminated);

        let pickup = DomainEvent::ItemCollected {
            item: "diamond".into(),
            player: PlayerId::new("alex"),
        };
        assert_eq!(pickup.kind(), EventKind::ItemCollected);
    }

    #[test]
    fn actor_is_killer_or_collector() {
        let steve = PlayerId::new("steve");
        let kill = DomainEvent::EntityEliminated {
            entity: "wither".into(),
            environment: Environment::Nether,
            killer: Some(steve.clone()),
        };
        assert_eq!(kill.actor(), Some(&steve));

        let unattributed = DomainEvent::EntityEliminated {
            entity: "wither".into(),
            environment: Environment::Nether,
            killer: None,
        };
        assert!(unattributed.actor().is_none());
    }

    #[test]
    fn environment_serializes_snake_case() {
        let json = serde_json::to_string(&Environment::Overworld).unwrap();
        assert_eq!(json, "\"overworld\"");
    }
}
