//! Goal evaluation against domain events.

use chl_core::{DomainEvent, EndCause, PlayerId, SessionClock};

use crate::entry::{ChallengeEntry, ChallengeVariant};

/// A goal that ended the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalReached {
    /// Id of the satisfied goal.
    pub goal: String,
    /// The credited player, if the event named one.
    pub winner: Option<PlayerId>,
}

/// Check one goal entry against an event and end the session on a match.
///
/// Returns `None` without side effects when the entry is not an enabled,
/// still-live goal, when the session is not RUNNING, or when the predicate
/// does not match. The event is only read.
pub fn evaluate(entry: &mut ChallengeEntry, event: &DomainEvent, session: &mut SessionClock) -> Option<GoalReached> {
    if !entry.enabled || !session.is_running() {
        return None;
    }
    let ChallengeVariant::Goal(spec) = &mut entry.variant else {
        return None;
    };
    if spec.state.reached || !spec.predicate.matches(event) {
        return None;
    }

    let winner = event.actor().cloned();
    spec.state.reached = true;
    spec.state.winner = winner.clone();

    // Running was checked above, so this cannot be rejected.
    let _ = session.end(EndCause::GoalReached);

    tracing::info!(
        goal = %entry.id,
        winner = winner.as_ref().map(|w| w.0.as_str()).unwrap_or("-"),
        "goal reached"
    );
    Some(GoalReached {
        goal: entry.id.clone(),
        winner,
    })
}
