//! The challenge engine: session, registry, and event dispatch in one owner.
//!
//! `ChallengeEngine` is the context object handed to hosts. It is meant to be
//! owned by a single logical thread; every operation is synchronous and
//! bounded.

use std::sync::Arc;
use std::time::Duration;

use chl_core::{
    Clock, DomainEvent, EndCause, EventKind, OverridePriority, OverrideTable, PlayerId, SessionClock,
    SessionSnapshot, SessionState,
};

use crate::config::RulesConfig;
use crate::dispatch::{DispatchSlot, EventDispatcher, Handler};
use crate::entry::ChallengeEntry;
use crate::error::RulesResult;
use crate::goal::GoalReached;
use crate::registry::{ChallengeRegistry, GamestateSnapshot, SettingsSnapshot};

/// State handed to event handlers.
#[derive(Debug)]
pub struct EngineState {
    /// The session clock.
    pub session: SessionClock,
    /// The challenge registry.
    pub registry: ChallengeRegistry,
    reached: Option<GoalReached>,
}

/// Why the host is shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Regular stop; the session is persisted.
    Normal,
    /// Stop caused by a session reset; a fresh session is expected.
    Reset,
}

/// What a shutdown asks the host to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownSnapshot {
    /// Encoded session snapshot, absent after a reset.
    pub session: Option<Vec<u8>>,
    /// Encoded goal progress, absent after a reset.
    pub gamestate: Option<Vec<u8>>,
    /// Encoded settings.
    pub settings: Vec<u8>,
}

/// What a tick reports to display collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Session state at the tick.
    pub state: SessionState,
    /// Elapsed session time at the tick.
    pub elapsed: Duration,
}

impl Default for TickReport {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            elapsed: Duration::ZERO,
        }
    }
}

/// Session, registry, and dispatch table behind one owner.
pub struct ChallengeEngine {
    state: EngineState,
    dispatcher: EventDispatcher<EngineState>,
    config: RulesConfig,
}

impl std::fmt::Debug for ChallengeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengeEngine")
            .field("state", &self.state.session.state())
            .field("challenges", &self.state.registry.len())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl ChallengeEngine {
    /// Create an engine with an idle session and an empty registry.
    pub fn new(config: RulesConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: EngineState {
                session: SessionClock::new(clock),
                registry: ChallengeRegistry::new(config.seed),
                reached: None,
            },
            dispatcher: EventDispatcher::new(),
            config,
        }
    }

    /// Create an engine and register every entry of `catalog`.
    pub fn with_catalog(
        config: RulesConfig,
        clock: Arc<dyn Clock>,
        catalog: impl IntoIterator<Item = ChallengeEntry>,
    ) -> RulesResult<Self> {
        let mut engine = Self::new(config, clock);
        for entry in catalog {
            engine.register(entry)?;
        }
        Ok(engine)
    }

    /// The configuration the engine was built with.
    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    /// Register an entry. Goals subscribe to their event kinds as monitors,
    /// in registration order.
    pub fn register(&mut self, entry: ChallengeEntry) -> RulesResult<()> {
        let goal = match &entry.variant {
            crate::entry::ChallengeVariant::Goal(spec) => Some(spec.predicate.event_kinds()),
            _ => None,
        };
        let id = entry.id.clone();
        self.state.registry.register(entry)?;

        for &kind in goal.unwrap_or_default() {
            let id = id.clone();
            self.dispatcher.subscribe(
                kind,
                DispatchSlot::Monitor,
                Box::new(move |event: &DomainEvent, state: &mut EngineState| {
                    let reached = state.registry.evaluate_goal(&id, event, &mut state.session);
                    if state.reached.is_none() {
                        state.reached = reached;
                    }
                }),
            );
        }
        Ok(())
    }

    /// Add a host observer for `kind`.
    pub fn observe(&mut self, kind: EventKind, slot: DispatchSlot, handler: Handler<EngineState>) {
        self.dispatcher.subscribe(kind, slot, handler);
    }

    /// Deliver a domain event. Returns the goal that ended the session, if
    /// this event did so.
    pub fn dispatch(&mut self, event: &DomainEvent) -> Option<GoalReached> {
        self.state.reached = None;
        self.dispatcher.dispatch(event, &mut self.state);
        let reached = self.state.reached.take();
        if reached.is_some() {
            self.state.registry.suspend_evaluation();
        }
        reached
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    /// Start a fresh session.
    pub fn start(&mut self) -> RulesResult<()> {
        self.state.session.start()?;
        Ok(())
    }

    /// Pause the session.
    pub fn pause(&mut self) -> RulesResult<()> {
        self.state.session.pause()?;
        Ok(())
    }

    /// Resume a paused session.
    pub fn resume(&mut self) -> RulesResult<()> {
        self.state.session.resume()?;
        Ok(())
    }

    /// End the session. Returns the first recorded cause.
    pub fn end(&mut self, cause: EndCause) -> RulesResult<EndCause> {
        let first = self.state.session.end(cause)?;
        self.state.registry.suspend_evaluation();
        Ok(first)
    }

    /// Reset the session and every goal's progress.
    pub fn reset(&mut self) -> RulesResult<()> {
        self.state.session.reset()?;
        self.state.registry.on_session_reset();
        Ok(())
    }

    /// Elapsed session time.
    pub fn elapsed(&self) -> Duration {
        self.state.session.elapsed()
    }

    /// Session state.
    pub fn session_state(&self) -> SessionState {
        self.state.session.state()
    }

    /// The session clock.
    pub fn session(&self) -> &SessionClock {
        &self.state.session
    }

    /// Read-only view for periodic display refreshes.
    pub fn tick(&self) -> TickReport {
        TickReport {
            state: self.state.session.state(),
            elapsed: self.state.session.elapsed(),
        }
    }

    // -----------------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------------

    /// Enable a challenge.
    pub fn enable(&mut self, id: &str) -> RulesResult<()> {
        self.state.registry.enable(id)
    }

    /// Disable a challenge.
    pub fn disable(&mut self, id: &str) -> RulesResult<()> {
        self.state.registry.disable(id)
    }

    /// Change a challenge's setting value.
    pub fn set_value(&mut self, id: &str, value: i32) -> RulesResult<()> {
        self.state.registry.set_value(id, value)
    }

    /// Look up a challenge.
    pub fn get(&self, id: &str) -> Option<&ChallengeEntry> {
        self.state.registry.get(id)
    }

    /// The challenge registry.
    pub fn registry(&self) -> &ChallengeRegistry {
        &self.state.registry
    }

    /// Winners of every reached goal, in registration order.
    pub fn winners(&self) -> Vec<PlayerId> {
        self.state.registry.winners()
    }

    // -----------------------------------------------------------------------
    // Overrides
    // -----------------------------------------------------------------------

    /// The effective outcome list for `key`, if any layer overrides it.
    pub fn resolve(&self, key: &str) -> Option<&[String]> {
        self.state.registry.overrides().resolve(&key.to_string())
    }

    /// The override table.
    pub fn overrides(&self) -> &OverrideTable<String, String> {
        self.state.registry.overrides()
    }

    /// Set a player-chosen outcome for `key`, shadowing any randomized one.
    pub fn set_override(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.state
            .registry
            .overrides_mut()
            .set(key.into(), OverridePriority::Explicit, values);
    }

    /// Remove the player-chosen outcome for `key`.
    pub fn clear_override(&mut self, key: &str) -> Option<Vec<String>> {
        self.state
            .registry
            .overrides_mut()
            .remove(&key.to_string(), OverridePriority::Explicit)
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Encoded settings of every challenge.
    pub fn save_settings(&self) -> Vec<u8> {
        self.state.registry.save_settings().encode()
    }

    /// Apply encoded settings. Corrupt data is logged and ignored.
    pub fn load_settings(&mut self, bytes: Option<&[u8]>) {
        let Some(bytes) = bytes else {
            tracing::debug!("no persisted settings; using defaults");
            return;
        };
        match SettingsSnapshot::decode(bytes) {
            Ok(snapshot) => self.state.registry.load_settings(&snapshot),
            Err(error) => tracing::warn!(%error, "corrupt settings snapshot; using defaults"),
        }
    }

    /// Encoded progress of every reached goal.
    pub fn save_gamestate(&self) -> Vec<u8> {
        self.state.registry.save_gamestate().encode()
    }

    /// Apply encoded goal progress. Corrupt data is logged and ignored.
    pub fn load_gamestate(&mut self, bytes: Option<&[u8]>) {
        let Some(bytes) = bytes else {
            tracing::debug!("no persisted goal progress");
            return;
        };
        match GamestateSnapshot::decode(bytes) {
            Ok(snapshot) => self.state.registry.load_gamestate(&snapshot),
            Err(error) => tracing::warn!(%error, "corrupt goal progress; goals start fresh"),
        }
    }

    /// Current session snapshot.
    pub fn session_snapshot(&self) -> SessionSnapshot {
        self.state.session.snapshot()
    }

    /// Restore the session from encoded bytes using the configured
    /// resume-on-load policy. Missing or corrupt data leaves an idle session.
    pub fn restore_session(&mut self, bytes: Option<&[u8]>) {
        let Some(bytes) = bytes else {
            tracing::debug!("no persisted session; starting idle");
            return;
        };
        let snapshot = match SessionSnapshot::decode(bytes) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::warn!(%error, "corrupt session snapshot; starting idle");
                return;
            }
        };
        if let Err(error) = self.state.session.restore(&snapshot, self.config.resume_on_load) {
            tracing::warn!(%error, "could not restore session; keeping current state");
            return;
        }
        if snapshot.state == SessionState::Ended {
            self.state.registry.suspend_evaluation();
        }
    }

    /// Capture what must be persisted and drop generated state.
    ///
    /// Settings are always captured. The session and goal progress are
    /// captured unless the shutdown comes from a reset. Randomized assignments are cleared last
    /// so they are never persisted.
    pub fn shutdown(&mut self, reason: ShutdownReason) -> ShutdownSnapshot {
        let settings = self.save_settings();
        let (session, gamestate) = match reason {
            ShutdownReason::Normal => (Some(self.session_snapshot().encode()), Some(self.save_gamestate())),
            ShutdownReason::Reset => (None, None),
        };
        self.state.registry.clear_cache();
        tracing::info!(?reason, persist_session = session.is_some(), "engine shut down");
        ShutdownSnapshot {
            session,
            gamestate,
            settings,
        }
    }
}
