//! The engine service: one task that owns the challenge engine.
//!
//! Every engine operation reaches the engine as a [`ServiceCommand`] on a
//! bounded queue and is answered over a oneshot reply. Persistence runs on
//! the blocking pool; loaded bytes come back through the same queue, so the
//! engine is only ever touched by this task.

use std::ops::ControlFlow;
use std::sync::Arc;

use chl_core::{DomainEvent, EndCause, PlayerId, Store, StoreResult};
use chl_rules::{ChallengeEngine, ChallengeEntry, GoalReached, RulesResult, ShutdownReason, ShutdownSnapshot, TickReport};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::error::{HostError, HostResult};
use crate::handle::ServiceHandle;

/// Store key of the session snapshot.
pub const SESSION_KEY: &str = "session";
/// Store key of the settings map.
pub const SETTINGS_KEY: &str = "settings";
/// Store key of the per-goal progress.
pub const GAMESTATE_KEY: &str = "gamestate";

type Reply<T> = oneshot::Sender<RulesResult<T>>;

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Commands processed by the engine service, in arrival order.
#[derive(Debug)]
pub enum ServiceCommand {
    /// Start a fresh session.
    Start(Reply<()>),
    /// Pause the session.
    Pause(Reply<()>),
    /// Resume a paused session.
    Resume(Reply<()>),
    /// End the session.
    End(EndCause, Reply<EndCause>),
    /// Reset the session and goal progress.
    Reset(Reply<()>),
    /// Enable a challenge.
    Enable(String, Reply<()>),
    /// Disable a challenge.
    Disable(String, Reply<()>),
    /// Change a challenge's value.
    SetValue {
        /// Challenge id.
        id: String,
        /// New value.
        value: i32,
        /// Reply channel.
        reply: Reply<()>,
    },
    /// Deliver a domain event.
    Dispatch(DomainEvent, oneshot::Sender<Option<GoalReached>>),
    /// Resolve the effective outcome list of a key.
    Resolve(String, oneshot::Sender<Option<Vec<String>>>),
    /// Set an explicit outcome for a key.
    SetOverride {
        /// Override key.
        key: String,
        /// Outcome list.
        values: Vec<String>,
        /// Reply channel.
        reply: oneshot::Sender<()>,
    },
    /// Remove the explicit outcome of a key.
    ClearOverride(String, oneshot::Sender<Option<Vec<String>>>),
    /// Snapshot of every registered challenge.
    Entries(oneshot::Sender<Vec<ChallengeEntry>>),
    /// Winners of reached goals.
    Winners(oneshot::Sender<Vec<PlayerId>>),
    /// Publish a tick report.
    Tick,
    /// Load persisted settings, gamestate and session. Replies once all are
    /// applied.
    Restore(oneshot::Sender<()>),
    /// Persisted settings, read off-thread.
    SettingsLoaded(Option<Vec<u8>>),
    /// Persisted goal progress, read off-thread.
    GamestateLoaded(Option<Vec<u8>>),
    /// Persisted session, read off-thread.
    SessionLoaded {
        /// Encoded snapshot, if one was stored.
        bytes: Option<Vec<u8>>,
        /// Reply for the originating restore.
        reply: Option<oneshot::Sender<()>>,
    },
    /// Persist and stop the service.
    Shutdown(ShutdownReason, oneshot::Sender<HostResult<()>>),
}

// ─────────────────────────────────────────────────────────────────────────────
// Service
// ─────────────────────────────────────────────────────────────────────────────

/// Owner of a [`ChallengeEngine`].
pub struct EngineService {
    engine: ChallengeEngine,
    store: Arc<dyn Store>,
    commands: mpsc::Receiver<ServiceCommand>,
    loopback: mpsc::WeakSender<ServiceCommand>,
    ticks: watch::Sender<TickReport>,
}

impl EngineService {
    /// Move `engine` into a new service task. The task ends after a
    /// shutdown command or once every handle is dropped.
    pub fn spawn(engine: ChallengeEngine, store: Arc<dyn Store>, queue_capacity: usize) -> (ServiceHandle, JoinHandle<()>) {
        let (cmd_tx, commands) = mpsc::channel(queue_capacity.max(1));
        let (ticks, tick_rx) = watch::channel(engine.tick());
        let service = Self {
            engine,
            store,
            commands,
            loopback: cmd_tx.downgrade(),
            ticks,
        };
        let task = tokio::spawn(service.run());
        (ServiceHandle::new(cmd_tx, tick_rx), task)
    }

    async fn run(mut self) {
        tracing::info!(challenges = self.engine.registry().len(), "engine service started");
        while let Some(command) = self.commands.recv().await {
            if self.handle(command).await.is_break() {
                break;
            }
            self.publish();
        }
        tracing::info!("engine service stopped");
    }

    async fn handle(&mut self, command: ServiceCommand) -> ControlFlow<()> {
        match command {
            ServiceCommand::Start(reply) => {
                let result = self.engine.start();
                self.answer(reply, result);
            }
            ServiceCommand::Pause(reply) => {
                let result = self.engine.pause();
                self.answer(reply, result);
            }
            ServiceCommand::Resume(reply) => {
                let result = self.engine.resume();
                self.answer(reply, result);
            }
            ServiceCommand::End(cause, reply) => {
                let result = self.engine.end(cause);
                self.answer(reply, result);
            }
            ServiceCommand::Reset(reply) => {
                let result = self.engine.reset();
                self.answer(reply, result);
            }
            ServiceCommand::Enable(id, reply) => {
                let result = self.engine.enable(&id);
                self.answer(reply, result);
            }
            ServiceCommand::Disable(id, reply) => {
                let result = self.engine.disable(&id);
                self.answer(reply, result);
            }
            ServiceCommand::SetValue { id, value, reply } => {
                let result = self.engine.set_value(&id, value);
                self.answer(reply, result);
            }
            ServiceCommand::Dispatch(event, reply) => {
                let reached = self.engine.dispatch(&event);
                self.answer(reply, reached);
            }
            ServiceCommand::Resolve(key, reply) => {
                let _ = reply.send(self.engine.resolve(&key).map(<[String]>::to_vec));
            }
            ServiceCommand::SetOverride { key, values, reply } => {
                self.engine.set_override(key, values);
                let _ = reply.send(());
            }
            ServiceCommand::ClearOverride(key, reply) => {
                let _ = reply.send(self.engine.clear_override(&key));
            }
            ServiceCommand::Entries(reply) => {
                let _ = reply.send(self.engine.registry().entries().to_vec());
            }
            ServiceCommand::Winners(reply) => {
                let _ = reply.send(self.engine.winners());
            }
            ServiceCommand::Tick => {}
            ServiceCommand::Restore(reply) => self.load(reply),
            ServiceCommand::SettingsLoaded(bytes) => self.engine.load_settings(bytes.as_deref()),
            ServiceCommand::GamestateLoaded(bytes) => self.engine.load_gamestate(bytes.as_deref()),
            ServiceCommand::SessionLoaded { bytes, reply } => {
                self.engine.restore_session(bytes.as_deref());
                tracing::info!(state = %self.engine.session_state(), elapsed = ?self.engine.elapsed(), "persisted state applied");
                if let Some(reply) = reply {
                    self.answer(reply, ());
                }
            }
            ServiceCommand::Shutdown(reason, reply) => {
                let snapshot = self.engine.shutdown(reason);
                let result = persist(Arc::clone(&self.store), snapshot).await;
                if let Err(error) = &result {
                    tracing::error!(%error, "failed to persist state on shutdown");
                }
                self.answer(reply, result);
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Publish the current tick report, then reply, so a caller never sees
    /// a report older than its own command.
    fn answer<T>(&self, reply: oneshot::Sender<T>, value: T) {
        self.publish();
        let _ = reply.send(value);
    }

    /// Read settings, gamestate and session on the blocking pool and feed
    /// them back through the queue in that order.
    fn load(&self, reply: oneshot::Sender<()>) {
        let Some(loopback) = self.loopback.upgrade() else {
            return;
        };
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let loaded = tokio::task::spawn_blocking(move || {
                let store = store.as_ref();
                (
                    read(store, SETTINGS_KEY),
                    read(store, GAMESTATE_KEY),
                    read(store, SESSION_KEY),
                )
            })
            .await;
            let (settings, gamestate, session) = match loaded {
                Ok(loaded) => loaded,
                Err(error) => {
                    tracing::error!(%error, "loading persisted state failed");
                    (None, None, None)
                }
            };
            let steps = [
                ServiceCommand::SettingsLoaded(settings),
                ServiceCommand::GamestateLoaded(gamestate),
                ServiceCommand::SessionLoaded {
                    bytes: session,
                    reply: Some(reply),
                },
            ];
            for step in steps {
                if loopback.send(step).await.is_err() {
                    return;
                }
            }
        });
    }

    fn publish(&self) {
        let report = self.engine.tick();
        self.ticks.send_if_modified(|current| {
            if *current == report {
                return false;
            }
            *current = report;
            true
        });
    }
}

impl std::fmt::Debug for EngineService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineService")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

fn read(store: &dyn Store, key: &str) -> Option<Vec<u8>> {
    match store.load(key) {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!(key, %error, "could not read persisted state; using defaults");
            None
        }
    }
}

/// Write a shutdown snapshot on the blocking pool. Takes the store by value
/// so the service is not borrowed across the await.
async fn persist(store: Arc<dyn Store>, snapshot: ShutdownSnapshot) -> HostResult<()> {
    tokio::task::spawn_blocking(move || write(store.as_ref(), &snapshot))
        .await
        .map_err(HostError::from)
        .and_then(|saved| saved.map_err(HostError::from))
}

fn write(store: &dyn Store, snapshot: &ShutdownSnapshot) -> StoreResult<()> {
    store.save(SETTINGS_KEY, &snapshot.settings)?;
    if let Some(gamestate) = &snapshot.gamestate {
        store.save(GAMESTATE_KEY, gamestate)?;
    }
    if let Some(session) = &snapshot.session {
        store.save(SESSION_KEY, session)?;
    }
    Ok(())
}
