//! Cloneable async facade over the engine service.

use std::time::Duration;

use chl_core::{DomainEvent, EndCause, PlayerId};
use chl_rules::{ChallengeEntry, GoalReached, ShutdownReason, TickReport};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};

use crate::error::{HostError, HostResult};
use crate::scheduler::{TickHandle, TickScheduler};
use crate::service::ServiceCommand;

/// Handle to communicate with the engine service.
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    commands: mpsc::Sender<ServiceCommand>,
    ticks: watch::Receiver<TickReport>,
}

impl ServiceHandle {
    pub(crate) fn new(commands: mpsc::Sender<ServiceCommand>, ticks: watch::Receiver<TickReport>) -> Self {
        Self { commands, ticks }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> ServiceCommand) -> HostResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| HostError::ServiceStopped)?;
        response.await.map_err(|_| HostError::ServiceStopped)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a fresh session.
    pub async fn start(&self) -> HostResult<()> {
        self.request(ServiceCommand::Start).await?.map_err(HostError::from)
    }

    /// Pause the session.
    pub async fn pause(&self) -> HostResult<()> {
        self.request(ServiceCommand::Pause).await?.map_err(HostError::from)
    }

    /// Resume a paused session.
    pub async fn resume(&self) -> HostResult<()> {
        self.request(ServiceCommand::Resume).await?.map_err(HostError::from)
    }

    /// End the session. Returns the first recorded cause.
    pub async fn end(&self, cause: EndCause) -> HostResult<EndCause> {
        self.request(|reply| ServiceCommand::End(cause, reply))
            .await?
            .map_err(HostError::from)
    }

    /// Reset the session and goal progress.
    pub async fn reset(&self) -> HostResult<()> {
        self.request(ServiceCommand::Reset).await?.map_err(HostError::from)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Challenges
    // ─────────────────────────────────────────────────────────────────────────

    /// Enable a challenge.
    pub async fn enable(&self, id: &str) -> HostResult<()> {
        self.request(|reply| ServiceCommand::Enable(id.to_string(), reply))
            .await?
            .map_err(HostError::from)
    }

    /// Disable a challenge.
    pub async fn disable(&self, id: &str) -> HostResult<()> {
        self.request(|reply| ServiceCommand::Disable(id.to_string(), reply))
            .await?
            .map_err(HostError::from)
    }

    /// Change a challenge's value.
    pub async fn set_value(&self, id: &str, value: i32) -> HostResult<()> {
        self.request(|reply| ServiceCommand::SetValue {
            id: id.to_string(),
            value,
            reply,
        })
        .await?
        .map_err(HostError::from)
    }

    /// Every registered challenge, in registration order.
    pub async fn entries(&self) -> HostResult<Vec<ChallengeEntry>> {
        self.request(ServiceCommand::Entries).await
    }

    /// Winners of reached goals.
    pub async fn winners(&self) -> HostResult<Vec<PlayerId>> {
        self.request(ServiceCommand::Winners).await
    }

    /// Deliver a domain event. Returns the goal that ended the session, if
    /// this event did so.
    pub async fn dispatch(&self, event: DomainEvent) -> HostResult<Option<GoalReached>> {
        self.request(|reply| ServiceCommand::Dispatch(event, reply)).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Overrides
    // ─────────────────────────────────────────────────────────────────────────

    /// The effective outcome list for `key`; `None` means natural behavior.
    pub async fn resolve(&self, key: &str) -> HostResult<Option<Vec<String>>> {
        self.request(|reply| ServiceCommand::Resolve(key.to_string(), reply))
            .await
    }

    /// Set an explicit outcome for `key`.
    pub async fn set_override(&self, key: &str, values: Vec<String>) -> HostResult<()> {
        self.request(|reply| ServiceCommand::SetOverride {
            key: key.to_string(),
            values,
            reply,
        })
        .await
    }

    /// Remove the explicit outcome for `key`.
    pub async fn clear_override(&self, key: &str) -> HostResult<Option<Vec<String>>> {
        self.request(|reply| ServiceCommand::ClearOverride(key.to_string(), reply))
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Load persisted settings, goal progress and session. Returns once all
    /// of them are applied.
    pub async fn restore(&self) -> HostResult<()> {
        self.request(ServiceCommand::Restore).await
    }

    /// Persist state and stop the service.
    pub async fn shutdown(&self, reason: ShutdownReason) -> HostResult<()> {
        self.request(|reply| ServiceCommand::Shutdown(reason, reply))
            .await?
    }

    /// Queue a tick every `interval`. Ticks are dropped while the queue is
    /// full.
    pub fn start_ticking(&self, scheduler: &TickScheduler, interval: Duration) -> TickHandle {
        let commands = self.commands.clone();
        scheduler.schedule_repeating(interval, move || match commands.try_send(ServiceCommand::Tick) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(_)) => tracing::debug!("command queue full; tick skipped"),
        })
    }

    /// Receiver of tick reports.
    pub fn subscribe_ticks(&self) -> watch::Receiver<TickReport> {
        self.ticks.clone()
    }

    /// The most recently published tick report.
    pub fn latest_tick(&self) -> TickReport {
        *self.ticks.borrow()
    }

    /// Whether the service has stopped.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}
