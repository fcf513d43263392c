use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{SessionError, SessionResult};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Not started yet, or reset.
    Idle,
    /// Time is counting.
    Running,
    /// Time is frozen until resumed.
    Paused,
    /// Finished; elapsed time is frozen for good.
    Ended,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndCause {
    /// A goal challenge was satisfied.
    GoalReached,
    /// The players lost.
    GoalFailed,
    /// An operator ended the session.
    Manual,
}

impl fmt::Display for EndCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoalReached => write!(f, "goal reached"),
            Self::GoalFailed => write!(f, "goal failed"),
            Self::Manual => write!(f, "ended manually"),
        }
    }
}

/// Persisted form of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// State at the time of the snapshot.
    pub state: SessionState,
    /// Elapsed session time in milliseconds.
    pub elapsed_millis: u64,
    /// Cause, for ended sessions.
    #[serde(default)]
    pub end_cause: Option<EndCause>,
}

impl SessionSnapshot {
    /// Encode as JSON bytes.
    pub fn encode(&self) -> Vec<u8> {
        // Serializing a plain struct with no maps cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Decode from JSON bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// The session state machine.
///
/// `IDLE -> RUNNING -> {PAUSED <-> RUNNING} -> ENDED -> (reset) -> IDLE`.
///
/// Elapsed time is `carried + (now - started_at) - accumulated_pause`, where
/// `carried` is time restored from a previous process. It never moves while
/// paused or ended.
#[derive(Debug, Clone)]
pub struct SessionClock {
    clock: Arc<dyn Clock>,
    state: SessionState,
    started_at: Option<Instant>,
    paused_at: Option<Instant>,
    accumulated_pause: Duration,
    carried: Duration,
    frozen: Option<Duration>,
    end_cause: Option<EndCause>,
}

impl SessionClock {
    /// Create an idle session reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: SessionState::Idle,
            started_at: None,
            paused_at: None,
            accumulated_pause: Duration::ZERO,
            carried: Duration::ZERO,
            frozen: None,
            end_cause: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether time is counting.
    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// The cause recorded by the first successful [`end`](Self::end).
    pub fn end_cause(&self) -> Option<EndCause> {
        self.end_cause
    }

    /// Begin a fresh session. Only valid from IDLE.
    pub fn start(&mut self) -> SessionResult<()> {
        self.require(&[SessionState::Idle], "start")?;
        self.started_at = Some(self.clock.now());
        self.accumulated_pause = Duration::ZERO;
        self.state = SessionState::Running;
        tracing::info!("session started");
        Ok(())
    }

    /// Freeze time. Only valid while RUNNING.
    pub fn pause(&mut self) -> SessionResult<()> {
        self.require(&[SessionState::Running], "pause")?;
        self.paused_at = Some(self.clock.now());
        self.state = SessionState::Paused;
        tracing::info!(elapsed_ms = millis(self.elapsed()), "session paused");
        Ok(())
    }

    /// Unfreeze time. Only valid while PAUSED.
    pub fn resume(&mut self) -> SessionResult<()> {
        self.require(&[SessionState::Paused], "resume")?;
        let now = self.clock.now();
        if let Some(paused_at) = self.paused_at.take() {
            self.accumulated_pause += now.saturating_duration_since(paused_at);
        }
        self.state = SessionState::Running;
        tracing::info!(elapsed_ms = millis(self.elapsed()), "session resumed");
        Ok(())
    }

    /// Finish the session. Valid from RUNNING or PAUSED; once ENDED, further
    /// calls change nothing and return the first cause.
    pub fn end(&mut self, cause: EndCause) -> SessionResult<EndCause> {
        if let (SessionState::Ended, Some(first)) = (self.state, self.end_cause) {
            return Ok(first);
        }
        self.require(&[SessionState::Running, SessionState::Paused], "end")?;
        self.frozen = Some(self.elapsed());
        self.end_cause = Some(cause);
        self.state = SessionState::Ended;
        tracing::info!(%cause, elapsed_ms = millis(self.elapsed()), "session ended");
        Ok(cause)
    }

    /// Clear everything back to IDLE. Valid from ENDED or IDLE.
    pub fn reset(&mut self) -> SessionResult<()> {
        self.require(&[SessionState::Ended, SessionState::Idle], "reset")?;
        self.state = SessionState::Idle;
        self.started_at = None;
        self.paused_at = None;
        self.accumulated_pause = Duration::ZERO;
        self.carried = Duration::ZERO;
        self.frozen = None;
        self.end_cause = None;
        tracing::info!("session reset");
        Ok(())
    }

    /// Elapsed session time. Frozen unless RUNNING.
    pub fn elapsed(&self) -> Duration {
        match self.state {
            SessionState::Idle => Duration::ZERO,
            SessionState::Ended => self.frozen.unwrap_or(self.carried),
            SessionState::Running => self.elapsed_at(self.clock.now()),
            SessionState::Paused => match self.paused_at {
                Some(paused_at) => self.elapsed_at(paused_at),
                None => self.carried,
            },
        }
    }

    fn elapsed_at(&self, at: Instant) -> Duration {
        let since_start = self
            .started_at
            .map(|start| at.saturating_duration_since(start))
            .unwrap_or(Duration::ZERO);
        self.carried + since_start.saturating_sub(self.accumulated_pause)
    }

    /// Capture state and elapsed time for persistence.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            elapsed_millis: millis(self.elapsed()),
            end_cause: self.end_cause,
        }
    }

    /// Rebuild a session from a snapshot. Only valid from IDLE.
    ///
    /// A session that was RUNNING comes back RUNNING when `resume_on_load`
    /// is set and PAUSED otherwise. PAUSED, ENDED and IDLE snapshots come back
    /// in their own state.
    pub fn restore(&mut self, snapshot: &SessionSnapshot, resume_on_load: bool) -> SessionResult<()> {
        self.require(&[SessionState::Idle], "restore")?;
        let elapsed = Duration::from_millis(snapshot.elapsed_millis);
        let now = self.clock.now();

        match snapshot.state {
            SessionState::Idle => return Ok(()),
            SessionState::Ended => {
                self.carried = elapsed;
                self.frozen = Some(elapsed);
                self.end_cause = Some(snapshot.end_cause.unwrap_or(EndCause::Manual));
                self.state = SessionState::Ended;
            }
            SessionState::Running | SessionState::Paused => {
                self.carried = elapsed;
                self.started_at = Some(now);
                self.accumulated_pause = Duration::ZERO;
                if snapshot.state == SessionState::Running && resume_on_load {
                    self.state = SessionState::Running;
                } else {
                    self.paused_at = Some(now);
                    self.state = SessionState::Paused;
                }
            }
        }

        tracing::info!(
            state = %self.state,
            elapsed_ms = snapshot.elapsed_millis,
            "session restored"
        );
        Ok(())
    }

    fn require(&self, allowed: &[SessionState], action: &'static str) -> SessionResult<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                from: self.state,
                action,
            })
        }
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
