//! Core types for the challenge engine.
//!
//! This crate holds the pieces that have no knowledge of individual
//! challenges: the priority-layered [`OverrideTable`], the [`SessionClock`]
//! state machine with its persisted snapshot, the typed domain events a host
//! delivers, and the persistence [`Store`] seam. Everything here is
//! synchronous and owned by a single logical thread.

/// Monotonic time sources.
pub mod clock;
/// Error types for session transitions and persistence.
pub mod error;
/// Typed domain events delivered by the host.
pub mod event;
/// Priority-layered key to value-list overrides.
pub mod overrides;
/// Session state machine and elapsed-time tracking.
pub mod session;
/// Key-value persistence seam.
pub mod store;

/// Re-exports of the clock types.
pub use clock::{Clock, ManualClock, SystemClock};
/// Re-exports of the error types.
pub use error::{SessionError, SessionResult, StoreError, StoreResult};
/// Re-exports of the event types.
pub use event::{DomainEvent, Environment, EventKind, PlayerId};
/// Re-exports of the override types.
pub use overrides::{OverridePriority, OverrideTable};
/// Re-exports of the session types.
pub use session::{EndCause, SessionClock, SessionSnapshot, SessionState};
/// Re-exports of the store types.
pub use store::{MemoryStore, Store};
