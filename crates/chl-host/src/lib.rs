//! Host runtime for the challenge engine.
//!
//! Runs a [`chl_rules::ChallengeEngine`] inside a single tokio task, exposes
//! it through a cloneable [`ServiceHandle`], drives periodic tick reports,
//! and persists settings and the session to disk.

pub mod config;
/// Host error type.
pub mod error;
pub mod handle;
/// Tracing subscriber setup.
pub mod logging;
pub mod scheduler;
pub mod service;
pub mod store;

pub use config::HostConfig;
pub use error::{HostError, HostResult};
pub use handle::ServiceHandle;
pub use logging::init_logging;
pub use scheduler::{TickHandle, TickScheduler};
pub use service::{EngineService, GAMESTATE_KEY, SESSION_KEY, SETTINGS_KEY, ServiceCommand};
pub use store::FileStore;
