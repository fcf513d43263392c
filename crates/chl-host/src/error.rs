use chl_core::StoreError;
use chl_rules::RulesError;

/// Alias for `Result<T, HostError>`.
pub type HostResult<T> = Result<T, HostError>;

/// Errors surfaced by the host service.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// An engine operation was rejected.
    #[error(transparent)]
    Rules(#[from] RulesError),

    /// Persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The service task is gone; no further commands are accepted.
    #[error("engine service has stopped")]
    ServiceStopped,

    /// A blocking persistence task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_errors_display_through() {
        let err: HostError = RulesError::NotFound("wither".into()).into();
        assert_eq!(err.to_string(), RulesError::NotFound("wither".into()).to_string());
    }

    #[test]
    fn stopped_message() {
        assert_eq!(HostError::ServiceStopped.to_string(), "engine service has stopped");
    }
}
