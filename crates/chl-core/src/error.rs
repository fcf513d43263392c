use crate::session::SessionState;

/// Alias for `Result<T, SessionError>`.
pub type SessionResult<T> = Result<T, SessionError>;

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the session state machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The requested action is not allowed from the current state.
    /// The session is left unchanged.
    #[error("cannot {action} a session that is {from}")]
    InvalidTransition {
        /// State the session was in when the action was rejected.
        from: SessionState,
        /// The rejected action, e.g. `"pause"`.
        action: &'static str,
    },
}

/// Errors raised by a persistence store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying storage failed.
    #[error("store i/o error for key \"{key}\": {source}")]
    Io {
        /// The key being read or written.
        key: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A key contained characters the store cannot represent.
    #[error("invalid store key: \"{0}\"")]
    InvalidKey(String),
}
