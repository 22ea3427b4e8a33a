use std::time::Duration;

/// Failure of a bounded wait on the admission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// No permit became available within the wait bound.
    #[error("no frame slot became available within {0:?}")]
    Timeout(Duration),
}
