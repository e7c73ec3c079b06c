use thiserror::Error;

/// Construction-time faults. Contention outcomes are never reported here,
/// see [`Rejection`].
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid capacity (must be greater than zero)")]
    InvalidCapacity,

    #[error("Slot table must hold at least one slot")]
    EmptyTable,

    #[error("Poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("Failed to spawn background thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Why a reservation-style operation did not take effect.
///
/// These are expected, frequent outcomes under contention. The boolean
/// operations collapse them to `false`; callers that care about the reason
/// use the `Result` variants.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    /// Slot index outside `[1, N]`.
    #[error("slot index out of range")]
    OutOfRange,

    /// Slot already in the requested state, or no matching unpaid record.
    #[error("conflicting state")]
    Conflict,

    /// Stock level already zero.
    #[error("stock exhausted")]
    Exhausted,
}
