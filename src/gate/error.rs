//! Error types for admission gates.

use std::fmt;
use std::time::Duration;

/// Why a permit could not be acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireError {
    /// The gate was closed.
    Closed,
    /// Every permit is taken, or the gate is draining (non-blocking acquisition only).
    NoPermits,
    /// No permit freed up within the allotted time.
    Timeout {
        /// How long the caller waited.
        duration: Duration,
    },
}

impl AcquireError {
    /// Returns true if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true if the gate was closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("admission gate closed"),
            Self::NoPermits => f.write_str("no permits available"),
            Self::Timeout { duration } => {
                write!(f, "timed out after {:?} waiting for a permit", duration)
            }
        }
    }
}

impl std::error::Error for AcquireError {}
