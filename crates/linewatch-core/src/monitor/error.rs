//! Monitor errors

use thiserror::Error;

use crate::transport::TransportError;

/// Errors yielded by the continuity monitor
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Transport failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid counter digits {high:#04x} {low:#04x}")]
    InvalidDigit { high: u8, low: u8 },
}

impl MonitorError {
    /// Whether monitoring cannot continue after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
