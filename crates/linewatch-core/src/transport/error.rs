//! Transport errors

use std::io;
use thiserror::Error;

/// Errors that can occur while operating a serial transport
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Port is open: close it before changing its configuration")]
    AlreadyOpen,

    #[error("Port is closed")]
    NotOpen,

    #[error("Can't open port {path}: {source}")]
    CannotOpen {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Can't set timeouts: {0}")]
    TimeoutConfigureFailed(#[source] io::Error),

    #[error("Line settings rejected: {0}")]
    ConfigureRejected(#[source] io::Error),

    #[error("Read timeout")]
    ReadTimeout,

    #[error("Write timeout")]
    WriteTimeout,

    #[error("Partial read: expected {expected} bytes, got {received}")]
    PartialRead { expected: usize, received: usize },

    #[error("Partial write: expected {expected} bytes, sent {sent}")]
    PartialWrite { expected: usize, sent: usize },

    #[error("Can't set break: {0}")]
    CannotSetBreak(#[source] io::Error),

    #[error("Can't reset break: {0}")]
    CannotResetBreak(#[source] io::Error),
}

/// Fieldless classification of a [`TransportError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Operation needs a closed port
    AlreadyOpen,
    /// Operation needs an open port
    NotOpen,
    /// Device could not be acquired
    CannotOpen,
    /// Driver refused the timeouts
    TimeoutConfigureFailed,
    /// Driver refused the line settings
    ConfigureRejected,
    /// Nothing arrived before the timeout
    ReadTimeout,
    /// Nothing was sent before the timeout
    WriteTimeout,
    /// Fewer bytes arrived than requested
    PartialRead,
    /// Fewer bytes were sent than requested
    PartialWrite,
    /// Driver refused to assert break
    CannotSetBreak,
    /// Driver refused to clear break
    CannotResetBreak,
}

impl TransportError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyOpen => ErrorKind::AlreadyOpen,
            Self::NotOpen => ErrorKind::NotOpen,
            Self::CannotOpen { .. } => ErrorKind::CannotOpen,
            Self::TimeoutConfigureFailed(_) => ErrorKind::TimeoutConfigureFailed,
            Self::ConfigureRejected(_) => ErrorKind::ConfigureRejected,
            Self::ReadTimeout => ErrorKind::ReadTimeout,
            Self::WriteTimeout => ErrorKind::WriteTimeout,
            Self::PartialRead { .. } => ErrorKind::PartialRead,
            Self::PartialWrite { .. } => ErrorKind::PartialWrite,
            Self::CannotSetBreak(_) => ErrorKind::CannotSetBreak,
            Self::CannotResetBreak(_) => ErrorKind::CannotResetBreak,
        }
    }
}
