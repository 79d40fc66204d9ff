//! Driver collaborator contract
//!
//! A [`Driver`] performs the device-level calls a [`SerialTransport`] needs.
//! The transport owns lifecycle and error classification; drivers only report
//! what the device did.
//!
//! [`SerialTransport`]: super::SerialTransport

use std::io;
use std::time::Duration;

use super::{Parity, PortConfiguration, StopBits};

/// Line settings applied to an acquired handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSettings {
    /// Baud rate in bits per second
    pub baud_rate: u32,
    /// Data bits per character
    pub data_bits: u8,
    /// Stop bits per character
    pub stop_bits: StopBits,
    /// Parity mode
    pub parity: Parity,
}

impl From<&PortConfiguration> for LineSettings {
    fn from(config: &PortConfiguration) -> Self {
        Self {
            baud_rate: config.baud_rate,
            data_bits: config.data_bits,
            stop_bits: config.stop_bits,
            parity: config.parity,
        }
    }
}

/// Raw outcome of one blocking read or write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transfer {
    /// Bytes actually moved
    pub count: usize,
    /// The timeout elapsed before the transfer completed
    pub timed_out: bool,
    /// The driver call itself reported success
    pub succeeded: bool,
}

impl Transfer {
    /// A transfer that moved `count` bytes without error
    pub fn complete(count: usize) -> Self {
        Self {
            count,
            timed_out: false,
            succeeded: true,
        }
    }

    /// A transfer cut short by the timeout after `count` bytes
    pub fn timed_out(count: usize) -> Self {
        Self {
            count,
            timed_out: true,
            succeeded: false,
        }
    }

    /// A transfer the driver aborted after `count` bytes
    pub fn failed(count: usize) -> Self {
        Self {
            count,
            timed_out: false,
            succeeded: false,
        }
    }
}

/// Opens devices
pub trait Driver: Send + Sync {
    /// Acquire exclusive read/write access to the device at `path`
    fn acquire(&self, path: &str) -> io::Result<Box<dyn DriverHandle>>;
}

/// An acquired device. Dropping the handle releases the device.
pub trait DriverHandle: Send {
    /// Apply baud rate, data bits, stop bits and parity
    fn configure(&mut self, line: &LineSettings) -> io::Result<()>;

    /// Set total read and write timeouts
    fn set_timeouts(&mut self, read: Duration, write: Duration) -> io::Result<()>;

    /// Discard pending input and abort in-flight reads
    fn purge(&mut self);

    /// Read until `buf` is full, the timeout elapses, or the driver fails
    fn read(&mut self, buf: &mut [u8]) -> Transfer;

    /// Write until `buf` is sent, the timeout elapses, or the driver fails
    fn write(&mut self, buf: &[u8]) -> Transfer;

    /// Assert a break condition on the line
    fn set_break(&mut self) -> io::Result<()>;

    /// Clear a break condition on the line
    fn clear_break(&mut self) -> io::Result<()>;

    /// Whether the last driver error indicates the device went away
    fn access_lost(&mut self) -> bool;
}
