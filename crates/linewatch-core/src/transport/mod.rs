//! Serial Transport
//!
//! Managed access to a single serial line: open/close lifecycle, guarded
//! reconfiguration, and blocking reads/writes bounded by a timeout.
//!
//! The actual device calls are delegated to a [`Driver`]; the default one is
//! backed by the `serialport` crate.

mod config;
pub mod driver;
mod error;
mod port;
pub mod serial;

pub use config::{Parity, PortConfiguration, StopBits};
pub use driver::{Driver, DriverHandle, LineSettings, Transfer};
pub use error::{ErrorKind, TransportError};
pub use port::SerialTransport;
pub use serial::{list_ports, PortInfo, SerialportDriver};

/// Default baud rate for the monitored line
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Default number of data bits per character
pub const DEFAULT_DATA_BITS: u8 = 8;

/// Default read/write timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u32 = 1100;

/// Default device path for the current platform
#[cfg(windows)]
pub const DEFAULT_PORT_PATH: &str = "COM5";

/// Default device path for the current platform
#[cfg(not(windows))]
pub const DEFAULT_PORT_PATH: &str = "/dev/ttyUSB0";
