//! # Linewatch Core Library
//!
//! Core functionality for the linewatch serial continuity monitor.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - A managed serial transport with strict open/close discipline
//! - Timeout-bounded blocking reads and writes with typed errors
//! - A continuity decoder for the incrementing 8-bit counter stream
//! - File-based monitor settings
//!
//! ## Example
//!
//! ```rust,ignore
//! use linewatch_core::{monitor::ContinuityMonitor, transport::{PortConfiguration, SerialTransport}};
//!
//! let transport = SerialTransport::new(PortConfiguration::default());
//! transport.open()?;
//!
//! for event in ContinuityMonitor::new(&transport) {
//!     println!("{}", event?);
//! }
//! ```

pub mod monitor;
pub mod settings;
pub mod transport;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::monitor::{
        ByteSource, ContinuityMonitor, MonitorError, MonitorEvent, MonitorStats,
    };
    pub use crate::settings::MonitorSettings;
    pub use crate::transport::{
        ErrorKind, Parity, PortConfiguration, SerialTransport, StopBits, TransportError,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
