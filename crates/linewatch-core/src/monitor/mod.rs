//! Counter Continuity Monitoring
//!
//! Decodes the stream sent by a counting device: ASCII hex pairs carrying an
//! incrementing 8-bit counter, space fillers, and two-byte marker records
//! introduced by `K` or `S`. Each decoded sample is compared with the previous
//! one and reported as a [`MonitorEvent`].

mod continuity;
mod decoder;
mod error;
mod event;

use std::sync::Arc;

pub use continuity::ContinuityMonitor;
pub use decoder::{decode_hex_pair, SequenceState};
pub use error::MonitorError;
pub use event::{MonitorEvent, MonitorStats};

use crate::transport::{SerialTransport, TransportError};

/// Filler byte, skipped without effect
pub const FILLER_BYTE: u8 = b' ';

/// Bytes introducing a two-byte marker record
pub const MARKER_BYTES: [u8; 2] = [b'K', b'S'];

/// Anything the monitor can pull bytes from
pub trait ByteSource {
    /// Fill `buf` completely or fail
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError>;
}

impl ByteSource for SerialTransport {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        self.read(buf)
    }
}

impl ByteSource for &SerialTransport {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        self.read(buf)
    }
}

impl ByteSource for Arc<SerialTransport> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        self.read(buf)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        (**self).read_exact(buf)
    }
}
