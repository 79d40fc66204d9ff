//! Transport lifecycle
//!
//! Handles opening, closing and guarded reconfiguration of one serial line,
//! and classifies driver transfers into [`TransportError`]s.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

use super::{
    Driver, DriverHandle, LineSettings, Parity, PortConfiguration, SerialportDriver, StopBits,
    Transfer, TransportError,
};

/// Mutable transport state. `handle` is `Some` exactly while the port is open.
struct Inner {
    config: PortConfiguration,
    handle: Option<Box<dyn DriverHandle>>,
}

impl Inner {
    fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    fn handle_mut(&mut self) -> Result<&mut (dyn DriverHandle + 'static), TransportError> {
        self.handle.as_deref_mut().ok_or(TransportError::NotOpen)
    }

    fn release(&mut self) {
        if self.handle.take().is_some() {
            tracing::info!("Closed {}", self.config.path);
        }
    }
}

/// A serial line with an explicit open/closed lifecycle.
///
/// Every operation takes the internal lock, so a transport can be shared
/// between threads. A `close()` issued while another thread is blocked in
/// `read()` waits until that read returns (at most the configured timeout).
pub struct SerialTransport {
    driver: Arc<dyn Driver>,
    inner: Mutex<Inner>,
}

impl fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("SerialTransport")
            .field("config", &inner.config)
            .field("open", &inner.is_open())
            .finish()
    }
}

/// Map a driver transfer onto the error taxonomy.
///
/// A timeout that still moved some bytes is reported like any other short
/// transfer.
fn classify(
    transfer: Transfer,
    expected: usize,
    timeout: TransportError,
    partial: impl FnOnce(usize) -> TransportError,
) -> Result<(), TransportError> {
    if transfer.count >= expected {
        Ok(())
    } else if transfer.count == 0 && (transfer.timed_out || !transfer.succeeded) {
        Err(timeout)
    } else {
        Err(partial(transfer.count))
    }
}

impl SerialTransport {
    /// Create a closed transport using the `serialport` driver
    pub fn new(config: PortConfiguration) -> Self {
        Self::with_driver(config, Arc::new(SerialportDriver))
    }

    /// Create a closed transport on top of a custom driver
    pub fn with_driver(config: PortConfiguration, driver: Arc<dyn Driver>) -> Self {
        Self {
            driver,
            inner: Mutex::new(Inner {
                config,
                handle: None,
            }),
        }
    }

    /// Snapshot of the current configuration
    pub fn configuration(&self) -> PortConfiguration {
        self.inner.lock().config.clone()
    }

    /// Whether the port is open, without probing the driver
    pub fn is_open(&self) -> bool {
        self.inner.lock().is_open()
    }

    fn update(
        &self,
        what: &str,
        apply: impl FnOnce(&mut PortConfiguration),
    ) -> Result<(), TransportError> {
        let mut inner = self.inner.lock();
        Self::refresh(&mut inner);
        if inner.is_open() {
            tracing::debug!("Refusing to change {} on open port {}", what, inner.config.path);
            return Err(TransportError::AlreadyOpen);
        }
        apply(&mut inner.config);
        tracing::debug!("Set {}: {}", what, inner.config);
        Ok(())
    }

    /// Set the device path
    pub fn set_path(&self, path: impl Into<String>) -> Result<(), TransportError> {
        let path = path.into();
        self.update("path", |c| c.path = path)
    }

    /// Set the baud rate
    pub fn set_baud_rate(&self, baud_rate: u32) -> Result<(), TransportError> {
        self.update("baud rate", |c| c.baud_rate = baud_rate)
    }

    /// Set the number of data bits
    pub fn set_data_bits(&self, data_bits: u8) -> Result<(), TransportError> {
        self.update("data bits", |c| c.data_bits = data_bits)
    }

    /// Set the number of stop bits
    pub fn set_stop_bits(&self, stop_bits: StopBits) -> Result<(), TransportError> {
        self.update("stop bits", |c| c.stop_bits = stop_bits)
    }

    /// Set the parity mode
    pub fn set_parity(&self, parity: Parity) -> Result<(), TransportError> {
        self.update("parity", |c| c.parity = parity)
    }

    /// Set the read/write timeout in milliseconds
    pub fn set_timeout_ms(&self, timeout_ms: u32) -> Result<(), TransportError> {
        self.update("timeout", |c| c.timeout_ms = timeout_ms)
    }

    /// Replace the whole configuration
    pub fn reconfigure(&self, config: PortConfiguration) -> Result<(), TransportError> {
        self.update("configuration", |c| *c = config)
    }

    /// Open the port, closing it first if it is already open.
    ///
    /// On any failure the port is left closed and no handle is retained.
    pub fn open(&self) -> Result<(), TransportError> {
        let mut inner = self.inner.lock();
        if inner.is_open() {
            tracing::debug!("Reopening {}", inner.config.path);
            inner.release();
        }

        // The handle stays local until fully set up; an early return drops it.
        let mut handle = self
            .driver
            .acquire(&inner.config.path)
            .map_err(|source| TransportError::CannotOpen {
                path: inner.config.path.clone(),
                source,
            })?;

        handle
            .configure(&LineSettings::from(&inner.config))
            .map_err(TransportError::ConfigureRejected)?;

        let timeout = inner.config.timeout();
        handle
            .set_timeouts(timeout, timeout)
            .map_err(TransportError::TimeoutConfigureFailed)?;

        handle.purge();

        tracing::info!("Opened {}", inner.config);
        inner.handle = Some(handle);
        Ok(())
    }

    /// Close the port. Closing a closed port does nothing.
    pub fn close(&self) {
        self.inner.lock().release();
    }

    /// Read exactly `buf.len()` bytes, blocking for at most the timeout
    pub fn read(&self, buf: &mut [u8]) -> Result<(), TransportError> {
        let mut inner = self.inner.lock();
        let handle = inner.handle_mut()?;
        let transfer = handle.read(buf);
        tracing::trace!("read {:?} of {} bytes", transfer, buf.len());

        let expected = buf.len();
        classify(transfer, expected, TransportError::ReadTimeout, |received| {
            TransportError::PartialRead { expected, received }
        })
    }

    /// Read a single byte
    pub fn read_byte(&self) -> Result<u8, TransportError> {
        let mut buf = [0u8; 1];
        self.read(&mut buf)?;
        Ok(buf[0])
    }

    /// Write all of `buf`, blocking for at most the timeout
    pub fn write(&self, buf: &[u8]) -> Result<(), TransportError> {
        let mut inner = self.inner.lock();
        let handle = inner.handle_mut()?;
        let transfer = handle.write(buf);
        tracing::trace!("wrote {:?} of {} bytes", transfer, buf.len());

        let expected = buf.len();
        classify(transfer, expected, TransportError::WriteTimeout, |sent| {
            TransportError::PartialWrite { expected, sent }
        })
    }

    /// Assert a break condition on the line
    pub fn set_break(&self) -> Result<(), TransportError> {
        let mut inner = self.inner.lock();
        inner
            .handle_mut()?
            .set_break()
            .map_err(TransportError::CannotSetBreak)
    }

    /// Clear a break condition on the line
    pub fn reset_break(&self) -> Result<(), TransportError> {
        let mut inner = self.inner.lock();
        inner
            .handle_mut()?
            .clear_break()
            .map_err(TransportError::CannotResetBreak)
    }

    /// Discard pending input and abort in-flight reads. No-op when closed.
    pub fn clean(&self) {
        if let Some(handle) = self.inner.lock().handle.as_deref_mut() {
            tracing::debug!("Purging input");
            handle.purge();
        }
    }

    /// Report whether the port is open.
    ///
    /// If the driver says access to the device was lost, the port is closed
    /// first, so the answer reflects the real state of the line.
    pub fn query_state(&self) -> bool {
        let mut inner = self.inner.lock();
        Self::refresh(&mut inner);
        inner.is_open()
    }

    fn refresh(inner: &mut Inner) {
        let lost = inner
            .handle
            .as_deref_mut()
            .is_some_and(|handle| handle.access_lost());
        if lost {
            tracing::warn!("Lost access to {}, closing", inner.config.path);
            inner.release();
        }
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.inner.get_mut().release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_complete() {
        let result = classify(Transfer::complete(4), 4, TransportError::ReadTimeout, |n| {
            TransportError::PartialRead { expected: 4, received: n }
        });
        assert!(result.is_ok());
    }

    #[test]
    fn test_classify_timeout_without_data() {
        let err = classify(Transfer::timed_out(0), 4, TransportError::ReadTimeout, |n| {
            TransportError::PartialRead { expected: 4, received: n }
        })
        .unwrap_err();
        assert!(matches!(err, TransportError::ReadTimeout));
    }

    #[test]
    fn test_classify_failure_without_data() {
        let err = classify(Transfer::failed(0), 2, TransportError::WriteTimeout, |n| {
            TransportError::PartialWrite { expected: 2, sent: n }
        })
        .unwrap_err();
        assert!(matches!(err, TransportError::WriteTimeout));
    }

    #[test]
    fn test_classify_timeout_with_data_is_partial() {
        let err = classify(Transfer::timed_out(3), 4, TransportError::ReadTimeout, |n| {
            TransportError::PartialRead { expected: 4, received: n }
        })
        .unwrap_err();
        assert!(matches!(
            err,
            TransportError::PartialRead { expected: 4, received: 3 }
        ));
    }

    #[test]
    fn test_classify_short_success_is_partial() {
        // Zero bytes with a successful driver call is a short transfer, not a timeout
        let err = classify(Transfer::complete(0), 1, TransportError::ReadTimeout, |n| {
            TransportError::PartialRead { expected: 1, received: n }
        })
        .unwrap_err();
        assert!(matches!(
            err,
            TransportError::PartialRead { expected: 1, received: 0 }
        ));
    }

    #[test]
    fn test_new_transport_is_closed() {
        let transport = SerialTransport::new(PortConfiguration::new("/dev/null-port"));
        assert!(!transport.is_open());
        assert!(!transport.query_state());
        let err = transport.read_byte().unwrap_err();
        assert!(matches!(err, TransportError::NotOpen));
    }
}
