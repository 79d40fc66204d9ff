//! Serial port handling
//!
//! Provides the `serialport`-backed [`Driver`] and port enumeration.

use serialport::{SerialPort, SerialPortInfo, SerialPortType, UsbPortInfo};
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use super::{Driver, DriverHandle, LineSettings, Parity, StopBits, Transfer, DEFAULT_BAUD_RATE};

#[cfg(unix)]
type NativePort = serialport::TTYPort;
#[cfg(windows)]
type NativePort = serialport::COMPort;

/// A serial device found on this machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Device path or COM name
    pub path: String,

    /// Short description, e.g. "FT232R USB UART (0403:6001)"
    pub description: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let description = match &info.port_type {
            SerialPortType::UsbPort(usb) => Some(describe_usb(usb)),
            SerialPortType::PciPort => Some("PCI".to_string()),
            SerialPortType::BluetoothPort => Some("Bluetooth".to_string()),
            SerialPortType::Unknown => None,
        };
        Self {
            path: info.port_name,
            description,
        }
    }
}

fn describe_usb(usb: &UsbPortInfo) -> String {
    let name = usb
        .product
        .as_deref()
        .or(usb.manufacturer.as_deref())
        .unwrap_or("USB serial");
    format!("{} ({:04x}:{:04x})", name, usb.vid, usb.pid)
}

/// Split a trailing device number off so COM2 sorts before COM10
fn path_order(path: &str) -> (&str, u32) {
    let stem = path.trim_end_matches(|c: char| c.is_ascii_digit());
    let number = path[stem.len()..].parse().unwrap_or(0);
    (stem, number)
}

/// Enumerate the serial devices the OS reports
pub fn list_ports() -> io::Result<Vec<PortInfo>> {
    let mut ports: Vec<PortInfo> = serialport::available_ports()
        .map_err(serialport_error)?
        .into_iter()
        .map(PortInfo::from)
        .collect();
    ports.sort_by(|a, b| path_order(&a.path).cmp(&path_order(&b.path)));
    ports.dedup_by(|a, b| a.path == b.path);
    Ok(ports)
}

/// Driver backed by the `serialport` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialportDriver;

impl Driver for SerialportDriver {
    fn acquire(&self, path: &str) -> io::Result<Box<dyn DriverHandle>> {
        // Line settings are applied by `configure`; the builder only needs a
        // placeholder rate to open the device.
        let port = serialport::new(path, DEFAULT_BAUD_RATE)
            .flow_control(serialport::FlowControl::None)
            .open_native()
            .map_err(io::Error::from)?;

        Ok(Box::new(SerialportHandle {
            port,
            read_timeout: Duration::ZERO,
            write_timeout: Duration::ZERO,
            lost: false,
        }))
    }
}

/// An open device owned by [`SerialportDriver`]
struct SerialportHandle {
    port: NativePort,
    read_timeout: Duration,
    write_timeout: Duration,
    lost: bool,
}

impl SerialportHandle {
    fn note_error(&mut self, err: &io::Error) {
        if indicates_access_lost(err) {
            self.lost = true;
        }
        tracing::trace!("serial driver error: {}", err);
    }
}

/// Whether a driver error means the device is gone or no longer ours
fn indicates_access_lost(err: &io::Error) -> bool {
    if matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::NotConnected | io::ErrorKind::PermissionDenied
    ) {
        return true;
    }
    // EIO, ENXIO and ENODEV on Unix; ERROR_ACCESS_DENIED (5) on Windows
    #[cfg(unix)]
    let lost_codes: &[i32] = &[5, 6, 19];
    #[cfg(not(unix))]
    let lost_codes: &[i32] = &[5];
    err.raw_os_error().is_some_and(|code| lost_codes.contains(&code))
}

/// Wait slice used while a transfer has no total timeout
const UNBOUNDED_WAIT: Duration = Duration::from_millis(250);

/// A zero timeout means no total timeout: the transfer blocks until complete.
fn deadline_after(timeout: Duration) -> Option<Instant> {
    (!timeout.is_zero()).then(|| Instant::now() + timeout)
}

/// How long the next driver call may block, or `None` once the deadline passed
fn next_wait(deadline: Option<Instant>) -> Option<Duration> {
    match deadline {
        None => Some(UNBOUNDED_WAIT),
        Some(deadline) => {
            let remaining = deadline.saturating_duration_since(Instant::now());
            (!remaining.is_zero()).then_some(remaining)
        }
    }
}

fn serialport_error(e: serialport::Error) -> io::Error {
    io::Error::from(e)
}

#[cfg(unix)]
fn unsupported(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, msg)
}

impl DriverHandle for SerialportHandle {
    fn configure(&mut self, line: &LineSettings) -> io::Result<()> {
        let data_bits = match line.data_bits {
            5 => serialport::DataBits::Five,
            6 => serialport::DataBits::Six,
            7 => serialport::DataBits::Seven,
            8 => serialport::DataBits::Eight,
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} data bits not supported", other),
                ))
            }
        };
        let stop_bits = match line.stop_bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
            // Widened below where the OS can do it
            StopBits::OneAndHalf => serialport::StopBits::One,
        };
        if line.baud_rate == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "baud rate must be positive",
            ));
        }

        self.port.set_data_bits(data_bits).map_err(serialport_error)?;
        self.port.set_stop_bits(stop_bits).map_err(serialport_error)?;
        self.port
            .set_flow_control(serialport::FlowControl::None)
            .map_err(serialport_error)?;
        self.port.set_baud_rate(line.baud_rate).map_err(serialport_error)?;

        match line.parity {
            Parity::None => self.port.set_parity(serialport::Parity::None),
            Parity::Odd | Parity::Mark => self.port.set_parity(serialport::Parity::Odd),
            Parity::Even | Parity::Space => self.port.set_parity(serialport::Parity::Even),
        }
        .map_err(serialport_error)?;

        match line.parity {
            Parity::Mark => apply_sticky_parity(&self.port, true)?,
            Parity::Space => apply_sticky_parity(&self.port, false)?,
            _ => {}
        }
        if line.stop_bits == StopBits::OneAndHalf {
            apply_one_and_half_stop_bits(&self.port)?;
        }
        Ok(())
    }

    fn set_timeouts(&mut self, read: Duration, write: Duration) -> io::Result<()> {
        self.port.set_timeout(read).map_err(serialport_error)?;
        self.read_timeout = read;
        self.write_timeout = write;
        Ok(())
    }

    fn purge(&mut self) {
        if let Err(e) = self.port.clear(serialport::ClearBuffer::Input) {
            tracing::debug!("purge failed: {}", e);
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Transfer {
        let deadline = deadline_after(self.read_timeout);
        let mut count = 0;

        while count < buf.len() {
            let Some(wait) = next_wait(deadline) else {
                return Transfer::timed_out(count);
            };
            if let Err(e) = self.port.set_timeout(wait) {
                self.note_error(&serialport_error(e));
                return Transfer::failed(count);
            }
            match self.port.read(&mut buf[count..]) {
                Ok(0) => return Transfer::failed(count),
                Ok(n) => count += n,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    if deadline.is_some() {
                        return Transfer::timed_out(count);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.note_error(&e);
                    return Transfer::failed(count);
                }
            }
        }

        Transfer::complete(count)
    }

    fn write(&mut self, buf: &[u8]) -> Transfer {
        let deadline = deadline_after(self.write_timeout);
        let mut count = 0;

        while count < buf.len() {
            let Some(wait) = next_wait(deadline) else {
                return Transfer::timed_out(count);
            };
            if let Err(e) = self.port.set_timeout(wait) {
                self.note_error(&serialport_error(e));
                return Transfer::failed(count);
            }
            match self.port.write(&buf[count..]) {
                Ok(0) => return Transfer::failed(count),
                Ok(n) => count += n,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    if deadline.is_some() {
                        return Transfer::timed_out(count);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.note_error(&e);
                    return Transfer::failed(count);
                }
            }
        }

        // No flush: tcdrain can block past the timeout, and the bytes are
        // already in the kernel's output buffer.
        Transfer::complete(count)
    }

    fn set_break(&mut self) -> io::Result<()> {
        self.port.set_break().map_err(serialport_error).inspect_err(|e| {
            if indicates_access_lost(e) {
                self.lost = true;
            }
        })
    }

    fn clear_break(&mut self) -> io::Result<()> {
        self.port.clear_break().map_err(serialport_error).inspect_err(|e| {
            if indicates_access_lost(e) {
                self.lost = true;
            }
        })
    }

    fn access_lost(&mut self) -> bool {
        self.lost
    }
}

/// Turn odd/even parity into mark/space via termios CMSPAR
#[cfg(target_os = "linux")]
fn apply_sticky_parity(port: &NativePort, mark: bool) -> io::Result<()> {
    use nix::sys::termios::{self, ControlFlags, SetArg};
    use std::os::fd::{AsRawFd, BorrowedFd};

    // SAFETY: the descriptor belongs to `port`, which outlives this borrow.
    let fd = unsafe { BorrowedFd::borrow_raw(port.as_raw_fd()) };
    let mut attrs = termios::tcgetattr(fd)?;
    attrs
        .control_flags
        .insert(ControlFlags::PARENB | ControlFlags::CMSPAR);
    attrs.control_flags.set(ControlFlags::PARODD, mark);
    termios::tcsetattr(fd, SetArg::TCSANOW, &attrs)?;
    Ok(())
}

// termios has no 1.5 stop bits on any Unix
#[cfg(unix)]
fn apply_one_and_half_stop_bits(_port: &NativePort) -> io::Result<()> {
    Err(unsupported("1.5 stop bits not supported on this platform".to_string()))
}

/// Read-modify-write the device control block of a COM port
#[cfg(windows)]
fn update_dcb(
    port: &NativePort,
    apply: impl FnOnce(&mut windows_sys::Win32::Devices::Communication::DCB),
) -> io::Result<()> {
    use std::os::windows::io::AsRawHandle;
    use windows_sys::Win32::Devices::Communication::{GetCommState, SetCommState, DCB};
    use windows_sys::Win32::Foundation::HANDLE;

    let handle = port.as_raw_handle() as HANDLE;
    // SAFETY: DCB is plain old data; GetCommState fills it in.
    let mut dcb: DCB = unsafe { std::mem::zeroed() };
    dcb.DCBlength = std::mem::size_of::<DCB>() as u32;
    // SAFETY: `handle` is an open COM handle owned by `port`.
    if unsafe { GetCommState(handle, &mut dcb) } == 0 {
        return Err(io::Error::last_os_error());
    }
    apply(&mut dcb);
    // SAFETY: as above; `dcb` was initialised by GetCommState.
    if unsafe { SetCommState(handle, &dcb) } == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Set MARKPARITY/SPACEPARITY in the DCB
#[cfg(windows)]
fn apply_sticky_parity(port: &NativePort, mark: bool) -> io::Result<()> {
    use windows_sys::Win32::Devices::Communication::{MARKPARITY, SPACEPARITY};

    update_dcb(port, |dcb| dcb.Parity = if mark { MARKPARITY } else { SPACEPARITY })
}

/// Set ONE5STOPBITS in the DCB. Windows only accepts it with 5 data bits.
#[cfg(windows)]
fn apply_one_and_half_stop_bits(port: &NativePort) -> io::Result<()> {
    use windows_sys::Win32::Devices::Communication::ONE5STOPBITS;

    update_dcb(port, |dcb| dcb.StopBits = ONE5STOPBITS)
}

// termios on the BSDs and macOS has no CMSPAR
#[cfg(all(unix, not(target_os = "linux")))]
fn apply_sticky_parity(_port: &NativePort, mark: bool) -> io::Result<()> {
    let name = if mark { "mark" } else { "space" };
    Err(unsupported(format!("{} parity not supported on this platform", name)))
}
