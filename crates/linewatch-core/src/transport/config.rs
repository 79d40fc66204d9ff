//! Line parameters for a serial transport

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::{DEFAULT_BAUD_RATE, DEFAULT_DATA_BITS, DEFAULT_PORT_PATH, DEFAULT_TIMEOUT_MS};

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopBits {
    /// One stop bit
    One,
    /// One and a half stop bits
    OneAndHalf,
    /// Two stop bits
    Two,
}

impl StopBits {
    /// Short label as used in `8N1`-style notation
    pub fn label(&self) -> &'static str {
        match self {
            Self::One => "1",
            Self::OneAndHalf => "1.5",
            Self::Two => "2",
        }
    }
}

impl FromStr for StopBits {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "one" => Ok(Self::One),
            "1.5" | "one_and_half" => Ok(Self::OneAndHalf),
            "2" | "two" => Ok(Self::Two),
            other => Err(format!("unknown stop bits '{}' (expected 1, 1.5 or 2)", other)),
        }
    }
}

/// Parity checking mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    /// No parity bit
    None,
    /// Odd parity
    Odd,
    /// Even parity
    Even,
    /// Parity bit always set
    Mark,
    /// Parity bit always clear
    Space,
}

impl Parity {
    /// Single-letter label as used in `8N1`-style notation
    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "N",
            Self::Odd => "O",
            Self::Even => "E",
            Self::Mark => "M",
            Self::Space => "S",
        }
    }
}

impl FromStr for Parity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n" | "none" => Ok(Self::None),
            "o" | "odd" => Ok(Self::Odd),
            "e" | "even" => Ok(Self::Even),
            "m" | "mark" => Ok(Self::Mark),
            "s" | "space" => Ok(Self::Space),
            other => Err(format!(
                "unknown parity '{}' (expected none, odd, even, mark or space)",
                other
            )),
        }
    }
}

/// Physical line parameters for one serial device.
///
/// Values are not validated here. A transport hands them to its driver on
/// open, and the driver rejects anything it cannot apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfiguration {
    /// Device path (e.g., "/dev/ttyUSB0" or "COM5")
    #[serde(default = "default_path")]
    pub path: String,

    /// Baud rate in bits per second
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Data bits per character (commonly 5-8)
    #[serde(default = "default_data_bits")]
    pub data_bits: u8,

    /// Stop bits per character
    #[serde(default = "default_stop_bits")]
    pub stop_bits: StopBits,

    /// Parity mode
    #[serde(default = "default_parity")]
    pub parity: Parity,

    /// Read and write timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u32,
}

fn default_path() -> String {
    DEFAULT_PORT_PATH.to_string()
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_data_bits() -> u8 {
    DEFAULT_DATA_BITS
}

fn default_stop_bits() -> StopBits {
    StopBits::Two
}

fn default_parity() -> Parity {
    Parity::Mark
}

fn default_timeout_ms() -> u32 {
    DEFAULT_TIMEOUT_MS
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self {
            path: default_path(),
            baud_rate: default_baud_rate(),
            data_bits: default_data_bits(),
            stop_bits: default_stop_bits(),
            parity: default_parity(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl PortConfiguration {
    /// Create a configuration for `path` with default line settings
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_ms))
    }
}

impl fmt::Display for PortConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} {}{}{}, {} ms",
            self.path,
            self.baud_rate,
            self.data_bits,
            self.parity.label(),
            self.stop_bits.label(),
            self.timeout_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration() {
        let config = PortConfiguration::default();
        assert_eq!(config.path, DEFAULT_PORT_PATH);
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.data_bits, 8);
        assert_eq!(config.stop_bits, StopBits::Two);
        assert_eq!(config.parity, Parity::Mark);
        assert_eq!(config.timeout_ms, 1100);
        assert_eq!(config.timeout(), Duration::from_millis(1100));
    }

    #[test]
    fn test_display() {
        let config = PortConfiguration::new("/dev/ttyS1");
        assert_eq!(config.to_string(), "/dev/ttyS1 @ 115200 8M2, 1100 ms");
    }

    #[test]
    fn test_parse_line_enums() {
        assert_eq!("1.5".parse::<StopBits>().unwrap(), StopBits::OneAndHalf);
        assert_eq!("Two".parse::<StopBits>().unwrap(), StopBits::Two);
        assert!("3".parse::<StopBits>().is_err());

        assert_eq!("M".parse::<Parity>().unwrap(), Parity::Mark);
        assert_eq!("space".parse::<Parity>().unwrap(), Parity::Space);
        assert!("x".parse::<Parity>().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PortConfiguration =
            serde_json::from_str(r#"{"path": "COM3", "parity": "even"}"#).unwrap();
        assert_eq!(config.path, "COM3");
        assert_eq!(config.parity, Parity::Even);
        assert_eq!(config.stop_bits, StopBits::Two);
        assert_eq!(config.baud_rate, DEFAULT_BAUD_RATE);
    }
}
