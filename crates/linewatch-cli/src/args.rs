//! Command line arguments

use clap::{ArgAction, Parser};
use linewatch_core::settings::MonitorSettings;
use linewatch_core::transport::{Parity, StopBits};
use std::path::PathBuf;

/// Watch a serial counter stream for gaps, wraps and markers
#[derive(Debug, Parser)]
#[command(name = "linewatch", version)]
pub struct Args {
    /// Settings file (JSON); flags below override it
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Device path
    #[arg(short, long)]
    pub port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Data bits per character
    #[arg(long)]
    pub data_bits: Option<u8>,

    /// Stop bits: 1, 1.5 or 2
    #[arg(long)]
    pub stop_bits: Option<StopBits>,

    /// Parity: none, odd, even, mark or space
    #[arg(long)]
    pub parity: Option<Parity>,

    /// Read/write timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u32>,

    /// Don't print a glyph per heartbeat
    #[arg(long)]
    pub no_heartbeats: bool,

    /// Prefix reported lines with the local time
    #[arg(long)]
    pub timestamps: bool,

    /// List serial ports and exit
    #[arg(long)]
    pub list_ports: bool,

    /// Write the effective settings to FILE and exit
    #[arg(long, value_name = "FILE")]
    pub write_config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Overlay command line values on loaded settings
    pub fn apply(&self, settings: &mut MonitorSettings) {
        let port = &mut settings.port;
        if let Some(path) = &self.port {
            port.path = path.clone();
        }
        if let Some(baud) = self.baud {
            port.baud_rate = baud;
        }
        if let Some(data_bits) = self.data_bits {
            port.data_bits = data_bits;
        }
        if let Some(stop_bits) = self.stop_bits {
            port.stop_bits = stop_bits;
        }
        if let Some(parity) = self.parity {
            port.parity = parity;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            port.timeout_ms = timeout_ms;
        }
        if self.no_heartbeats {
            settings.show_heartbeats = false;
        }
    }
}
