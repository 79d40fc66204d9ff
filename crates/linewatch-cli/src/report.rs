//! Console rendering of monitor events

use chrono::Local;
use linewatch_core::monitor::MonitorEvent;
use std::io::{self, Write};

/// Writes events to a sink, heartbeats inline and everything else on its own line
pub struct Reporter<W: Write> {
    out: W,
    show_heartbeats: bool,
    timestamps: bool,
    mid_line: bool,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, show_heartbeats: bool, timestamps: bool) -> Self {
        Self {
            out,
            show_heartbeats,
            timestamps,
            mid_line: false,
        }
    }

    pub fn report(&mut self, event: &MonitorEvent) -> io::Result<()> {
        if *event == MonitorEvent::Heartbeat {
            if self.show_heartbeats {
                write!(self.out, "{}", event)?;
                self.mid_line = true;
                self.out.flush()?;
            }
            return Ok(());
        }

        self.end_line()?;
        if self.timestamps {
            write!(self.out, "[{}] ", Local::now().format("%H:%M:%S%.3f"))?;
        }
        writeln!(self.out, "{}", event)?;
        self.out.flush()
    }

    /// Terminate a pending heartbeat line
    pub fn finish(&mut self) -> io::Result<()> {
        self.end_line()?;
        self.out.flush()
    }

    fn end_line(&mut self) -> io::Result<()> {
        if self.mid_line {
            writeln!(self.out)?;
            self.mid_line = false;
        }
        Ok(())
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(events: &[MonitorEvent], show_heartbeats: bool) -> String {
        let mut reporter = Reporter::new(Vec::new(), show_heartbeats, false);
        for event in events {
            reporter.report(event).unwrap();
        }
        reporter.finish().unwrap();
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn test_heartbeats_inline() {
        let out = render(
            &[
                MonitorEvent::Heartbeat,
                MonitorEvent::Heartbeat,
                MonitorEvent::Wrap,
                MonitorEvent::Heartbeat,
            ],
            true,
        );
        assert_eq!(out, "**\nI: Wrap(FF -> 00)\n*\n");
    }

    #[test]
    fn test_hidden_heartbeats() {
        let out = render(
            &[
                MonitorEvent::Heartbeat,
                MonitorEvent::Anomaly(0x10),
                MonitorEvent::Marker(b'O', b'K'),
            ],
            false,
        );
        assert_eq!(out, "E: 0x10 (even)\nE: OK (odd)\n");
    }

    #[test]
    fn test_timestamps_prefix() {
        let mut reporter = Reporter::new(Vec::new(), true, true);
        reporter.report(&MonitorEvent::Wrap).unwrap();
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(out.starts_with('['));
        assert!(out.ends_with("] I: Wrap(FF -> 00)\n"));
    }
}
