//! Monitor events and running totals

use serde::Serialize;
use std::fmt;

/// One diagnostic produced by the continuity monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// Sample is exactly one above the previous one
    Heartbeat,
    /// Counter rolled over from 0xFF to 0x00
    Wrap,
    /// Sample breaks continuity; carries the decoded value
    Anomaly(u8),
    /// Out-of-band marker record with its two payload bytes
    Marker(u8, u8),
}

impl fmt::Display for MonitorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heartbeat => write!(f, "*"),
            Self::Wrap => write!(f, "I: Wrap(FF -> 00)"),
            Self::Anomaly(value) => write!(f, "E: 0x{:02X} (even)", value),
            Self::Marker(a, b) => write!(
                f,
                "E: {}{} (odd)",
                char::from(*a).escape_default(),
                char::from(*b).escape_default()
            ),
        }
    }
}

/// Running totals over everything a monitor has seen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonitorStats {
    /// Contiguous increments
    pub heartbeats: u64,
    /// 0xFF -> 0x00 rollovers
    pub wraps: u64,
    /// Discontinuities after the first sample
    pub anomalies: u64,
    /// Marker records
    pub markers: u64,
    /// Counter pairs that were not valid hex
    pub malformed: u64,
    /// Filler bytes skipped
    pub fillers: u64,
}

impl MonitorStats {
    pub(crate) fn record(&mut self, event: &MonitorEvent) {
        match event {
            MonitorEvent::Heartbeat => self.heartbeats += 1,
            MonitorEvent::Wrap => self.wraps += 1,
            MonitorEvent::Anomaly(_) => self.anomalies += 1,
            MonitorEvent::Marker(..) => self.markers += 1,
        }
    }
}

impl fmt::Display for MonitorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} heartbeats, {} wraps, {} anomalies, {} markers, {} malformed",
            self.heartbeats, self.wraps, self.anomalies, self.markers, self.malformed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_display() {
        assert_eq!(MonitorEvent::Heartbeat.to_string(), "*");
        assert_eq!(MonitorEvent::Wrap.to_string(), "I: Wrap(FF -> 00)");
        assert_eq!(MonitorEvent::Anomaly(0x3c).to_string(), "E: 0x3C (even)");
        assert_eq!(MonitorEvent::Marker(b'A', b'B').to_string(), "E: AB (odd)");
        assert_eq!(MonitorEvent::Marker(b'\n', b'Z').to_string(), "E: \\nZ (odd)");
    }

    #[test]
    fn test_stats_record() {
        let mut stats = MonitorStats::default();
        stats.record(&MonitorEvent::Heartbeat);
        stats.record(&MonitorEvent::Heartbeat);
        stats.record(&MonitorEvent::Anomaly(7));
        stats.record(&MonitorEvent::Marker(1, 2));
        assert_eq!(stats.heartbeats, 2);
        assert_eq!(stats.anomalies, 1);
        assert_eq!(stats.markers, 1);
        assert_eq!(stats.wraps, 0);
    }

    #[test]
    fn test_event_serialize() {
        let json = serde_json::to_string(&MonitorEvent::Anomaly(5)).unwrap();
        assert_eq!(json, r#"{"event":"anomaly","data":5}"#);
    }
}
