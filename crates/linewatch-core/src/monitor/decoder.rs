//! Counter sample decoding and continuity tracking

use super::{MonitorError, MonitorEvent};

/// Decode two ASCII hex digits into a counter sample
pub fn decode_hex_pair(high: u8, low: u8) -> Result<u8, MonitorError> {
    let digit = |b: u8| char::from(b).to_digit(16);
    match (digit(high), digit(low)) {
        (Some(h), Some(l)) => Ok((h * 16 + l) as u8),
        _ => Err(MonitorError::InvalidDigit { high, low }),
    }
}

/// Continuity state carried between counter samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceState {
    /// Last decoded sample (0 before the first one)
    pub previous: i16,
    /// Whether a contiguous increment has been seen yet
    pub sample_seen: bool,
}

impl SequenceState {
    /// Fresh state: previous sample 0, nothing seen
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one sample into the state and report what it means.
    ///
    /// Returns `None` for a discontinuous sample before any contiguous
    /// increment has been seen.
    pub fn observe(&mut self, sample: u8) -> Option<MonitorEvent> {
        let curr = i16::from(sample);
        let event = if self.previous - curr == 0xFF {
            Some(MonitorEvent::Wrap)
        } else if curr - self.previous == 1 {
            self.sample_seen = true;
            Some(MonitorEvent::Heartbeat)
        } else if self.sample_seen {
            Some(MonitorEvent::Anomaly(sample))
        } else {
            None
        };
        self.previous = curr;
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(previous: i16, sample_seen: bool) -> SequenceState {
        SequenceState {
            previous,
            sample_seen,
        }
    }

    #[test]
    fn test_decode_hex_pair() {
        assert_eq!(decode_hex_pair(b'0', b'1').unwrap(), 0x01);
        assert_eq!(decode_hex_pair(b'F', b'F').unwrap(), 0xFF);
        assert_eq!(decode_hex_pair(b'a', b'7').unwrap(), 0xA7);
    }

    #[test]
    fn test_decode_hex_pair_invalid() {
        let err = decode_hex_pair(b'G', b'1').unwrap_err();
        assert!(matches!(err, MonitorError::InvalidDigit { high: b'G', low: b'1' }));
        assert!(decode_hex_pair(b'1', b' ').is_err());
    }

    #[test]
    fn test_heartbeat_from_zero() {
        let mut s = SequenceState::new();
        assert_eq!(s.observe(0x01), Some(MonitorEvent::Heartbeat));
        assert_eq!(s, state(1, true));
    }

    #[test]
    fn test_wrap() {
        let mut s = state(0xFF, true);
        assert_eq!(s.observe(0x00), Some(MonitorEvent::Wrap));
        assert_eq!(s, state(0, true));
    }

    #[test]
    fn test_wrap_does_not_mark_sample_seen() {
        let mut s = state(0xFF, false);
        assert_eq!(s.observe(0x00), Some(MonitorEvent::Wrap));
        assert!(!s.sample_seen);
    }

    #[test]
    fn test_first_discontinuity_is_silent() {
        let mut s = SequenceState::new();
        assert_eq!(s.observe(0x42), None);
        assert_eq!(s, state(0x42, false));
        // Still in grace until a contiguous increment arrives
        assert_eq!(s.observe(0x10), None);
        assert_eq!(s.observe(0x11), Some(MonitorEvent::Heartbeat));
        assert_eq!(s.observe(0x20), Some(MonitorEvent::Anomaly(0x20)));
        assert_eq!(s, state(0x20, true));
    }

    #[test]
    fn test_repeated_sample_is_anomaly() {
        let mut s = state(0x05, true);
        assert_eq!(s.observe(0x05), Some(MonitorEvent::Anomaly(0x05)));
    }
}
