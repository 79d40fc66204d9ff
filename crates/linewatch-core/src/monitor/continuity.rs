//! The consumption loop
//!
//! [`ContinuityMonitor`] pulls bytes from a [`ByteSource`] on demand and
//! yields one item per event. It never restarts: after a transport failure or
//! cancellation it stays exhausted.

use tokio_util::sync::CancellationToken;

use super::{
    decode_hex_pair, ByteSource, MonitorError, MonitorEvent, MonitorStats, SequenceState,
    FILLER_BYTE, MARKER_BYTES,
};

/// Lazy, endless stream of continuity events read from a byte source
pub struct ContinuityMonitor<S> {
    source: S,
    state: SequenceState,
    stats: MonitorStats,
    cancel: CancellationToken,
    finished: bool,
}

impl<S: ByteSource> ContinuityMonitor<S> {
    /// Monitor `source` until it fails
    pub fn new(source: S) -> Self {
        Self::with_cancellation(source, CancellationToken::new())
    }

    /// Monitor `source` until it fails or `cancel` is triggered
    pub fn with_cancellation(source: S, cancel: CancellationToken) -> Self {
        Self {
            source,
            state: SequenceState::new(),
            stats: MonitorStats::default(),
            cancel,
            finished: false,
        }
    }

    /// Token that stops this monitor when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current continuity state
    pub fn state(&self) -> SequenceState {
        self.state
    }

    /// Totals so far
    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    /// Give the source back
    pub fn into_inner(self) -> S {
        self.source
    }

    fn read_raw<const N: usize>(&mut self) -> Result<[u8; N], MonitorError> {
        let mut buf = [0u8; N];
        self.source.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Decode until something is worth reporting
    fn next_item(&mut self) -> Option<Result<MonitorEvent, MonitorError>> {
        loop {
            // A partially decoded pair is dropped on cancellation.
            if self.cancel.is_cancelled() {
                tracing::debug!("Monitor cancelled");
                return None;
            }

            let [first] = match self.read_raw::<1>() {
                Ok(b) => b,
                Err(e) => return Some(Err(e)),
            };

            if first == FILLER_BYTE {
                self.stats.fillers += 1;
                continue;
            }

            if MARKER_BYTES.contains(&first) {
                let [a, b] = match self.read_raw::<2>() {
                    Ok(b) => b,
                    Err(e) => return Some(Err(e)),
                };
                let event = MonitorEvent::Marker(a, b);
                self.stats.record(&event);
                return Some(Ok(event));
            }

            let [second] = match self.read_raw::<1>() {
                Ok(b) => b,
                Err(e) => return Some(Err(e)),
            };

            let sample = match decode_hex_pair(first, second) {
                Ok(sample) => sample,
                Err(e) => {
                    self.stats.malformed += 1;
                    return Some(Err(e));
                }
            };

            if let Some(event) = self.state.observe(sample) {
                self.stats.record(&event);
                return Some(Ok(event));
            }
            tracing::trace!("sample {:#04x} accepted silently", sample);
        }
    }
}

impl<S: ByteSource> Iterator for ContinuityMonitor<S> {
    type Item = Result<MonitorEvent, MonitorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = self.next_item();
        match &item {
            None => self.finished = true,
            Some(Err(e)) if e.is_fatal() => {
                tracing::debug!("Monitor stopping: {}", e);
                self.finished = true;
            }
            _ => {}
        }
        item
    }
}

impl<S: ByteSource> std::iter::FusedIterator for ContinuityMonitor<S> {}
