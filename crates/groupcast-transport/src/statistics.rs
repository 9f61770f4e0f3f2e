//! Receive-path loss and buffer-availability statistics.
//!
//! The receive path feeds these counters opportunistically; roughly every
//! two seconds, if anything was discarded or the arena ran low, a one-line
//! report is emitted and the counters reset. There is no dedicated
//! reporting thread.

use std::time::Instant;

use tracing::warn;

#[derive(Debug)]
pub(crate) struct ReceiveStats {
    /// Messages completed since the last report.
    pub udp_rx: u32,
    /// Datagrams rejected for any reason since the last report.
    pub discarded_bad: u32,
    /// Least fraction of the ring arena seen free since the last report.
    pub low_watermark: f64,
    last_report: Instant,
}

impl ReceiveStats {
    pub fn new() -> Self {
        Self {
            udp_rx: 0,
            discarded_bad: 0,
            low_watermark: 1.0,
            last_report: Instant::now(),
        }
    }

    /// Records the current free fraction of the ring arena.
    pub fn observe_buffer(&mut self, free_fraction: f64) {
        if free_fraction < self.low_watermark {
            self.low_watermark = free_fraction;
        }
    }

    /// Emits the loss report if enough time has passed and there is
    /// something worth saying, then resets the counters.
    pub fn maybe_report(&mut self) {
        if self.last_report.elapsed().as_secs() < 2 {
            return;
        }
        if self.discarded_bad > 0 || self.low_watermark < 0.5 {
            let total = self.udp_rx + self.discarded_bad;
            let loss = if total > 0 {
                self.discarded_bad as f64 * 100.0 / total as f64
            } else {
                0.0
            };
            warn!(
                "loss {:4.1}% : {:5} err, buf avail {:4.1}%",
                loss,
                self.discarded_bad,
                100.0 * self.low_watermark
            );
            self.udp_rx = 0;
            self.discarded_bad = 0;
            self.low_watermark = 1.0;
            self.last_report = Instant::now();
        }
    }
}
