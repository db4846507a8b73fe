//! Round-trip time measurement from `ping`/`pong` pairs.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const MAX_RTT_SAMPLES: usize = 100;

#[derive(Debug)]
pub struct PingTracker {
    last_sent: Option<Instant>,
    last_rtt: Option<Duration>,
    history: VecDeque<Duration>,
}

impl PingTracker {
    pub fn new() -> Self {
        Self {
            last_sent: None,
            last_rtt: None,
            history: VecDeque::with_capacity(MAX_RTT_SAMPLES),
        }
    }

    pub fn mark_sent(&mut self, now: Instant) {
        self.last_sent = Some(now);
    }

    /// Records a sample. A pong with no outstanding ping is ignored.
    pub fn on_pong(&mut self, now: Instant) -> Option<Duration> {
        let sent = self.last_sent.take()?;
        let rtt = now.saturating_duration_since(sent);

        self.last_rtt = Some(rtt);
        self.history.push_back(rtt);
        while self.history.len() > MAX_RTT_SAMPLES {
            self.history.pop_front();
        }
        Some(rtt)
    }

    pub fn last_rtt(&self) -> Option<Duration> {
        self.last_rtt
    }

    pub fn average(&self) -> Option<Duration> {
        if self.history.is_empty() {
            return None;
        }
        let total: Duration = self.history.iter().sum();
        Some(total / self.history.len() as u32)
    }

    pub fn max_rtt(&self) -> Option<Duration> {
        self.history.iter().max().copied()
    }

    pub fn samples(&self) -> usize {
        self.history.len()
    }

    /// Forgets the outstanding ping. History survives reconnects.
    pub fn reset(&mut self) {
        self.last_sent = None;
    }
}

impl Default for PingTracker {
    fn default() -> Self {
        Self::new()
    }
}
