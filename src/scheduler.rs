// scheduler.rs

use std::fmt::Write;

use log::*;
use tokio::time::{Duration, Instant};

use crate::{ChannelRegistry, PushError, Sensors};

/// Text of one SSE event. Big enough for any f32 with one decimal.
pub type Payload = heapless::String<48>;

/// Fixed point, exactly one fractional digit, no unit. Never "-0.0".
pub fn format_reading(value: f32) -> Payload {
    let mut s = Payload::new();
    let _ = write!(s, "{value:.1}");
    if s.as_str() == "-0.0" {
        s.clear();
        let _ = write!(s, "0.0");
    }
    s
}

/// Shared next-push time for all channels.
#[derive(Clone, Copy, Debug)]
pub struct Schedule {
    next: Instant,
    interval: Duration,
}

impl Schedule {
    /// The first push is due right away.
    pub fn new(start: Instant, interval: Duration) -> Self {
        Schedule {
            next: start,
            interval,
        }
    }

    pub fn next(&self) -> Instant {
        self.next
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next
    }

    fn advance(&mut self, now: Instant) {
        self.next = self.next.max(now + self.interval);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub pushed: usize,
    pub dropped: usize,
    pub skipped: usize,
}

pub struct PushScheduler {
    schedule: Schedule,
    cycles: u64,
}

impl PushScheduler {
    pub fn new(start: Instant, interval: Duration) -> Self {
        PushScheduler {
            schedule: Schedule::new(start, interval),
            cycles: 0,
        }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Called on every loop iteration. Returns `None` while the next push is not due.
    ///
    /// A due cycle reads the sensor of every occupied channel, pushes one event each,
    /// and then moves the shared schedule one interval past `now`.
    pub fn tick<S>(&mut self, now: Instant, registry: &mut ChannelRegistry, sensors: &mut S) -> Option<CycleReport>
    where
        S: Sensors + ?Sized,
    {
        if !self.schedule.is_due(now) {
            return None;
        }

        let mut report = CycleReport::default();
        let mut broken = Vec::new();

        for channel in registry.iter_mut() {
            if channel.connection().is_none() {
                continue;
            }
            let (id, metric) = (channel.id(), channel.metric());

            let value = match metric.read(&mut *sensors) {
                Ok(v) => v,
                Err(e) => {
                    error!("Channel {id}: {metric} read failed: {e:#}");
                    report.skipped += 1;
                    continue;
                }
            };
            let payload = channel.format(value);

            let Some(conn) = channel.connection_mut() else {
                continue;
            };
            match conn.send_event(payload) {
                Ok(()) => report.pushed += 1,
                Err(PushError::Full) => {
                    warn!("Channel {id}: client is behind, event skipped");
                    report.skipped += 1;
                }
                Err(PushError::Disconnected) => broken.push(id),
            }
        }

        for id in broken {
            registry.clear_if_broken(id);
            report.dropped += 1;
        }

        self.schedule.advance(now);
        self.cycles += 1;
        debug!(
            "Push cycle #{}: {} sent, {} dropped, {} skipped",
            self.cycles, report.pushed, report.dropped, report.skipped
        );
        Some(report)
    }
}


// EOF
