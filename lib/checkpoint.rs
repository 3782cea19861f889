use crate::storage::PendingWrite;
use crate::telemetry::SharedTelemetry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Tick {
    // Threshold not reached yet
    Waiting { elapsed: u32 },
    // Distance handed to the store, elapsed counter back at zero
    Requested { distance: u32 },
}

/// Body of the checkpoint interrupt. Never blocks, flash work happens later.
pub struct CheckpointTimer {
    elapsed: u32,
    threshold: u32,
}

impl CheckpointTimer {
    pub const fn new(threshold: u32) -> Self {
        CheckpointTimer {
            elapsed: 0,
            threshold,
        }
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn on_tick(&mut self, telemetry: &SharedTelemetry, pending: &PendingWrite) -> Tick {
        self.elapsed = self.elapsed.saturating_add(1);
        if self.elapsed < self.threshold {
            return Tick::Waiting {
                elapsed: self.elapsed,
            };
        }

        let distance = telemetry.distance();
        if let Some(stale) = pending.request(distance) {
            defmt::debug!("checkpoint {=u32} superseded before it was written", stale);
        }
        self.elapsed = 0;
        Tick::Requested { distance }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_once_threshold_is_reached() {
        let telemetry = SharedTelemetry::new();
        let pending = PendingWrite::new();
        let mut timer = CheckpointTimer::new(60);
        telemetry.seed(500);

        for tick in 1..60 {
            assert_eq!(
                timer.on_tick(&telemetry, &pending),
                Tick::Waiting { elapsed: tick }
            );
        }
        assert_eq!(pending.take(), None);

        assert_eq!(
            timer.on_tick(&telemetry, &pending),
            Tick::Requested { distance: 500 }
        );
        assert_eq!(timer.elapsed(), 0);
        assert_eq!(pending.take(), Some(500));
    }

    #[test]
    fn elapsed_restarts_after_each_request() {
        let telemetry = SharedTelemetry::new();
        let pending = PendingWrite::new();
        let mut timer = CheckpointTimer::new(3);
        let mut requested = 0;

        for _ in 0..9 {
            telemetry.record(2);
            if let Tick::Requested { distance } = timer.on_tick(&telemetry, &pending) {
                requested += 1;
                assert_eq!(distance, telemetry.distance());
            }
            assert!(timer.elapsed() < 3);
        }

        assert_eq!(requested, 3);
        assert_eq!(pending.take(), Some(18));
    }

    #[test]
    fn unwritten_request_is_replaced_by_newer_distance() {
        let telemetry = SharedTelemetry::new();
        let pending = PendingWrite::new();
        let mut timer = CheckpointTimer::new(1);

        telemetry.record(10);
        timer.on_tick(&telemetry, &pending);
        telemetry.record(10);
        timer.on_tick(&telemetry, &pending);

        assert_eq!(pending.take(), Some(20));
        assert_eq!(pending.take(), None);
    }
}
