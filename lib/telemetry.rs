// Every access copies the whole Snapshot in or out inside one critical
// section, record() included, so no reader sees a half-applied update.

use core::cell::Cell;

use critical_section::Mutex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, defmt::Format)]
pub struct Snapshot {
    /// Speed derived from the latest sample, 0..=25
    pub speed: u32,
    /// Accumulated distance, never decreases
    pub distance: u32,
    /// Samples recorded since boot
    pub samples: u32,
}

impl Snapshot {
    const EMPTY: Snapshot = Snapshot {
        speed: 0,
        distance: 0,
        samples: 0,
    };
}

pub struct SharedTelemetry {
    state: Mutex<Cell<Snapshot>>,
}

impl SharedTelemetry {
    pub const fn new() -> Self {
        SharedTelemetry {
            state: Mutex::new(Cell::new(Snapshot::EMPTY)),
        }
    }

    /// Restarts the counters from a checkpointed distance.
    pub fn seed(&self, distance: u32) {
        critical_section::with(|cs| {
            self.state.borrow(cs).set(Snapshot {
                distance,
                ..Snapshot::EMPTY
            })
        });
    }

    /// Stores a new speed and adds it to the distance.
    pub fn record(&self, speed: u32) -> Snapshot {
        critical_section::with(|cs| {
            let state = self.state.borrow(cs);
            let previous = state.get();
            let next = Snapshot {
                speed,
                // Saturate rather than wrap, distance must stay monotonic
                distance: previous.distance.saturating_add(speed),
                samples: previous.samples.wrapping_add(1),
            };
            state.set(next);
            next
        })
    }

    pub fn snapshot(&self) -> Snapshot {
        critical_section::with(|cs| self.state.borrow(cs).get())
    }

    pub fn distance(&self) -> u32 {
        self.snapshot().distance
    }
}

impl Default for SharedTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, defmt::Format)]
pub struct Counters {
    pub sensor_timeouts: u32,
    pub display_errors: u32,
    pub checkpoints_requested: u32,
    pub checkpoints_written: u32,
    pub checkpoint_failures: u32,
}

// Observational only, nothing decides on them
pub struct Diagnostics {
    counters: Mutex<Cell<Counters>>,
}

impl Diagnostics {
    pub const fn new() -> Self {
        Diagnostics {
            counters: Mutex::new(Cell::new(Counters {
                sensor_timeouts: 0,
                display_errors: 0,
                checkpoints_requested: 0,
                checkpoints_written: 0,
                checkpoint_failures: 0,
            })),
        }
    }

    pub fn sensor_timeout(&self) {
        self.update(|c| c.sensor_timeouts = c.sensor_timeouts.wrapping_add(1));
    }

    pub fn display_error(&self) {
        self.update(|c| c.display_errors = c.display_errors.wrapping_add(1));
    }

    pub fn checkpoint_requested(&self) {
        self.update(|c| c.checkpoints_requested = c.checkpoints_requested.wrapping_add(1));
    }

    pub fn checkpoint_written(&self) {
        self.update(|c| c.checkpoints_written = c.checkpoints_written.wrapping_add(1));
    }

    pub fn checkpoint_failed(&self) {
        self.update(|c| c.checkpoint_failures = c.checkpoint_failures.wrapping_add(1));
    }

    pub fn counters(&self) -> Counters {
        critical_section::with(|cs| self.counters.borrow(cs).get())
    }

    fn update<F: FnOnce(&mut Counters)>(&self, f: F) {
        critical_section::with(|cs| {
            let cell = self.counters.borrow(cs);
            let mut counters = cell.get();
            f(&mut counters);
            cell.set(counters);
        });
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

pub static TELEMETRY: SharedTelemetry = SharedTelemetry::new();
pub static DIAGNOSTICS: Diagnostics = Diagnostics::new();

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    use crate::checkpoint::{CheckpointTimer, Tick};
    use crate::storage::PendingWrite;

    #[test]
    fn record_accumulates_constant_speed() {
        let telemetry = SharedTelemetry::new();
        telemetry.seed(100);

        for _ in 0..7 {
            telemetry.record(3);
        }

        assert_eq!(
            telemetry.snapshot(),
            Snapshot {
                speed: 3,
                distance: 121,
                samples: 7
            }
        );
    }

    #[test]
    fn seed_resets_speed_and_sample_count() {
        let telemetry = SharedTelemetry::new();
        telemetry.record(20);
        telemetry.seed(42);

        assert_eq!(
            telemetry.snapshot(),
            Snapshot {
                speed: 0,
                distance: 42,
                samples: 0
            }
        );
    }

    #[test]
    fn distance_saturates_instead_of_wrapping() {
        let telemetry = SharedTelemetry::new();
        telemetry.seed(u32::MAX - 10);

        assert_eq!(telemetry.record(25).distance, u32::MAX);
        assert_eq!(telemetry.record(25).distance, u32::MAX);
    }

    #[test]
    fn diagnostics_count_independently() {
        let diagnostics = Diagnostics::new();
        diagnostics.sensor_timeout();
        diagnostics.sensor_timeout();
        diagnostics.checkpoint_written();

        let counters = diagnostics.counters();
        assert_eq!(counters.sensor_timeouts, 2);
        assert_eq!(counters.checkpoints_written, 1);
        assert_eq!(counters.checkpoints_requested, 0);
    }

    // Cheap xorshift so both sides yield at unpredictable points
    fn jitter(state: &mut u32) -> bool {
        *state ^= *state << 13;
        *state ^= *state >> 17;
        *state ^= *state << 5;
        *state % 3 == 0
    }

    #[test]
    fn checkpoint_handler_never_sees_torn_update() {
        const INITIAL: u32 = 1_000;
        const SPEED: u32 = 7;
        const CYCLES: u32 = 20_000;

        static SHARED: SharedTelemetry = SharedTelemetry::new();
        static PENDING: PendingWrite = PendingWrite::new();
        static DONE: AtomicBool = AtomicBool::new(false);

        SHARED.seed(INITIAL);

        let sampler = thread::spawn(|| {
            let mut rng = 0x9E37_79B9;
            for _ in 0..CYCLES {
                SHARED.record(SPEED);
                if jitter(&mut rng) {
                    thread::yield_now();
                }
            }
            DONE.store(true, Ordering::Release);
        });

        let handler = thread::spawn(|| {
            let mut rng = 0x2545_F491;
            let mut timer = CheckpointTimer::new(1);
            let mut last_posted = INITIAL;
            let mut checks = 0u32;
            while !DONE.load(Ordering::Acquire) || checks == 0 {
                let snapshot = SHARED.snapshot();
                assert_eq!(snapshot.distance, INITIAL + snapshot.samples * SPEED);
                let expected_speed = if snapshot.samples == 0 { 0 } else { SPEED };
                assert_eq!(snapshot.speed, expected_speed);

                if let Tick::Requested { distance } = timer.on_tick(&SHARED, &PENDING) {
                    assert_eq!((distance - INITIAL) % SPEED, 0);
                    assert!(distance >= last_posted);
                    last_posted = distance;
                }
                checks += 1;
                if jitter(&mut rng) {
                    thread::yield_now();
                }
            }
        });

        sampler.join().unwrap();
        handler.join().unwrap();

        assert_eq!(SHARED.distance(), INITIAL + CYCLES * SPEED);
    }
}
