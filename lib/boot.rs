use crate::error::Result;
use crate::hw::NvStorage;
use crate::storage::PersistentStore;
use crate::telemetry::SharedTelemetry;

/// Seeds `telemetry` from the last checkpoint and hands over to `schedule`.
///
/// `schedule` runs only on success. An uninitialized store returns the error
/// without scheduling anything; the firmware halts on it rather than count on
/// storage it could not verify.
pub fn run<S, F>(store: &mut PersistentStore<S>, telemetry: &SharedTelemetry, schedule: F) -> Result<u32>
where
    S: NvStorage,
    F: FnOnce(u32),
{
    store.initialize()?;

    let distance = store.read();
    telemetry.seed(distance);
    defmt::info!("restored distance {=u32}", distance);

    schedule(distance);
    Ok(distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::Slot;
    use crate::error::Error;
    use crate::sim::RamSlot;

    #[test]
    fn blank_store_starts_from_zero() {
        let telemetry = SharedTelemetry::new();
        telemetry.record(9);
        let mut store = PersistentStore::new(RamSlot::blank(), Slot::ADDRESS);
        let mut scheduled = None;

        assert_eq!(run(&mut store, &telemetry, |d| scheduled = Some(d)), Ok(0));
        assert_eq!(telemetry.distance(), 0);
        assert_eq!(scheduled, Some(0));
    }

    #[test]
    fn checkpoint_is_restored() {
        let telemetry = SharedTelemetry::new();
        let mut store = PersistentStore::new(RamSlot::with_word(Slot::ADDRESS, 4321), Slot::ADDRESS);
        let mut scheduled = None;

        assert_eq!(run(&mut store, &telemetry, |d| scheduled = Some(d)), Ok(4321));
        assert_eq!(telemetry.distance(), 4321);
        assert_eq!(scheduled, Some(4321));
    }

    #[test]
    fn storage_failure_never_schedules() {
        let telemetry = SharedTelemetry::new();
        let mut store = PersistentStore::new(RamSlot::not_ready(), Slot::ADDRESS);
        let mut scheduled = false;

        assert_eq!(
            run(&mut store, &telemetry, |_| scheduled = true),
            Err(Error::StoreNotReady)
        );
        assert!(!scheduled);
        assert_eq!(telemetry.distance(), 0);
    }
}
