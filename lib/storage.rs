use core::cell::Cell;

use critical_section::Mutex;

use crate::config::Slot;
use crate::error::{Error, Result};
use crate::hw::NvStorage;
use crate::telemetry::Diagnostics;

/// One-slot mailbox holding the newest checkpoint that still has to be written.
pub struct PendingWrite {
    value: Mutex<Cell<Option<u32>>>,
}

impl PendingWrite {
    pub const fn new() -> Self {
        PendingWrite {
            value: Mutex::new(Cell::new(None)),
        }
    }

    // Callable from interrupt context
    pub fn request(&self, value: u32) -> Option<u32> {
        critical_section::with(|cs| self.value.borrow(cs).replace(Some(value)))
    }

    pub fn take(&self) -> Option<u32> {
        critical_section::with(|cs| self.value.borrow(cs).take())
    }
}

impl Default for PendingWrite {
    fn default() -> Self {
        Self::new()
    }
}

pub static PENDING_WRITE: PendingWrite = PendingWrite::new();

const ERASED: u32 = 0xFFFF_FFFF;

// Value in the low word, complement in the high one
pub fn encode_slot(value: u32) -> u64 {
    (u64::from(!value) << 32) | u64::from(value)
}

pub fn decode_slot(low: u32, high: u32) -> Option<u32> {
    if low == ERASED && high == ERASED {
        return None;
    }
    if high != !low {
        defmt::warn!("torn checkpoint {=u32:#x}/{=u32:#x}", low, high);
        return None;
    }
    Some(low)
}

pub struct PersistentStore<S> {
    driver: S,
    address: u32,
}

impl<S> PersistentStore<S>
where
    S: NvStorage,
{
    pub fn new(driver: S, address: u32) -> Self {
        PersistentStore { driver, address }
    }

    pub fn initialize(&mut self) -> Result<()> {
        self.driver.initialize().map_err(|_| {
            defmt::error!("storage at {=u32:#x} failed to initialize", self.address);
            Error::StoreNotReady
        })
    }

    /// Last completed checkpoint, or [`Slot::DEFAULT`] for a slot never written.
    pub fn read(&self) -> u32 {
        self.driver.read_word(self.address).unwrap_or(Slot::DEFAULT)
    }

    /// Writes the newest pending request, if any. Runs in task context only.
    pub fn flush(
        &mut self,
        pending: &PendingWrite,
        diagnostics: &Diagnostics,
    ) -> Result<Option<u32>> {
        let value = match pending.take() {
            Some(value) => value,
            None => return Ok(None),
        };

        if self.driver.read_word(self.address) == Some(value) {
            defmt::debug!("checkpoint {=u32} already stored", value);
            return Ok(Some(value));
        }

        match self.driver.write_word(self.address, value) {
            Ok(()) => {
                diagnostics.checkpoint_written();
                defmt::info!("checkpoint {=u32} stored", value);
                Ok(Some(value))
            }
            Err(_) => {
                diagnostics.checkpoint_failed();
                defmt::warn!("checkpoint {=u32} could not be stored", value);
                Err(Error::StoreWrite)
            }
        }
    }

    pub fn driver(&self) -> &S {
        &self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::sim::RamSlot;

    const ADDRESS: u32 = Slot::ADDRESS;

    #[test]
    fn blank_slot_reads_default() {
        let store = PersistentStore::new(RamSlot::blank(), ADDRESS);
        assert_eq!(store.read(), 0);
    }

    #[test]
    fn request_then_flush_round_trips() {
        let mut store = PersistentStore::new(RamSlot::blank(), ADDRESS);
        let pending = PendingWrite::new();
        let diagnostics = Diagnostics::new();

        pending.request(1234);
        assert_eq!(store.flush(&pending, &diagnostics), Ok(Some(1234)));

        assert_eq!(store.read(), 1234);
        assert_eq!(diagnostics.counters().checkpoints_written, 1);
    }

    #[test]
    fn flush_without_request_leaves_slot_alone() {
        let mut store = PersistentStore::new(RamSlot::with_word(ADDRESS, 9), ADDRESS);
        let diagnostics = Diagnostics::new();

        assert_eq!(store.flush(&PendingWrite::new(), &diagnostics), Ok(None));
        assert_eq!(store.read(), 9);
        assert_eq!(store.driver().writes(), 0);
    }

    #[test]
    fn unchanged_distance_is_not_rewritten() {
        let mut store = PersistentStore::new(RamSlot::with_word(ADDRESS, 77), ADDRESS);
        let pending = PendingWrite::new();
        let diagnostics = Diagnostics::new();

        pending.request(77);
        assert_eq!(store.flush(&pending, &diagnostics), Ok(Some(77)));
        assert_eq!(store.driver().writes(), 0);
    }

    #[test]
    fn only_newest_request_is_written() {
        let mut store = PersistentStore::new(RamSlot::blank(), ADDRESS);
        let pending = PendingWrite::new();
        let diagnostics = Diagnostics::new();

        assert_eq!(pending.request(10), None);
        assert_eq!(pending.request(20), Some(10));
        store.flush(&pending, &diagnostics).unwrap();

        assert_eq!(store.read(), 20);
        assert_eq!(store.driver().writes(), 1);
    }

    #[test]
    fn failed_write_is_reported_and_counted() {
        let mut slot = RamSlot::blank();
        slot.fail_writes(true);
        let mut store = PersistentStore::new(slot, ADDRESS);
        let pending = PendingWrite::new();
        let diagnostics = Diagnostics::new();

        pending.request(5);
        assert_eq!(store.flush(&pending, &diagnostics), Err(Error::StoreWrite));
        assert_eq!(store.read(), 0);
        assert_eq!(diagnostics.counters().checkpoint_failures, 1);
        // Best effort: the failed value is not retried
        assert_eq!(pending.take(), None);
    }

    fn split(word: u64) -> (u32, u32) {
        (word as u32, (word >> 32) as u32)
    }

    #[test]
    fn erased_slot_decodes_as_blank() {
        assert_eq!(decode_slot(0xFFFF_FFFF, 0xFFFF_FFFF), None);
    }

    #[test]
    fn torn_pair_decodes_as_blank() {
        let (low, high) = split(encode_slot(1234));
        // Low word programmed, high word still erased
        assert_eq!(decode_slot(low, 0xFFFF_FFFF), None);
        // High word left over from an older checkpoint
        assert_eq!(decode_slot(low, !1233), None);
        assert_eq!(decode_slot(low ^ 0x10, high), None);
    }

    #[test]
    fn valid_pairs_decode_to_their_value() {
        for value in [0, 1, 1234, 0x7FFF_FFFF, 0xFFFF_FFFE, 0xFFFF_FFFF] {
            let (low, high) = split(encode_slot(value));
            assert_eq!(low, value);
            assert_eq!(high, !value);
            assert_eq!(decode_slot(low, high), Some(value), "value {:#x}", value);
        }
    }

    #[test]
    fn initialize_failure_maps_to_not_ready() {
        let mut store = PersistentStore::new(RamSlot::not_ready(), ADDRESS);
        assert_eq!(store.initialize(), Err(Error::StoreNotReady));
    }
}
