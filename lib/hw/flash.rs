use core::ptr;

use stm32g0xx_hal::flash::{Error as FlashError, FlashExt, FlashPage, UnlockedFlash, WriteErase};
use stm32g0xx_hal::stm32::FLASH;

use crate::hw::NvStorage;
use crate::storage::{decode_slot, encode_slot};

const FLASH_BASE: u32 = 0x0800_0000;
const PAGE_SIZE: u32 = 2048;

#[derive(Debug)]
pub enum SlotError {
    Locked,
    Flash(FlashError),
}

enum State {
    Locked(FLASH),
    Unlocked(UnlockedFlash),
    // Only seen while a state transition is in flight
    Gone,
}

/// Checkpoint slot in internal flash, one double word per value.
pub struct FlashSlot {
    state: State,
}

impl FlashSlot {
    pub fn new(flash: FLASH) -> Self {
        FlashSlot {
            state: State::Locked(flash),
        }
    }
}

impl NvStorage for FlashSlot {
    type Error = SlotError;

    fn initialize(&mut self) -> Result<(), SlotError> {
        match core::mem::replace(&mut self.state, State::Gone) {
            State::Locked(flash) => match flash.unlock() {
                Ok(unlocked) => {
                    self.state = State::Unlocked(unlocked);
                    Ok(())
                }
                Err(flash) => {
                    self.state = State::Locked(flash);
                    Err(SlotError::Locked)
                }
            },
            State::Unlocked(unlocked) => {
                self.state = State::Unlocked(unlocked);
                Ok(())
            }
            State::Gone => Err(SlotError::Locked),
        }
    }

    fn write_word(&mut self, address: u32, value: u32) -> Result<(), SlotError> {
        let flash = match &mut self.state {
            State::Unlocked(flash) => flash,
            _ => return Err(SlotError::Locked),
        };
        let page = FlashPage(((address - FLASH_BASE) / PAGE_SIZE) as usize);
        flash.erase_page(page).map_err(SlotError::Flash)?;
        flash
            .write_native(address as usize, &[encode_slot(value)])
            .map_err(SlotError::Flash)
    }

    fn read_word(&self, address: u32) -> Option<u32> {
        // Flash is memory mapped, no controller involvement needed for reads
        let (low, high) = unsafe {
            (
                ptr::read_volatile(address as *const u32),
                ptr::read_volatile((address + 4) as *const u32),
            )
        };
        decode_slot(low, high)
    }
}
