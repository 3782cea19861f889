#[cfg(target_os = "none")]
mod adc;
#[cfg(target_os = "none")]
mod flash;
#[cfg(target_os = "none")]
mod helper;
#[cfg(target_os = "none")]
mod lcd;
#[cfg(target_os = "none")]
mod timers;

#[cfg(target_os = "none")]
pub use flash::{FlashSlot, SlotError};
#[cfg(target_os = "none")]
pub use helper::*;
#[cfg(target_os = "none")]
pub use lcd::IliError;
#[cfg(target_os = "none")]
pub use timers::{CheckpointTicker, SampleTicker};

/// Single-shot analog conversion, 12-bit result.
pub trait AnalogInput {
    fn trigger_conversion(&mut self);
    fn conversion_ready(&self) -> bool;
    fn read_result(&mut self) -> u16;
}

pub trait CharDisplay {
    type Error;
    fn clear(&mut self) -> Result<(), Self::Error>;
    fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), Self::Error>;
    fn write_text(&mut self, text: &[u8]) -> Result<(), Self::Error>;
}

pub trait NvStorage {
    type Error;
    fn initialize(&mut self) -> Result<(), Self::Error>;
    fn write_word(&mut self, address: u32, value: u32) -> Result<(), Self::Error>;
    /// `None` when nothing valid was ever written at `address`.
    fn read_word(&self, address: u32) -> Option<u32>;
}
