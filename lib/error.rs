pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Error {
    // ADC never reported end of conversion
    SensorTimeout,
    // Non-volatile storage failed its boot check
    StoreNotReady,
    // Checkpoint could not be programmed
    StoreWrite,
    // Display driver error
    Display,
    // Buffer
    BufferWrite,
}
