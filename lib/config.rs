pub struct Sampling;

impl Sampling {
    pub const PERIOD_MS: u32 = 1_000;
    // Ready-flag polls before a conversion counts as lost
    pub const POLL_LIMIT: u32 = 10_000;
    // 12-bit ADC
    pub const RAW_FULL_SCALE: u32 = 4_095;
    pub const SPEED_FULL_SCALE: u32 = 25;
}

pub struct Checkpoint;

impl Checkpoint {
    pub const TICK_MS: u32 = 1_000;
    pub const THRESHOLD_TICKS: u32 = 60;
}

pub struct Slot;

impl Slot {
    // Last 2 KiB page of the 128 KiB flash
    pub const ADDRESS: u32 = 0x0801_F800;
    pub const DEFAULT: u32 = 0;
}
