#![no_std]

use core::sync::atomic::{AtomicUsize, Ordering};

use defmt_rtt as _; // global logger
#[cfg(target_os = "none")]
use panic_probe as _;

#[cfg(not(target_os = "none"))]
extern crate std;

pub mod boot;
pub mod checkpoint;
pub mod config;
pub mod display;
pub mod error;
pub mod hw;
pub mod sampler;
#[cfg(not(target_os = "none"))]
pub mod sim;
pub mod storage;
pub mod task;
pub mod telemetry;

static COUNT: AtomicUsize = AtomicUsize::new(0);
defmt::timestamp!("{=usize}", {
    let n = COUNT.load(Ordering::Relaxed);
    COUNT.store(n + 1, Ordering::Relaxed);
    n
});

/// Parks the core for good. Nothing runs after this, not even interrupts.
#[cfg(target_os = "none")]
pub fn halt() -> ! {
    cortex_m::interrupt::disable();
    loop {
        cortex_m::asm::wfi();
    }
}
