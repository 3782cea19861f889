use crate::config::Sampling;
use crate::error::{Error, Result};
use crate::hw::AnalogInput;
use crate::telemetry::{SharedTelemetry, Snapshot};

pub struct Sampler<A> {
    adc: A,
    poll_limit: u32,
}

impl<A> Sampler<A>
where
    A: AnalogInput,
{
    pub fn new(adc: A, poll_limit: u32) -> Self {
        Sampler {
            adc,
            // At least one look at the ready flag
            poll_limit: poll_limit.max(1),
        }
    }

    /// Converts one sample and folds it into the shared counters.
    pub fn sample(&mut self, telemetry: &SharedTelemetry) -> Result<Snapshot> {
        let raw = self.read_raw()?;
        Ok(telemetry.record(to_speed(raw)))
    }

    #[cfg(test)]
    pub(crate) fn adc_mut(&mut self) -> &mut A {
        &mut self.adc
    }

    fn read_raw(&mut self) -> Result<u16> {
        self.adc.trigger_conversion();
        for _ in 0..self.poll_limit {
            if self.adc.conversion_ready() {
                return Ok(self.adc.read_result());
            }
        }
        Err(Error::SensorTimeout)
    }
}

/// Maps a raw conversion onto the 0..=25 speed range, rounding down.
pub fn to_speed(raw: u16) -> u32 {
    let raw = (raw as u32).min(Sampling::RAW_FULL_SCALE);
    raw * Sampling::SPEED_FULL_SCALE / Sampling::RAW_FULL_SCALE
}
