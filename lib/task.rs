use crate::display::Dashboard;
use crate::error::{Error, Result};
use crate::hw::{AnalogInput, CharDisplay};
use crate::sampler::Sampler;
use crate::telemetry::{Diagnostics, SharedTelemetry, Snapshot};

/// One period of the sampling task: convert, accumulate, render.
pub struct SamplingTask<A, LCD> {
    sampler: Sampler<A>,
    dashboard: Dashboard<LCD>,
}

impl<A, LCD> SamplingTask<A, LCD>
where
    A: AnalogInput,
    LCD: CharDisplay,
{
    pub fn new(sampler: Sampler<A>, dashboard: Dashboard<LCD>) -> Self {
        SamplingTask { sampler, dashboard }
    }

    /// Runs a single cycle. Failures are logged and counted here, the caller
    /// only has to keep the period going.
    pub fn run_once(
        &mut self,
        telemetry: &SharedTelemetry,
        diagnostics: &Diagnostics,
    ) -> Result<Snapshot> {
        let snapshot = self.sampler.sample(telemetry).map_err(|e| {
            if e == Error::SensorTimeout {
                diagnostics.sensor_timeout();
            }
            defmt::warn!("sample skipped: {}", e);
            e
        })?;

        if let Err(e) = self.dashboard.update(&snapshot) {
            diagnostics.display_error();
            defmt::warn!("dashboard not updated: {}", e);
        }
        defmt::trace!("{}", snapshot);
        Ok(snapshot)
    }

    pub fn dashboard(&self) -> &Dashboard<LCD> {
        &self.dashboard
    }
}
