use stm32g0xx_hal::rcc::Rcc;
use stm32g0xx_hal::stm32::{TIM6, TIM7};
use stm32g0xx_hal::time::MicroSecond;
use stm32g0xx_hal::timer::{Timer, TimerExt};

/// Drives the sampling task, one interrupt per period.
pub struct SampleTicker {
    timer: Timer<TIM6>,
    period: MicroSecond,
}

impl SampleTicker {
    pub fn new(pac_tim: TIM6, period: MicroSecond, rcc: &mut Rcc) -> Self {
        SampleTicker {
            timer: pac_tim.timer(rcc),
            period,
        }
    }

    pub fn start(&mut self) {
        self.timer.clear_irq();
        self.timer.listen();
        self.timer.start(self.period);
    }

    pub fn unpend(&mut self) {
        self.timer.clear_irq();
    }
}

/// Clock source of the elapsed-seconds counter.
pub struct CheckpointTicker {
    timer: Timer<TIM7>,
    tick: MicroSecond,
}

impl CheckpointTicker {
    pub fn new(pac_tim: TIM7, tick: MicroSecond, rcc: &mut Rcc) -> Self {
        CheckpointTicker {
            timer: pac_tim.timer(rcc),
            tick,
        }
    }

    pub fn start(&mut self) {
        self.timer.clear_irq();
        self.timer.listen();
        self.timer.start(self.tick);
    }

    /// Must run before anything else in the handler.
    pub fn unpend(&mut self) {
        self.timer.clear_irq();
    }
}
