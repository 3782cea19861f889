#![cfg_attr(target_os = "none", no_main)]
#![cfg_attr(target_os = "none", no_std)]

use lib as _;

/// On a desktop the same library runs against simulated peripherals.
#[cfg(not(target_os = "none"))]
fn main() {
    use lib::sim::{self, RamSlot, SimConfig};
    use lib::storage::PENDING_WRITE;
    use lib::telemetry::{DIAGNOSTICS, TELEMETRY};

    let config = SimConfig::default();
    match sim::run(&config, RamSlot::blank(), &TELEMETRY, &PENDING_WRITE, &DIAGNOSTICS) {
        Ok(summary) => println!("{:?}", summary),
        Err(e) => {
            eprintln!("halted: {:?}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(target_os = "none")]
#[rtic::app(device = stm32g0xx_hal::stm32, peripherals = true, dispatchers = [USART1])]
mod app {
    use lib::boot;
    use lib::checkpoint::{CheckpointTimer, Tick};
    use lib::config::{Checkpoint, Sampling, Slot};
    use lib::display::Dashboard;
    use lib::hw::{
        init_clock, init_lcd, Adc, CheckpointTicker, FlashSlot, HwLcd, LcdInterface, SampleTicker,
    };
    use lib::sampler::Sampler;
    use lib::storage::{PersistentStore, PENDING_WRITE};
    use lib::task::SamplingTask;
    use lib::telemetry::{DIAGNOSTICS, TELEMETRY};
    use stm32g0xx_hal::gpio::{GpioExt, Speed};
    use stm32g0xx_hal::time::ExtU32;
    use stm32g0xx_hal::timer::delay::DelayExt;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        task: SamplingTask<Adc, HwLcd>,
        sample_ticker: SampleTicker,
        checkpoint: CheckpointTimer,
        checkpoint_ticker: CheckpointTicker,
        store: PersistentStore<FlashSlot>,
    }

    #[init]
    fn init(cx: init::Context) -> (Shared, Local, init::Monotonics) {
        let core = cx.core;
        let device = cx.device;

        // Clock
        let mut rcc = init_clock(device.RCC);
        let mut delay = core.SYST.delay(&mut rcc);

        // GPIO
        let gpioa = device.GPIOA.split(&mut rcc);
        let gpiob = device.GPIOB.split(&mut rcc);

        // LCD
        let interface = LcdInterface::new(
            gpiob.pb0.into_push_pull_output().set_speed(Speed::VeryHigh),
            gpiob.pb1.into_push_pull_output().set_speed(Speed::VeryHigh),
            gpiob.pb2.into_push_pull_output().set_speed(Speed::VeryHigh),
            gpiob.pb3.into_push_pull_output().set_speed(Speed::VeryHigh),
            gpiob.pb4.into_push_pull_output().set_speed(Speed::VeryHigh),
            gpiob.pb5.into_push_pull_output().set_speed(Speed::VeryHigh),
            gpiob.pb6.into_push_pull_output().set_speed(Speed::VeryHigh),
            gpiob.pb7.into_push_pull_output().set_speed(Speed::VeryHigh),
            gpiob.pb8.into_push_pull_output().set_speed(Speed::VeryHigh),
            gpiob.pb9.into_push_pull_output().set_speed(Speed::VeryHigh),
        );
        let lcd = init_lcd(
            interface,
            gpioa.pa4.into_push_pull_output(),
            gpioa.pa5.into_push_pull_output(),
            &mut delay,
        )
        .unwrap();
        let dashboard = Dashboard::new(lcd).unwrap();

        // ADC
        let adc = Adc::new(device.ADC, gpioa.pa0, &mut rcc, &mut delay);
        let task = SamplingTask::new(Sampler::new(adc, Sampling::POLL_LIMIT), dashboard);

        // Timers
        let mut sample_ticker =
            SampleTicker::new(device.TIM6, Sampling::PERIOD_MS.millis(), &mut rcc);
        let mut checkpoint_ticker =
            CheckpointTicker::new(device.TIM7, Checkpoint::TICK_MS.millis(), &mut rcc);

        // Storage, nothing is started unless the slot checks out
        let mut store = PersistentStore::new(FlashSlot::new(device.FLASH), Slot::ADDRESS);
        let recovered = boot::run(&mut store, &TELEMETRY, |_| {
            checkpoint_ticker.start();
            sample_ticker.start();
        });
        if recovered.is_err() {
            defmt::error!("storage unusable, halting");
            lib::halt();
        }

        (
            Shared {},
            Local {
                task,
                sample_ticker,
                checkpoint: CheckpointTimer::new(Checkpoint::THRESHOLD_TICKS),
                checkpoint_ticker,
                store,
            },
            init::Monotonics(),
        )
    }

    #[idle]
    fn idle(_: idle::Context) -> ! {
        loop {
            cortex_m::asm::wfi();
        }
    }

    #[task(binds = TIM6, priority = 1, local = [sample_ticker, task])]
    fn tim6(cx: tim6::Context) {
        cx.local.sample_ticker.unpend();
        // Failures are already logged and counted
        cx.local.task.run_once(&TELEMETRY, &DIAGNOSTICS).ok();
    }

    #[task(binds = TIM7, priority = 2, local = [checkpoint_ticker, checkpoint])]
    fn tim7(cx: tim7::Context) {
        cx.local.checkpoint_ticker.unpend();

        let tick = cx.local.checkpoint.on_tick(&TELEMETRY, &PENDING_WRITE);
        if let Tick::Requested { distance } = tick {
            DIAGNOSTICS.checkpoint_requested();
            defmt::debug!("checkpoint {=u32} requested", distance);
            // Already queued means the newer value is picked up by that run
            persist::spawn().ok();
        }
    }

    #[task(priority = 1, local = [store])]
    fn persist(cx: persist::Context) {
        if let Ok(Some(_)) = cx.local.store.flush(&PENDING_WRITE, &DIAGNOSTICS) {
            defmt::info!("{}", DIAGNOSTICS.counters());
        }
    }
}
