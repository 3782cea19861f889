use core::cell::Cell;
use core::time::Duration;
use std::collections::BTreeMap;
use std::println;
use std::string::String;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::vec;
use std::vec::Vec;

use crate::boot;
use crate::checkpoint::{CheckpointTimer, Tick};
use crate::config::{Checkpoint, Sampling, Slot};
use crate::display::Dashboard;
use crate::error::Result;
use crate::hw::{AnalogInput, CharDisplay, NvStorage};
use crate::sampler::Sampler;
use crate::storage::{PendingWrite, PersistentStore};
use crate::task::SamplingTask;
use crate::telemetry::{Counters, Diagnostics, SharedTelemetry, Snapshot};

pub struct SimAdc {
    readings: Vec<u16>,
    next: usize,
    // Ready-flag polls before a conversion completes
    latency: u32,
    polls: Cell<u32>,
    triggered: bool,
    stuck: bool,
}

impl SimAdc {
    fn new(readings: Vec<u16>, latency: u32, stuck: bool) -> Self {
        SimAdc {
            readings,
            next: 0,
            latency,
            polls: Cell::new(0),
            triggered: false,
            stuck,
        }
    }

    pub fn constant(raw: u16) -> Self {
        SimAdc::new(vec![raw], 0, false)
    }

    pub fn slow(raw: u16, latency: u32) -> Self {
        SimAdc::new(vec![raw], latency, false)
    }

    pub fn stuck() -> Self {
        SimAdc::new(vec![0], 0, true)
    }

    // Triangle wave over the whole input range
    pub fn sweep() -> Self {
        SimAdc::new(sweep_points(), 2, false)
    }

    pub fn unstick(&mut self, raw: u16) {
        self.readings = vec![raw];
        self.next = 0;
        self.stuck = false;
    }
}

pub(crate) fn sweep_points() -> Vec<u16> {
    let up = (0..=15u16).map(|step| step * 273);
    let down = (1..15u16).rev().map(|step| step * 273);
    up.chain(down).collect()
}

impl AnalogInput for SimAdc {
    fn trigger_conversion(&mut self) {
        self.triggered = true;
        self.polls.set(0);
    }

    fn conversion_ready(&self) -> bool {
        if !self.triggered || self.stuck {
            return false;
        }
        let polls = self.polls.get();
        self.polls.set(polls + 1);
        polls >= self.latency
    }

    fn read_result(&mut self) -> u16 {
        let raw = self.readings[self.next % self.readings.len()];
        self.next += 1;
        self.triggered = false;
        raw
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelError {
    OutOfBounds,
    WriteFailed,
}

const PANEL_ROWS: usize = 4;
const PANEL_COLS: usize = 24;

pub struct TextPanel {
    cells: [[u8; PANEL_COLS]; PANEL_ROWS],
    cursor: (usize, usize),
    writes: usize,
    fail_writes: bool,
}

impl TextPanel {
    pub const ROWS: usize = PANEL_ROWS;
    pub const COLS: usize = PANEL_COLS;

    pub fn new() -> Self {
        TextPanel {
            cells: [[b' '; TextPanel::COLS]; TextPanel::ROWS],
            cursor: (0, 0),
            writes: 0,
            fail_writes: false,
        }
    }

    pub fn row(&self, row: usize) -> String {
        String::from_utf8_lossy(&self.cells[row]).into_owned()
    }

    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn print(&self) {
        for row in 0..TextPanel::ROWS {
            println!("|{}|", self.row(row));
        }
        println!();
    }
}

impl Default for TextPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl CharDisplay for TextPanel {
    type Error = PanelError;

    fn clear(&mut self) -> core::result::Result<(), PanelError> {
        self.cells = [[b' '; TextPanel::COLS]; TextPanel::ROWS];
        self.cursor = (0, 0);
        Ok(())
    }

    fn set_cursor(&mut self, row: u8, col: u8) -> core::result::Result<(), PanelError> {
        let (row, col) = (row as usize, col as usize);
        if row >= TextPanel::ROWS || col >= TextPanel::COLS {
            return Err(PanelError::OutOfBounds);
        }
        self.cursor = (row, col);
        Ok(())
    }

    fn write_text(&mut self, text: &[u8]) -> core::result::Result<(), PanelError> {
        if self.fail_writes {
            return Err(PanelError::WriteFailed);
        }
        let (row, col) = self.cursor;
        let end = col + text.len();
        if end > TextPanel::COLS {
            return Err(PanelError::OutOfBounds);
        }
        self.cells[row][col..end].copy_from_slice(text);
        self.cursor = (row, end);
        self.writes += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamError {
    NotReady,
    WriteFailed,
}

pub struct RamSlot {
    words: BTreeMap<u32, u32>,
    ready: bool,
    fail_writes: bool,
    writes: u32,
}

impl RamSlot {
    pub fn blank() -> Self {
        RamSlot {
            words: BTreeMap::new(),
            ready: true,
            fail_writes: false,
            writes: 0,
        }
    }

    pub fn with_word(address: u32, value: u32) -> Self {
        let mut slot = RamSlot::blank();
        slot.words.insert(address, value);
        slot
    }

    pub fn not_ready() -> Self {
        RamSlot {
            ready: false,
            ..RamSlot::blank()
        }
    }

    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn writes(&self) -> u32 {
        self.writes
    }
}

impl NvStorage for RamSlot {
    type Error = RamError;

    fn initialize(&mut self) -> core::result::Result<(), RamError> {
        if self.ready {
            Ok(())
        } else {
            Err(RamError::NotReady)
        }
    }

    fn write_word(&mut self, address: u32, value: u32) -> core::result::Result<(), RamError> {
        if self.fail_writes {
            return Err(RamError::WriteFailed);
        }
        self.words.insert(address, value);
        self.writes += 1;
        Ok(())
    }

    fn read_word(&self, address: u32) -> Option<u32> {
        self.words.get(&address).copied()
    }
}

pub struct SimConfig {
    pub sample_period: Duration,
    pub tick: Duration,
    pub cycles: u32,
    pub threshold: u32,
    pub echo: bool,
}

impl Default for SimConfig {
    // Ten times faster than the board
    fn default() -> Self {
        SimConfig {
            sample_period: Duration::from_millis(Sampling::PERIOD_MS as u64 / 10),
            tick: Duration::from_millis(Checkpoint::TICK_MS as u64 / 10),
            cycles: 600,
            threshold: Checkpoint::THRESHOLD_TICKS,
            echo: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub snapshot: Snapshot,
    pub stored: u32,
    pub counters: Counters,
}

pub fn run(
    config: &SimConfig,
    slot: RamSlot,
    telemetry: &SharedTelemetry,
    pending: &PendingWrite,
    diagnostics: &Diagnostics,
) -> Result<Summary> {
    let mut store = PersistentStore::new(slot, Slot::ADDRESS);
    boot::run(&mut store, telemetry, |distance| {
        if config.echo {
            println!("resuming at {}", distance);
        }
    })?;

    let dashboard = Dashboard::new(TextPanel::new())?;
    let sampler = Sampler::new(SimAdc::sweep(), Sampling::POLL_LIMIT);
    let mut task = SamplingTask::new(sampler, dashboard);
    let running = AtomicBool::new(true);

    thread::scope(|scope| {
        // Plays the ticker interrupt
        scope.spawn(|| {
            let mut timer = CheckpointTimer::new(config.threshold);
            while running.load(Ordering::Acquire) {
                thread::sleep(config.tick);
                if let Tick::Requested { .. } = timer.on_tick(telemetry, pending) {
                    diagnostics.checkpoint_requested();
                }
            }
        });

        // Sampling and persisting share a priority on the board, so one thread here
        for _ in 0..config.cycles {
            task.run_once(telemetry, diagnostics).ok();
            store.flush(pending, diagnostics).ok();
            if config.echo {
                task.dashboard().lcd().print();
            }
            thread::sleep(config.sample_period);
        }
        running.store(false, Ordering::Release);
    });

    // The ticker may have posted after the last cycle
    store.flush(pending, diagnostics).ok();

    Ok(Summary {
        snapshot: telemetry.snapshot(),
        stored: store.read(),
        counters: diagnostics.counters(),
    })
}
