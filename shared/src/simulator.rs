//! Contract with the external circuit simulator.
//!
//! The viewer never computes signal values. Everything it shows comes through
//! the [`Simulator`] trait, implemented by the browser binding in `frontend`
//! and by a recording fake in tests.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::profile::MachineProfile;

// ===== ERRORS =====

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulatorError {
    #[error("no machine has been launched")]
    NotLaunched,
    #[error("malformed `{query}` result: {message}")]
    Malformed { query: &'static str, message: String },
    #[error("simulator rejected `{command}`: {message}")]
    Rejected { command: &'static str, message: String },
}

impl SimulatorError {
    pub fn malformed(query: &'static str, message: impl fmt::Display) -> Self {
        SimulatorError::Malformed {
            query,
            message: message.to_string(),
        }
    }
}

// ===== QUERY RESULTS =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Waiting,
    Running,
    Other,
}

impl RunStatus {
    pub fn from_label(label: &str) -> Self {
        match label {
            "waiting" | "Waiting" => RunStatus::Waiting,
            "running" | "Running" => RunStatus::Running,
            _ => RunStatus::Other,
        }
    }
}

/// Location of one named signal inside the flat signal array.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SignalEntry {
    #[serde(default)]
    pub domain: Option<u32>,
    pub start: usize,
    pub count: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SignalInfo {
    pub count: usize,
    pub names: IndexMap<String, SignalEntry>,
}

impl SignalInfo {
    /// Known signal names in alphabetical order.
    pub fn sorted_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.keys().cloned().collect();
        names.sort();
        names
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SignalDetails {
    pub value: bool,
    #[serde(default)]
    pub writer_name: Option<String>,
}

impl SignalDetails {
    pub fn writer_label(&self) -> &str {
        match self.writer_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "—",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuInfo {
    pub reg_a: u8,
    pub reg_x: u8,
    pub reg_y: u8,
    pub reg_sp: u8,
    pub reg_ir: u8,
    pub reg_pc: u16,
    pub reg_p: u8,
}

impl CpuInfo {
    const FLAG_NAMES: [char; 8] = ['N', 'V', '-', 'B', 'D', 'I', 'Z', 'C'];

    /// `(label, hex, decimal)` rows for the register table.
    pub fn register_rows(&self) -> Vec<(&'static str, String, String)> {
        let byte = |label, value: u8| (label, format!("${value:02x}"), value.to_string());
        vec![
            byte("A", self.reg_a),
            byte("X", self.reg_x),
            byte("Y", self.reg_y),
            byte("SP", self.reg_sp),
            ("PC", format!("${:04x}", self.reg_pc), self.reg_pc.to_string()),
            byte("IR", self.reg_ir),
            byte("P", self.reg_p),
        ]
    }

    /// Status register bits, most significant first.
    pub fn flags(&self) -> [(char, bool); 8] {
        let mut flags = [(' ', false); 8];
        for (bit, name) in Self::FLAG_NAMES.iter().enumerate() {
            flags[bit] = (*name, self.reg_p & (0x80 >> bit) != 0);
        }
        flags
    }
}

/// Simulation tick split into two 32-bit words.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WideTick {
    pub low: u32,
    pub high: u32,
}

impl WideTick {
    pub fn as_u64(self) -> u64 {
        (u64::from(self.high) << 32) | u64::from(self.low)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct ClockInfo {
    #[serde(rename = "current_tick_lo")]
    pub tick_low: u32,
    #[serde(rename = "current_tick_hi")]
    pub tick_high: u32,
    pub time_elapsed_ns: f64,
}

impl ClockInfo {
    pub fn current_tick(&self) -> WideTick {
        WideTick {
            low: self.tick_low,
            high: self.tick_high,
        }
    }

    pub fn elapsed(&self) -> ElapsedTime {
        ElapsedTime(self.time_elapsed_ns.max(0.0))
    }
}

/// Simulated time in nanoseconds, displayed with a scaled unit.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ElapsedTime(pub f64);

impl ElapsedTime {
    fn seconds(self) -> f64 {
        self.0 / 1_000_000_000.0
    }
}

impl fmt::Display for ElapsedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = self.seconds();
        if seconds >= 1.0 {
            write!(f, "{:.3}s", seconds)
        } else if seconds >= 0.001 {
            write!(f, "{:.3}ms", self.0 / 1_000_000.0)
        } else if seconds >= 0.000001 {
            write!(f, "{:.3}μs", self.0 / 1_000.0)
        } else {
            write!(f, "{}ns", self.0.round())
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayInfo {
    pub width: u32,
    pub height: u32,
}

impl DisplayInfo {
    /// Expected RGBA buffer length.
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPosition {
    pub row: u8,
    pub column: u8,
}

impl KeyPosition {
    pub const fn new(row: u8, column: u8) -> Self {
        Self { row, column }
    }
}

// ===== CONTROLS =====

/// Which run controls are usable for a given run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlAvailability {
    pub step: bool,
    pub run: bool,
    pub pause: bool,
    pub reset: bool,
}

impl ControlAvailability {
    pub const DISABLED: ControlAvailability = ControlAvailability {
        step: false,
        run: false,
        pause: false,
        reset: false,
    };

    pub fn for_status(status: RunStatus) -> Self {
        match status {
            RunStatus::Waiting => ControlAvailability {
                step: true,
                run: true,
                pause: false,
                reset: true,
            },
            RunStatus::Running => ControlAvailability {
                step: false,
                run: false,
                pause: true,
                reset: true,
            },
            RunStatus::Other => ControlAvailability {
                reset: true,
                ..Self::DISABLED
            },
        }
    }
}

// ===== SIMULATOR TRAIT =====

/// One simulator instance. Creating the value creates the session and
/// dropping it destroys the session.
pub trait Simulator {
    fn launch(&mut self, profile: MachineProfile) -> Result<(), SimulatorError>;
    fn stop(&mut self);

    /// Runs one scheduling quantum; `false` when nothing was executed.
    fn execute_quantum(&mut self) -> bool;
    fn step_instruction(&mut self);
    fn step_clock(&mut self);
    fn select_clock_signal(&mut self, name: &str);
    fn run(&mut self);
    fn pause(&mut self);
    fn reset(&mut self);
    fn status(&self) -> Result<RunStatus, SimulatorError>;

    fn signal_info(&self) -> Result<SignalInfo, SimulatorError>;
    /// One 0/1 byte per signal index.
    fn signal_data(&self, domain: Option<u32>) -> Result<Vec<u8>, SimulatorError>;
    fn signal_details(&self, name: &str) -> Result<SignalDetails, SimulatorError>;
    fn cpu_info(&self) -> Result<CpuInfo, SimulatorError>;
    fn clock_info(&self) -> Result<ClockInfo, SimulatorError>;

    fn display_info(&self) -> Result<DisplayInfo, SimulatorError>;
    fn display_data(&self) -> Result<Vec<u8>, SimulatorError>;

    fn breakpoint_signal_set(&mut self, name: &str);
    fn breakpoint_signal_clear(&mut self, name: &str);
    fn breakpoint_signal_list(&self) -> Result<IndexSet<String>, SimulatorError>;

    fn keys_down(&self) -> Result<Vec<KeyPosition>, SimulatorError>;
    fn key_pressed(&mut self, key: KeyPosition);
    fn num_keys_down(&self) -> Result<usize, SimulatorError>;
    fn set_dwell_time(&mut self, dwell_ms: u32);
}
