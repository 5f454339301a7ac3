//! Recording fakes for the simulator and the browser side.

use indexmap::{IndexMap, IndexSet};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::panel::{PanelKind, PanelSet};
use crate::profile::MachineProfile;
use crate::render_binding::StyleScope;
use crate::session::SessionUi;
use crate::simulator::{
    ClockInfo, ControlAvailability, CpuInfo, DisplayInfo, KeyPosition, RunStatus, SignalDetails,
    SignalEntry, SignalInfo, Simulator, SimulatorError, WideTick,
};

pub type Journal = Rc<RefCell<Vec<String>>>;

pub fn signal_info(signals: &[(&str, usize, usize)], count: usize) -> SignalInfo {
    SignalInfo {
        count,
        names: signals
            .iter()
            .map(|(name, start, width)| {
                (
                    name.to_string(),
                    SignalEntry {
                        domain: None,
                        start: *start,
                        count: *width,
                    },
                )
            })
            .collect(),
    }
}

pub struct FakeSimulator {
    /// Lifecycle and command log shared across instances.
    pub journal: Journal,
    pub launched: Option<MachineProfile>,
    pub reject_launch: bool,
    pub signal_info: SignalInfo,
    pub signals_by_profile: Vec<(MachineProfile, SignalInfo)>,
    pub signal_values: Vec<u8>,
    /// Values for an explicit domain; other domains read `signal_values`.
    pub domain_values: IndexMap<u32, Vec<u8>>,
    pub signal_data_reads: Cell<usize>,
    /// Queries that answer with a malformed-result error.
    pub failing_queries: Vec<&'static str>,
    pub details: IndexMap<String, SignalDetails>,
    pub performs_work: bool,
    pub clock_advances: bool,
    pub tick: WideTick,
    pub status: RunStatus,
    pub cpu: CpuInfo,
    pub display: DisplayInfo,
    pub display_pixels: Vec<u8>,
    pub breakpoints: IndexSet<String>,
    pub pressed_keys: Vec<KeyPosition>,
    pub keys_held: Vec<(KeyPosition, u32)>,
    pub key_hold_ticks: u32,
    pub dwell_ms: Option<u32>,
    pub clock_signal: Option<String>,
}

impl Default for FakeSimulator {
    fn default() -> Self {
        Self {
            journal: Journal::default(),
            launched: None,
            reject_launch: false,
            signal_info: SignalInfo::default(),
            signals_by_profile: Vec::new(),
            signal_values: Vec::new(),
            domain_values: IndexMap::new(),
            signal_data_reads: Cell::new(0),
            failing_queries: Vec::new(),
            details: IndexMap::new(),
            performs_work: true,
            clock_advances: true,
            tick: WideTick::default(),
            status: RunStatus::Waiting,
            cpu: CpuInfo::default(),
            display: DisplayInfo { width: 2, height: 2 },
            display_pixels: vec![0; 16],
            breakpoints: IndexSet::new(),
            pressed_keys: Vec::new(),
            keys_held: Vec::new(),
            key_hold_ticks: 1,
            dwell_ms: None,
            clock_signal: None,
        }
    }
}

impl FakeSimulator {
    pub fn with_signals(signals: &[(&str, usize, usize)], count: usize) -> Self {
        let mut simulator = Self::default();
        simulator.signal_info = signal_info(signals, count);
        simulator.signal_values = vec![0; count];
        simulator
    }

    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }

    fn query(&self, query: &'static str) -> Result<(), SimulatorError> {
        if self.failing_queries.contains(&query) {
            return Err(SimulatorError::malformed(query, "injected failure"));
        }
        Ok(())
    }

    fn record(&self, entry: impl Into<String>) {
        self.journal.borrow_mut().push(entry.into());
    }

    /// Counts down held keys by one tick and releases expired ones.
    pub fn release_aged_keys(&mut self) {
        for (_, remaining) in &mut self.keys_held {
            *remaining = remaining.saturating_sub(1);
        }
        self.keys_held.retain(|(_, remaining)| *remaining > 0);
    }
}

impl Drop for FakeSimulator {
    fn drop(&mut self) {
        self.record("destroy");
    }
}

impl Simulator for FakeSimulator {
    fn launch(&mut self, profile: MachineProfile) -> Result<(), SimulatorError> {
        self.record(format!("launch {}", profile.launch_id()));
        if self.reject_launch {
            return Err(SimulatorError::Rejected {
                command: "launch",
                message: "unknown machine".to_string(),
            });
        }
        if let Some((_, info)) = self.signals_by_profile.iter().find(|(p, _)| *p == profile) {
            self.signal_info = info.clone();
            self.signal_values = vec![0; info.count];
        }
        self.launched = Some(profile);
        Ok(())
    }

    fn stop(&mut self) {
        self.record("stop");
    }

    fn execute_quantum(&mut self) -> bool {
        self.release_aged_keys();
        if self.performs_work && self.clock_advances {
            self.tick.low = self.tick.low.wrapping_add(1);
        }
        self.performs_work
    }

    fn step_instruction(&mut self) {
        self.record("step_instruction");
    }

    fn step_clock(&mut self) {
        self.record("step_clock");
    }

    fn select_clock_signal(&mut self, name: &str) {
        self.clock_signal = Some(name.to_string());
    }

    fn run(&mut self) {
        self.record("run");
        self.status = RunStatus::Running;
    }

    fn pause(&mut self) {
        self.record("pause");
        self.status = RunStatus::Waiting;
    }

    fn reset(&mut self) {
        self.record("reset");
    }

    fn status(&self) -> Result<RunStatus, SimulatorError> {
        Ok(self.status)
    }

    fn signal_info(&self) -> Result<SignalInfo, SimulatorError> {
        Ok(self.signal_info.clone())
    }

    fn signal_data(&self, domain: Option<u32>) -> Result<Vec<u8>, SimulatorError> {
        self.signal_data_reads.set(self.signal_data_reads.get() + 1);
        self.query("signal_data")?;
        let values = domain
            .and_then(|domain| self.domain_values.get(&domain))
            .unwrap_or(&self.signal_values);
        Ok(values.clone())
    }

    fn signal_details(&self, name: &str) -> Result<SignalDetails, SimulatorError> {
        self.details
            .get(name)
            .cloned()
            .ok_or_else(|| SimulatorError::malformed("signal_details", format!("unknown signal {name}")))
    }

    fn cpu_info(&self) -> Result<CpuInfo, SimulatorError> {
        self.query("cpu_info")?;
        Ok(self.cpu)
    }

    fn clock_info(&self) -> Result<ClockInfo, SimulatorError> {
        self.query("clock_info")?;
        Ok(ClockInfo {
            tick_low: self.tick.low,
            tick_high: self.tick.high,
            time_elapsed_ns: f64::from(self.tick.low) * 1000.0,
        })
    }

    fn display_info(&self) -> Result<DisplayInfo, SimulatorError> {
        self.query("display_info")?;
        Ok(self.display)
    }

    fn display_data(&self) -> Result<Vec<u8>, SimulatorError> {
        Ok(self.display_pixels.clone())
    }

    fn breakpoint_signal_set(&mut self, name: &str) {
        self.breakpoints.insert(name.to_string());
    }

    fn breakpoint_signal_clear(&mut self, name: &str) {
        self.breakpoints.shift_remove(name);
    }

    fn breakpoint_signal_list(&self) -> Result<IndexSet<String>, SimulatorError> {
        Ok(self.breakpoints.clone())
    }

    fn keys_down(&self) -> Result<Vec<KeyPosition>, SimulatorError> {
        self.query("keys_down")?;
        Ok(self.keys_held.iter().map(|(key, _)| *key).collect())
    }

    fn key_pressed(&mut self, key: KeyPosition) {
        self.pressed_keys.push(key);
        self.keys_held.push((key, self.key_hold_ticks));
    }

    fn num_keys_down(&self) -> Result<usize, SimulatorError> {
        Ok(self.keys_held.len())
    }

    fn set_dwell_time(&mut self, dwell_ms: u32) {
        self.dwell_ms = Some(dwell_ms);
    }
}

#[derive(Debug, Default)]
pub struct RecordingStyles {
    pub properties: IndexMap<String, String>,
    pub clears: usize,
}

impl RecordingStyles {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

impl StyleScope for RecordingStyles {
    fn set_property(&mut self, name: &str, value: &str) {
        self.properties.insert(name.to_string(), value.to_string());
    }

    fn clear_all(&mut self) {
        self.properties.clear();
        self.clears += 1;
    }
}

#[derive(Debug, Default)]
pub struct RecordingUi {
    /// Call order of every effect.
    pub calls: Vec<&'static str>,
    /// Present while a viewport is built.
    pub styles: Option<RecordingStyles>,
    pub viewport: Option<MachineProfile>,
    pub timer_running: bool,
    pub open_panels: Vec<PanelKind>,
    pub controls: Option<ControlAvailability>,
    pub signal_names: Vec<String>,
    pub last_cpu: Option<CpuInfo>,
    pub last_clock: Option<ClockInfo>,
    pub screen_frames: usize,
    pub keys_down: Vec<KeyPosition>,
    pub details: Option<(String, SignalDetails)>,
    pub breakpoints: Vec<String>,
}

impl RecordingUi {
    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }
}

impl SessionUi for RecordingUi {
    type Styles = RecordingStyles;

    fn active_styles(&mut self) -> Option<&mut RecordingStyles> {
        // asked for only when signal colours are about to be written
        self.calls.push("signals");
        self.styles.as_mut()
    }

    fn build_viewport(&mut self, profile: MachineProfile) {
        self.calls.push("build_viewport");
        self.viewport = Some(profile);
        self.styles = Some(RecordingStyles::default());
    }

    fn teardown_viewport(&mut self) {
        self.calls.push("teardown_viewport");
        self.viewport = None;
        self.styles = None;
    }

    fn start_refresh_timer(&mut self) {
        self.calls.push("start_timer");
        self.timer_running = true;
    }

    fn cancel_refresh_timer(&mut self) {
        self.calls.push("cancel_timer");
        self.timer_running = false;
    }

    fn panels_changed(&mut self, panels: &PanelSet) {
        self.calls.push("panels");
        self.open_panels = panels.open_panels().map(|panel| panel.kind()).collect();
    }

    fn controls_changed(&mut self, controls: ControlAvailability) {
        self.calls.push("controls");
        self.controls = Some(controls);
    }

    fn signals_listed(&mut self, names: &[String]) {
        self.signal_names = names.to_vec();
    }

    fn cpu_refreshed(&mut self, cpu: &CpuInfo) {
        self.calls.push("cpu");
        self.last_cpu = Some(*cpu);
    }

    fn clock_refreshed(&mut self, clock: &ClockInfo) {
        self.calls.push("clock");
        self.last_clock = Some(*clock);
    }

    fn screen_refreshed(&mut self, _display: DisplayInfo, _pixels: &[u8]) {
        self.calls.push("screen");
        self.screen_frames += 1;
    }

    fn keyboard_refreshed(&mut self, keys_down: &[KeyPosition], _shift_locked: bool) {
        self.calls.push("keyboard");
        self.keys_down = keys_down.to_vec();
    }

    fn signal_details_changed(&mut self, name: &str, details: &SignalDetails) {
        self.calls.push("details");
        self.details = Some((name.to_string(), details.clone()));
    }

    fn breakpoints_changed(&mut self, breakpoints: &IndexSet<String>) {
        self.calls.push("breakpoints");
        self.breakpoints = breakpoints.iter().cloned().collect();
    }
}
