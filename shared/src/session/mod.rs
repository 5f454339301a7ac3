//! Session orchestrator.
//!
//! One [`Session`] owns the simulator instance, the render binding, the
//! panels and the refresh bookkeeping for the machine currently on screen.
//! The browser side implements [`SessionUi`] and feeds user events and
//! refresh ticks in; everything here runs to completion per call.

use indexmap::IndexSet;
use thiserror::Error;

use crate::config::AppConfig;
use crate::keyboard::KeyboardMacroPlayer;
use crate::panel::{PanelKind, PanelSet, PanelSize};
use crate::profile::MachineProfile;
use crate::render_binding::{SignalPalette, SignalRenderBinding, StyleScope};
use crate::simulator::{
    ClockInfo, ControlAvailability, CpuInfo, DisplayInfo, KeyPosition, SignalDetails, Simulator,
    SimulatorError, WideTick,
};

#[cfg(test)]
mod tests;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to launch {profile}: {source}")]
    Launch {
        profile: MachineProfile,
        #[source]
        source: SimulatorError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No machine constructed.
    Idle,
    /// Refresh timer active.
    Running,
    /// Timer suspended after the clock stopped advancing.
    Stalled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshState {
    pub timer_active: bool,
    pub last_tick: Option<WideTick>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    StepInstruction,
    StepClock,
    Run,
    Pause,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running; nothing was asked of the simulator.
    Inactive,
    /// The quantum did no work; displays were left alone.
    NoWork,
    Refreshed,
    /// Displays were refreshed and the clock did not move, timer cancelled.
    Stalled,
}

/// Browser-side effects driven by the session.
pub trait SessionUi {
    type Styles: StyleScope;

    /// Root style scope of the active sheet document, if one is shown.
    fn active_styles(&mut self) -> Option<&mut Self::Styles>;
    fn build_viewport(&mut self, profile: MachineProfile);
    fn teardown_viewport(&mut self);

    fn start_refresh_timer(&mut self);
    fn cancel_refresh_timer(&mut self);

    fn panels_changed(&mut self, panels: &PanelSet);
    fn controls_changed(&mut self, controls: ControlAvailability);
    fn signals_listed(&mut self, names: &[String]);

    fn cpu_refreshed(&mut self, cpu: &CpuInfo);
    fn clock_refreshed(&mut self, clock: &ClockInfo);
    fn screen_refreshed(&mut self, display: DisplayInfo, pixels: &[u8]);
    fn keyboard_refreshed(&mut self, keys_down: &[KeyPosition], shift_locked: bool);

    fn signal_details_changed(&mut self, name: &str, details: &SignalDetails);
    fn breakpoints_changed(&mut self, breakpoints: &IndexSet<String>);
}

struct Machine<S> {
    profile: MachineProfile,
    simulator: S,
    binding: SignalRenderBinding,
    panels: PanelSet,
    keyboard: KeyboardMacroPlayer,
    selected_signal: Option<String>,
    controls: Option<ControlAvailability>,
}

pub struct Session<S: Simulator, U: SessionUi> {
    launcher: Box<dyn FnMut() -> S>,
    ui: U,
    config: AppConfig,
    machine: Option<Machine<S>>,
    state: SessionState,
    refresh: RefreshState,
}

impl<S: Simulator, U: SessionUi> Session<S, U> {
    pub fn new(config: AppConfig, launcher: impl FnMut() -> S + 'static, ui: U) -> Self {
        Self {
            launcher: Box::new(launcher),
            ui,
            config,
            machine: None,
            state: SessionState::Idle,
            refresh: RefreshState::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn refresh_state(&self) -> RefreshState {
        self.refresh
    }

    pub fn profile(&self) -> Option<MachineProfile> {
        self.machine.as_ref().map(|machine| machine.profile)
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    pub fn simulator(&self) -> Option<&S> {
        self.machine.as_ref().map(|machine| &machine.simulator)
    }

    pub fn binding(&self) -> Option<&SignalRenderBinding> {
        self.machine.as_ref().map(|machine| &machine.binding)
    }

    pub fn panels(&self) -> Option<&PanelSet> {
        self.machine.as_ref().map(|machine| &machine.panels)
    }

    // ===== MACHINE LIFECYCLE =====

    /// Tears down the current machine, if any, and launches `profile`.
    pub fn switch_machine(&mut self, profile: MachineProfile) -> Result<(), SessionError> {
        self.teardown();
        log::info!("launching {profile}");

        let mut simulator = (self.launcher)();
        let launch_error = |source| SessionError::Launch { profile, source };
        simulator.launch(profile).map_err(launch_error)?;
        let info = simulator.signal_info().map_err(launch_error)?;
        let palette = SignalPalette::from_colors(&self.config.colors);
        let binding = SignalRenderBinding::from_info(&info, palette);
        simulator.set_dwell_time(self.config.keyboard.dwell_ms);

        let machine = Machine {
            profile,
            simulator,
            binding,
            panels: PanelSet::startup(),
            keyboard: KeyboardMacroPlayer::new(self.config.keyboard.key_spacing_ticks),
            selected_signal: None,
            controls: None,
        };
        self.ui.build_viewport(profile);
        self.ui.panels_changed(&machine.panels);
        self.ui.signals_listed(&info.sorted_names());
        match machine.simulator.breakpoint_signal_list() {
            Ok(breakpoints) => self.ui.breakpoints_changed(&breakpoints),
            Err(err) => log::warn!("breakpoint list unavailable: {err}"),
        }
        self.machine = Some(machine);

        self.refresh = RefreshState::default();
        self.activate();
        self.update_controls();
        Ok(())
    }

    /// Stops the timer and the simulator. The session returns to `Idle`.
    pub fn shutdown(&mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        let Some(mut machine) = self.machine.take() else {
            return;
        };
        log::info!("tearing down {}", machine.profile);
        if self.refresh.timer_active {
            self.ui.cancel_refresh_timer();
        }
        machine.panels.close_all();
        self.ui.panels_changed(&machine.panels);
        self.ui.teardown_viewport();
        machine.simulator.stop();
        drop(machine);
        self.refresh = RefreshState::default();
        self.state = SessionState::Idle;
    }

    /// Enters `Running`, restarting the timer if it was suspended.
    fn activate(&mut self) {
        if self.machine.is_none() {
            return;
        }
        if !self.refresh.timer_active {
            self.refresh.timer_active = true;
            self.refresh.last_tick = None;
            self.ui.start_refresh_timer();
        }
        self.state = SessionState::Running;
    }

    fn suspend(&mut self) {
        if self.refresh.timer_active {
            self.refresh.timer_active = false;
            self.ui.cancel_refresh_timer();
        }
        self.state = SessionState::Stalled;
    }

    // ===== COMMANDS =====

    pub fn command(&mut self, command: ControlCommand) {
        let Some(machine) = self.machine.as_mut() else {
            log::warn!("{command:?} ignored, no machine launched");
            return;
        };
        let simulator = &mut machine.simulator;
        match command {
            ControlCommand::StepInstruction => simulator.step_instruction(),
            ControlCommand::StepClock => simulator.step_clock(),
            ControlCommand::Run => simulator.run(),
            ControlCommand::Pause => simulator.pause(),
            ControlCommand::Reset => simulator.reset(),
        }
        // pause is observed by the stall detector instead
        if command != ControlCommand::Pause {
            self.activate();
        }
        self.update_controls();
    }

    pub fn select_clock_signal(&mut self, name: &str) {
        if let Some(machine) = self.machine.as_mut() {
            machine.simulator.select_clock_signal(name);
        }
    }

    fn update_controls(&mut self) {
        let Some(machine) = self.machine.as_mut() else {
            return;
        };
        let controls = match machine.simulator.status() {
            Ok(status) => ControlAvailability::for_status(status),
            Err(err) => {
                log::warn!("run status unavailable: {err}");
                ControlAvailability::DISABLED
            }
        };
        if machine.controls != Some(controls) {
            machine.controls = Some(controls);
            self.ui.controls_changed(controls);
        }
    }

    // ===== REFRESH =====

    /// One refresh timer tick.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != SessionState::Running {
            return TickOutcome::Inactive;
        }
        let Some(machine) = self.machine.as_mut() else {
            return TickOutcome::Inactive;
        };
        if !machine.simulator.execute_quantum() {
            self.update_controls();
            return TickOutcome::NoWork;
        }

        let ui = &mut self.ui;
        if let Err(err) = machine.binding.refresh(&machine.simulator, ui.active_styles()) {
            log::warn!("signal refresh skipped: {err}");
        }

        if machine.panels.is_open(PanelKind::Cpu) {
            match machine.simulator.cpu_info() {
                Ok(cpu) => ui.cpu_refreshed(&cpu),
                Err(err) => log::warn!("cpu refresh skipped: {err}"),
            }
        }

        let mut stalled = false;
        match machine.simulator.clock_info() {
            Ok(clock) => {
                if machine.panels.is_open(PanelKind::Clock) {
                    ui.clock_refreshed(&clock);
                }
                let tick = clock.current_tick();
                stalled = self.refresh.last_tick == Some(tick);
                self.refresh.last_tick = Some(tick);
            }
            Err(err) => log::warn!("clock refresh skipped: {err}"),
        }

        if machine.panels.is_open(PanelKind::Screen) {
            refresh_screen(&machine.simulator, ui);
        }

        machine.keyboard.tick(&mut machine.simulator);
        if machine.panels.is_open(PanelKind::Keyboard) {
            match machine.simulator.keys_down() {
                Ok(keys) => ui.keyboard_refreshed(&keys, machine.keyboard.shift_locked()),
                Err(err) => log::warn!("keyboard refresh skipped: {err}"),
            }
        }

        self.update_controls();
        if stalled {
            log::debug!("clock stopped advancing, suspending refresh");
            self.suspend();
            return TickOutcome::Stalled;
        }
        TickOutcome::Refreshed
    }

    // ===== VIEWPORT EVENTS =====

    pub fn hover_signal(&mut self, signal: &str) {
        if let Some(machine) = self.machine.as_mut() {
            machine.binding.hover(signal, self.ui.active_styles());
        }
    }

    pub fn unhover_signal(&mut self) {
        if let Some(machine) = self.machine.as_mut() {
            machine.binding.unhover(self.ui.active_styles());
        }
    }

    pub fn click_signal(&mut self, signal: &str) {
        let Some(machine) = self.machine.as_mut() else {
            return;
        };
        let details = match machine.simulator.signal_details(signal) {
            Ok(details) => details,
            Err(err) => {
                log::warn!("no details for '{signal}': {err}");
                return;
            }
        };
        machine.selected_signal = Some(signal.to_string());
        if machine.panels.open(PanelKind::SignalDetails) {
            self.ui.panels_changed(&machine.panels);
        }
        self.ui.signal_details_changed(signal, &details);
    }

    // ===== BREAKPOINTS =====

    /// Sets a breakpoint on the signal shown in the details panel.
    pub fn break_on_selected_signal(&mut self) {
        let Some(name) = self
            .machine
            .as_ref()
            .and_then(|machine| machine.selected_signal.clone())
        else {
            return;
        };
        self.add_breakpoint(&name);
    }

    pub fn add_breakpoint(&mut self, signal: &str) {
        if let Some(machine) = self.machine.as_mut() {
            machine.simulator.breakpoint_signal_set(signal);
            self.refresh_breakpoints();
        }
    }

    pub fn remove_breakpoint(&mut self, signal: &str) {
        if let Some(machine) = self.machine.as_mut() {
            machine.simulator.breakpoint_signal_clear(signal);
            self.refresh_breakpoints();
        }
    }

    fn refresh_breakpoints(&mut self) {
        let Some(machine) = self.machine.as_ref() else {
            return;
        };
        match machine.simulator.breakpoint_signal_list() {
            Ok(breakpoints) => self.ui.breakpoints_changed(&breakpoints),
            Err(err) => log::warn!("breakpoint list unavailable: {err}"),
        }
    }

    // ===== KEYBOARD =====

    pub fn submit_keyboard_text(&mut self, text: &str) {
        if let Some(machine) = self.machine.as_mut() {
            machine.keyboard.submit(text);
        }
    }

    pub fn toggle_shift_lock(&mut self) -> bool {
        self.machine
            .as_mut()
            .is_some_and(|machine| machine.keyboard.toggle_shift_lock())
    }

    pub fn press_key(&mut self, key: KeyPosition) {
        if let Some(machine) = self.machine.as_mut() {
            machine.simulator.key_pressed(key);
        }
    }

    // ===== PANELS =====

    pub fn open_panel(&mut self, kind: PanelKind) {
        if let Some(machine) = self.machine.as_mut() {
            if machine.panels.open(kind) {
                self.ui.panels_changed(&machine.panels);
            }
        }
    }

    pub fn close_panel(&mut self, kind: PanelKind) {
        if let Some(machine) = self.machine.as_mut() {
            if machine.panels.close(kind) {
                self.ui.panels_changed(&machine.panels);
            }
        }
    }

    pub fn resize_panel(&mut self, kind: PanelKind, size: PanelSize) {
        if let Some(machine) = self.machine.as_mut() {
            if machine.panels.resize(kind, size).is_some() {
                self.ui.panels_changed(&machine.panels);
            }
        }
    }
}

fn refresh_screen(simulator: &impl Simulator, ui: &mut impl SessionUi) {
    let display = match simulator.display_info() {
        Ok(display) => display,
        Err(err) => {
            log::warn!("screen refresh skipped: {err}");
            return;
        }
    };
    match simulator.display_data() {
        Ok(pixels) if pixels.len() == display.frame_len() => ui.screen_refreshed(display, &pixels),
        Ok(pixels) => log::warn!(
            "screen buffer has {} bytes, expected {} for {}x{}",
            pixels.len(),
            display.frame_len(),
            display.width,
            display.height
        ),
        Err(err) => log::warn!("screen refresh skipped: {err}"),
    }
}
