//! SchemViewApp: the browser shell around one simulation [`Session`].
//!
//! UI elements only send into relays. A single actor task owns the session
//! and the simulator handle and reacts to every relay plus the refresh
//! timer, so session state is never shared across tasks.

use std::cell::Cell;
use std::rc::Rc;

use futures::future::{self, FutureExt};
use futures::{StreamExt, select};
use gloo_timers::future::IntervalStream;
use indexmap::IndexSet;
use shared::{
    AppConfig, ClockInfo, ControlAvailability, ControlCommand, CpuInfo, DisplayInfo, KeyPosition,
    MachineProfile, PanelSet, Session, SessionState, SessionUi, SignalDetails, TickOutcome,
};
use zoon::*;

use crate::config::{load_app_config, remember_profile};
use crate::controls::control_bar;
use crate::dataflow::{Actor, Relay, relay};
use crate::dom;
use crate::panels::{
    BreakpointAction, KeyboardInput, KeyboardSurface, PanelEvent, PanelSlots, ScreenSurface,
    panel_column,
};
use crate::schematic_view::{SchematicView, SvgStyles, ViewportEvent};
use crate::simulator_api::DmsSimulator;
use crate::theme;

type BrowserSession = Session<DmsSimulator, BrowserUi>;

// ===== VIEW MODEL =====

/// Everything the element tree reads. Written only by [`BrowserUi`].
#[derive(Clone)]
pub struct ViewModel {
    pub base_path: String,
    pub profile: Mutable<Option<MachineProfile>>,
    pub viewport: Mutable<Option<SchematicView>>,
    pub controls: Mutable<ControlAvailability>,
    pub signal_names: Mutable<Vec<String>>,
    pub panels: PanelSlots,
    pub cpu: Mutable<Option<CpuInfo>>,
    pub clock: Mutable<Option<ClockInfo>>,
    pub details: Mutable<Option<(String, SignalDetails)>>,
    pub breakpoints: Mutable<Vec<String>>,
    pub shift_locked: Mutable<bool>,
    pub screen: ScreenSurface,
    pub keyboard: KeyboardSurface,
}

impl ViewModel {
    fn new(base_path: String) -> Self {
        Self {
            base_path,
            profile: Mutable::new(None),
            viewport: Mutable::new(None),
            controls: Mutable::new(ControlAvailability::DISABLED),
            signal_names: Mutable::new(Vec::new()),
            panels: PanelSlots::default(),
            cpu: Mutable::new(None),
            clock: Mutable::new(None),
            details: Mutable::new(None),
            breakpoints: Mutable::new(Vec::new()),
            shift_locked: Mutable::new(false),
            screen: ScreenSurface::default(),
            keyboard: KeyboardSurface::default(),
        }
    }
}

// ===== RELAYS =====

#[derive(Clone)]
pub struct AppRelays {
    pub viewport_event_relay: Relay<ViewportEvent>,
    pub control_pressed_relay: Relay<ControlCommand>,
    pub profile_selected_relay: Relay<MachineProfile>,
    pub clock_signal_selected_relay: Relay<String>,
    pub panel_event_relay: Relay<PanelEvent>,
    pub keyboard_input_relay: Relay<KeyboardInput>,
    pub breakpoint_action_relay: Relay<BreakpointAction>,
    pub page_hidden_relay: Relay<()>,
}

struct SessionStreams {
    viewport_events: futures::channel::mpsc::UnboundedReceiver<ViewportEvent>,
    control_pressed: futures::channel::mpsc::UnboundedReceiver<ControlCommand>,
    profile_selected: futures::channel::mpsc::UnboundedReceiver<MachineProfile>,
    clock_signal_selected: futures::channel::mpsc::UnboundedReceiver<String>,
    panel_events: futures::channel::mpsc::UnboundedReceiver<PanelEvent>,
    keyboard_input: futures::channel::mpsc::UnboundedReceiver<KeyboardInput>,
    breakpoint_actions: futures::channel::mpsc::UnboundedReceiver<BreakpointAction>,
    page_hidden: futures::channel::mpsc::UnboundedReceiver<()>,
}

fn create_relays() -> (AppRelays, SessionStreams) {
    let (viewport_event_relay, viewport_events) = relay();
    let (control_pressed_relay, control_pressed) = relay();
    let (profile_selected_relay, profile_selected) = relay();
    let (clock_signal_selected_relay, clock_signal_selected) = relay();
    let (panel_event_relay, panel_events) = relay();
    let (keyboard_input_relay, keyboard_input) = relay();
    let (breakpoint_action_relay, breakpoint_actions) = relay();
    let (page_hidden_relay, page_hidden) = relay();
    let relays = AppRelays {
        viewport_event_relay,
        control_pressed_relay,
        profile_selected_relay,
        clock_signal_selected_relay,
        panel_event_relay,
        keyboard_input_relay,
        breakpoint_action_relay,
        page_hidden_relay,
    };
    let streams = SessionStreams {
        viewport_events,
        control_pressed,
        profile_selected,
        clock_signal_selected,
        panel_events,
        keyboard_input,
        breakpoint_actions,
        page_hidden,
    };
    (relays, streams)
}

// ===== SESSION UI =====

/// Session callbacks applied to the view model.
struct BrowserUi {
    model: ViewModel,
    viewport: Option<SchematicView>,
    styles: Option<SvgStyles>,
    // read by the actor loop to start or drop the interval
    timer_active: Rc<Cell<bool>>,
    viewport_event_relay: Relay<ViewportEvent>,
}

impl SessionUi for BrowserUi {
    type Styles = SvgStyles;

    fn active_styles(&mut self) -> Option<&mut SvgStyles> {
        self.styles = self.viewport.as_ref().and_then(SchematicView::active_styles);
        self.styles.as_mut()
    }

    fn build_viewport(&mut self, profile: MachineProfile) {
        let view = SchematicView::new(profile, &self.model.base_path, self.viewport_event_relay.clone());
        self.viewport = Some(view.clone());
        self.model.viewport.set(Some(view));
        self.model.profile.set_neq(Some(profile));
    }

    fn teardown_viewport(&mut self) {
        if let Some(view) = self.viewport.take() {
            view.release();
        }
        self.styles = None;
        self.model.viewport.set(None);
        self.model.profile.set_neq(None);
        self.model.details.set(None);
        self.model.cpu.set(None);
        self.model.clock.set(None);
        self.model.breakpoints.set(Vec::new());
        self.model.signal_names.set(Vec::new());
    }

    fn start_refresh_timer(&mut self) {
        self.timer_active.set(true);
    }

    fn cancel_refresh_timer(&mut self) {
        self.timer_active.set(false);
    }

    fn panels_changed(&mut self, panels: &PanelSet) {
        self.model.panels.sync(panels);
    }

    fn controls_changed(&mut self, controls: ControlAvailability) {
        self.model.controls.set_neq(controls);
    }

    fn signals_listed(&mut self, names: &[String]) {
        self.model.signal_names.set(names.to_vec());
    }

    fn cpu_refreshed(&mut self, cpu: &CpuInfo) {
        self.model.cpu.set(Some(*cpu));
    }

    fn clock_refreshed(&mut self, clock: &ClockInfo) {
        self.model.clock.set(Some(*clock));
    }

    fn screen_refreshed(&mut self, display: DisplayInfo, pixels: &[u8]) {
        self.model.screen.draw(display, pixels);
    }

    fn keyboard_refreshed(&mut self, keys_down: &[KeyPosition], shift_locked: bool) {
        self.model.keyboard.highlight(keys_down, shift_locked);
        self.model.shift_locked.set_neq(shift_locked);
    }

    fn signal_details_changed(&mut self, name: &str, details: &SignalDetails) {
        self.model.details.set(Some((name.to_string(), details.clone())));
    }

    fn breakpoints_changed(&mut self, breakpoints: &IndexSet<String>) {
        self.model.breakpoints.set(breakpoints.iter().cloned().collect());
    }
}

// ===== APP =====

pub struct SchemViewApp {
    model: ViewModel,
    relays: AppRelays,
    session: Actor<SessionState>,
    hovered_signal: Actor<Option<String>>,
    page_hidden_listener: Option<Rc<dom::Listener>>,
}

impl SchemViewApp {
    pub fn new() -> Self {
        let config = load_app_config();
        let model = ViewModel::new(config.assets.base_path.clone());
        let (relays, streams) = create_relays();

        let ui = BrowserUi {
            model: model.clone(),
            viewport: None,
            styles: None,
            timer_active: Rc::new(Cell::new(false)),
            viewport_event_relay: relays.viewport_event_relay.clone(),
        };
        let session = Actor::new(SessionState::Idle, move |state| run_session(config, ui, streams, state));
        let hovered_signal = hovered_signal_actor(&relays.viewport_event_relay);

        let page_hidden_listener = web_sys::window().map(|window| {
            let relay = relays.page_hidden_relay.clone();
            Rc::new(dom::listen(&window, "pagehide", move |_: web_sys::Event| relay.send(())))
        });

        Self {
            model,
            relays,
            session,
            hovered_signal,
            page_hidden_listener,
        }
    }

    pub fn root(&self) -> impl Element + use<> {
        let actors = (
            self.session.clone(),
            self.hovered_signal.clone(),
            self.page_hidden_listener.clone(),
        );
        Column::new()
            .s(Width::fill())
            .s(Height::screen())
            .s(Background::new().color(theme::APP_BACKGROUND))
            .s(Font::new().color(theme::TEXT).size(13))
            .item(control_bar(
                &self.model,
                &self.relays,
                self.session.signal(),
                self.hovered_signal.signal(),
            ))
            .item(
                Row::new()
                    .s(Width::fill())
                    .s(Height::fill())
                    .item(self.schematic_area())
                    .item(panel_column(&self.model, &self.relays)),
            )
            .update_raw_el(move |raw_el| raw_el.after_remove(move |_| drop(actors)))
    }

    fn schematic_area(&self) -> impl Element + use<> {
        El::new()
            .s(Width::fill())
            .s(Height::fill())
            .s(Background::new().color(theme::SHEET_BACKGROUND))
            .child_signal(self.model.viewport.signal_cloned().map(|view| match view {
                Some(view) => view.render().unify(),
                None => El::new()
                    .s(Align::center())
                    .s(Font::new().color(theme::TEXT_MUTED))
                    .child(Text::new("no machine running"))
                    .unify(),
            }))
    }
}

/// Tracks the signal under the pointer for the status line.
fn hovered_signal_actor(viewport_event_relay: &Relay<ViewportEvent>) -> Actor<Option<String>> {
    let mut viewport_events = viewport_event_relay.subscribe();
    Actor::new(None, move |state| async move {
        while let Some(event) = viewport_events.next().await {
            match event {
                ViewportEvent::Hovered(name) => state.set(Some(name)),
                ViewportEvent::Unhovered => state.set(None),
                ViewportEvent::Clicked(_) => {}
            }
        }
    })
}

// ===== SESSION ACTOR =====

async fn run_session(
    mut config: AppConfig,
    ui: BrowserUi,
    mut streams: SessionStreams,
    state: Mutable<SessionState>,
) {
    let timer_active = ui.timer_active.clone();
    let tick_ms = config.session.tick_interval_ms();
    let mut session: BrowserSession = Session::new(config.clone(), DmsSimulator::create, ui);
    let initial_profile = config.session.default_profile;
    launch(&mut session, &mut config, initial_profile);

    let mut interval: Option<IntervalStream> = None;
    loop {
        match (timer_active.get(), interval.is_some()) {
            (true, false) => interval = Some(IntervalStream::new(tick_ms)),
            (false, true) => interval = None,
            _ => {}
        }
        state.set_neq(session.state());

        select! {
            _ = next_tick(&mut interval).fuse() => {
                if matches!(session.tick(), TickOutcome::Stalled) {
                    log::info!("simulation stalled, press Run to resume");
                }
            }
            event = streams.viewport_events.next() => {
                if let Some(event) = event {
                    match event {
                        ViewportEvent::Hovered(signal) => session.hover_signal(&signal),
                        ViewportEvent::Unhovered => session.unhover_signal(),
                        ViewportEvent::Clicked(signal) => session.click_signal(&signal),
                    }
                }
            }
            command = streams.control_pressed.next() => {
                if let Some(command) = command {
                    session.command(command);
                }
            }
            profile = streams.profile_selected.next() => {
                if let Some(profile) = profile {
                    launch(&mut session, &mut config, profile);
                }
            }
            signal = streams.clock_signal_selected.next() => {
                if let Some(signal) = signal {
                    session.select_clock_signal(&signal);
                }
            }
            event = streams.panel_events.next() => {
                match event {
                    Some(PanelEvent::Open(kind)) => session.open_panel(kind),
                    Some(PanelEvent::Close(kind)) => session.close_panel(kind),
                    Some(PanelEvent::Resize(kind, size)) => session.resize_panel(kind, size),
                    None => {}
                }
            }
            input = streams.keyboard_input.next() => {
                match input {
                    Some(KeyboardInput::Submit(text)) => session.submit_keyboard_text(&text),
                    Some(KeyboardInput::ToggleShiftLock) => {
                        let locked = session.toggle_shift_lock();
                        session.ui().model.shift_locked.set_neq(locked);
                    }
                    Some(KeyboardInput::Press(key)) => session.press_key(key),
                    None => {}
                }
            }
            action = streams.breakpoint_actions.next() => {
                match action {
                    Some(BreakpointAction::Add(signal)) => session.add_breakpoint(&signal),
                    Some(BreakpointAction::Remove(signal)) => session.remove_breakpoint(&signal),
                    Some(BreakpointAction::SetOnSelected) => session.break_on_selected_signal(),
                    None => {}
                }
            }
            hidden = streams.page_hidden.next() => {
                if hidden.is_some() {
                    log::info!("page hidden, shutting the simulation down");
                    session.shutdown();
                }
            }
        }
    }
}

fn launch(session: &mut BrowserSession, config: &mut AppConfig, profile: MachineProfile) {
    match session.switch_machine(profile) {
        Ok(()) => {
            log::info!("launched {}", profile.label());
            remember_profile(config, profile);
        }
        Err(err) => log::error!("failed to launch {}: {err}", profile.label()),
    }
}

/// Next refresh tick; never resolves while the timer is off.
async fn next_tick(interval: &mut Option<IntervalStream>) {
    match interval {
        Some(interval) => {
            interval.next().await;
        }
        None => future::pending::<()>().await,
    }
}
