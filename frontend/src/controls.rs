//! Top bar: run controls, machine and clock-source selectors, panel
//! toggles and the status line.

use shared::{ControlAvailability, ControlCommand, MachineProfile, PanelKind, SessionState};
use zoon::*;

use crate::app::{AppRelays, ViewModel};
use crate::panels::PanelEvent;
use crate::theme;
use crate::widgets::{chrome_button, select_box};

pub fn control_bar<S, H>(
    model: &ViewModel,
    relays: &AppRelays,
    session_state: S,
    hovered_signal: H,
) -> impl Element + use<S, H>
where
    S: Signal<Item = SessionState> + Unpin + 'static,
    H: Signal<Item = Option<String>> + Unpin + 'static,
{
    Row::new()
        .s(Width::fill())
        .s(Gap::new().x(6))
        .s(Padding::new().x(8).y(6))
        .s(Align::new().center_y())
        .s(Background::new().color(theme::BAR_BACKGROUND))
        .item(profile_selector(model, relays))
        .item(control_button("Step instr", ControlCommand::StepInstruction, |c| c.step, model, relays))
        .item(control_button("Step clock", ControlCommand::StepClock, |c| c.step, model, relays))
        .item(control_button("Run", ControlCommand::Run, |c| c.run, model, relays))
        .item(control_button("Pause", ControlCommand::Pause, |c| c.pause, model, relays))
        .item(control_button("Reset", ControlCommand::Reset, |c| c.reset, model, relays))
        .item(clock_source_selector(model, relays))
        .items(PanelKind::ALL.into_iter().map(|kind| panel_toggle(kind, model, relays)))
        .item(status_line(session_state, hovered_signal))
}

fn control_button(
    label: &'static str,
    command: ControlCommand,
    allowed: fn(&ControlAvailability) -> bool,
    model: &ViewModel,
    relays: &AppRelays,
) -> impl Element + use<> {
    let controls = model.controls.clone();
    let relay = relays.control_pressed_relay.clone();
    chrome_button(
        label,
        model.controls.signal().map(move |controls| allowed(&controls)),
        move || {
            if allowed(&controls.get()) {
                relay.send(command);
            }
        },
    )
}

fn profile_selector(model: &ViewModel, relays: &AppRelays) -> impl Element + use<> {
    let relay = relays.profile_selected_relay.clone();
    El::new().child_signal(model.profile.signal().map(move |current| {
        let options = MachineProfile::ALL
            .into_iter()
            .map(|profile| (profile.key().to_string(), profile.label().to_string()))
            .collect();
        let relay = relay.clone();
        select_box(options, current.map(|profile| profile.key().to_string()), move |key| {
            match MachineProfile::from_key(&key) {
                Some(profile) => relay.send(profile),
                None => log::warn!("unknown machine profile '{key}'"),
            }
        })
    }))
}

fn clock_source_selector(model: &ViewModel, relays: &AppRelays) -> impl Element + use<> {
    let relay = relays.clock_signal_selected_relay.clone();
    El::new().child_signal(model.signal_names.signal_cloned().map(move |names| {
        let mut options = vec![(String::new(), "clock source".to_string())];
        options.extend(names.into_iter().map(|name| (name.clone(), name)));
        let relay = relay.clone();
        select_box(options, None, move |name| {
            if !name.is_empty() {
                relay.send(name);
            }
        })
    }))
}

fn panel_toggle(kind: PanelKind, model: &ViewModel, relays: &AppRelays) -> impl Element + use<> {
    let relay = relays.panel_event_relay.clone();
    let open = model
        .panels
        .slot(kind)
        .map(|slot| slot.open.clone())
        .unwrap_or_default();
    chrome_button(kind.title(), open.signal().map(|open| !open), move || {
        let event = if open.get() {
            PanelEvent::Close(kind)
        } else {
            PanelEvent::Open(kind)
        };
        relay.send(event);
    })
}

fn status_line(
    session_state: impl Signal<Item = SessionState> + Unpin + 'static,
    hovered_signal: impl Signal<Item = Option<String>> + Unpin + 'static,
) -> impl Element {
    let text = map_ref! {
        let state = session_state,
        let hovered = hovered_signal => {
            let state = match state {
                SessionState::Idle => "idle",
                SessionState::Running => "running",
                SessionState::Stalled => "stopped",
            };
            match hovered {
                Some(signal) => format!("{state} · {signal}"),
                None => state.to_string(),
            }
        }
    };
    El::new()
        .s(Align::new().right())
        .s(Font::new().color(theme::TEXT_MUTED))
        .child_signal(text.map(Text::new))
}
