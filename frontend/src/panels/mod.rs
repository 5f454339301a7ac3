//! Side panels. Each panel renders only its body; [`dockable_panel`] adds
//! the shared chrome (title bar, close button, resize handle) driven by the
//! session's `PanelSet`.

use std::cell::Cell;
use std::rc::Rc;

use indexmap::IndexMap;
use shared::{PanelKind, PanelSet, PanelSize};
use web_sys::PointerEvent;
use zoon::*;

use crate::app::{AppRelays, ViewModel};
use crate::dataflow::Relay;
use crate::dom;
use crate::theme;

pub mod breakpoints;
pub mod clock;
pub mod cpu;
pub mod details;
pub mod keyboard;
pub mod screen;

pub use breakpoints::BreakpointAction;
pub use keyboard::{KeyboardInput, KeyboardSurface};
pub use screen::ScreenSurface;

const HANDLE_SIZE: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelEvent {
    Open(PanelKind),
    Close(PanelKind),
    Resize(PanelKind, PanelSize),
}

// ===== SLOTS =====

/// Reactive mirror of one `DockablePanel`.
#[derive(Clone)]
pub struct PanelSlot {
    pub open: Mutable<bool>,
    pub size: Mutable<PanelSize>,
}

#[derive(Clone)]
pub struct PanelSlots {
    slots: IndexMap<PanelKind, PanelSlot>,
}

impl Default for PanelSlots {
    fn default() -> Self {
        let slots = PanelKind::ALL
            .into_iter()
            .map(|kind| {
                let slot = PanelSlot {
                    open: Mutable::new(false),
                    size: Mutable::new(kind.default_size()),
                };
                (kind, slot)
            })
            .collect();
        Self { slots }
    }
}

impl PanelSlots {
    pub fn sync(&self, panels: &PanelSet) {
        for (kind, slot) in &self.slots {
            slot.open.set_neq(panels.is_open(*kind));
            if let Some(panel) = panels.get(*kind) {
                slot.size.set_neq(panel.size());
            }
        }
    }

    pub fn slot(&self, kind: PanelKind) -> Option<&PanelSlot> {
        self.slots.get(&kind)
    }
}

// ===== LAYOUT =====

pub fn panel_column(model: &ViewModel, relays: &AppRelays) -> impl Element + use<> {
    Column::new()
        .s(Height::fill())
        .s(Gap::new().y(6))
        .s(Padding::all(6))
        .s(Background::new().color(theme::APP_BACKGROUND))
        .update_raw_el(|raw_el| raw_el.style("overflow-y", "auto"))
        .items(PanelKind::ALL.into_iter().filter_map(|kind| {
            let slot = model.panels.slot(kind)?.clone();
            let model = model.clone();
            let relays = relays.clone();
            Some(El::new().child_signal(slot.open.signal().map(move |open| {
                open.then(|| {
                    dockable_panel(
                        kind,
                        &slot,
                        relays.panel_event_relay.clone(),
                        panel_body(kind, &model, &relays),
                    )
                })
            })))
        }))
}

fn panel_body(kind: PanelKind, model: &ViewModel, relays: &AppRelays) -> RawElOrText {
    match kind {
        PanelKind::Cpu => cpu::cpu_panel(model.cpu.clone()).unify(),
        PanelKind::Clock => clock::clock_panel(model.clock.clone()).unify(),
        PanelKind::Screen => screen::screen_panel(model.screen.clone()).unify(),
        PanelKind::Keyboard => keyboard::keyboard_panel(
            &model.base_path,
            model.keyboard.clone(),
            model.shift_locked.clone(),
            relays.keyboard_input_relay.clone(),
        )
        .unify(),
        PanelKind::SignalDetails => details::details_panel(
            model.details.clone(),
            relays.breakpoint_action_relay.clone(),
        )
        .unify(),
        PanelKind::Breakpoints => breakpoints::breakpoints_panel(
            model.breakpoints.clone(),
            model.signal_names.clone(),
            relays.breakpoint_action_relay.clone(),
        )
        .unify(),
    }
}

// ===== CHROME =====

pub fn dockable_panel<B: Element>(
    kind: PanelKind,
    slot: &PanelSlot,
    panel_event_relay: Relay<PanelEvent>,
    body: B,
) -> impl Element + use<B> {
    Column::new()
        .s(Width::exact_signal(slot.size.signal().map(|size| size.width)))
        .s(Height::exact_signal(slot.size.signal().map(|size| size.height)))
        .s(Background::new().color(theme::PANEL_BACKGROUND))
        .s(Borders::all(Border::new().color(theme::BORDER)))
        .s(RoundedCorners::all(4))
        .update_raw_el(move |raw_el| raw_el.attr("id", kind.element_id()))
        .item(
            Row::new()
                .s(Width::fill())
                .s(Padding::new().x(8).y(4))
                .s(Background::new().color(theme::PANEL_HEADER))
                .s(Font::new().weight(FontWeight::SemiBold))
                .item(El::new().s(Width::fill()).child(Text::new(kind.title())))
                .item(
                    Button::new()
                        .s(Padding::new().x(4))
                        .label(Text::new("✕"))
                        .on_press({
                            let relay = panel_event_relay.clone();
                            move || relay.send(PanelEvent::Close(kind))
                        }),
                ),
        )
        .item(
            El::new()
                .s(Width::fill())
                .s(Height::fill())
                .s(Padding::all(6))
                .update_raw_el(|raw_el| raw_el.style("overflow", "auto").style("min-height", "0"))
                .child(body),
        )
        .item(resize_handle(kind, slot.size.clone(), panel_event_relay))
}

/// Bottom-right grip. Dragging reports the new size; the session clamps it
/// and the slot follows.
fn resize_handle(kind: PanelKind, size: Mutable<PanelSize>, relay: Relay<PanelEvent>) -> impl Element {
    // pointer origin and size when the drag started
    let drag: Rc<Cell<Option<(i32, i32, PanelSize)>>> = Rc::new(Cell::new(None));
    El::new()
        .s(Width::exact(HANDLE_SIZE))
        .s(Height::exact(HANDLE_SIZE))
        .s(Align::new().right())
        .s(Background::new().color(theme::BORDER))
        .update_raw_el(move |raw_el| {
            let target = raw_el.dom_element();
            let pointer_down = dom::listen(&target, "pointerdown", {
                let drag = drag.clone();
                let target = target.clone();
                move |event: PointerEvent| {
                    if event.button() != 0 {
                        return;
                    }
                    let _ = target.set_pointer_capture(event.pointer_id());
                    drag.set(Some((event.client_x(), event.client_y(), size.get())));
                    event.prevent_default();
                }
            });
            let pointer_move = dom::listen(&target, "pointermove", {
                let drag = drag.clone();
                move |event: PointerEvent| {
                    let Some((x, y, start)) = drag.get() else {
                        return;
                    };
                    let width = (start.width as i32 + event.client_x() - x).max(0) as u32;
                    let height = (start.height as i32 + event.client_y() - y).max(0) as u32;
                    relay.send(PanelEvent::Resize(kind, PanelSize::new(width, height)));
                }
            });
            let pointer_up = dom::listen(&target, "pointerup", {
                let target = target.clone();
                move |event: PointerEvent| {
                    drag.set(None);
                    let _ = target.release_pointer_capture(event.pointer_id());
                }
            });
            let listeners = [pointer_down, pointer_move, pointer_up];
            raw_el
                .style("cursor", "nwse-resize")
                .style("touch-action", "none")
                .after_remove(move |_| drop(listeners))
        })
}
