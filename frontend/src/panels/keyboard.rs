//! PET keyboard: clickable keys from the keyboard SVG, pressed-key
//! highlighting and text entry played back as a key macro.

use std::cell::RefCell;
use std::rc::Rc;

use shared::schematic::{KEYBOARD_ASSET, KEYBOARD_GROUP_ID, KeyElement};
use shared::{KeyPosition, parse_key_id};
use web_sys::MouseEvent;
use zoon::*;

use crate::dataflow::Relay;
use crate::dom;
use crate::widgets::chrome_button;

#[derive(Debug, Clone, PartialEq)]
pub enum KeyboardInput {
    Submit(String),
    ToggleShiftLock,
    Press(KeyPosition),
}

/// Key elements of the loaded keyboard SVG.
#[derive(Clone, Default)]
pub struct KeyboardSurface {
    keys: Rc<RefCell<Vec<(KeyElement, web_sys::Element)>>>,
    listeners: Rc<RefCell<Vec<dom::Listener>>>,
}

impl KeyboardSurface {
    /// Marks held keys (and the shift lock while engaged) with `pressed`.
    pub fn highlight(&self, keys_down: &[KeyPosition], shift_locked: bool) {
        for (key, element) in self.keys.borrow().iter() {
            let pressed = if key.lock {
                shift_locked
            } else {
                keys_down.contains(&KeyPosition::new(key.row, key.column))
            };
            let _ = element.class_list().toggle_with_force("pressed", pressed);
        }
    }

    fn attach(&self, svg_root: &web_sys::Element, keyboard_input_relay: &Relay<KeyboardInput>) {
        let mut keys = Vec::new();
        let mut listeners = Vec::new();
        let selector = format!("#{KEYBOARD_GROUP_ID} [id^='key_']");
        for element in dom::query_all(svg_root, &selector) {
            let id = element.id();
            let Some(key) = parse_key_id(&id) else {
                log::debug!("skipping key element '{id}'");
                continue;
            };
            let input = if key.lock {
                KeyboardInput::ToggleShiftLock
            } else {
                KeyboardInput::Press(KeyPosition::new(key.row, key.column))
            };
            let relay = keyboard_input_relay.clone();
            listeners.push(dom::listen(&element, "click", move |_: MouseEvent| {
                relay.send(input.clone())
            }));
            let _ = element.set_attribute("cursor", "pointer");
            keys.push((key, element));
        }
        log::debug!("keyboard has {} clickable keys", keys.len());
        *self.keys.borrow_mut() = keys;
        *self.listeners.borrow_mut() = listeners;
    }

    fn detach(&self) {
        self.keys.borrow_mut().clear();
        self.listeners.borrow_mut().clear();
    }
}

pub fn keyboard_panel(
    base_path: &str,
    surface: KeyboardSurface,
    shift_locked: Mutable<bool>,
    keyboard_input_relay: Relay<KeyboardInput>,
) -> impl Element {
    Column::new()
        .s(Width::fill())
        .s(Gap::new().y(6))
        .item(keyboard_image(format!("{base_path}{KEYBOARD_ASSET}"), surface, keyboard_input_relay.clone()))
        .item(
            Row::new()
                .s(Gap::new().x(6))
                .item(text_entry(keyboard_input_relay.clone()))
                .item(chrome_button("Shift lock", shift_locked.signal(), move || {
                    keyboard_input_relay.send(KeyboardInput::ToggleShiftLock)
                })),
        )
}

fn keyboard_image(
    asset: String,
    surface: KeyboardSurface,
    keyboard_input_relay: Relay<KeyboardInput>,
) -> impl Element {
    let on_remove = surface.clone();
    RawHtmlEl::new("div")
        .style("width", "100%")
        .after_insert(move |container| {
            Task::start(async move {
                let markup = match dom::fetch_text(&asset).await {
                    Ok(markup) => markup,
                    Err(err) => {
                        log::error!("failed to load {asset}: {err:?}");
                        return;
                    }
                };
                container.set_inner_html(&markup);
                match container.query_selector("svg").ok().flatten() {
                    Some(svg) => {
                        let _ = svg.set_attribute("width", "100%");
                        surface.attach(&svg, &keyboard_input_relay);
                    }
                    None => log::error!("{asset} contains no <svg> root"),
                }
            });
        })
        .after_remove(move |_| on_remove.detach())
}

fn text_entry(keyboard_input_relay: Relay<KeyboardInput>) -> impl Element {
    let text = Mutable::new(String::new());
    TextInput::new()
        .s(Width::fill())
        .s(Padding::new().x(6).y(3))
        .label_hidden("Keyboard input")
        .placeholder(Placeholder::new("type, then Enter"))
        .text_signal(text.signal_cloned())
        .on_change({
            let text = text.clone();
            move |value| text.set_neq(value)
        })
        .on_key_down_event(move |event| {
            event.if_key(Key::Enter, || {
                let submitted = text.replace(String::new());
                if !submitted.is_empty() {
                    keyboard_input_relay.send(KeyboardInput::Submit(submitted));
                }
            })
        })
}
