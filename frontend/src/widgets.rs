use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use web_sys::HtmlSelectElement;
use zoon::*;

use crate::dom;
use crate::theme;

/// Flat chrome button; `enabled` only drives the look, callers guard the
/// action themselves.
pub fn chrome_button(
    label: impl Into<String>,
    enabled: impl Signal<Item = bool> + Unpin + 'static,
    on_press: impl FnMut() + 'static,
) -> impl Element {
    let enabled = enabled.broadcast();
    Button::new()
        .s(Padding::new().x(10).y(4))
        .s(RoundedCorners::all(3))
        .s(Background::new().color_signal(enabled.signal().map(|enabled| {
            if enabled {
                theme::BUTTON_BACKGROUND
            } else {
                theme::PANEL_BACKGROUND
            }
        })))
        .s(Font::new().color_signal(enabled.signal().map(|enabled| {
            if enabled { theme::TEXT } else { theme::TEXT_MUTED }
        })))
        .label(Text::new(label.into()))
        .on_press(on_press)
}

/// Native `<select>`; `on_change` receives the chosen option value.
pub fn select_box(
    options: Vec<(String, String)>,
    selected: Option<String>,
    mut on_change: impl FnMut(String) + 'static,
) -> RawHtmlEl<web_sys::HtmlElement> {
    let listener: Rc<RefCell<Option<dom::Listener>>> = Rc::default();
    RawHtmlEl::new("select")
        .style("background-color", theme::BUTTON_BACKGROUND)
        .style("color", theme::TEXT)
        .style("border", &format!("1px solid {}", theme::BORDER))
        .style("padding", "3px 6px")
        .children(options.into_iter().map(move |(value, label)| {
            let option = RawHtmlEl::new("option")
                .attr("value", &value)
                .child(Text::new(label));
            if selected.as_deref() == Some(value.as_str()) {
                option.attr("selected", "selected")
            } else {
                option
            }
        }))
        .after_insert({
            let listener = listener.clone();
            move |element| {
                let change = dom::listen(&element, "change", move |event: web_sys::Event| {
                    let Some(select) = event.target() else {
                        return;
                    };
                    on_change(select.unchecked_into::<HtmlSelectElement>().value())
                });
                *listener.borrow_mut() = Some(change);
            }
        })
        .after_remove(move |_| drop(listener.borrow_mut().take()))
}
