use std::cell::RefCell;
use std::rc::Rc;

use zoon::*;

use crate::dataflow::Relay;
use crate::theme;
use crate::widgets::{chrome_button, select_box};

#[derive(Debug, Clone, PartialEq)]
pub enum BreakpointAction {
    Add(String),
    Remove(String),
    /// Break on the signal shown in the details panel.
    SetOnSelected,
}

pub fn breakpoints_panel(
    breakpoints: Mutable<Vec<String>>,
    signal_names: Mutable<Vec<String>>,
    breakpoint_action_relay: Relay<BreakpointAction>,
) -> impl Element {
    Column::new()
        .s(Gap::new().y(6))
        .item(El::new().child_signal(breakpoints.signal_cloned().map({
            let relay = breakpoint_action_relay.clone();
            move |names| breakpoint_list(names, relay.clone())
        })))
        .item(El::new().child_signal(signal_names.signal_cloned().map(move |names| {
            add_row(names, breakpoint_action_relay.clone())
        })))
}

fn breakpoint_list(names: Vec<String>, relay: Relay<BreakpointAction>) -> RawElOrText {
    if names.is_empty() {
        return El::new()
            .s(Font::new().color(theme::TEXT_MUTED))
            .child(Text::new("no breakpoints"))
            .unify();
    }
    Column::new()
        .s(Gap::new().y(2))
        .items(names.into_iter().map(|name| {
            let relay = relay.clone();
            let remove = name.clone();
            Row::new()
                .s(Gap::new().x(8))
                .item(El::new().s(Width::fill()).child(Text::new(name)))
                .item(chrome_button("Remove", always(true), move || {
                    relay.send(BreakpointAction::Remove(remove.clone()))
                }))
        }))
        .unify()
}

fn add_row(names: Vec<String>, relay: Relay<BreakpointAction>) -> impl Element {
    let selected = names.first().cloned();
    let chosen = Rc::new(RefCell::new(selected.clone()));
    let options = names.iter().map(|name| (name.clone(), name.clone())).collect();
    Row::new()
        .s(Gap::new().x(6))
        .item(select_box(options, selected, {
            let chosen = chosen.clone();
            move |name| *chosen.borrow_mut() = Some(name)
        }))
        .item(chrome_button("Add", always(true), move || {
            if let Some(name) = chosen.borrow().clone() {
                relay.send(BreakpointAction::Add(name));
            }
        }))
}
