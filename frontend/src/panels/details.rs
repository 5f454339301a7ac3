use shared::SignalDetails;
use zoon::*;

use super::BreakpointAction;
use crate::dataflow::Relay;
use crate::theme;
use crate::widgets::chrome_button;

pub fn details_panel(
    details: Mutable<Option<(String, SignalDetails)>>,
    breakpoint_action_relay: Relay<BreakpointAction>,
) -> impl Element {
    El::new().child_signal(details.signal_cloned().map(move |details| {
        let relay = breakpoint_action_relay.clone();
        details.map(|(name, details)| {
            Column::new()
                .s(Gap::new().y(4))
                .item(row("Signal", name))
                .item(row("Value", details.value.to_string()))
                .item(row("Writer", details.writer_label().to_string()))
                .item(chrome_button("Set breakpoint", always(true), move || {
                    relay.send(BreakpointAction::SetOnSelected)
                }))
        })
    }))
}

fn row(label: &'static str, value: String) -> impl Element {
    Row::new()
        .s(Gap::new().x(12))
        .item(
            El::new()
                .s(Width::exact(56))
                .s(Font::new().color(theme::TEXT_MUTED))
                .child(Text::new(label)),
        )
        .item(Text::new(value))
}
