use shared::ClockInfo;
use zoon::*;

use crate::theme;

pub fn clock_panel(clock: Mutable<Option<ClockInfo>>) -> impl Element {
    El::new().child_signal(clock.signal().map(|clock| {
        clock.map(|clock| {
            Column::new()
                .s(Gap::new().y(4))
                .item(labelled("Tick", clock.current_tick().as_u64().to_string()))
                .item(labelled("Elapsed", clock.elapsed().to_string()))
        })
    }))
}

fn labelled(label: &'static str, value: String) -> impl Element {
    Row::new()
        .s(Gap::new().x(12))
        .item(
            El::new()
                .s(Width::exact(60))
                .s(Font::new().color(theme::TEXT_MUTED))
                .child(Text::new(label)),
        )
        .item(
            El::new()
                .s(Font::new().family([FontFamily::Monospace]))
                .child(Text::new(value)),
        )
}
