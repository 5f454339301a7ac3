use shared::CpuInfo;
use zoon::*;

use crate::theme;

pub fn cpu_panel(cpu: Mutable<Option<CpuInfo>>) -> impl Element {
    El::new()
        .s(Font::new().family([FontFamily::Monospace]))
        .child_signal(cpu.signal().map(|cpu| match cpu {
            Some(cpu) => register_table(&cpu).unify(),
            None => Text::new("no data yet").unify(),
        }))
}

fn register_table(cpu: &CpuInfo) -> impl Element {
    Column::new()
        .s(Gap::new().y(2))
        .items(cpu.register_rows().into_iter().map(|(label, hex, decimal)| {
            Row::new()
                .s(Gap::new().x(12))
                .item(El::new().s(Width::exact(28)).child(Text::new(label)))
                .item(El::new().s(Width::exact(56)).child(Text::new(hex)))
                .item(
                    El::new()
                        .s(Font::new().color(theme::TEXT_MUTED))
                        .child(Text::new(decimal)),
                )
        }))
        .item(flag_row(cpu))
}

fn flag_row(cpu: &CpuInfo) -> impl Element {
    Row::new()
        .s(Gap::new().x(6))
        .s(Padding::new().top(6))
        .items(cpu.flags().into_iter().map(|(name, set)| {
            El::new()
                .s(Font::new().color(if set { theme::TEXT } else { theme::TEXT_MUTED }))
                .child(Text::new(if set { name.to_string() } else { name.to_ascii_lowercase().to_string() }))
        }))
}
