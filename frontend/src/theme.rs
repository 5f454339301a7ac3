//! Dark chrome colors shared by the tab bar, controls and panels.

pub const APP_BACKGROUND: &str = "oklch(18% 0.02 255)";
pub const BAR_BACKGROUND: &str = "oklch(24% 0.03 255)";
pub const PANEL_BACKGROUND: &str = "oklch(22% 0.025 255)";
pub const PANEL_HEADER: &str = "oklch(32% 0.05 255)";
pub const BUTTON_BACKGROUND: &str = "oklch(38% 0.06 255)";
pub const BUTTON_ACTIVE: &str = "oklch(55% 0.14 250)";
pub const BORDER: &str = "oklch(40% 0.04 255)";
pub const TEXT: &str = "oklch(92% 0.03 255)";
pub const TEXT_MUTED: &str = "oklch(70% 0.05 255)";
pub const SHEET_BACKGROUND: &str = "oklch(97% 0.005 90)";
