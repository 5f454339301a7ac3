//! Platform-independent core of the schematic viewer.
//!
//! The browser frontend owns the DOM and the simulator binding; everything
//! that decides *what* to show and *when* lives here and is tested natively.

pub mod config;
pub mod keyboard;
pub mod panel;
pub mod profile;
pub mod render_binding;
pub mod schematic;
pub mod session;
pub mod simulator;
pub mod transform;

#[cfg(test)]
mod testing;

pub use config::{AppConfig, ConfigError};
pub use keyboard::KeyboardMacroPlayer;
pub use panel::{DockablePanel, PanelKind, PanelSet, PanelSize};
pub use profile::MachineProfile;
pub use render_binding::{SignalPalette, SignalRenderBinding, StyleScope, render_variable_name};
pub use schematic::{
    SchematicDocument, SchematicSheet, SchematicViewport, TransformLayer, ZoomDirection,
    parse_key_id, parse_wire_id,
};
pub use session::{
    ControlCommand, RefreshState, Session, SessionError, SessionState, SessionUi, TickOutcome,
};
pub use simulator::{
    ClockInfo, ControlAvailability, CpuInfo, DisplayInfo, KeyPosition, RunStatus, SignalDetails,
    SignalInfo, Simulator, SimulatorError, WideTick,
};
pub use transform::{Affine, Point};
