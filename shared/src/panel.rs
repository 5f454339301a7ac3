//! Panel lifecycle shared by every side panel.
//!
//! A concrete panel only renders its content; opening, closing and sizing
//! all go through the [`DockablePanel`] it holds.

use indexmap::IndexMap;

pub const MIN_PANEL_WIDTH: u32 = 160;
pub const MIN_PANEL_HEIGHT: u32 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    Cpu,
    Clock,
    Screen,
    Keyboard,
    SignalDetails,
    Breakpoints,
}

impl PanelKind {
    pub const ALL: [PanelKind; 6] = [
        PanelKind::Cpu,
        PanelKind::Clock,
        PanelKind::Screen,
        PanelKind::Keyboard,
        PanelKind::SignalDetails,
        PanelKind::Breakpoints,
    ];

    /// Panels opened when a machine is launched.
    pub const STARTUP: [PanelKind; 5] = [
        PanelKind::Cpu,
        PanelKind::Clock,
        PanelKind::Screen,
        PanelKind::Keyboard,
        PanelKind::Breakpoints,
    ];

    pub fn title(self) -> &'static str {
        match self {
            PanelKind::Cpu => "CPU",
            PanelKind::Clock => "Clock",
            PanelKind::Screen => "Monitor",
            PanelKind::Keyboard => "Keyboard",
            PanelKind::SignalDetails => "Signal details",
            PanelKind::Breakpoints => "Breakpoints",
        }
    }

    pub fn element_id(self) -> &'static str {
        match self {
            PanelKind::Cpu => "pnlCpu",
            PanelKind::Clock => "pnlClock",
            PanelKind::Screen => "pnlMonitor",
            PanelKind::Keyboard => "pnlKeyboard",
            PanelKind::SignalDetails => "pnlSignalDetails",
            PanelKind::Breakpoints => "pnlBreakpoints",
        }
    }

    pub fn default_size(self) -> PanelSize {
        match self {
            PanelKind::Cpu => PanelSize::new(220, 240),
            PanelKind::Clock => PanelSize::new(220, 100),
            PanelKind::Screen => PanelSize::new(340, 240),
            PanelKind::Keyboard => PanelSize::new(750, 300),
            PanelKind::SignalDetails => PanelSize::new(260, 140),
            PanelKind::Breakpoints => PanelSize::new(260, 200),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelSize {
    pub width: u32,
    pub height: u32,
}

impl PanelSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn clamped(self) -> Self {
        Self {
            width: self.width.max(MIN_PANEL_WIDTH),
            height: self.height.max(MIN_PANEL_HEIGHT),
        }
    }
}

/// Open/close/resize state of one panel.
#[derive(Debug, Clone, PartialEq)]
pub struct DockablePanel {
    kind: PanelKind,
    size: PanelSize,
    open: bool,
}

impl DockablePanel {
    pub fn create(kind: PanelKind) -> Self {
        Self {
            kind,
            size: kind.default_size().clamped(),
            open: true,
        }
    }

    pub fn kind(&self) -> PanelKind {
        self.kind
    }

    pub fn title(&self) -> &'static str {
        self.kind.title()
    }

    pub fn size(&self) -> PanelSize {
        self.size
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn reopen(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn resize(&mut self, size: PanelSize) -> PanelSize {
        self.size = size.clamped();
        self.size
    }
}

/// Panels of the current machine, in creation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelSet {
    panels: IndexMap<PanelKind, DockablePanel>,
}

impl PanelSet {
    pub fn startup() -> Self {
        let mut set = Self::default();
        for kind in PanelKind::STARTUP {
            set.open(kind);
        }
        set
    }

    /// Opens `kind`, creating it on first use. Returns true if it was closed.
    pub fn open(&mut self, kind: PanelKind) -> bool {
        let panel = self
            .panels
            .entry(kind)
            .or_insert_with(|| {
                let mut panel = DockablePanel::create(kind);
                panel.close();
                panel
            });
        let was_closed = !panel.is_open();
        panel.reopen();
        was_closed
    }

    pub fn close(&mut self, kind: PanelKind) -> bool {
        match self.panels.get_mut(&kind) {
            Some(panel) if panel.is_open() => {
                panel.close();
                true
            }
            _ => false,
        }
    }

    pub fn close_all(&mut self) {
        self.panels.values_mut().for_each(DockablePanel::close);
    }

    pub fn resize(&mut self, kind: PanelKind, size: PanelSize) -> Option<PanelSize> {
        self.panels.get_mut(&kind).map(|panel| panel.resize(size))
    }

    pub fn get(&self, kind: PanelKind) -> Option<&DockablePanel> {
        self.panels.get(&kind)
    }

    pub fn is_open(&self, kind: PanelKind) -> bool {
        self.get(kind).is_some_and(DockablePanel::is_open)
    }

    pub fn open_panels(&self) -> impl Iterator<Item = &DockablePanel> {
        self.panels.values().filter(|panel| panel.is_open())
    }

    pub fn any_open(&self) -> bool {
        self.open_panels().next().is_some()
    }
}
