//! Multi-sheet schematic viewport model.
//!
//! Tracks which sheets exist for a machine profile, when they finish loading,
//! which one is active, and owns the pan/zoom gesture state for the active
//! sheet's transform layer. Document access goes through [`SchematicDocument`]
//! so the browser and the tests provide their own element handles.

use crate::profile::MachineProfile;
use crate::transform::{Affine, Point};

/// Id of the top-level group inside each sheet that carries the transform.
pub const TRANSFORM_LAYER_ID: &str = "Schematic";
/// Id of the group holding the keys inside the keyboard asset.
pub const KEYBOARD_GROUP_ID: &str = "Keyboard";
pub const KEYBOARD_ASSET: &str = "pet_keyboard.svg";

const WIRE_PREFIX: &str = "wire#";

const ZOOM_IN_FACTOR: f64 = 1.2;
const ZOOM_OUT_FACTOR: f64 = 0.8;

const SHEET_TITLES: [&str; 8] = [
    "Micro-processor / Memory Expansion",
    "IEEE-488 Interface",
    "Cassette & Keyboard",
    "ROMS",
    "RAMS",
    "Master Timing",
    "Display Logic",
    "Display RAMs",
];

// ===== IDENTIFIERS =====

/// Signal name encoded in a `wire#<name>_<suffix>` element id.
pub fn parse_wire_id(id: &str) -> Option<&str> {
    let rest = id.strip_prefix(WIRE_PREFIX)?;
    let (name, _suffix) = rest.split_once('_')?;
    if name.is_empty() {
        return None;
    }
    Some(name)
}

/// Key element parsed from a `key_<row>_<col>[_lock]` element id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyElement {
    pub row: u8,
    pub column: u8,
    pub lock: bool,
}

pub fn parse_key_id(id: &str) -> Option<KeyElement> {
    let mut parts = id.strip_prefix("key_")?.split('_');
    let row = parts.next()?.parse().ok()?;
    let column = parts.next()?.parse().ok()?;
    let lock = match parts.next() {
        None => false,
        Some("lock") => true,
        Some(_) => return None,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(KeyElement { row, column, lock })
}

// ===== SHEETS =====

#[derive(Debug, Clone, PartialEq)]
pub struct SchematicSheet {
    pub index: usize,
    pub page: u8,
    pub title: &'static str,
    pub asset: String,
    /// Set when the profile does not render this sheet.
    pub notice: Option<&'static str>,
    pub loaded: bool,
}

impl SchematicSheet {
    pub fn element_id(&self) -> String {
        format!("sheet_{:02}", self.page)
    }

    pub fn tab_label(&self) -> String {
        format!("Sheet {}", self.page)
    }

    pub fn is_excluded(&self) -> bool {
        self.notice.is_some()
    }
}

pub fn sheets_for(profile: MachineProfile, base_path: &str) -> Vec<SchematicSheet> {
    SHEET_TITLES
        .iter()
        .copied()
        .enumerate()
        .map(|(index, title)| {
            let page = index as u8 + 1;
            SchematicSheet {
                index,
                page,
                title,
                asset: format!("{base_path}sheet_{page:02}.svg"),
                notice: profile.excluded_notice(page),
                loaded: false,
            }
        })
        .collect()
}

// ===== DOCUMENT ACCESS =====

/// A loaded sheet document.
pub trait SchematicDocument {
    type Layer: TransformLayer;

    /// The group with id [`TRANSFORM_LAYER_ID`], if the document has one.
    fn transform_layer(&self) -> Option<Self::Layer>;
    fn has_view_box(&self) -> bool;
    fn remove_view_box(&self);
}

pub trait TransformLayer {
    /// Accumulated screen transform of the layer, including any view box.
    fn current_transform(&self) -> Affine;
    fn set_transform(&self, transform: Affine);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Wheel scrolled away from the user zooms in.
    pub fn from_wheel_delta(delta_y: f64) -> Self {
        if delta_y < 0.0 {
            ZoomDirection::In
        } else {
            ZoomDirection::Out
        }
    }

    pub fn factor(self) -> f64 {
        match self {
            ZoomDirection::In => ZOOM_IN_FACTOR,
            ZoomDirection::Out => ZOOM_OUT_FACTOR,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PanGesture {
    start: Affine,
    inverse: Affine,
    origin: Point,
}

// ===== VIEWPORT =====

pub struct SchematicViewport<D: SchematicDocument> {
    profile: MachineProfile,
    sheets: Vec<SchematicSheet>,
    documents: Vec<Option<D>>,
    loaded_count: usize,
    first_sheet_selected: bool,
    active: Option<usize>,
    layer: Option<D::Layer>,
    pan: Option<PanGesture>,
}

impl<D: SchematicDocument> SchematicViewport<D> {
    pub fn new(profile: MachineProfile, base_path: &str) -> Self {
        let sheets = sheets_for(profile, base_path);
        let documents = sheets.iter().map(|_| None).collect();
        Self {
            profile,
            sheets,
            documents,
            loaded_count: 0,
            first_sheet_selected: false,
            active: None,
            layer: None,
            pan: None,
        }
    }

    pub fn profile(&self) -> MachineProfile {
        self.profile
    }

    pub fn sheets(&self) -> &[SchematicSheet] {
        &self.sheets
    }

    /// Number of sheets that load an asset.
    pub fn expected_loads(&self) -> usize {
        self.sheets.iter().filter(|sheet| !sheet.is_excluded()).count()
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded_count
    }

    /// Records a finished sheet load. Returns the sheet to auto-select once
    /// every rendered sheet has arrived; this happens at most once.
    pub fn sheet_loaded(&mut self, index: usize, document: D) -> Option<usize> {
        let sheet = self.sheets.get_mut(index)?;
        if sheet.is_excluded() {
            log::warn!("ignoring load of excluded sheet {}", sheet.page);
            return None;
        }
        self.documents[index] = Some(document);
        if !sheet.loaded {
            sheet.loaded = true;
            self.loaded_count += 1;
        }
        if self.loaded_count == self.expected_loads() && !self.first_sheet_selected {
            self.first_sheet_selected = true;
            return Some(0);
        }
        None
    }

    /// Makes `index` the active sheet and drops the cached layer handle.
    pub fn select_sheet(&mut self, index: usize) -> Option<&SchematicSheet> {
        let sheet = self.sheets.get(index)?;
        self.active = Some(index);
        self.layer = None;
        self.pan = None;
        Some(sheet)
    }

    pub fn active_sheet(&self) -> Option<&SchematicSheet> {
        self.active.and_then(|index| self.sheets.get(index))
    }

    pub fn active_document(&self) -> Option<&D> {
        self.active
            .and_then(|index| self.documents.get(index))
            .and_then(Option::as_ref)
    }

    fn resolve_layer(&mut self) -> Option<&D::Layer> {
        if self.layer.is_none() {
            let document = self.active_document()?;
            let layer = document.transform_layer()?;
            if document.has_view_box() {
                layer.set_transform(layer.current_transform());
                document.remove_view_box();
            }
            self.layer = Some(layer);
        }
        self.layer.as_ref()
    }

    /// Zooms the active sheet around the pointer position.
    pub fn zoom(&mut self, pointer: Point, direction: ZoomDirection) -> Option<Affine> {
        let layer = self.resolve_layer()?;
        let current = layer.current_transform();
        let center = current.inverse()?.apply(pointer);
        let transform = current.multiply(
            Affine::translation(center.x, center.y)
                .scale(direction.factor())
                .translate(-center.x, -center.y),
        );
        layer.set_transform(transform);
        Some(transform)
    }

    pub fn begin_pan(&mut self, pointer: Point) -> bool {
        let Some(layer) = self.resolve_layer() else {
            return false;
        };
        let start = layer.current_transform();
        let Some(inverse) = start.inverse() else {
            return false;
        };
        self.pan = Some(PanGesture {
            start,
            inverse,
            origin: inverse.apply(pointer),
        });
        true
    }

    pub fn pan_to(&mut self, pointer: Point) -> Option<Affine> {
        let gesture = self.pan?;
        let layer = self.layer.as_ref()?;
        let local = gesture.inverse.apply(pointer);
        let transform = gesture
            .start
            .translate(local.x - gesture.origin.x, local.y - gesture.origin.y);
        layer.set_transform(transform);
        Some(transform)
    }

    pub fn end_pan(&mut self) {
        self.pan = None;
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }
}
