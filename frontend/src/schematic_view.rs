//! Schematic sheets in the browser: tab bar, SVG loading, wire listeners and
//! pan/zoom gestures. The sheet bookkeeping itself lives in
//! [`SchematicViewport`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use shared::schematic::TRANSFORM_LAYER_ID;
use shared::{
    Affine, MachineProfile, SchematicDocument, SchematicSheet, SchematicViewport, StyleScope,
    TransformLayer, ZoomDirection, parse_wire_id,
};
use wasm_bindgen::JsCast;
use web_sys::{
    CssStyleDeclaration, MouseEvent, PointerEvent, SvggElement, SvgsvgElement, WheelEvent,
};
use zoon::*;

use crate::dataflow::Relay;
use crate::dom;
use crate::theme;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewportEvent {
    Hovered(String),
    Unhovered,
    Clicked(String),
}

// ===== DOCUMENT HANDLES =====

#[derive(Clone)]
pub struct SvgSheet {
    svg: SvgsvgElement,
}

pub struct SvgLayer(SvggElement);

impl SchematicDocument for SvgSheet {
    type Layer = SvgLayer;

    fn transform_layer(&self) -> Option<SvgLayer> {
        self.svg
            .query_selector(&format!("#{TRANSFORM_LAYER_ID}"))
            .ok()
            .flatten()
            .and_then(|element| element.dyn_into::<SvggElement>().ok())
            .map(SvgLayer)
    }

    fn has_view_box(&self) -> bool {
        self.svg.has_attribute("viewBox")
    }

    fn remove_view_box(&self) {
        let _ = self.svg.remove_attribute("viewBox");
    }
}

impl TransformLayer for SvgLayer {
    fn current_transform(&self) -> Affine {
        match self.0.get_ctm() {
            Some(m) => Affine::new(
                f64::from(m.a()),
                f64::from(m.b()),
                f64::from(m.c()),
                f64::from(m.d()),
                f64::from(m.e()),
                f64::from(m.f()),
            ),
            None => Affine::IDENTITY,
        }
    }

    fn set_transform(&self, transform: Affine) {
        if self
            .0
            .set_attribute("transform", &transform.to_svg_matrix())
            .is_err()
        {
            log::warn!("could not apply layer transform");
        }
    }
}

/// Inline style of the active sheet's root `<svg>`.
pub struct SvgStyles(CssStyleDeclaration);

impl StyleScope for SvgStyles {
    fn set_property(&mut self, name: &str, value: &str) {
        let _ = self.0.set_property(name, value);
    }

    fn clear_all(&mut self) {
        self.0.set_css_text("");
    }
}

// ===== VIEW =====

#[derive(Clone)]
pub struct SchematicView {
    viewport: Rc<RefCell<SchematicViewport<SvgSheet>>>,
    active_sheet: Mutable<Option<usize>>,
    viewport_event_relay: Relay<ViewportEvent>,
    // wire and gesture listeners of every loaded sheet
    listeners: Rc<RefCell<Vec<dom::Listener>>>,
    released: Rc<Cell<bool>>,
}

impl SchematicView {
    pub fn new(
        profile: MachineProfile,
        base_path: &str,
        viewport_event_relay: Relay<ViewportEvent>,
    ) -> Self {
        Self {
            viewport: Rc::new(RefCell::new(SchematicViewport::new(profile, base_path))),
            active_sheet: Mutable::new(None),
            viewport_event_relay,
            listeners: Rc::default(),
            released: Rc::default(),
        }
    }

    /// Detaches every sheet listener so the loaded documents can be freed.
    /// Sheets that finish loading afterwards are discarded.
    pub fn release(&self) {
        self.released.set(true);
        let listeners = self.listeners.take();
        log::debug!("released {} sheet listeners", listeners.len());
        drop(listeners);
    }

    fn keep(&self, listener: dom::Listener) {
        self.listeners.borrow_mut().push(listener);
    }

    pub fn active_styles(&self) -> Option<SvgStyles> {
        self.viewport
            .borrow()
            .active_document()
            .map(|document| SvgStyles(document.svg.style()))
    }

    fn select_sheet(&self, index: usize) {
        let selected = self.viewport.borrow_mut().select_sheet(index).is_some();
        if selected {
            self.active_sheet.set_neq(Some(index));
        }
    }

    pub fn render(&self) -> impl Element + use<> {
        let sheets = self.viewport.borrow().sheets().to_vec();
        Column::new()
            .s(Width::fill())
            .s(Height::fill())
            .item(self.tab_bar(&sheets))
            .item(
                El::new()
                    .s(Width::fill())
                    .s(Height::fill())
                    .s(Background::new().color(theme::SHEET_BACKGROUND))
                    .update_raw_el(|raw_el| raw_el.style("overflow", "hidden"))
                    .child(
                        Column::new()
                            .s(Width::fill())
                            .s(Height::fill())
                            .items(sheets.iter().map(|sheet| self.sheet_container(sheet))),
                    ),
            )
    }

    fn tab_bar(&self, sheets: &[SchematicSheet]) -> impl Element + use<> {
        Row::new()
            .s(Width::fill())
            .s(Gap::new().x(2))
            .s(Padding::new().x(4).y(2))
            .s(Background::new().color(theme::BAR_BACKGROUND))
            .items(sheets.iter().map(|sheet| {
                let index = sheet.index;
                let view = self.clone();
                let title = sheet.title;
                Button::new()
                    .s(Padding::new().x(10).y(4))
                    .s(Background::new().color_signal(self.active_sheet.signal().map(
                        move |active| {
                            if active == Some(index) {
                                theme::BUTTON_ACTIVE
                            } else {
                                theme::BUTTON_BACKGROUND
                            }
                        },
                    )))
                    .update_raw_el(move |raw_el| raw_el.attr("title", title))
                    .label(Text::new(sheet.tab_label()))
                    .on_press(move || view.select_sheet(index))
            }))
    }

    fn sheet_container(&self, sheet: &SchematicSheet) -> RawHtmlEl<web_sys::HtmlElement> {
        let index = sheet.index;
        let container = RawHtmlEl::new("div")
            .attr("id", &sheet.element_id())
            .style("width", "100%")
            .style("height", "100%")
            .style_signal(
                "display",
                self.active_sheet
                    .signal()
                    .map(move |active| if active == Some(index) { "block" } else { "none" }),
            );
        if let Some(notice) = sheet.notice {
            return container
                .style("padding", "24px")
                .style("color", "black")
                .child(Text::new(notice));
        }
        let view = self.clone();
        let asset = sheet.asset.clone();
        container.after_insert(move |element| {
            Task::start(load_sheet(view, index, asset, element));
        })
    }

    // ===== LISTENERS =====

    fn attach_wire_listeners(&self, svg: &SvgsvgElement) {
        let selector = format!("#{TRANSFORM_LAYER_ID} [id^='wire#']");
        let mut attached = 0;
        for wire in dom::query_all(svg, &selector) {
            let id = wire.id();
            let Some(signal) = parse_wire_id(&id) else {
                log::debug!("skipping wire element '{id}'");
                continue;
            };
            let signal = signal.to_string();
            self.wire_listener(&wire, "mouseover", ViewportEvent::Hovered(signal.clone()));
            self.wire_listener(&wire, "mouseout", ViewportEvent::Unhovered);
            self.wire_listener(&wire, "click", ViewportEvent::Clicked(signal));
            attached += 1;
        }
        log::debug!("attached listeners to {attached} wires");
    }

    fn wire_listener(&self, wire: &web_sys::Element, event: &str, message: ViewportEvent) {
        let relay = self.viewport_event_relay.clone();
        self.keep(dom::listen(wire, event, move |_: MouseEvent| relay.send(message.clone())));
    }

    fn attach_pan_zoom(&self, svg: &SvgsvgElement) {
        self.keep(dom::listen_active(svg, "wheel", {
            let viewport = self.viewport.clone();
            let svg = svg.clone();
            move |event: WheelEvent| {
                let pointer = dom::local_point(&svg, &event);
                let direction = ZoomDirection::from_wheel_delta(event.delta_y());
                if viewport.borrow_mut().zoom(pointer, direction).is_some() {
                    event.prevent_default();
                }
            }
        }));
        self.keep(dom::listen(svg, "pointerdown", {
            let viewport = self.viewport.clone();
            let svg = svg.clone();
            move |event: PointerEvent| {
                if event.button() != 0 {
                    return;
                }
                let pointer = dom::local_point(&svg, &event);
                viewport.borrow_mut().begin_pan(pointer);
            }
        }));
        self.keep(dom::listen(svg, "pointermove", {
            let viewport = self.viewport.clone();
            let svg = svg.clone();
            move |event: PointerEvent| {
                let mut viewport = viewport.borrow_mut();
                if viewport.is_panning() {
                    viewport.pan_to(dom::local_point(&svg, &event));
                }
            }
        }));
        for event in ["pointerup", "pointerleave"] {
            let viewport = self.viewport.clone();
            self.keep(dom::listen(svg, event, move |_: PointerEvent| viewport.borrow_mut().end_pan()));
        }
    }
}

async fn load_sheet(view: SchematicView, index: usize, asset: String, container: web_sys::HtmlElement) {
    let markup = match dom::fetch_text(&asset).await {
        Ok(markup) => markup,
        Err(err) => {
            // the sheet stays unloaded, so the first sheet is never auto-selected
            log::error!("failed to load {asset}: {err:?}");
            return;
        }
    };
    if view.released.get() {
        log::debug!("dropping {asset}, its viewport is gone");
        return;
    }
    container.set_inner_html(&markup);
    let Some(svg) = container
        .query_selector("svg")
        .ok()
        .flatten()
        .and_then(|element| element.dyn_into::<SvgsvgElement>().ok())
    else {
        log::error!("{asset} contains no <svg> root");
        return;
    };
    let _ = svg.set_attribute("width", "100%");
    let _ = svg.set_attribute("height", "100%");
    view.attach_wire_listeners(&svg);
    view.attach_pan_zoom(&svg);

    let auto_select = view
        .viewport
        .borrow_mut()
        .sheet_loaded(index, SvgSheet { svg });
    if let Some(first) = auto_select {
        log::info!("all sheets loaded");
        view.select_sheet(first);
    }
}
