use std::cell::RefCell;
use std::rc::Rc;

use shared::DisplayInfo;
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};
use zoon::*;

/// Canvas the monitor panel paints into. Empty while the panel is closed.
#[derive(Clone, Default)]
pub struct ScreenSurface {
    canvas: Rc<RefCell<Option<HtmlCanvasElement>>>,
}

impl ScreenSurface {
    fn attach(&self, canvas: HtmlCanvasElement) {
        *self.canvas.borrow_mut() = Some(canvas);
    }

    fn detach(&self) {
        self.canvas.borrow_mut().take();
    }

    /// Copies one RGBA frame; the caller has checked the length.
    pub fn draw(&self, display: DisplayInfo, pixels: &[u8]) {
        let Some(canvas) = self.canvas.borrow().clone() else {
            return;
        };
        if canvas.width() != display.width || canvas.height() != display.height {
            canvas.set_width(display.width);
            canvas.set_height(display.height);
        }
        let Some(context) = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|context| context.dyn_into::<CanvasRenderingContext2d>().ok())
        else {
            log::warn!("monitor canvas has no 2d context");
            return;
        };
        match ImageData::new_with_u8_clamped_array_and_sh(Clamped(pixels), display.width, display.height) {
            Ok(image) => {
                let _ = context.put_image_data(&image, 0.0, 0.0);
            }
            Err(err) => log::warn!("monitor frame rejected: {err:?}"),
        }
    }
}

pub fn screen_panel(surface: ScreenSurface) -> impl Element {
    let on_insert = surface.clone();
    Canvas::new()
        .width(320)
        .height(200)
        .s(Width::fill())
        .update_raw_el(|raw_el| {
            raw_el
                .style("image-rendering", "pixelated")
                .style("background-color", "black")
        })
        .after_insert(move |canvas| on_insert.attach(canvas))
        .after_remove(move |_| surface.detach())
}
