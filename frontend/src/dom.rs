//! Raw DOM helpers for content that lives outside zoon's element tree
//! (loaded SVG documents and their children).

use js_sys::Function;
use shared::Point;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::convert::FromWasmAbi;
use wasm_bindgen::prelude::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AddEventListenerOptions, Element, EventTarget, MouseEvent, Response};

/// Registered event listener. Dropping it removes the listener; the handler
/// is then freed by the JS garbage collector together with whatever it
/// captured.
#[must_use = "the listener is removed as soon as it is dropped"]
pub struct Listener {
    target: EventTarget,
    event: String,
    callback: Function,
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(&self.event, &self.callback);
    }
}

fn register<E>(
    target: &EventTarget,
    event: &str,
    handler: impl FnMut(E) + 'static,
    options: Option<&AddEventListenerOptions>,
) -> Listener
where
    E: FromWasmAbi + 'static,
{
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(E)>);
    let callback: Function = closure.into_js_value().unchecked_into();
    let attached = match options {
        Some(options) => target
            .add_event_listener_with_callback_and_add_event_listener_options(event, &callback, options),
        None => target.add_event_listener_with_callback(event, &callback),
    };
    if attached.is_err() {
        log::warn!("could not attach '{event}' listener");
    }
    Listener {
        target: target.clone(),
        event: event.to_string(),
        callback,
    }
}

pub fn listen<E>(target: &EventTarget, event: &str, handler: impl FnMut(E) + 'static) -> Listener
where
    E: FromWasmAbi + 'static,
{
    register(target, event, handler, None)
}

/// Like [`listen`] but the handler may call `prevent_default`.
pub fn listen_active<E>(target: &EventTarget, event: &str, handler: impl FnMut(E) + 'static) -> Listener
where
    E: FromWasmAbi + 'static,
{
    let options = AddEventListenerOptions::new();
    options.set_passive(false);
    register(target, event, handler, Some(&options))
}

/// Every element under `root` matching `selector`.
pub fn query_all(root: &Element, selector: &str) -> Vec<Element> {
    let Ok(nodes) = root.query_selector_all(selector) else {
        log::warn!("invalid selector '{selector}'");
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|index| nodes.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

/// Pointer position relative to the top-left corner of `element`.
pub fn local_point(element: &Element, event: &MouseEvent) -> Point {
    let rect = element.get_bounding_client_rect();
    Point::new(
        f64::from(event.client_x()) - rect.left(),
        f64::from(event.client_y()) - rect.top(),
    )
}

pub async fn fetch_text(url: &str) -> Result<String, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let response: Response = JsFuture::from(window.fetch_with_str(url)).await?.dyn_into()?;
    if !response.ok() {
        return Err(JsValue::from_str(&format!("HTTP {}", response.status())));
    }
    JsFuture::from(response.text()?)
        .await?
        .as_string()
        .ok_or_else(|| JsValue::from_str("response body is not text"))
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn detached_div() -> Element {
        web_sys::window()
            .unwrap()
            .document()
            .unwrap()
            .create_element("div")
            .unwrap()
    }

    fn click(target: &EventTarget) {
        let event = web_sys::Event::new("click").unwrap();
        target.dispatch_event(&event).unwrap();
    }

    #[wasm_bindgen_test]
    fn dropped_listener_stops_handling() {
        let target = detached_div();
        let clicks = Rc::new(Cell::new(0));
        let listener = listen(&target, "click", {
            let clicks = clicks.clone();
            move |_: web_sys::Event| clicks.set(clicks.get() + 1)
        });

        click(&target);
        assert_eq!(clicks.get(), 1);

        drop(listener);
        click(&target);
        assert_eq!(clicks.get(), 1);
    }

    #[wasm_bindgen_test]
    fn listeners_on_one_target_are_independent() {
        let target = detached_div();
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));
        let first_listener = listen(&target, "click", {
            let first = first.clone();
            move |_: web_sys::Event| first.set(first.get() + 1)
        });
        let _second_listener = listen(&target, "click", {
            let second = second.clone();
            move |_: web_sys::Event| second.set(second.get() + 1)
        });

        drop(first_listener);
        click(&target);
        assert_eq!((first.get(), second.get()), (0, 1));
    }
}
