//! Browser platform: requestAnimationFrame scheduling, removable event
//! listeners and the DOM overlay for labels and the discovered counter.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, EventTarget, HtmlCanvasElement, HtmlElement};

use super::{FrameHandle, FrameScheduler};
use crate::renderer::Label;

type FrameCallback = Closure<dyn FnMut(f64)>;

/// Frame scheduler backed by `requestAnimationFrame`.
///
/// The callback is installed after construction because it usually needs a
/// handle to the object that owns this scheduler.
#[derive(Clone, Default)]
pub struct RafScheduler {
    callback: Rc<RefCell<Option<FrameCallback>>>,
}

impl RafScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the function invoked with the rAF timestamp (ms)
    pub fn set_callback(&self, callback: impl FnMut(f64) + 'static) {
        *self.callback.borrow_mut() = Some(Closure::new(callback));
    }

    /// Drop the callback, breaking any reference cycle through it
    pub fn clear_callback(&self) {
        self.callback.borrow_mut().take();
    }
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let id = match (web_sys::window(), self.callback.borrow().as_ref()) {
            (Some(window), Some(cb)) => window
                .request_animation_frame(cb.as_ref().unchecked_ref())
                .unwrap_or_else(|e| {
                    log::warn!("requestAnimationFrame failed: {:?}", e);
                    0
                }),
            _ => {
                log::warn!("Frame requested without a window or callback");
                0
            }
        };
        FrameHandle(id)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Some(window) = web_sys::window() {
            let _ = window.cancel_animation_frame(handle.0);
        }
    }
}

/// Event listeners that are removed again on drop
#[derive(Default)]
pub struct Listeners {
    installed: Vec<(EventTarget, &'static str, Closure<dyn FnMut(web_sys::Event)>)>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `handler` for `event` on `target`
    pub fn add(
        &mut self,
        target: &EventTarget,
        event: &'static str,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) {
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
        if target
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .is_ok()
        {
            self.installed.push((target.clone(), event, closure));
        } else {
            log::warn!("Could not attach {event} listener");
        }
    }

    pub fn remove_all(&mut self) {
        for (target, event, closure) in self.installed.drain(..) {
            let _ = target
                .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        }
    }

    pub fn len(&self) -> usize {
        self.installed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.installed.is_empty()
    }
}

impl Drop for Listeners {
    fn drop(&mut self) {
        self.remove_all();
    }
}

/// Pointer position relative to the canvas, in CSS pixels
pub fn canvas_point(canvas: &HtmlCanvasElement, client_x: i32, client_y: i32) -> (f32, f32) {
    let rect = canvas.get_bounding_client_rect();
    (
        client_x as f32 - rect.left() as f32,
        client_y as f32 - rect.top() as f32,
    )
}

/// Absolutely positioned captions above the canvas plus the counter
pub struct LabelOverlay {
    document: Document,
    container: Option<Element>,
    counter: Option<Element>,
    nodes: Vec<HtmlElement>,
}

impl LabelOverlay {
    /// Bind to `#labels` and `#discovered` if the page has them
    pub fn new(document: &Document) -> Self {
        Self {
            document: document.clone(),
            container: document.get_element_by_id("labels"),
            counter: document.get_element_by_id("discovered"),
            nodes: Vec::new(),
        }
    }

    /// Show exactly `labels`, reusing nodes from the previous frame
    pub fn sync(&mut self, labels: &[Label]) {
        let Some(container) = &self.container else {
            return;
        };

        while self.nodes.len() < labels.len() {
            let Some(node) = self
                .document
                .create_element("div")
                .ok()
                .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            else {
                return;
            };
            let _ = node.set_attribute("class", "constellation-label");
            let _ = container.append_child(&node);
            self.nodes.push(node);
        }
        while self.nodes.len() > labels.len() {
            if let Some(node) = self.nodes.pop() {
                node.remove();
            }
        }

        for (node, label) in self.nodes.iter().zip(labels) {
            if node.text_content().as_deref() != Some(label.text.as_str()) {
                node.set_text_content(Some(&label.text));
            }
            let style = node.style();
            let _ = style.set_property("left", &format!("{}px", label.pos.x));
            let _ = style.set_property("top", &format!("{}px", label.pos.y));
            let _ = style.set_property("opacity", &format!("{:.3}", label.alpha));
        }
    }

    pub fn set_counter(&self, discovered: u32, visible: bool) {
        if let Some(el) = &self.counter {
            el.set_text_content(Some(&discovered.to_string()));
            let class = if visible && discovered > 0 { "" } else { "hidden" };
            let _ = el.set_attribute("class", class);
        }
    }

    pub fn clear(&mut self) {
        for node in self.nodes.drain(..) {
            node.remove();
        }
    }
}

/// Dispatch a `CustomEvent` on the window with a string detail
pub fn dispatch(name: &str, detail: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let init = web_sys::CustomEventInit::new();
    init.set_detail(&JsValue::from_str(detail));
    if let Ok(event) = web_sys::CustomEvent::new_with_event_init_dict(name, &init) {
        let _ = window.dispatch_event(&event);
    }
}
