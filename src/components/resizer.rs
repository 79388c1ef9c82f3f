//! Pane resizer
//!
//! Drag handle between the tree and the detail panel. The width is kept
//! per pane in client storage.

use leptos::prelude::*;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use crate::context::use_app_context;
use crate::storage::{load_json, store_json};

pub const MIN_WIDTH: i32 = 180;
pub const DEFAULT_WIDTH: i32 = 340;

pub fn clamp_width(width: i32, viewport: i32) -> i32 {
    let max = (viewport - MIN_WIDTH).max(MIN_WIDTH);
    width.clamp(MIN_WIDTH, max)
}

/// Returns the pane width signal; the handle itself is rendered by [`Resizer`]
pub fn use_pane_width(pane: &'static str) -> RwSignal<i32> {
    let ctx = use_app_context();
    let services = ctx.services();
    let stored: Option<i32> = load_json(&services.storage, &services.keys.resizer_width(pane));
    RwSignal::new(stored.unwrap_or(DEFAULT_WIDTH))
}

#[component]
pub fn Resizer(pane: &'static str, width: RwSignal<i32>) -> impl IntoView {
    let ctx = use_app_context();
    let dragging = RwSignal::new(false);

    let on_mousemove = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |ev: web_sys::MouseEvent| {
        if !dragging.get_untracked() {
            return;
        }
        let viewport = web_sys::window()
            .and_then(|w| w.inner_width().ok())
            .and_then(|v| v.as_f64())
            .unwrap_or(1920.0) as i32;
        width.set(clamp_width(ev.client_x(), viewport));
    });

    let on_mouseup = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |_ev: web_sys::MouseEvent| {
        if !dragging.get_untracked() {
            return;
        }
        dragging.set(false);
        let services = ctx.services();
        if let Err(e) = store_json(&services.storage, &services.keys.resizer_width(pane), &width.get_untracked()) {
            tracing::warn!(error = %e, "could not persist pane width");
        }
    });

    if let Some(doc) = web_sys::window().and_then(|w| w.document()) {
        let _ = doc.add_event_listener_with_callback("mousemove", on_mousemove.as_ref().unchecked_ref());
        let _ = doc.add_event_listener_with_callback("mouseup", on_mouseup.as_ref().unchecked_ref());
    }
    on_mousemove.forget();
    on_mouseup.forget();

    view! {
        <div
            class="column-resizer"
            class:dragging=move || dragging.get()
            on:mousedown=move |ev| {
                ev.prevent_default();
                dragging.set(true);
            }
        ></div>
    }
}
