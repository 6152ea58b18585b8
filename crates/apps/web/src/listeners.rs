//! Wires page gestures to the session.

use std::cell::RefCell;
use std::rc::Rc;

use foundation::bounds::Point2;
use foundation::handles::{Disposer, DisposerSet};
use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo::timers::callback::Timeout;
use interaction::ClickTarget;
use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, KeyboardEvent, MouseEvent};

use crate::AppSession;
use crate::arcgis::MapView;
use crate::dom::{closest, event_element};

const MAP_POPUP_SELECTOR: &str = "#custom-popup";
const VIEW_MORE_SELECTOR: &str = ".popup-button";

thread_local! {
    // At most one pending outside-click check for the map popup.
    static OUTSIDE_CLICK: RefCell<Option<EventListener>> = const { RefCell::new(None) };
}

fn pointer(event: &Event) -> Option<Point2> {
    let mouse = event.dyn_ref::<MouseEvent>()?;
    Some(Point2::new(
        f64::from(mouse.client_x()),
        f64::from(mouse.client_y()),
    ))
}

fn on(target: &web_sys::EventTarget, event: &'static str, f: impl FnMut(&Event) + 'static) -> Disposer {
    Disposer::holding(EventListener::new(target, event, f))
}

fn on_id(
    document: &Document,
    id: &str,
    event: &'static str,
    f: impl FnMut(&Event) + 'static,
) -> Option<Disposer> {
    let el = document.get_element_by_id(id)?;
    Some(on(&el, event, f))
}

/// Registers every page listener. Dropping the returned set removes them.
pub fn wire(session: &Rc<AppSession>, document: &Document, view: &MapView) -> DisposerSet {
    let mut set = DisposerSet::new();
    wire_controls(session, document, &mut set);
    wire_info_popup(session, document, &mut set);
    wire_map(session, document, view, &mut set);
    wire_sidebar(session, document, &mut set);
    wire_tutorial(session, document, &mut set);
    set.push(Disposer::new(|| {
        OUTSIDE_CLICK.with(|slot| slot.borrow_mut().take());
    }));
    tracing::debug!("listeners: registered {}", set.len());
    set
}

fn wire_controls(session: &Rc<AppSession>, document: &Document, set: &mut DisposerSet) {
    let Ok(buttons) = document.query_selector_all("button[data-layer-name]") else {
        return;
    };
    for node in (0..buttons.length()).filter_map(|i| buttons.item(i)) {
        let Ok(button) = node.dyn_into::<Element>() else {
            continue;
        };
        let Some(name) = button.get_attribute("data-layer-name") else {
            continue;
        };

        let (s, n) = (session.clone(), name.clone());
        set.push(on(&button, "mouseenter", move |_| s.request_highlight(&n)));
        let s = session.clone();
        set.push(on(&button, "mouseleave", move |_| s.clear_highlight()));
        let s = session.clone();
        set.push(on(&button, "click", move |_| s.activate_category(&name)));
    }

    if let Some(body) = document.body() {
        let s = session.clone();
        set.push(on(&body, "mouseenter", move |_| s.pointer_entered_body()));
    }
}

fn wire_info_popup(session: &Rc<AppSession>, document: &Document, set: &mut DisposerSet) {
    // The popup is built lazily, so its controls are reached by delegation.
    let s = session.clone();
    set.push(on(document, "click", move |event| {
        if event_element(event)
            .and_then(|el| closest(&el, "#infoPopupClose"))
            .is_some()
        {
            s.info_popup_close_control();
        }
    }));

    let s = session.clone();
    set.push(on(document, "mousedown", move |event| {
        let Some(el) = event_element(event) else {
            return;
        };
        if closest(&el, "#infoPopupTitleBar").is_none() || closest(&el, "#infoPopupClose").is_some() {
            return;
        }
        if let Some(at) = pointer(event) {
            s.popup_drag_start(at);
            event.prevent_default();
        }
    }));

    let s = session.clone();
    set.push(on(document, "mousemove", move |event| {
        if !s.info_popup().is_dragging() {
            return;
        }
        if let Some(at) = pointer(event) {
            s.popup_drag_move(at);
        }
    }));

    let s = session.clone();
    set.push(on(document, "mouseup", move |_| s.popup_drag_end()));

    let s = session.clone();
    set.push(on(document, "keydown", move |event| {
        if event
            .dyn_ref::<KeyboardEvent>()
            .is_some_and(|k| k.key() == "Escape")
        {
            s.escape();
        }
    }));
}

fn wire_map(session: &Rc<AppSession>, document: &Document, view: &MapView, set: &mut DisposerSet) {
    let s = session.clone();
    let handler = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
        let coord = |k: &str| {
            Reflect::get(&event, &JsValue::from_str(k))
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0)
        };
        let at = Point2::new(coord("x"), coord("y"));
        let s = s.clone();
        spawn_local(async move {
            if s.handle_map_click(at).await {
                arm_outside_click(&s);
            }
        });
    });
    let handle = view.on("click", handler.as_ref().unchecked_ref());
    set.push(Disposer::new(move || {
        handle.remove();
        drop(handler);
    }));

    let s = session.clone();
    set.push(on(document, "click", move |event| {
        if event_element(event)
            .and_then(|el| closest(&el, &format!("{MAP_POPUP_SELECTOR} {VIEW_MORE_SELECTOR}")))
            .is_some()
        {
            s.view_more();
        }
    }));
}

/// Listens once for the next document click after the popup opened. Armed
/// on a zero-delay timer so the opening click itself is not seen.
fn arm_outside_click(session: &Rc<AppSession>) {
    let session = session.clone();
    Timeout::new(0, move || {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let options = EventListenerOptions {
            phase: EventListenerPhase::Capture,
            passive: true,
        };
        let listener = EventListener::once_with_options(&document, "click", options, move |event| {
            let el = event_element(event);
            let target = ClickTarget {
                inside_popup: el
                    .as_ref()
                    .and_then(|el| closest(el, MAP_POPUP_SELECTOR))
                    .is_some(),
                on_view_more: el
                    .as_ref()
                    .and_then(|el| closest(el, VIEW_MORE_SELECTOR))
                    .is_some(),
            };
            session.map_popup_document_click(target);
        });
        OUTSIDE_CLICK.with(|slot| *slot.borrow_mut() = Some(listener));
    })
    .forget();
}

fn wire_sidebar(session: &Rc<AppSession>, document: &Document, set: &mut DisposerSet) {
    let s = session.clone();
    set.push(on(document, "click", move |event| {
        let Some(header) = event_element(event).and_then(|el| closest(&el, ".collapsible-header")) else {
            return;
        };
        let name = header
            .first_child()
            .and_then(|n| n.text_content())
            .map(|t| t.trim().to_string());
        if let Some(name) = name {
            s.toggle_section(&name);
        }
    }));
}

fn wire_tutorial(session: &Rc<AppSession>, document: &Document, set: &mut DisposerSet) {
    let s = session.clone();
    set.extend(on_id(document, "start-tutorial-btn", "click", move |_| s.tutorial_start()));
    let s = session.clone();
    set.extend(on_id(document, "tutorial-close", "click", move |_| s.tutorial_close()));
    let s = session.clone();
    set.extend(on_id(document, "tutorial-prev", "click", move |_| s.tutorial_prev()));
    let s = session.clone();
    set.extend(on_id(document, "tutorial-next", "click", move |_| s.tutorial_next()));
}
