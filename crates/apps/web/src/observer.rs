use std::cell::RefCell;
use std::rc::Rc;

use foundation::handles::Disposer;
use js_sys::Array;
use runtime::{Notifications, Notifier, notifications};
use wasm_bindgen::prelude::*;
use web_sys::{Document, MutationObserver, MutationObserverInit};

/// Watches style-attribute and child-list changes anywhere under `<body>`.
///
/// Each observer batch becomes one notification. The observer is
/// disconnected when the returned stream is dropped. If it cannot be
/// created the stream ends immediately.
pub fn observe_body(document: &Document) -> Notifications {
    match try_observe(document) {
        Ok(stream) => stream,
        Err(err) => {
            tracing::warn!("observer: cannot observe document: {err:?}");
            let (_, stream) = notifications(Disposer::noop());
            stream
        }
    }
}

fn try_observe(document: &Document) -> Result<Notifications, JsValue> {
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("document has no body"))?;

    let slot: Rc<RefCell<Option<Notifier>>> = Rc::default();
    let sink = slot.clone();
    let callback = Closure::<dyn FnMut(Array, MutationObserver)>::new(
        move |_records: Array, _observer: MutationObserver| {
            if let Some(notifier) = sink.borrow().as_ref() {
                notifier.notify();
            }
        },
    );
    let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;

    let init = MutationObserverInit::new();
    init.set_attributes(true);
    init.set_attribute_filter(&Array::of1(&JsValue::from_str("style")));
    init.set_child_list(true);
    init.set_subtree(true);
    observer.observe_with_options(&body, &init)?;

    let handle = observer.clone();
    let (notifier, stream) = notifications(Disposer::new(move || {
        handle.disconnect();
        drop(callback);
    }));
    *slot.borrow_mut() = Some(notifier);
    Ok(stream)
}
