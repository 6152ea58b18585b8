//! Browser entry points: attaches the interaction session to a map view
//! and the surrounding page.

mod arcgis;
mod dom;
mod listeners;
mod logging;
mod observer;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use foundation::handles::DisposerSet;
use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};
use gloo_net::http::Request;
use interaction::{Session, SiteConfig};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};

use crate::arcgis::{ArcGisMap, MapView, js_error};
use crate::dom::DomSurface;

pub(crate) type AppSession = Session<ArcGisMap, DomSurface>;

// Guard to prevent double-initialization of global state (relevant during hot reload).
static INITIALIZED: AtomicBool = AtomicBool::new(false);

struct App {
    session: Rc<AppSession>,
    _listeners: DisposerSet,
}

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

/// Runs spawned session work on the browser's microtask queue.
#[derive(Debug, Default, Copy, Clone)]
struct WasmSpawner;

impl LocalSpawn for WasmSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        spawn_local(future);
        Ok(())
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    console_error_panic_hook::set_once();
    logging::init(tracing::Level::INFO);
    Ok(())
}

/// Attaches to a ready map view. Called by the page bootstrap once the
/// document and the view exist; a second call replaces the first session.
#[wasm_bindgen]
pub fn attach_map_view(view: JsValue, config_url: Option<String>) -> Result<(), JsValue> {
    if !view.is_object() {
        return Err(JsValue::from_str("attach_map_view expects a map view"));
    }
    let view: MapView = view.unchecked_into();
    spawn_local(async move {
        if let Err(err) = attach(view, config_url).await {
            tracing::error!("attach failed: {}", js_error(&err));
        }
    });
    Ok(())
}

/// Tears down the current session and removes its listeners.
#[wasm_bindgen]
pub fn detach() {
    let app = APP.with(|slot| slot.borrow_mut().take());
    if let Some(app) = app {
        app.session.teardown();
        tracing::info!("session detached");
    }
}

async fn attach(view: MapView, config_url: Option<String>) -> Result<(), JsValue> {
    detach();

    let cfg = match config_url {
        Some(url) => fetch_config(&url).await.unwrap_or_else(|err| {
            tracing::warn!("using default site config: {}", js_error(&err));
            SiteConfig::default()
        }),
        None => SiteConfig::default(),
    };

    // Tables are only listed once the web map has loaded.
    JsFuture::from(view.map().load()).await?;

    let map = ArcGisMap::new(view.clone());
    map.disable_builtin_popup();
    let surface = DomSurface::new()?;
    let document = surface.document().clone();
    let session = Session::new(map, surface, cfg, WasmSpawner);
    let listeners = listeners::wire(&session, &document, &view);

    APP.with(|slot| {
        *slot.borrow_mut() = Some(App {
            session: session.clone(),
            _listeners: listeners,
        })
    });
    tracing::info!("session attached");

    // Failures are logged by the session; the sidebar keeps its markup.
    let _ = session.populate_upcoming_events().await;
    Ok(())
}

async fn fetch_config(url: &str) -> Result<SiteConfig, JsValue> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let text = resp
        .text()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    SiteConfig::from_json(&text).map_err(|e| JsValue::from_str(&e.to_string()))
}
