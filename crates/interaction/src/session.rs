//! The per-page context tying the controllers to one map and one page.

use std::cell::RefCell;
use std::future::Future;
use std::rc::{Rc, Weak};

use chrono::{Local, TimeZone};
use foundation::bounds::Point2;
use futures::task::{LocalSpawn, LocalSpawnExt};
use layers::{ActiveLayerFilter, FeatureQuery, MapWidget};
use tracing::{debug, error, info, warn};

use crate::accordion::Accordion;
use crate::category::{self, Activation};
use crate::config::SiteConfig;
use crate::error::InteractionError;
use crate::events::{UpcomingEvent, render_sidebar};
use crate::highlight::HighlightCoordinator;
use crate::info_popup::{CloseAction, InfoPopupController};
use crate::map_click::{ClickTarget, MapClickPopupController};
use crate::surface::Surface;
use crate::tutorial::{self, TutorialEngine, TutorialHost};

/// Owns every piece of interaction state for one map view.
///
/// Gesture handlers hold an `Rc<Session>`; async work spawned from here
/// holds a `Weak` and gives up quietly once the session is gone.
pub struct Session<M: MapWidget + 'static, S: Surface + 'static> {
    me: Weak<Self>,
    map: M,
    surface: S,
    cfg: SiteConfig,
    spawner: Box<dyn LocalSpawn>,
    highlights: HighlightCoordinator,
    popup: InfoPopupController,
    map_popup: MapClickPopupController,
    filter: RefCell<ActiveLayerFilter>,
    accordion: Accordion,
    tutorial: TutorialEngine,
}

impl<M: MapWidget + 'static, S: Surface + 'static> Session<M, S> {
    pub fn new(map: M, surface: S, cfg: SiteConfig, spawner: impl LocalSpawn + 'static) -> Rc<Self> {
        Rc::new_cyclic(|me| Session {
            me: me.clone(),
            map,
            surface,
            tutorial: TutorialEngine::new(cfg.tutorial.clone()),
            cfg,
            spawner: Box::new(spawner),
            highlights: HighlightCoordinator::new(),
            popup: InfoPopupController::new(),
            map_popup: MapClickPopupController::new(),
            filter: RefCell::default(),
            accordion: Accordion::new(),
        })
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn config(&self) -> &SiteConfig {
        &self.cfg
    }

    pub fn highlights(&self) -> &HighlightCoordinator {
        &self.highlights
    }

    pub fn info_popup(&self) -> &InfoPopupController {
        &self.popup
    }

    pub fn map_popup(&self) -> &MapClickPopupController {
        &self.map_popup
    }

    pub fn accordion(&self) -> &Accordion {
        &self.accordion
    }

    pub fn active_filter(&self) -> Option<layers::LayerId> {
        self.filter.borrow().selected()
    }

    fn spawn(&self, fut: impl Future<Output = ()> + 'static) {
        if let Err(err) = self.spawner.spawn_local(fut) {
            error!("failed to spawn task: {err}");
        }
    }

    /// Spawns `f(session)`, skipped if the session is dropped first.
    fn spawn_with<F, Fut>(&self, f: F)
    where
        F: FnOnce(Rc<Self>) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let me = self.me.clone();
        self.spawn(async move {
            if let Some(session) = me.upgrade() {
                f(session).await;
            }
        });
    }

    // --- highlight ---

    /// Pointer entered a category control.
    pub fn request_highlight(&self, name: &str) {
        let Ok(pending) = self.highlights.begin(&self.map, name) else {
            return;
        };
        let name = name.to_string();
        self.spawn_with(move |s| async move {
            match s.highlights.complete(&s.map, pending).await {
                Ok(n) => debug!(layer = %name, features = n, "highlight settled"),
                Err(InteractionError::Stale) => debug!(layer = %name, "highlight superseded"),
                Err(_) => {}
            }
        });
    }

    /// Pointer left a control.
    pub fn clear_highlight(&self) {
        self.highlights.clear(&self.map);
    }

    /// Pointer entered the page body outside every control.
    pub fn pointer_entered_body(&self) {
        self.clear_highlight();
    }

    // --- info window ---

    /// Click on the category control for `name`.
    pub fn activate_category(&self, name: &str) {
        let activation = category::activate(
            &self.map,
            &self.surface,
            &self.popup,
            &self.filter,
            &self.cfg,
            name,
        );
        if let Activation::Opened {
            token,
            show_locations,
        } = activation
        {
            let name = name.to_string();
            self.spawn_with(move |s| async move {
                category::fill(
                    &s.map,
                    &s.surface,
                    &s.popup,
                    &s.cfg,
                    token,
                    &name,
                    show_locations,
                )
                .await;
            });
        }
    }

    /// Shows arbitrary content in the info window, with no trigger control.
    pub fn show_info(&self, title: &str, html: &str) {
        self.popup.show(&self.surface, &self.cfg.popup, title, html);
    }

    /// Click on the window's close control.
    pub fn info_popup_close_control(&self) {
        match self.popup.close_action() {
            CloseAction::Proxy(control) => self.activate_category(&control),
            CloseAction::Direct => self.popup.close(&self.surface),
        }
    }

    pub fn escape(&self) {
        self.popup.close(&self.surface);
    }

    pub fn popup_drag_start(&self, pointer: Point2) {
        self.popup.begin_drag(&self.surface, pointer);
    }

    pub fn popup_drag_move(&self, pointer: Point2) {
        self.popup.drag_to(&self.surface, pointer);
    }

    pub fn popup_drag_end(&self) {
        self.popup.end_drag(&self.surface);
    }

    // --- map popup ---

    /// Click on the map. Returns whether the popup is now showing, in which
    /// case the caller arms the outside-click check.
    pub async fn handle_map_click(&self, at: Point2) -> bool {
        if !self.tutorial.map_popup_allowed() {
            return false;
        }
        match self
            .map_popup
            .handle_click(&self.map, &self.surface, &self.cfg, at)
            .await
        {
            Ok(shown) => shown,
            Err(InteractionError::Stale) => false,
            Err(err) => {
                error!("map click failed: {err}");
                false
            }
        }
    }

    /// "View More" inside the map popup.
    pub fn view_more(&self) {
        if let Some(layer) = self.map_popup.shown_layer() {
            if self.surface.control_label(&layer).is_some() {
                if let Some(section) = self.surface.control_section(&layer) {
                    self.accordion.open(&self.surface, &section);
                }
                self.activate_category(&layer);
            }
        }
        self.map_popup.hide(&self.surface);
    }

    /// First document click after the map popup opened.
    pub fn map_popup_document_click(&self, target: ClickTarget) -> bool {
        self.map_popup
            .outside_click(&self.surface, target, self.tutorial.keeps_map_popup_open())
    }

    // --- sidebar ---

    /// Click on a collapsible section header.
    pub fn toggle_section(&self, section: &str) -> bool {
        self.accordion.toggle(&self.surface, section)
    }

    /// Fills the upcoming-events sidebar from the events table, in the
    /// browser's local time.
    pub async fn populate_upcoming_events(&self) -> Result<usize, InteractionError> {
        self.populate_upcoming_events_in(&Local).await
    }

    pub async fn populate_upcoming_events_in<Tz>(&self, tz: &Tz) -> Result<usize, InteractionError>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let table = &self.cfg.events_table;
        let Some(id) = self.map.find_table(table) else {
            warn!(table = %table, "events table not found");
            return Err(InteractionError::not_found("table", table.as_str()));
        };
        let rows = match self
            .map
            .query_table(id, &FeatureQuery::all().without_geometry())
            .await
        {
            Ok(rows) => rows,
            Err(err) => {
                error!("failed to fetch upcoming events: {err}");
                return Err(err.into());
            }
        };

        let events: Vec<UpcomingEvent> = rows
            .iter()
            .map(|f| UpcomingEvent::from_attributes(&f.attributes, tz))
            .collect();
        if !self.surface.render_upcoming_events(&render_sidebar(&events)) {
            error!("upcoming events sidebar not found");
            return Err(InteractionError::not_found("element", "#programsSidebar"));
        }
        info!("populated {} upcoming events", events.len());
        Ok(events.len())
    }

    // --- tutorial ---

    pub fn tutorial(&self) -> &TutorialEngine {
        &self.tutorial
    }

    pub fn tutorial_start(self: &Rc<Self>) {
        tutorial::start(self);
    }

    pub fn tutorial_next(self: &Rc<Self>) {
        tutorial::next(self);
    }

    pub fn tutorial_prev(self: &Rc<Self>) {
        tutorial::prev(self);
    }

    pub fn tutorial_close(&self) {
        tutorial::close(self);
    }

    /// Releases page-facing state: highlight, layer order, popups.
    pub fn teardown(&self) {
        self.highlights.clear(&self.map);
        self.map_popup.hide(&self.surface);
        if self.tutorial.is_active() {
            tutorial::close(self);
        }
    }
}

impl<M: MapWidget + 'static, S: Surface + 'static> TutorialHost for Session<M, S> {
    type View = S;

    fn tutorial_view(&self) -> &S {
        &self.surface
    }

    fn tutorial(&self) -> &TutorialEngine {
        &self.tutorial
    }

    fn spawn_local(&self, fut: impl Future<Output = ()> + 'static) {
        self.spawn(fut);
    }

    fn hide_map_popup(&self) {
        self.map_popup.hide(&self.surface);
    }

    fn dismiss_info_popup(&self) {
        if self.popup.is_open() {
            self.info_popup_close_control();
        }
    }

    fn activate_control(&self, layer: &str) -> bool {
        if self.surface.control_label(layer).is_none() {
            return false;
        }
        self.activate_category(layer);
        true
    }

    fn open_section(&self, section: &str) {
        self.accordion.open(&self.surface, section);
    }

    fn close_all_sections(&self) {
        self.accordion.close_all(&self.surface);
    }
}
