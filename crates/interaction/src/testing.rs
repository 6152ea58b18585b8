//! In-memory collaborators for driving sessions under `LocalPool`.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::future::Future;
use std::rc::Rc;

use foundation::bounds::{Point2, Rect2, Size2};
use foundation::handles::Disposer;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use layers::{
    Feature, FeatureQuery, FieldSchema, HitResult, InMemoryLayerStack, LayerId, LayerInfo,
    LayerStack, MapError, MapWidget, TableId,
};
use runtime::{Clock, Notifier, Notifications, notifications};

use crate::config::PopupLayout;
use crate::surface::{InfoPopupView, MapPopupView, PointerRouting, SidebarView, TutorialView};
use crate::tutorial::BoxPlacement;

type Gates = RefCell<HashMap<LayerId, VecDeque<oneshot::Receiver<()>>>>;

fn take_gate(gates: &Gates, id: LayerId) -> Option<oneshot::Receiver<()>> {
    gates.borrow_mut().get_mut(&id).and_then(|q| q.pop_front())
}

fn push_gate(gates: &Gates, id: LayerId) -> oneshot::Sender<()> {
    let (tx, rx) = oneshot::channel();
    gates.borrow_mut().entry(id).or_default().push_back(rx);
    tx
}

async fn pass(gate: Option<oneshot::Receiver<()>>) {
    if let Some(gate) = gate {
        let _ = gate.await;
    }
}

struct Table {
    id: TableId,
    title: String,
    rows: Result<Vec<Feature>, MapError>,
}

#[derive(Default)]
pub struct FakeMap {
    pub stack: InMemoryLayerStack,
    features: RefCell<HashMap<LayerId, Result<Vec<Feature>, MapError>>>,
    tables: RefCell<Vec<Table>>,
    table_gates: RefCell<HashMap<TableId, VecDeque<oneshot::Receiver<()>>>>,
    view_gates: Gates,
    query_gates: Gates,
    hits: RefCell<Vec<HitResult>>,
    highlighted: Rc<RefCell<Vec<LayerId>>>,
    pub table_queries: RefCell<Vec<FeatureQuery>>,
}

impl FakeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_layer(&self, title: &str, fields: Option<FieldSchema>) -> LayerId {
        self.stack.push(title, fields)
    }

    pub fn set_features(&self, id: LayerId, features: Vec<Feature>) {
        self.features.borrow_mut().insert(id, Ok(features));
    }

    pub fn fail_features(&self, id: LayerId, err: MapError) {
        self.features.borrow_mut().insert(id, Err(err));
    }

    pub fn add_table(&self, title: &str, rows: Result<Vec<Feature>, MapError>) -> TableId {
        let mut tables = self.tables.borrow_mut();
        let id = TableId(tables.len() as u64 + 100);
        tables.push(Table {
            id,
            title: title.to_string(),
            rows,
        });
        id
    }

    /// The next `layer_view(id)` waits until the returned sender fires or drops.
    pub fn gate_view(&self, id: LayerId) -> oneshot::Sender<()> {
        push_gate(&self.view_gates, id)
    }

    pub fn gate_query(&self, id: LayerId) -> oneshot::Sender<()> {
        push_gate(&self.query_gates, id)
    }

    pub fn gate_table(&self, id: TableId) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.table_gates.borrow_mut().entry(id).or_default().push_back(rx);
        tx
    }

    pub fn set_hits(&self, hits: Vec<HitResult>) {
        *self.hits.borrow_mut() = hits;
    }

    /// Layers with a live highlight handle.
    pub fn highlighted(&self) -> Vec<LayerId> {
        self.highlighted.borrow().clone()
    }

    pub fn stack_id(&self, title: &str) -> LayerId {
        self.stack.find_layer(title).expect("layer")
    }

    pub fn table_id(&self, title: &str) -> TableId {
        self.find_table(title).expect("table")
    }
}

impl LayerStack for FakeMap {
    fn find_layer(&self, title: &str) -> Option<LayerId> {
        self.stack.find_layer(title)
    }

    fn layer_ids(&self) -> Vec<LayerId> {
        self.stack.layer_ids()
    }

    fn layer_index(&self, id: LayerId) -> Option<usize> {
        self.stack.layer_index(id)
    }

    fn reorder(&self, id: LayerId, index: usize) {
        self.stack.reorder(id, index)
    }

    fn is_visible(&self, id: LayerId) -> bool {
        self.stack.is_visible(id)
    }

    fn set_visible(&self, id: LayerId, visible: bool) {
        self.stack.set_visible(id, visible)
    }

    fn layer_info(&self, id: LayerId) -> Option<Rc<LayerInfo>> {
        self.stack.layer_info(id)
    }
}

impl MapWidget for FakeMap {
    type View = LayerId;

    fn layer_view(&self, id: LayerId) -> impl Future<Output = Result<LayerId, MapError>> {
        let gate = take_gate(&self.view_gates, id);
        async move {
            pass(gate).await;
            Ok(id)
        }
    }

    fn query_features(
        &self,
        id: LayerId,
        _query: &FeatureQuery,
    ) -> impl Future<Output = Result<Vec<Feature>, MapError>> {
        let gate = take_gate(&self.query_gates, id);
        let info = self.stack.layer_info(id);
        let result = self
            .features
            .borrow()
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()));
        async move {
            pass(gate).await;
            let features = result?;
            Ok(features
                .into_iter()
                .map(|f| match &info {
                    Some(info) if f.layer.is_none() => f.with_layer(info.clone()),
                    _ => f,
                })
                .collect())
        }
    }

    fn highlight(&self, view: &LayerId, features: &[Feature]) -> Option<Disposer> {
        if features.iter().all(|f| f.object_id.is_none()) {
            return None;
        }
        let id = *view;
        self.highlighted.borrow_mut().push(id);
        let registry = self.highlighted.clone();
        Some(Disposer::new(move || registry.borrow_mut().retain(|l| *l != id)))
    }

    fn find_table(&self, title: &str) -> Option<TableId> {
        self.tables
            .borrow()
            .iter()
            .find(|t| t.title == title)
            .map(|t| t.id)
    }

    fn query_table(
        &self,
        table: TableId,
        query: &FeatureQuery,
    ) -> impl Future<Output = Result<Vec<Feature>, MapError>> {
        self.table_queries.borrow_mut().push(query.clone());
        let gate = self
            .table_gates
            .borrow_mut()
            .get_mut(&table)
            .and_then(|q| q.pop_front());
        let result = match self.tables.borrow().iter().find(|t| t.id == table) {
            Some(t) => t.rows.clone().map(|rows| {
                rows.into_iter()
                    .filter(|f| query.matches(&f.attributes))
                    .collect()
            }),
            None => Err(MapError::NotFound(format!("table {}", table.0))),
        };
        async move {
            pass(gate).await;
            result
        }
    }

    fn hit_test(&self, _at: Point2) -> impl Future<Output = Result<Vec<HitResult>, MapError>> {
        let hits = self.hits.borrow().clone();
        async move { Ok(hits) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub label: String,
    pub section: Option<String>,
}

/// Records everything the controllers do to the page.
#[derive(Default)]
pub struct FakeSurface {
    // info window
    pub popup_builds: Cell<usize>,
    pub popup_title: RefCell<String>,
    pub popup_body: RefCell<String>,
    pub popup_visible: Cell<bool>,
    pub popup_rect: Cell<Option<Rect2>>,
    pub popup_moves: RefCell<Vec<Point2>>,
    pub popup_dragging: Cell<bool>,
    pub popup_z: Cell<Option<i32>>,
    /// Keeps the window hidden even when shown, as if rendering stalled.
    pub popup_suppressed: Cell<bool>,
    // map popup
    pub map_popup: RefCell<Option<(String, Point2)>>,
    // sidebar
    pub controls: RefCell<HashMap<String, Control>>,
    pub sections: RefCell<Vec<String>>,
    pub open_sections: RefCell<BTreeSet<String>>,
    pub events_sidebar: Cell<bool>,
    pub events_html: RefCell<Option<String>>,
    // tutorial
    pub tutorial_visible: Cell<bool>,
    pub tutorial_text: RefCell<(String, String)>,
    pub tutorial_nav: Cell<(bool, bool)>,
    pub placements: RefCell<Vec<BoxPlacement>>,
    pub elements: RefCell<HashMap<String, Rect2>>,
    pub classes: RefCell<BTreeSet<(String, String)>>,
    pub pointer_events: RefCell<HashMap<String, String>>,
    pub routing: Cell<PointerRouting>,
    pub body_classes: RefCell<BTreeSet<String>>,
    pub click_guard: Cell<bool>,
    observers: RefCell<Vec<Notifier>>,
    pub live_observers: Rc<Cell<usize>>,
    sleeps: RefCell<Vec<(u32, oneshot::Sender<()>)>>,
}

impl FakeSurface {
    pub fn new() -> Self {
        let s = Self::default();
        s.events_sidebar.set(true);
        s.popup_rect.set(Some(Rect2::new(600.0, 55.0, 400.0, 500.0)));
        for sel in [
            "#mainTitle",
            "#viewDiv",
            ".esri-search__container",
            ".esri-zoom",
            "#sidebar",
            "#programsSidebar",
            "#navbar",
        ] {
            s.elements
                .borrow_mut()
                .insert(sel.to_string(), Rect2::new(100.0, 100.0, 200.0, 100.0));
        }
        s
    }

    pub fn add_control(&self, layer: &str, label: &str, section: Option<&str>) {
        if let Some(sec) = section {
            let mut sections = self.sections.borrow_mut();
            if !sections.iter().any(|s| s == sec) {
                sections.push(sec.to_string());
            }
        }
        self.controls.borrow_mut().insert(
            layer.to_string(),
            Control {
                label: label.to_string(),
                section: section.map(str::to_string),
            },
        );
    }

    pub fn has_class(&self, selector: &str, class: &str) -> bool {
        self.classes
            .borrow()
            .contains(&(selector.to_string(), class.to_string()))
    }

    pub fn has_body_class(&self, class: &str) -> bool {
        self.body_classes.borrow().contains(class)
    }

    pub fn map_popup_html(&self) -> Option<String> {
        self.map_popup.borrow().as_ref().map(|(html, _)| html.clone())
    }

    /// Completes every pending sleep.
    pub fn fire_sleeps(&self) {
        for (_, tx) in self.sleeps.borrow_mut().drain(..) {
            let _ = tx.send(());
        }
    }

    pub fn pending_sleeps(&self) -> Vec<u32> {
        self.sleeps.borrow().iter().map(|(ms, _)| *ms).collect()
    }

    fn notify_observers(&self) {
        self.observers.borrow_mut().retain(|n| n.notify());
    }
}

impl InfoPopupView for FakeSurface {
    fn ensure_info_popup(&self, _layout: &PopupLayout) {
        self.popup_builds.set(self.popup_builds.get() + 1);
        self.elements.borrow_mut().insert(
            "#infoPopupOverlay".to_string(),
            Rect2::new(600.0, 55.0, 400.0, 500.0),
        );
        self.notify_observers();
    }

    fn set_info_popup_title(&self, title: &str) {
        *self.popup_title.borrow_mut() = title.to_string();
    }

    fn set_info_popup_body(&self, html: &str) {
        *self.popup_body.borrow_mut() = html.to_string();
    }

    fn set_info_popup_visible(&self, visible: bool) {
        let visible = visible && !self.popup_suppressed.get();
        self.popup_visible.set(visible);
        if visible {
            self.elements.borrow_mut().insert(
                "#infoPopupDialog".to_string(),
                Rect2::new(620.0, 80.0, 360.0, 450.0),
            );
        } else {
            self.elements.borrow_mut().remove("#infoPopupDialog");
        }
        self.notify_observers();
    }

    fn info_popup_visible(&self) -> bool {
        self.popup_visible.get()
    }

    fn info_popup_rect(&self) -> Option<Rect2> {
        self.popup_rect.get()
    }

    fn move_info_popup(&self, top_left: Point2) {
        self.popup_moves.borrow_mut().push(top_left);
    }

    fn set_info_popup_dragging(&self, dragging: bool) {
        self.popup_dragging.set(dragging);
    }

    fn set_info_popup_z_index(&self, z: i32) {
        self.popup_z.set(Some(z));
    }
}

impl MapPopupView for FakeSurface {
    fn show_map_popup(&self, html: &str, at: Point2) {
        *self.map_popup.borrow_mut() = Some((html.to_string(), at));
    }

    fn hide_map_popup(&self) {
        self.map_popup.borrow_mut().take();
    }

    fn map_popup_visible(&self) -> bool {
        self.map_popup.borrow().is_some()
    }
}

impl SidebarView for FakeSurface {
    fn control_label(&self, layer: &str) -> Option<String> {
        self.controls.borrow().get(layer).map(|c| c.label.clone())
    }

    fn control_section(&self, layer: &str) -> Option<String> {
        self.controls
            .borrow()
            .get(layer)
            .and_then(|c| c.section.clone())
    }

    fn section_names(&self) -> Vec<String> {
        self.sections.borrow().clone()
    }

    fn set_section_open(&self, section: &str, open: bool) {
        let mut sections = self.open_sections.borrow_mut();
        if open {
            sections.insert(section.to_string());
        } else {
            sections.remove(section);
        }
    }

    fn render_upcoming_events(&self, html: &str) -> bool {
        if !self.events_sidebar.get() {
            return false;
        }
        *self.events_html.borrow_mut() = Some(html.to_string());
        true
    }
}

impl TutorialView for FakeSurface {
    fn set_tutorial_visible(&self, visible: bool) {
        self.tutorial_visible.set(visible);
    }

    fn set_tutorial_text(&self, title: &str, text: &str) {
        *self.tutorial_text.borrow_mut() = (title.to_string(), text.to_string());
    }

    fn set_tutorial_nav(&self, show_prev: bool, show_next: bool) {
        self.tutorial_nav.set((show_prev, show_next));
    }

    fn place_tutorial_box(&self, placement: BoxPlacement) {
        self.placements.borrow_mut().push(placement);
    }

    fn tutorial_box_size(&self) -> Size2 {
        Size2::new(300.0, 150.0)
    }

    fn viewport_size(&self) -> Size2 {
        Size2::new(1280.0, 800.0)
    }

    fn element_rect(&self, selector: &str) -> Option<Rect2> {
        self.elements.borrow().get(selector).copied()
    }

    fn set_element_class(&self, selector: &str, class: &str, on: bool) {
        let key = (selector.to_string(), class.to_string());
        if on {
            self.classes.borrow_mut().insert(key);
        } else {
            self.classes.borrow_mut().remove(&key);
        }
    }

    fn set_element_pointer_events(&self, selector: &str, value: Option<&str>) {
        let mut map = self.pointer_events.borrow_mut();
        match value {
            Some(v) => map.insert(selector.to_string(), v.to_string()),
            None => map.remove(selector),
        };
    }

    fn set_pointer_routing(&self, routing: PointerRouting) {
        self.routing.set(routing);
    }

    fn set_body_class(&self, class: &str, on: bool) {
        if on {
            self.body_classes.borrow_mut().insert(class.to_string());
        } else {
            self.body_classes.borrow_mut().remove(class);
        }
    }

    fn set_click_guard(&self, on: bool) {
        self.click_guard.set(on);
    }

    fn observe_mutations(&self) -> Notifications {
        let live = self.live_observers.clone();
        live.set(live.get() + 1);
        let (notifier, stream) = notifications(Disposer::new(move || live.set(live.get() - 1)));
        self.observers.borrow_mut().push(notifier);
        stream
    }
}

impl Clock for FakeSurface {
    type Sleep = LocalBoxFuture<'static, ()>;

    fn sleep(&self, ms: u32) -> Self::Sleep {
        let (tx, rx) = oneshot::channel();
        self.sleeps.borrow_mut().push((ms, tx));
        Box::pin(async move {
            if rx.await.is_err() {
                futures::future::pending::<()>().await;
            }
        })
    }
}
