use std::cell::RefCell;
use std::rc::Rc;

use crate::layer::{FieldSchema, LayerId, LayerInfo};

/// Ordered, toggleable layer collection of the map (index 0 renders first,
/// the last index renders on top).
pub trait LayerStack {
    fn find_layer(&self, title: &str) -> Option<LayerId>;
    /// Bottom to top.
    fn layer_ids(&self) -> Vec<LayerId>;
    fn layer_index(&self, id: LayerId) -> Option<usize>;
    fn reorder(&self, id: LayerId, index: usize);
    fn is_visible(&self, id: LayerId) -> bool;
    fn set_visible(&self, id: LayerId, visible: bool);
    fn layer_info(&self, id: LayerId) -> Option<Rc<LayerInfo>>;

    fn layer_count(&self) -> usize {
        self.layer_ids().len()
    }

    fn top_index(&self) -> Option<usize> {
        self.layer_count().checked_sub(1)
    }
}

#[derive(Debug)]
struct Entry {
    info: Rc<LayerInfo>,
    visible: bool,
}

/// Reference `LayerStack` used by native builds and tests.
#[derive(Debug, Default)]
pub struct InMemoryLayerStack {
    entries: RefCell<Vec<Entry>>,
    next_id: std::cell::Cell<u64>,
}

impl InMemoryLayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a visible layer on top of the stack.
    pub fn push(&self, title: impl Into<String>, fields: Option<FieldSchema>) -> LayerId {
        let id = LayerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.entries.borrow_mut().push(Entry {
            info: Rc::new(LayerInfo {
                id,
                title: title.into(),
                fields,
            }),
            visible: true,
        });
        id
    }

    pub fn titles(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .map(|e| e.info.title.clone())
            .collect()
    }

    pub fn visible_titles(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.visible)
            .map(|e| e.info.title.clone())
            .collect()
    }
}

impl LayerStack for InMemoryLayerStack {
    fn find_layer(&self, title: &str) -> Option<LayerId> {
        self.entries
            .borrow()
            .iter()
            .find(|e| e.info.title == title)
            .map(|e| e.info.id)
    }

    fn layer_ids(&self) -> Vec<LayerId> {
        self.entries.borrow().iter().map(|e| e.info.id).collect()
    }

    fn layer_index(&self, id: LayerId) -> Option<usize> {
        self.entries.borrow().iter().position(|e| e.info.id == id)
    }

    fn reorder(&self, id: LayerId, index: usize) {
        let mut entries = self.entries.borrow_mut();
        let Some(from) = entries.iter().position(|e| e.info.id == id) else {
            return;
        };
        let entry = entries.remove(from);
        let to = index.min(entries.len());
        entries.insert(to, entry);
    }

    fn is_visible(&self, id: LayerId) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|e| e.info.id == id && e.visible)
    }

    fn set_visible(&self, id: LayerId, visible: bool) {
        if let Some(e) = self.entries.borrow_mut().iter_mut().find(|e| e.info.id == id) {
            e.visible = visible;
        }
    }

    fn layer_info(&self, id: LayerId) -> Option<Rc<LayerInfo>> {
        self.entries
            .borrow()
            .iter()
            .find(|e| e.info.id == id)
            .map(|e| e.info.clone())
    }
}
