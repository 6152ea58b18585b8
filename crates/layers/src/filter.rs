use tracing::info;

use crate::layer::LayerId;
use crate::stack::LayerStack;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FilterChange {
    /// Only this layer is visible now.
    Isolated(LayerId),
    /// Every layer is visible again.
    Restored,
}

/// "Show only this category" filter over the map's layers.
///
/// When `selected` is set exactly that layer is visible; otherwise all are.
#[derive(Debug, Default)]
pub struct ActiveLayerFilter {
    selected: Option<LayerId>,
}

impl ActiveLayerFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<LayerId> {
        self.selected
    }

    /// Same layer again restores everything; any other layer switches the
    /// filter directly.
    pub fn toggle(&mut self, stack: &impl LayerStack, layer: LayerId) -> FilterChange {
        if self.selected == Some(layer) {
            for id in stack.layer_ids() {
                stack.set_visible(id, true);
            }
            self.selected = None;
            info!("restored all layers");
            return FilterChange::Restored;
        }

        for id in stack.layer_ids() {
            stack.set_visible(id, id == layer);
        }
        self.selected = Some(layer);
        info!(layer = layer.0, "showing only one layer");
        FilterChange::Isolated(layer)
    }
}
