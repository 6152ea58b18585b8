use std::cell::RefCell;

use foundation::bounds::Point2;
use foundation::ids::TokenCounter;
use layers::{Feature, MapWidget, attr_by_alias, display_text, is_present};
use tracing::debug;

use crate::config::SiteConfig;
use crate::content::map_popup;
use crate::error::InteractionError;
use crate::surface::{MapPopupView, SidebarView};

/// Where a document click landed relative to the map popup.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ClickTarget {
    pub inside_popup: bool,
    pub on_view_more: bool,
}

/// Transient popup next to a clicked map feature.
///
/// Only the latest click may show a popup; an older hit test finishing late
/// is discarded.
#[derive(Debug, Default)]
pub struct MapClickPopupController {
    clicks: TokenCounter,
    /// Layer of the feature the popup describes, while it is showing.
    shown: RefCell<Option<String>>,
}

impl MapClickPopupController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown_layer(&self) -> Option<String> {
        self.shown.borrow().clone()
    }

    pub fn hide(&self, view: &impl MapPopupView) {
        view.hide_map_popup();
        self.shown.borrow_mut().take();
    }

    /// Hit-tests `at` and shows the popup for the first feature that belongs
    /// to a layer. Returns whether a popup is now showing.
    pub async fn handle_click<M, V>(
        &self,
        map: &M,
        view: &V,
        cfg: &SiteConfig,
        at: Point2,
    ) -> Result<bool, InteractionError>
    where
        M: MapWidget,
        V: MapPopupView + SidebarView,
    {
        let token = self.clicks.issue();
        self.hide(view);

        let hits = map.hit_test(at).await?;
        if !self.clicks.is_current(token) {
            return Err(InteractionError::Stale);
        }

        let Some(feature) = hits.into_iter().find_map(|h| h.feature.filter(|f| f.layer.is_some()))
        else {
            return Ok(false);
        };
        let Some(html) = popup_content(&feature, view, cfg) else {
            return Ok(false);
        };
        let Some(layer) = feature.layer.as_ref() else {
            return Ok(false);
        };

        let offset = cfg.map_popup_offset;
        view.show_map_popup(&html, at.offset(offset.dx, offset.dy));
        *self.shown.borrow_mut() = Some(layer.title.clone());
        debug!(layer = %layer.title, "map popup shown");
        Ok(true)
    }

    /// Deferred outside-click check. Returns whether the popup was closed.
    pub fn outside_click(
        &self,
        view: &impl MapPopupView,
        target: ClickTarget,
        keep_open: bool,
    ) -> bool {
        if target.inside_popup || target.on_view_more || keep_open {
            return false;
        }
        self.hide(view);
        true
    }
}

/// Popup markup for `feature`. `None` for boundary layers and for layers
/// without a field schema.
pub fn popup_content(feature: &Feature, view: &impl SidebarView, cfg: &SiteConfig) -> Option<String> {
    let layer = feature.layer.as_ref()?;
    if cfg.is_boundary(&layer.title) || layer.fields.is_none() {
        return None;
    }

    let title = view
        .control_label(&layer.title)
        .unwrap_or_else(|| layer.title.clone());

    let value = |alias: &str| {
        attr_by_alias(feature, alias)
            .filter(|v| is_present(v))
            .map(display_text)
    };
    let mut boxes = Vec::new();
    if !cfg.is_transit(&layer.title) {
        boxes.extend(value("Location").map(|v| ("Location", v)));
    }
    boxes.extend(value("Address").map(|v| ("Address", v)));
    boxes.extend(value("Events").map(|v| ("Events at Location", v)));

    Some(map_popup(&title, &boxes))
}
