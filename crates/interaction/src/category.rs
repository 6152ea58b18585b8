//! Sidebar category controls: filter toggling and the info window fill.

use std::cell::RefCell;

use foundation::ids::RequestToken;
use layers::{
    ActiveLayerFilter, FeatureQuery, FilterChange, MapWidget, PropertyFilter,
    attr_by_alias_or_name, display_text, is_present,
};
use tracing::{debug, error, warn};

use crate::config::SiteConfig;
use crate::content::{
    DESCRIPTION_ERROR, LOCATIONS_ERROR, NO_DESCRIPTION, NO_LOCATIONS, locations_list,
};
use crate::error::InteractionError;
use crate::info_popup::{InfoPopupController, Section};
use crate::surface::{InfoPopupView, SidebarView};

/// Result of a control activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The control was the window's trigger; the window closed.
    Closed,
    /// The window opened in its loading state; the fill must follow.
    Opened {
        token: RequestToken,
        show_locations: bool,
    },
}

fn toggle_filter<M: MapWidget>(map: &M, filter: &RefCell<ActiveLayerFilter>, name: &str) {
    let Some(layer) = map.find_layer(name) else {
        return;
    };
    match filter.borrow_mut().toggle(map, layer) {
        FilterChange::Isolated(_) => debug!(layer = name, "showing only layer"),
        FilterChange::Restored => debug!("restored all layers"),
    }
}

/// Click on the control for layer `name`.
pub fn activate<M, V>(
    map: &M,
    view: &V,
    popup: &InfoPopupController,
    filter: &RefCell<ActiveLayerFilter>,
    cfg: &SiteConfig,
    name: &str,
) -> Activation
where
    M: MapWidget,
    V: InfoPopupView + SidebarView,
{
    if popup.trigger().as_deref() == Some(name) {
        popup.close(view);
        toggle_filter(map, filter, name);
        return Activation::Closed;
    }

    toggle_filter(map, filter, name);

    let show_locations = !cfg.is_transit(name);
    let mut title = view.control_label(name).unwrap_or_else(|| name.to_string());
    if cfg.is_program(name) {
        title.push_str(" Program");
    }
    let token = popup.open_loading(view, &cfg.popup, &title, name.to_string(), show_locations);
    Activation::Opened {
        token,
        show_locations,
    }
}

/// "About" markup for layer `name` from the descriptions table.
pub async fn fetch_description<M: MapWidget>(
    map: &M,
    cfg: &SiteConfig,
    name: &str,
) -> Result<String, InteractionError> {
    let table = &cfg.descriptions;
    let Some(id) = map.find_table(&table.table) else {
        return Ok(NO_DESCRIPTION.to_string());
    };
    let query = FeatureQuery::filtered(PropertyFilter::eq(&table.key_field, name))
        .with_fields([table.description_field.as_str()])
        .without_geometry();
    let rows = map.query_table(id, &query).await?;
    let description = rows
        .first()
        .and_then(|f| f.attr(&table.description_field))
        .filter(|v| is_present(v))
        .map(display_text);
    Ok(description.unwrap_or_else(|| NO_DESCRIPTION.to_string()))
}

/// "Locations" markup: one entry per feature of layer `name`.
pub async fn fetch_locations<M: MapWidget>(
    map: &M,
    cfg: &SiteConfig,
    name: &str,
) -> Result<String, InteractionError> {
    let Some(layer) = map.find_layer(name) else {
        return Err(InteractionError::not_found("layer", name));
    };
    let features = map.query_features(layer, &FeatureQuery::all()).await?;
    if features.is_empty() {
        return Ok(NO_LOCATIONS.to_string());
    }

    let info = map.layer_info(layer);
    let resolve = |f: &layers::Feature, alias: &str| {
        attr_by_alias_or_name(f, name, alias, &cfg.alias_overrides)
            .map(display_text)
            .unwrap_or_else(|| "N/A".to_string())
    };
    let rows: Vec<(String, String)> = features
        .into_iter()
        .map(|f| match (&f.layer, &info) {
            (None, Some(info)) => f.with_layer(info.clone()),
            _ => f,
        })
        .map(|f| (resolve(&f, "Location"), resolve(&f, "Address")))
        .collect();
    Ok(locations_list(
        rows.iter().map(|(l, a)| (l.as_str(), a.as_str())),
    ))
}

/// Second phase of an activation: each section is replaced as soon as its
/// own fetch settles, independently of the other.
pub async fn fill<M, V>(
    map: &M,
    view: &V,
    popup: &InfoPopupController,
    cfg: &SiteConfig,
    token: RequestToken,
    name: &str,
    show_locations: bool,
) where
    M: MapWidget,
    V: InfoPopupView,
{
    let about = async {
        let html = match fetch_description(map, cfg, name).await {
            Ok(html) => html,
            Err(err) => {
                error!(layer = name, "failed to query descriptions table: {err}");
                DESCRIPTION_ERROR.to_string()
            }
        };
        popup.fill_section(view, token, Section::About, html);
    };

    let locations = async {
        if !show_locations {
            return;
        }
        let html = match fetch_locations(map, cfg, name).await {
            Ok(html) => html,
            Err(InteractionError::NotFound { .. }) => {
                warn!(layer = name, "no layer to list locations from");
                String::new()
            }
            Err(err) => {
                error!(layer = name, "failed to query layer for locations: {err}");
                LOCATIONS_ERROR.to_string()
            }
        };
        popup.fill_section(view, token, Section::Locations, html);
    };

    futures::join!(about, locations);
}

#[cfg(test)]
mod tests {
    use super::{Activation, activate, fetch_locations, fill};
    use crate::config::SiteConfig;
    use crate::content::{DESCRIPTION_ERROR, LOCATIONS_ERROR, NO_DESCRIPTION, NO_LOCATIONS};
    use crate::info_popup::InfoPopupController;
    use crate::testing::{FakeMap, FakeSurface};
    use futures::executor::{LocalPool, block_on};
    use futures::task::LocalSpawnExt;
    use layers::{ActiveLayerFilter, Feature, Field, FieldSchema, MapError};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn row(v: serde_json::Value) -> Feature {
        Feature::new(v.as_object().cloned().unwrap_or_default())
    }

    fn clpr_map() -> FakeMap {
        let map = FakeMap::new();
        map.add_layer("Parks", None);
        let clpr = map.add_layer(
            "CLPR",
            Some(FieldSchema::new(vec![
                Field::new("Name", "Site"),
                Field::new("ADDR", "Address"),
            ])),
        );
        map.add_layer("NEXTREX", None);
        map.set_features(
            clpr,
            vec![
                row(json!({"Name": "Youth Center", "ADDR": "405 Alhambra Cir"})),
                row(json!({"Name": "Library"})),
            ],
        );
        map.add_table(
            "Layer Descriptions",
            Ok(vec![
                row(json!({"LAYER_NAME": "CLPR", "Description": "<p>Clean Litter Pick-up.</p>"})),
                row(json!({"LAYER_NAME": "NEXTREX", "Description": "<p>Plastic film.</p>"})),
            ]),
        );
        map
    }

    fn open(popup: &InfoPopupController, view: &FakeSurface, map: &FakeMap, name: &str) -> Activation {
        let filter = RefCell::new(ActiveLayerFilter::new());
        activate(map, view, popup, &filter, &SiteConfig::default(), name)
    }

    fn opened_token(a: Activation) -> foundation::ids::RequestToken {
        match a {
            Activation::Opened { token, .. } => token,
            Activation::Closed => panic!("expected the popup to open"),
        }
    }

    #[test]
    fn fills_description_and_locations() {
        let map = clpr_map();
        let view = FakeSurface::new();
        let popup = InfoPopupController::new();
        let token = opened_token(open(&popup, &view, &map, "CLPR"));

        block_on(fill(&map, &view, &popup, &SiteConfig::default(), token, "CLPR", true));
        let body = view.popup_body.borrow().clone();
        assert!(body.contains("<p>Clean Litter Pick-up.</p>"));
        assert!(body.contains("<li>Youth Center | <i>405 Alhambra Cir</i></li>"));
        assert!(body.contains("<li>Library | <i>N/A</i></li>"));

        let q = map.table_queries.borrow()[0].clone();
        assert_eq!(q.where_clause(), "LAYER_NAME = 'CLPR'");
        assert_eq!(q.out_fields_list(), vec!["Description".to_string()]);
        assert!(!q.return_geometry);
    }

    #[test]
    fn description_failure_leaves_locations_intact() {
        let map = FakeMap::new();
        let id = map.add_layer("NEXTREX", Some(FieldSchema::new(vec![Field::new("LOC", "Location")])));
        map.set_features(id, vec![row(json!({"LOC": "Publix"}))]);
        map.add_table("Layer Descriptions", Err(MapError::Query("timeout".into())));
        let view = FakeSurface::new();
        let popup = InfoPopupController::new();
        let token = opened_token(open(&popup, &view, &map, "NEXTREX"));

        block_on(fill(&map, &view, &popup, &SiteConfig::default(), token, "NEXTREX", true));
        let body = view.popup_body.borrow().clone();
        assert!(body.contains(DESCRIPTION_ERROR));
        assert!(body.contains("<li>Publix | <i>N/A</i></li>"));
    }

    #[test]
    fn locations_failure_leaves_description_intact() {
        let map = clpr_map();
        let clpr = map.stack_id("CLPR");
        map.fail_features(clpr, MapError::Query("500".into()));
        let view = FakeSurface::new();
        let popup = InfoPopupController::new();
        let token = opened_token(open(&popup, &view, &map, "CLPR"));

        block_on(fill(&map, &view, &popup, &SiteConfig::default(), token, "CLPR", true));
        let body = view.popup_body.borrow().clone();
        assert!(body.contains("<p>Clean Litter Pick-up.</p>"));
        assert!(body.contains(LOCATIONS_ERROR));
    }

    #[test]
    fn sections_update_as_each_fetch_settles() {
        let mut pool = LocalPool::new();
        let map = Rc::new(clpr_map());
        let table = map.table_id("Layer Descriptions");
        let gate = map.gate_table(table);
        let view = Rc::new(FakeSurface::new());
        let popup = Rc::new(InfoPopupController::new());
        let token = opened_token(open(&popup, &view, &map, "CLPR"));

        let (m, v, p) = (map.clone(), view.clone(), popup.clone());
        pool.spawner()
            .spawn_local(async move {
                fill(m.as_ref(), v.as_ref(), p.as_ref(), &SiteConfig::default(), token, "CLPR", true).await;
            })
            .expect("spawn");
        pool.run_until_stalled();
        {
            let body = view.popup_body.borrow();
            assert!(body.contains("Loading description..."));
            assert!(body.contains("Youth Center"));
        }

        gate.send(()).expect("gate");
        pool.run_until_stalled();
        assert!(view.popup_body.borrow().contains("Clean Litter Pick-up."));
    }

    #[test]
    fn missing_table_and_empty_layer_placeholders() {
        let map = FakeMap::new();
        map.add_layer("LITTER_KIT", None);
        let view = FakeSurface::new();
        let popup = InfoPopupController::new();
        let token = opened_token(open(&popup, &view, &map, "LITTER_KIT"));

        block_on(fill(&map, &view, &popup, &SiteConfig::default(), token, "LITTER_KIT", true));
        let body = view.popup_body.borrow().clone();
        assert!(body.contains(NO_DESCRIPTION));
        assert!(body.contains(NO_LOCATIONS));
    }

    #[test]
    fn missing_layer_is_not_found() {
        let map = FakeMap::new();
        let r = block_on(fetch_locations(&map, &SiteConfig::default(), "GONE"));
        assert!(matches!(r, Err(crate::error::InteractionError::NotFound { .. })));
    }

    #[test]
    fn same_control_twice_closes_and_restores_layers() {
        let map = clpr_map();
        let view = FakeSurface::new();
        view.add_control("CLPR", "Clean-up", Some("Ongoing programs"));
        let popup = InfoPopupController::new();
        let filter = RefCell::new(ActiveLayerFilter::new());
        let cfg = SiteConfig::default();

        let first = activate(&map, &view, &popup, &filter, &cfg, "CLPR");
        assert!(matches!(first, Activation::Opened { show_locations: true, .. }));
        assert_eq!(*view.popup_title.borrow(), "Clean-up Program");
        assert_eq!(map.stack.visible_titles(), ["CLPR"]);

        let second = activate(&map, &view, &popup, &filter, &cfg, "CLPR");
        assert_eq!(second, Activation::Closed);
        assert!(!popup.is_open());
        assert_eq!(map.stack.visible_titles(), ["Parks", "CLPR", "NEXTREX"]);
    }

    #[test]
    fn different_control_switches_filter_and_trigger() {
        let map = clpr_map();
        let view = FakeSurface::new();
        let popup = InfoPopupController::new();
        let filter = RefCell::new(ActiveLayerFilter::new());
        let cfg = SiteConfig::default();

        activate(&map, &view, &popup, &filter, &cfg, "CLPR");
        activate(&map, &view, &popup, &filter, &cfg, "NEXTREX");
        assert_eq!(map.stack.visible_titles(), ["NEXTREX"]);
        assert_eq!(popup.trigger().as_deref(), Some("NEXTREX"));
        assert_eq!(*view.popup_title.borrow(), "NEXTREX Program");
    }
}
