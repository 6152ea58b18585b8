//! Bindings to the hosted mapping widget and the `MapWidget` adapter over them.

use std::rc::Rc;

use foundation::bounds::Point2;
use foundation::handles::Disposer;
use js_sys::{Array, Object, Promise, Reflect};
use layers::{
    Attributes, Feature, FeatureQuery, Field, FieldSchema, HitResult, LayerId, LayerInfo,
    LayerStack, MapError, MapWidget, TableId,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(extends = Object)]
    #[derive(Debug, Clone)]
    pub type MapView;

    #[wasm_bindgen(method, getter)]
    pub fn map(this: &MapView) -> WebMap;

    #[wasm_bindgen(method, getter)]
    pub fn popup(this: &MapView) -> JsValue;

    #[wasm_bindgen(method, js_name = whenLayerView)]
    pub fn when_layer_view(this: &MapView, layer: &FeatureLayer) -> Promise;

    #[wasm_bindgen(method, js_name = hitTest)]
    pub fn hit_test(this: &MapView, screen_point: &JsValue) -> Promise;

    #[wasm_bindgen(method)]
    pub fn on(this: &MapView, event: &str, handler: &js_sys::Function) -> Handle;

    #[wasm_bindgen(extends = Object)]
    #[derive(Debug, Clone)]
    pub type WebMap;

    #[wasm_bindgen(method, getter)]
    pub fn layers(this: &WebMap) -> Collection;

    #[wasm_bindgen(method, getter)]
    pub fn tables(this: &WebMap) -> Collection;

    #[wasm_bindgen(method)]
    pub fn reorder(this: &WebMap, layer: &FeatureLayer, index: usize);

    #[wasm_bindgen(method)]
    pub fn load(this: &WebMap) -> Promise;

    #[wasm_bindgen(extends = Object)]
    #[derive(Debug, Clone)]
    pub type Collection;

    #[wasm_bindgen(method, js_name = toArray)]
    pub fn to_array(this: &Collection) -> Array;

    #[wasm_bindgen(method, js_name = indexOf)]
    pub fn index_of(this: &Collection, item: &JsValue) -> i32;

    /// Feature layers and standalone tables share this shape.
    #[wasm_bindgen(extends = Object)]
    #[derive(Debug, Clone)]
    pub type FeatureLayer;

    #[wasm_bindgen(method, getter)]
    pub fn title(this: &FeatureLayer) -> Option<String>;

    #[wasm_bindgen(method, getter)]
    pub fn visible(this: &FeatureLayer) -> bool;

    #[wasm_bindgen(method, setter)]
    pub fn set_visible(this: &FeatureLayer, visible: bool);

    #[wasm_bindgen(method, getter)]
    pub fn fields(this: &FeatureLayer) -> JsValue;

    #[wasm_bindgen(method, getter, js_name = objectIdField)]
    pub fn object_id_field(this: &FeatureLayer) -> Option<String>;

    #[wasm_bindgen(method, setter, js_name = outFields)]
    pub fn set_out_fields(this: &FeatureLayer, fields: &Array);

    #[wasm_bindgen(method, js_name = queryFeatures)]
    pub fn query_features(this: &FeatureLayer, query: &JsValue) -> Promise;

    #[wasm_bindgen(extends = Object)]
    #[derive(Debug, Clone)]
    pub type LayerView;

    #[wasm_bindgen(method)]
    pub fn highlight(this: &LayerView, target: &JsValue) -> Handle;

    #[wasm_bindgen(extends = Object)]
    #[derive(Debug, Clone)]
    pub type Handle;

    #[wasm_bindgen(method)]
    pub fn remove(this: &Handle);
}

/// Best-effort message out of a rejected promise.
pub fn js_error(err: &JsValue) -> String {
    if let Some(s) = err.as_string() {
        return s;
    }
    Reflect::get(err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{err:?}"))
}

/// Converts a plain (or `toJSON`-capable) JS value through its JSON form.
fn from_js<T: DeserializeOwned>(value: &JsValue) -> Result<T, String> {
    let text: String = js_sys::JSON::stringify(value)
        .map_err(|e| js_error(&e))?
        .into();
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, String> {
    let text = serde_json::to_string(value).map_err(|e| e.to_string())?;
    js_sys::JSON::parse(&text).map_err(|e| js_error(&e))
}

fn get(target: &JsValue, key: &str) -> JsValue {
    Reflect::get(target, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryParams {
    #[serde(rename = "where")]
    where_clause: String,
    out_fields: Vec<String>,
    return_geometry: bool,
}

impl From<&FeatureQuery> for QueryParams {
    fn from(q: &FeatureQuery) -> Self {
        Self {
            where_clause: q.where_clause(),
            out_fields: q.out_fields_list(),
            return_geometry: q.return_geometry,
        }
    }
}

#[derive(Debug)]
struct LayerEntry {
    layer: FeatureLayer,
    info: Rc<LayerInfo>,
    object_id_field: Option<String>,
}

#[derive(Debug)]
struct TableEntry {
    id: TableId,
    title: String,
    table: FeatureLayer,
    object_id_field: Option<String>,
}

/// Layers and tables of one map view, registered once the map has loaded.
#[derive(Debug)]
pub struct ArcGisMap {
    view: MapView,
    webmap: WebMap,
    layers: Vec<LayerEntry>,
    tables: Vec<TableEntry>,
}

fn schema_of(layer: &FeatureLayer) -> Option<FieldSchema> {
    let fields = layer.fields();
    if fields.is_null() || fields.is_undefined() {
        return None;
    }
    match from_js::<Vec<Field>>(&fields) {
        Ok(fields) => Some(FieldSchema::new(fields)),
        Err(err) => {
            tracing::warn!("arcgis: unreadable field schema: {err}");
            None
        }
    }
}

impl ArcGisMap {
    /// Registers every operational layer and table of the view's map.
    ///
    /// Feature layers are switched to fetch all attributes so popup and
    /// list contents can read any field.
    pub fn new(view: MapView) -> Self {
        let webmap = view.map();
        let all_fields = Array::of1(&JsValue::from_str("*"));

        let layers = webmap
            .layers()
            .to_array()
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let layer: FeatureLayer = value.unchecked_into();
                layer.set_out_fields(&all_fields);
                let info = Rc::new(LayerInfo {
                    id: LayerId(i as u64),
                    title: layer.title().unwrap_or_default(),
                    fields: schema_of(&layer),
                });
                LayerEntry {
                    object_id_field: layer.object_id_field(),
                    layer,
                    info,
                }
            })
            .collect::<Vec<_>>();

        let tables = webmap
            .tables()
            .to_array()
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let table: FeatureLayer = value.unchecked_into();
                TableEntry {
                    id: TableId(i as u64),
                    title: table.title().unwrap_or_default(),
                    object_id_field: table.object_id_field(),
                    table,
                }
            })
            .collect::<Vec<_>>();

        tracing::info!(
            "arcgis: registered {} layers and {} tables",
            layers.len(),
            tables.len()
        );
        Self {
            view,
            webmap,
            layers,
            tables,
        }
    }

    pub fn view(&self) -> &MapView {
        &self.view
    }

    fn entry(&self, id: LayerId) -> Option<&LayerEntry> {
        self.layers.iter().find(|e| e.info.id == id)
    }

    fn entry_for(&self, layer: &JsValue) -> Option<&LayerEntry> {
        self.layers
            .iter()
            .find(|e| Object::is(e.layer.as_ref(), layer))
    }

    /// Disables the widget's built-in popup so map clicks are handled here.
    pub fn disable_builtin_popup(&self) {
        let popup = self.view.popup();
        if popup.is_object() {
            let _ = Reflect::set(
                &popup,
                &JsValue::from_str("autoOpenEnabled"),
                &JsValue::FALSE,
            );
        }
    }
}

fn feature_from_graphic(
    graphic: &JsValue,
    object_id_field: Option<&str>,
    layer: Option<Rc<LayerInfo>>,
) -> Feature {
    let attributes: Attributes = match from_js(&get(graphic, "attributes")) {
        Ok(attrs) => attrs,
        Err(err) => {
            tracing::warn!("arcgis: unreadable graphic attributes: {err}");
            Attributes::new()
        }
    };
    let object_id = object_id_field
        .and_then(|f| attributes.get(f))
        .and_then(|v| v.as_i64());
    let mut feature = Feature::new(attributes);
    if let Some(id) = object_id {
        feature = feature.with_object_id(id);
    }
    if let Some(layer) = layer {
        feature = feature.with_layer(layer);
    }
    feature
}

async fn run_query(
    layer: &FeatureLayer,
    query: &FeatureQuery,
    object_id_field: Option<&str>,
    info: Option<Rc<LayerInfo>>,
) -> Result<Vec<Feature>, MapError> {
    let params = to_js(&QueryParams::from(query)).map_err(MapError::Query)?;
    let result = JsFuture::from(layer.query_features(&params))
        .await
        .map_err(|e| MapError::Query(js_error(&e)))?;
    let graphics: Array = get(&result, "features").dyn_into().unwrap_or_default();
    Ok(graphics
        .iter()
        .map(|g| feature_from_graphic(&g, object_id_field, info.clone()))
        .collect())
}

impl LayerStack for ArcGisMap {
    fn find_layer(&self, title: &str) -> Option<LayerId> {
        self.layers
            .iter()
            .find(|e| e.info.title == title)
            .map(|e| e.info.id)
    }

    fn layer_ids(&self) -> Vec<LayerId> {
        self.webmap
            .layers()
            .to_array()
            .iter()
            .filter_map(|l| self.entry_for(&l).map(|e| e.info.id))
            .collect()
    }

    fn layer_index(&self, id: LayerId) -> Option<usize> {
        let entry = self.entry(id)?;
        usize::try_from(self.webmap.layers().index_of(entry.layer.as_ref())).ok()
    }

    fn reorder(&self, id: LayerId, index: usize) {
        if let Some(entry) = self.entry(id) {
            self.webmap.reorder(&entry.layer, index);
        }
    }

    fn is_visible(&self, id: LayerId) -> bool {
        self.entry(id).is_some_and(|e| e.layer.visible())
    }

    fn set_visible(&self, id: LayerId, visible: bool) {
        if let Some(entry) = self.entry(id) {
            entry.layer.set_visible(visible);
        }
    }

    fn layer_info(&self, id: LayerId) -> Option<Rc<LayerInfo>> {
        self.entry(id).map(|e| e.info.clone())
    }
}

impl MapWidget for ArcGisMap {
    type View = LayerView;

    async fn layer_view(&self, id: LayerId) -> Result<LayerView, MapError> {
        let entry = self
            .entry(id)
            .ok_or_else(|| MapError::NotFound(format!("layer {}", id.0)))?;
        let view = JsFuture::from(self.view.when_layer_view(&entry.layer))
            .await
            .map_err(|e| MapError::View(js_error(&e)))?;
        Ok(view.unchecked_into())
    }

    async fn query_features(
        &self,
        id: LayerId,
        query: &FeatureQuery,
    ) -> Result<Vec<Feature>, MapError> {
        let entry = self
            .entry(id)
            .ok_or_else(|| MapError::NotFound(format!("layer {}", id.0)))?;
        run_query(
            &entry.layer,
            query,
            entry.object_id_field.as_deref(),
            Some(entry.info.clone()),
        )
        .await
    }

    fn highlight(&self, view: &LayerView, features: &[Feature]) -> Option<Disposer> {
        let ids = features
            .iter()
            .filter_map(|f| f.object_id)
            .map(|id| JsValue::from_f64(id as f64))
            .collect::<Array>();
        if ids.length() == 0 {
            return None;
        }
        let handle = view.highlight(ids.as_ref());
        Some(Disposer::new(move || handle.remove()))
    }

    fn find_table(&self, title: &str) -> Option<TableId> {
        self.tables.iter().find(|t| t.title == title).map(|t| t.id)
    }

    async fn query_table(
        &self,
        table: TableId,
        query: &FeatureQuery,
    ) -> Result<Vec<Feature>, MapError> {
        let entry = self
            .tables
            .iter()
            .find(|t| t.id == table)
            .ok_or_else(|| MapError::NotFound(format!("table {}", table.0)))?;
        run_query(&entry.table, query, entry.object_id_field.as_deref(), None).await
    }

    async fn hit_test(&self, at: Point2) -> Result<Vec<HitResult>, MapError> {
        let point = Object::new();
        let _ = Reflect::set(&point, &"x".into(), &JsValue::from_f64(at.x));
        let _ = Reflect::set(&point, &"y".into(), &JsValue::from_f64(at.y));
        let response = JsFuture::from(self.view.hit_test(point.as_ref()))
            .await
            .map_err(|e| MapError::HitTest(js_error(&e)))?;
        let results: Array = get(&response, "results").dyn_into().unwrap_or_default();

        let mut hits = Vec::with_capacity(results.length() as usize);
        for result in results.iter() {
            let graphic = get(&result, "graphic");
            if !graphic.is_object() {
                hits.push(HitResult { feature: None });
                continue;
            }
            let entry = self.entry_for(&get(&graphic, "layer"));
            let feature = feature_from_graphic(
                &graphic,
                entry.and_then(|e| e.object_id_field.as_deref()),
                entry.map(|e| e.info.clone()),
            );
            hits.push(HitResult {
                feature: Some(feature),
            });
        }
        Ok(hits)
    }
}
