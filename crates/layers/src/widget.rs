use std::future::Future;

use foundation::bounds::Point2;
use foundation::handles::Disposer;

use crate::feature::Feature;
use crate::layer::{LayerId, TableId};
use crate::query::FeatureQuery;
use crate::stack::LayerStack;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    NotFound(String),
    View(String),
    Query(String),
    HitTest(String),
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::NotFound(what) => write!(f, "not found: {what}"),
            MapError::View(msg) => write!(f, "layer view unavailable: {msg}"),
            MapError::Query(msg) => write!(f, "feature query failed: {msg}"),
            MapError::HitTest(msg) => write!(f, "hit test failed: {msg}"),
        }
    }
}

impl std::error::Error for MapError {}

/// One ranked hit-test result.
#[derive(Debug, Clone, PartialEq)]
pub struct HitResult {
    /// `None` for hits that are not graphics (e.g. basemap).
    pub feature: Option<Feature>,
}

/// The host mapping widget, as consumed by the interaction layer.
///
/// Everything asynchronous here is a suspension point for the caller.
pub trait MapWidget: LayerStack {
    /// Materialised, renderable view of one layer.
    type View: 'static;

    fn layer_view(&self, id: LayerId) -> impl Future<Output = Result<Self::View, MapError>>;

    fn query_features(
        &self,
        id: LayerId,
        query: &FeatureQuery,
    ) -> impl Future<Output = Result<Vec<Feature>, MapError>>;

    /// Applies the widget's highlight effect; disposing the handle removes it.
    /// `None` when none of `features` can be highlighted.
    fn highlight(&self, view: &Self::View, features: &[Feature]) -> Option<Disposer>;

    fn find_table(&self, title: &str) -> Option<TableId>;

    fn query_table(
        &self,
        table: TableId,
        query: &FeatureQuery,
    ) -> impl Future<Output = Result<Vec<Feature>, MapError>>;

    /// Ranked results under a screen point.
    fn hit_test(&self, at: Point2) -> impl Future<Output = Result<Vec<HitResult>, MapError>>;
}
