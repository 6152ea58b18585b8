use std::cell::RefCell;

use foundation::handles::Disposer;
use foundation::ids::{RequestToken, TokenCounter};
use layers::{Displacement, FeatureQuery, LayerId, LayerOrder, MapWidget};
use tracing::{debug, warn};

use crate::error::InteractionError;

/// A request that has taken its token and lifted its layer but not yet
/// resolved the layer's features.
#[derive(Debug)]
#[must_use]
pub struct PendingHighlight {
    token: RequestToken,
    layer: LayerId,
    name: String,
}

impl PendingHighlight {
    pub fn layer(&self) -> LayerId {
        self.layer
    }
}

/// Owns the single active feature highlight.
///
/// Requests are never blocked: each one takes a fresh token and every
/// resumption after a suspension point compares it with the counter, so the
/// last issued request (or a clear) always wins.
#[derive(Debug, Default)]
pub struct HighlightCoordinator {
    tokens: TokenCounter,
    order: RefCell<LayerOrder>,
    active: RefCell<Option<Disposer>>,
}

impl HighlightCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.borrow().is_some()
    }

    /// The layer currently lifted to the top, if any.
    pub fn displaced(&self) -> Option<Displacement> {
        self.order.borrow().memo()
    }

    /// Highlights every feature of the layer titled `name`.
    ///
    /// Returns the number of highlighted features.
    pub async fn highlight<M: MapWidget>(
        &self,
        map: &M,
        name: &str,
    ) -> Result<usize, InteractionError> {
        let pending = self.begin(map, name)?;
        self.complete(map, pending).await
    }

    /// Synchronous half of a request: takes the token, drops the previous
    /// highlight and lifts the layer. Anything issued after this returns
    /// (including a clear) supersedes the request.
    pub fn begin<M: MapWidget>(
        &self,
        map: &M,
        name: &str,
    ) -> Result<PendingHighlight, InteractionError> {
        let token = self.tokens.issue();
        self.release(map);

        let Some(layer) = map.find_layer(name) else {
            warn!(layer = name, "layer not found");
            return Err(InteractionError::not_found("layer", name));
        };
        self.order.borrow_mut().displace(map, layer, token);
        Ok(PendingHighlight {
            token,
            layer,
            name: name.to_string(),
        })
    }

    /// Awaits the layer view and its features, then applies the highlight
    /// if `pending` is still the latest request.
    pub async fn complete<M: MapWidget>(
        &self,
        map: &M,
        pending: PendingHighlight,
    ) -> Result<usize, InteractionError> {
        let PendingHighlight { token, layer, name } = pending;
        self.ensure_current(map, token)?;

        let view = match map.layer_view(layer).await {
            Ok(view) => view,
            Err(err) => return Err(self.abandon(map, token, err.into())),
        };
        self.ensure_current(map, token)?;

        let features = match map.query_features(layer, &FeatureQuery::all()).await {
            Ok(features) => features,
            Err(err) => return Err(self.abandon(map, token, err.into())),
        };
        self.ensure_current(map, token)?;

        if features.is_empty() {
            debug!(layer = %name, "layer has no features");
            return Ok(0);
        }
        let Some(handle) = map.highlight(&view, &features) else {
            warn!(layer = %name, "features carry no object ids, nothing highlighted");
            return Ok(0);
        };
        *self.active.borrow_mut() = Some(handle);
        debug!(layer = %name, features = features.len(), "highlight applied");
        Ok(features.len())
    }

    /// Cancels in-flight requests, removes the highlight and puts any
    /// displaced layer back. Safe to call at any time.
    pub fn clear<M: MapWidget>(&self, map: &M) {
        self.tokens.invalidate();
        self.release(map);
    }

    fn release<M: MapWidget>(&self, map: &M) {
        if let Some(handle) = self.active.borrow_mut().take() {
            handle.dispose();
        }
        self.order.borrow_mut().restore(map);
    }

    fn ensure_current<M: MapWidget>(
        &self,
        map: &M,
        token: RequestToken,
    ) -> Result<(), InteractionError> {
        if self.tokens.is_current(token) {
            return Ok(());
        }
        self.order.borrow_mut().restore_if_owned(map, token);
        Err(InteractionError::Stale)
    }

    fn abandon<M: MapWidget>(
        &self,
        map: &M,
        token: RequestToken,
        err: InteractionError,
    ) -> InteractionError {
        self.order.borrow_mut().restore_if_owned(map, token);
        if !self.tokens.is_current(token) {
            return InteractionError::Stale;
        }
        warn!("highlight request failed: {err}");
        err
    }
}
