use foundation::ids::RequestToken;
use tracing::debug;

use crate::layer::LayerId;
use crate::stack::LayerStack;

/// A layer temporarily lifted to the top of the render order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Displacement {
    pub layer: LayerId,
    pub original_index: usize,
    /// Request that performed the move.
    pub owner: RequestToken,
}

/// Remembers at most one displaced layer and puts it back on demand.
///
/// Invariant: `memo` is `Some` iff a layer currently sits away from its
/// natural index.
#[derive(Debug, Default)]
pub struct LayerOrder {
    memo: Option<Displacement>,
}

impl LayerOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn memo(&self) -> Option<Displacement> {
        self.memo
    }

    pub fn is_displaced(&self) -> bool {
        self.memo.is_some()
    }

    /// Moves `layer` to the top of `stack` and records where it came from.
    ///
    /// Records once per displacement episode: while a memo is held, further
    /// calls are ignored. Already-topmost layers are left alone.
    /// Returns `true` if the layer was moved.
    pub fn displace(&mut self, stack: &impl LayerStack, layer: LayerId, owner: RequestToken) -> bool {
        if self.memo.is_some() {
            return false;
        }
        let (Some(original_index), Some(top)) = (stack.layer_index(layer), stack.top_index()) else {
            return false;
        };
        if original_index == top {
            return false;
        }
        stack.reorder(layer, top);
        self.memo = Some(Displacement {
            layer,
            original_index,
            owner,
        });
        debug!(layer = layer.0, original_index, "moved layer to top");
        true
    }

    /// Puts the displaced layer back and clears the memo.
    pub fn restore(&mut self, stack: &impl LayerStack) -> Option<Displacement> {
        let memo = self.memo.take()?;
        stack.reorder(memo.layer, memo.original_index);
        debug!(layer = memo.layer.0, index = memo.original_index, "restored layer order");
        Some(memo)
    }

    /// Restores only a displacement recorded by `owner`.
    pub fn restore_if_owned(&mut self, stack: &impl LayerStack, owner: RequestToken) -> bool {
        if self.memo.is_some_and(|m| m.owner == owner) {
            return self.restore(stack).is_some();
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::LayerOrder;
    use crate::stack::{InMemoryLayerStack, LayerStack};
    use foundation::ids::RequestToken;

    fn stack() -> InMemoryLayerStack {
        let s = InMemoryLayerStack::new();
        for t in ["base", "CLPR", "NEXTREX", "LITTER_KIT"] {
            s.push(t, None);
        }
        s
    }

    #[test]
    fn restore_returns_layer_to_exact_index() {
        let s = stack();
        let clpr = s.find_layer("CLPR").unwrap();
        let mut order = LayerOrder::new();
        assert!(order.displace(&s, clpr, RequestToken::new(1)));
        assert_eq!(s.layer_index(clpr), Some(3));
        assert!(order.restore(&s).is_some());
        assert_eq!(s.titles(), vec!["base", "CLPR", "NEXTREX", "LITTER_KIT"]);
    }

    #[test]
    fn second_restore_is_noop() {
        let s = stack();
        let clpr = s.find_layer("CLPR").unwrap();
        let mut order = LayerOrder::new();
        order.displace(&s, clpr, RequestToken::new(1));
        assert!(order.restore(&s).is_some());
        assert!(order.restore(&s).is_none());
        assert_eq!(s.layer_index(clpr), Some(1));
    }

    #[test]
    fn double_displace_keeps_first_index() {
        let s = stack();
        let clpr = s.find_layer("CLPR").unwrap();
        let mut order = LayerOrder::new();
        order.displace(&s, clpr, RequestToken::new(1));
        assert!(!order.displace(&s, clpr, RequestToken::new(2)));
        assert_eq!(order.memo().map(|m| m.original_index), Some(1));
        assert_eq!(order.memo().map(|m| m.owner), Some(RequestToken::new(1)));
    }

    #[test]
    fn topmost_layer_is_not_recorded() {
        let s = stack();
        let top = s.find_layer("LITTER_KIT").unwrap();
        let mut order = LayerOrder::new();
        assert!(!order.displace(&s, top, RequestToken::new(1)));
        assert!(!order.is_displaced());
    }

    #[test]
    fn restore_if_owned_ignores_other_owners() {
        let s = stack();
        let clpr = s.find_layer("CLPR").unwrap();
        let mut order = LayerOrder::new();
        order.displace(&s, clpr, RequestToken::new(2));
        assert!(!order.restore_if_owned(&s, RequestToken::new(1)));
        assert!(order.is_displaced());
        assert!(order.restore_if_owned(&s, RequestToken::new(2)));
        assert!(!order.is_displaced());
    }
}
