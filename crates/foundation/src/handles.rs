/// Release handle for a registration (listener, highlight, observer).
///
/// The release closure runs exactly once: on `dispose` or on drop.
pub struct Disposer(Option<Box<dyn FnOnce()>>);

impl Disposer {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Disposer(Some(Box::new(release)))
    }

    /// A handle that owns `value` and releases it by dropping it.
    pub fn holding<T: 'static>(value: T) -> Self {
        Disposer::new(move || drop(value))
    }

    pub fn noop() -> Self {
        Disposer(None)
    }

    pub fn dispose(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

impl Drop for Disposer {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Disposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Disposer")
            .field(&if self.0.is_some() { "armed" } else { "released" })
            .finish()
    }
}

/// Handles released together when a view is torn down.
#[derive(Debug, Default)]
pub struct DisposerSet {
    items: Vec<Disposer>,
}

impl DisposerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, d: Disposer) {
        self.items.push(d);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Releases in reverse registration order.
    pub fn clear(&mut self) {
        while let Some(d) = self.items.pop() {
            d.dispose();
        }
    }
}

impl Extend<Disposer> for DisposerSet {
    fn extend<I: IntoIterator<Item = Disposer>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl Drop for DisposerSet {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{Disposer, DisposerSet};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn dispose_runs_release_once() {
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        let d = Disposer::new(move || *h.borrow_mut() += 1);
        d.dispose();
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn drop_releases() {
        let hits = Rc::new(RefCell::new(0));
        {
            let h = hits.clone();
            let _d = Disposer::new(move || *h.borrow_mut() += 1);
        }
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn set_releases_in_reverse_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut set = DisposerSet::new();
        for i in 0..3 {
            let l = log.clone();
            set.push(Disposer::new(move || l.borrow_mut().push(i)));
        }
        assert_eq!(set.len(), 3);
        set.clear();
        assert!(set.is_empty());
        assert_eq!(*log.borrow(), vec![2, 1, 0]);
    }

    #[test]
    fn extend_skips_missing_handles() {
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        let mut set = DisposerSet::new();
        set.extend(Some(Disposer::new(move || *h.borrow_mut() += 1)));
        set.extend(None);
        assert_eq!(set.len(), 1);
        drop(set);
        assert_eq!(*hits.borrow(), 1);
    }
}
