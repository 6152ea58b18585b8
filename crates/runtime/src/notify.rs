use std::pin::Pin;
use std::task::{Context, Poll};

use foundation::handles::Disposer;
use futures::Stream;
use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};

/// Producer half: one call per observed change.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: UnboundedSender<()>,
}

impl Notifier {
    /// Returns `false` once the receiving side has been dropped.
    pub fn notify(&self) -> bool {
        self.tx.unbounded_send(()).is_ok()
    }
}

/// Stream of change notifications.
///
/// Owns the registration that feeds it: dropping the stream releases the
/// guard (for example disconnecting a `MutationObserver`).
#[derive(Debug)]
pub struct Notifications {
    rx: UnboundedReceiver<()>,
    _guard: Disposer,
}

/// Creates a connected pair. `guard` is released when the stream is dropped.
pub fn notifications(guard: Disposer) -> (Notifier, Notifications) {
    let (tx, rx) = unbounded();
    (Notifier { tx }, Notifications { rx, _guard: guard })
}

impl Stream for Notifications {
    type Item = ();

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<()>> {
        Pin::new(&mut self.rx).poll_next(cx)
    }
}
