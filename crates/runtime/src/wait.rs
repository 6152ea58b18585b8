use std::future::Future;
use std::pin::pin;

use futures::future::{Either, select};
use futures::{Stream, StreamExt};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Ready,
    TimedOut,
    /// The notification source went away before the condition held.
    Disconnected,
}

/// Timeout-bounded wait on an observed condition.
///
/// `ready` is evaluated once up front and again after every notification.
/// The notification stream is dropped on every exit path, which releases
/// whatever registration feeds it.
pub async fn wait_until<N, T, F>(notifications: N, timeout: T, mut ready: F) -> WaitOutcome
where
    N: Stream<Item = ()> + Unpin,
    T: Future<Output = ()>,
    F: FnMut() -> bool,
{
    let mut notifications = notifications;
    if ready() {
        return WaitOutcome::Ready;
    }

    let mut timeout = pin!(timeout);
    loop {
        match select(notifications.next(), timeout.as_mut()).await {
            Either::Left((Some(()), _)) => {
                if ready() {
                    return WaitOutcome::Ready;
                }
            }
            Either::Left((None, _)) => return WaitOutcome::Disconnected,
            Either::Right(((), _)) => return WaitOutcome::TimedOut,
        }
    }
}
