use std::future::Future;

/// Timer source for the cooperative runtime.
///
/// In the browser this is `setTimeout`; tests hand out sleeps they resolve
/// by hand.
pub trait Clock {
    type Sleep: Future<Output = ()> + 'static;

    fn sleep(&self, ms: u32) -> Self::Sleep;
}
