/// Token handed out to one asynchronous request.
///
/// Tokens are only ever compared for equality against the issuing counter's
/// current value; ordering exists for diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn new(n: u64) -> Self {
        RequestToken(n)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Monotonic, session-global request counter.
///
/// Only the request holding the current value is live. Every `issue` or
/// `invalidate` implicitly cancels all earlier tokens.
#[derive(Debug, Default)]
pub struct TokenCounter {
    current: std::cell::Cell<u64>,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a fresh token, superseding every token issued before it.
    pub fn issue(&self) -> RequestToken {
        let next = self.current.get().wrapping_add(1);
        self.current.set(next);
        RequestToken(next)
    }

    /// Bumps the counter without handing out a token.
    pub fn invalidate(&self) {
        self.current.set(self.current.get().wrapping_add(1));
    }

    pub fn current(&self) -> RequestToken {
        RequestToken(self.current.get())
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.current.get() == token.0
    }
}

#[cfg(test)]
mod tests {
    use super::TokenCounter;

    #[test]
    fn issue_supersedes_previous_tokens() {
        let counter = TokenCounter::new();
        let a = counter.issue();
        assert!(counter.is_current(a));
        let b = counter.issue();
        assert!(!counter.is_current(a));
        assert!(counter.is_current(b));
        assert!(a < b);
    }

    #[test]
    fn invalidate_cancels_without_new_token() {
        let counter = TokenCounter::new();
        let a = counter.issue();
        counter.invalidate();
        assert!(!counter.is_current(a));
        assert_eq!(counter.current().get(), a.get() + 1);
    }
}
