use std::time::{Duration, Instant};

/// Default delay between the last keystroke and applying the search query.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Coalesces rapid updates: a value becomes effective only once it has been
/// left untouched for `delay`.
#[derive(Debug)]
pub struct Debounced<T> {
    delay: Duration,
    settled: T,
    pending: Option<(T, Instant)>,
}

impl<T: Clone + PartialEq> Debounced<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            delay,
            settled: initial,
            pending: None,
        }
    }

    /// Record a new value at `now`, restarting the delay.
    pub fn set(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Replace the value immediately, dropping anything pending.
    pub fn set_now(&mut self, value: T) {
        self.pending = None;
        self.settled = value;
    }

    /// Promote the pending value if its delay has elapsed at `now`.
    /// Returns `true` when the settled value changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let ready = matches!(&self.pending, Some((_, at)) if now.duration_since(*at) >= self.delay);
        if !ready {
            return false;
        }
        match self.pending.take() {
            Some((value, _)) if value != self.settled => {
                self.settled = value;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self) -> &T {
        &self.settled
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
