#![forbid(unsafe_code)]

//! Trailing-edge debouncer.
//!
//! Every resize, visibility and mutation trigger funnels into one
//! [`Debouncer`]. A trigger (re)schedules the single pending deadline
//! (last-write-wins), so a burst of triggers inside the window produces
//! exactly one fire, `delay` after the last trigger.
//!
//! Time is supplied by the caller; the debouncer owns no timer.

use web_time::{Duration, Instant};

/// Single-slot trailing debouncer.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
    triggers: u64,
    fires: u64,
}

impl Debouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
            triggers: 0,
            fires: 0,
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule a fire `delay` from `now`, replacing any pending one.
    pub fn trigger(&mut self, now: Instant) {
        self.triggers += 1;
        self.deadline = Some(now + self.delay);
    }

    /// Returns `true` once when the pending deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.fires += 1;
                true
            }
            _ => false,
        }
    }

    /// Drop the pending fire, if any.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Triggers received since creation.
    #[must_use]
    pub fn triggers(&self) -> u64 {
        self.triggers
    }

    /// Fires delivered since creation.
    #[must_use]
    pub fn fires(&self) -> u64 {
        self.fires
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn fires_once_after_delay() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(150 * MS);
        d.trigger(t0);
        assert!(!d.poll(t0 + 149 * MS));
        assert!(d.poll(t0 + 150 * MS));
        assert!(!d.poll(t0 + 500 * MS));
        assert_eq!(d.fires(), 1);
    }

    #[test]
    fn retrigger_pushes_deadline() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(150 * MS);
        d.trigger(t0);
        d.trigger(t0 + 100 * MS);
        assert!(!d.poll(t0 + 200 * MS));
        assert_eq!(d.deadline(), Some(t0 + 250 * MS));
        assert!(d.poll(t0 + 250 * MS));
        assert_eq!(d.triggers(), 2);
        assert_eq!(d.fires(), 1);
    }

    #[test]
    fn cancel_drops_pending_fire() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(150 * MS);
        d.trigger(t0);
        d.cancel();
        assert!(!d.is_pending());
        assert!(!d.poll(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn idle_debouncer_never_fires() {
        let mut d = Debouncer::new(150 * MS);
        assert!(!d.poll(Instant::now()));
        assert_eq!(d.deadline(), None);
    }
}
