#![forbid(unsafe_code)]

//! Retry backoff for the element search.
//!
//! The delay before the next attempt grows geometrically with the attempt
//! index, a step of `factor` every `divisor` attempts, and is capped:
//!
//! `delay(n) = min(base * factor^(n / divisor), max)`
//!
//! # Determinism
//!
//! No jitter: the same attempt index always yields the same delay, so
//! timer-driven tests can reproduce exact schedules.
//!
//! # Example
//!
//! ```
//! use tourkit_runtime::backoff::Backoff;
//! use web_time::Duration;
//!
//! let backoff = Backoff::new(Duration::from_millis(100), 1.5, 3.0, Duration::from_millis(1000));
//! assert_eq!(backoff.delay(0), Duration::from_millis(100));
//! assert_eq!(backoff.delay(3), Duration::from_millis(150));
//! assert_eq!(backoff.delay(30), Duration::from_millis(1000));
//! ```

use tourkit_core::config::TimingConfig;
use web_time::Duration;

/// Capped geometric backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    pub base: Duration,
    pub factor: f64,
    pub divisor: f64,
    pub max: Duration,
}

impl Backoff {
    /// Create a backoff.
    pub fn new(base: Duration, factor: f64, divisor: f64, max: Duration) -> Self {
        Self {
            base,
            factor,
            divisor,
            max,
        }
    }

    /// Backoff described by a timing config.
    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self::new(
            timing.base_retry_delay(),
            timing.backoff_factor,
            timing.backoff_divisor,
            timing.max_retry_delay(),
        )
    }

    /// Delay after the given (0-indexed) failed attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        let divisor = if self.divisor > 0.0 { self.divisor } else { 1.0 };
        let multiplier = self.factor.max(1.0).powf(f64::from(attempt) / divisor);
        let millis = self.base.as_secs_f64() * 1000.0 * multiplier;
        let max_millis = self.max.as_secs_f64() * 1000.0;
        if !millis.is_finite() || millis >= max_millis {
            return self.max;
        }
        Duration::from_millis(millis.round() as u64)
    }

    /// Sum of the delays after attempts `0..attempts`.
    pub fn total_delay(&self, attempts: u32) -> Duration {
        (0..attempts).map(|i| self.delay(i)).sum()
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from_timing(&TimingConfig::default())
    }
}
