//! Property-based invariant tests for recompute scheduling.
//!
//! 1. Any burst of triggers inside the debounce window fires exactly once
//! 2. The fire lands `delay` after the last trigger, never earlier
//! 3. N resizes within the window cause exactly one positioner recompute
//! 4. Backoff delays are monotonic and capped

use proptest::prelude::*;
use tourkit_core::config::{TimingConfig, TourConfig};
use tourkit_core::geometry::ViewportSize;
use tourkit_core::placement::Placement;
use tourkit_dom::fixture::dashboard;
use tourkit_runtime::{Backoff, ClickExpander, Debouncer, Phase, TourPositioner};
use web_time::{Duration, Instant};

const DELAY_MS: u64 = 150;

/// Offsets (ms) of successive triggers, each gap shorter than the window.
fn burst_strategy() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..DELAY_MS, 1..40).prop_map(|gaps| {
        let mut t = 0;
        gaps.into_iter()
            .map(|gap| {
                t += gap;
                t
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn burst_fires_exactly_once(offsets in burst_strategy()) {
        let t0 = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(DELAY_MS));
        let mut fires = 0;
        for &offset in &offsets {
            let now = t0 + Duration::from_millis(offset);
            if debouncer.poll(now) {
                fires += 1;
            }
            debouncer.trigger(now);
        }
        let last = *offsets.last().unwrap();
        // Sweep well past the window in 1ms steps.
        for ms in last..last + 3 * DELAY_MS {
            if debouncer.poll(t0 + Duration::from_millis(ms)) {
                fires += 1;
                prop_assert_eq!(ms, last + DELAY_MS);
            }
        }
        prop_assert_eq!(fires, 1);
        prop_assert_eq!(debouncer.triggers(), offsets.len() as u64);
    }

    #[test]
    fn resizes_in_window_recompute_once(n in 1u32..25, spacing in 0u64..DELAY_MS) {
        let (mut doc, _) = dashboard(ViewportSize::new(1440.0, 900.0));
        let mut expander = ClickExpander::new();
        let mut positioner = TourPositioner::new(TourConfig::default());
        let mut now = Instant::now();
        positioner.set_target("[data-tour=\"kpi-cards\"]", Placement::Bottom, 100, now);
        positioner.set_active(true, now);
        while let Some(deadline) = positioner.next_deadline() {
            now = now.max(deadline);
            positioner.tick(now, &mut doc, &mut expander);
        }
        prop_assert_eq!(positioner.phase(), Phase::Positioned);
        let before = positioner.stats().recomputes;

        for _ in 0..n {
            positioner.on_resize(now);
            now += Duration::from_millis(spacing);
        }
        while let Some(deadline) = positioner.next_deadline() {
            now = now.max(deadline);
            positioner.tick(now, &mut doc, &mut expander);
        }
        prop_assert_eq!(positioner.stats().recomputes, before + 1);
    }

    #[test]
    fn backoff_is_monotonic_and_capped(
        base in 1u64..500,
        factor in 1.0f64..3.0,
        divisor in 1.0f64..6.0,
        max in 500u64..5000,
        attempt in 0u32..64,
    ) {
        let timing = TimingConfig {
            base_retry_delay_ms: base,
            backoff_factor: factor,
            backoff_divisor: divisor,
            max_retry_delay_ms: max,
            ..TimingConfig::default()
        };
        let backoff = Backoff::from_timing(&timing);
        prop_assert!(backoff.delay(attempt) <= backoff.delay(attempt + 1));
        prop_assert!(backoff.delay(attempt) <= Duration::from_millis(max));
    }
}
