//! Property-based invariant tests for tooltip placement.
//!
//! These tests verify the structural guarantees of `compute_positions`:
//!
//! 1. The tooltip rectangle lies inside the viewport minus the margin, for
//!    every placement, on desktop and mobile viewports
//! 2. Repeated computation with the same input yields identical styles
//! 3. A directional placement that overflows flips to its opposite side
//! 4. The cutout polygon never leaves the viewport
//! 5. No panics on arbitrary (finite) geometry

use proptest::prelude::*;
use tourkit_core::config::TourConfig;
use tourkit_core::geometry::{Bounds, ViewportSize};
use tourkit_core::layout::{PositionRequest, ViewportConstraints, compute_positions};
use tourkit_core::placement::Placement;

// ── Strategies ──────────────────────────────────────────────────────────

fn placement_strategy() -> impl Strategy<Value = Placement> {
    prop::sample::select(Placement::ALL.to_vec())
}

fn desktop_viewport() -> impl Strategy<Value = ViewportSize> {
    (768.0f64..2560.0, 480.0f64..1600.0).prop_map(|(w, h)| ViewportSize::new(w, h))
}

fn mobile_viewport() -> impl Strategy<Value = ViewportSize> {
    (280.0f64..767.0, 480.0f64..1000.0).prop_map(|(w, h)| ViewportSize::new(w, h))
}

/// Targets anywhere around (and partly outside) the viewport.
fn target_strategy() -> impl Strategy<Value = Bounds> {
    (-200.0f64..2600.0, -200.0f64..1700.0, 0.0f64..600.0, 0.0f64..400.0)
        .prop_map(|(x, y, w, h)| Bounds::new(x, y, w, h))
}

fn assert_inside(request: &PositionRequest, config: &TourConfig) -> Result<(), TestCaseError> {
    let styles = compute_positions(request, config).expect("valid request");
    let c = ViewportConstraints::from_viewport(request.viewport, &config.layout);
    let t = &styles.tooltip_style;
    let eps = 1e-6;
    prop_assert!(t.left >= c.margin - eps, "left {} < margin {}", t.left, c.margin);
    prop_assert!(t.top >= c.margin - eps, "top {} < margin {}", t.top, c.margin);
    prop_assert!(
        t.right() <= c.width - c.margin + eps,
        "right {} > {}",
        t.right(),
        c.width - c.margin
    );
    prop_assert!(
        t.bottom() <= c.height - c.margin + eps,
        "bottom {} > {}",
        t.bottom(),
        c.height - c.margin
    );
    Ok(())
}

proptest! {
    #[test]
    fn tooltip_stays_inside_desktop_viewport(
        target in target_strategy(),
        placement in placement_strategy(),
        viewport in desktop_viewport(),
        content_len in 0usize..2000,
    ) {
        let config = TourConfig::default();
        let request = PositionRequest::new(target, placement, viewport).content_len(content_len);
        assert_inside(&request, &config)?;
    }

    #[test]
    fn tooltip_stays_inside_mobile_viewport(
        target in target_strategy(),
        placement in placement_strategy(),
        viewport in mobile_viewport(),
        content_len in 0usize..2000,
    ) {
        let config = TourConfig::default();
        let request = PositionRequest::new(target, placement, viewport).content_len(content_len);
        assert_inside(&request, &config)?;
    }

    #[test]
    fn computation_is_idempotent(
        target in target_strategy(),
        placement in placement_strategy(),
        viewport in desktop_viewport(),
        skip in any::<bool>(),
    ) {
        let config = TourConfig::default();
        let request = PositionRequest::new(target, placement, viewport).skip_overlay(skip);
        prop_assert_eq!(compute_positions(&request, &config), compute_positions(&request, &config));
    }

    #[test]
    fn overflowing_top_flips_to_bottom(
        x in 100.0f64..1200.0,
        y in 0.0f64..60.0,
        viewport in desktop_viewport(),
    ) {
        let config = TourConfig::default();
        let target = Bounds::new(x.min(viewport.width - 50.0), y, 40.0, 20.0);
        let request = PositionRequest::new(target, Placement::Top, viewport);
        let styles = compute_positions(&request, &config).unwrap();
        prop_assert_eq!(styles.final_placement, Placement::Bottom);
        assert_inside(&request, &config)?;
    }

    #[test]
    fn overflowing_right_flips_to_left(
        y in 100.0f64..400.0,
        viewport in desktop_viewport(),
    ) {
        let config = TourConfig::default();
        let target = Bounds::new(viewport.width - 60.0, y, 40.0, 20.0);
        let request = PositionRequest::new(target, Placement::Right, viewport);
        let styles = compute_positions(&request, &config).unwrap();
        prop_assert_eq!(styles.final_placement, Placement::Left);
        prop_assert!(styles.tooltip_style.right() <= target.left);
    }

    #[test]
    fn cutout_stays_in_viewport(
        target in target_strategy(),
        viewport in desktop_viewport(),
    ) {
        let config = TourConfig::default();
        let request = PositionRequest::new(target, Placement::Bottom, viewport);
        let styles = compute_positions(&request, &config).unwrap();
        if let Some(clip) = styles.overlay_style.clip_path {
            for &(x, y) in clip.points() {
                prop_assert!((0.0..=viewport.width).contains(&x));
                prop_assert!((0.0..=viewport.height).contains(&y));
            }
        }
    }
}
