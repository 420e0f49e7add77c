#![forbid(unsafe_code)]

//! Geometry and placement engine.
//!
//! A pure transformation from a target's bounds, a requested placement and
//! the viewport into overlay and tooltip style descriptors.
//!
//! # Invariants
//!
//! 1. The overlay is a full-viewport layer with a padded cutout around the
//!    target, unless the overlay is skipped.
//! 2. A directional tooltip flips to the opposite side at most once, when the
//!    requested side overflows the viewport on that axis.
//! 3. The tooltip box is always clamped into the viewport minus the margin.
//! 4. Output is a function of the input only: same request, same styles.
//!
//! # Example
//!
//! ```
//! use tourkit_core::config::TourConfig;
//! use tourkit_core::geometry::{Bounds, ViewportSize};
//! use tourkit_core::layout::{compute_positions, PositionRequest};
//! use tourkit_core::placement::Placement;
//!
//! let config = TourConfig::default();
//! let request = PositionRequest::new(
//!     Bounds::new(100.0, 40.0, 200.0, 36.0),
//!     Placement::Bottom,
//!     ViewportSize::new(1440.0, 900.0),
//! );
//! let styles = compute_positions(&request, &config).unwrap();
//! assert_eq!(styles.final_placement, Placement::Bottom);
//! assert!(styles.tooltip_style.top > 76.0);
//! ```

use std::fmt;

use crate::config::{LayoutConfig, TourConfig};
use crate::geometry::{Bounds, ViewportSize};
use crate::placement::Placement;
use crate::style::{ClipPath, OverlayStyle, PointerEvents, PositionStyles, TooltipStyle};

/// Viewport-derived limits, recalculated for every computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportConstraints {
    pub width: f64,
    pub height: f64,
    /// Narrower than the mobile breakpoint.
    pub is_mobile: bool,
    pub margin: f64,
    pub max_tooltip_width: f64,
    pub max_tooltip_height: f64,
}

impl ViewportConstraints {
    /// Derive constraints for a viewport.
    #[must_use]
    pub fn from_viewport(viewport: ViewportSize, layout: &LayoutConfig) -> Self {
        let is_mobile = viewport.width < layout.mobile_breakpoint;
        let margin = if is_mobile {
            layout.mobile_margin
        } else {
            layout.margin
        };
        let usable_width = (viewport.width - margin * 2.0).max(0.0);
        let usable_height = (viewport.height - margin * 2.0).max(0.0);
        let max_tooltip_width = if is_mobile {
            usable_width
        } else {
            layout.max_tooltip_width.min(usable_width)
        };
        let max_tooltip_height = (viewport.height * layout.max_tooltip_height_fraction)
            .min(usable_height)
            .max(0.0);

        Self {
            width: viewport.width,
            height: viewport.height,
            is_mobile,
            margin,
            max_tooltip_width,
            max_tooltip_height,
        }
    }
}

/// Input to [`compute_positions`].
#[derive(Debug, Clone, PartialEq)]
pub struct PositionRequest {
    /// Viewport-relative bounds of the highlighted area.
    pub target: Bounds,
    pub placement: Placement,
    pub viewport: ViewportSize,
    /// Length of the tooltip body text; only used to estimate height.
    pub content_len: usize,
    /// Keep the page interactive (e.g. an open dropdown): no cutout, clicks
    /// pass through.
    pub skip_overlay: bool,
}

impl PositionRequest {
    /// Request with empty content and a visible overlay.
    #[must_use]
    pub fn new(target: Bounds, placement: Placement, viewport: ViewportSize) -> Self {
        Self {
            target,
            placement,
            viewport,
            content_len: 0,
            skip_overlay: false,
        }
    }

    #[must_use]
    pub fn content_len(mut self, len: usize) -> Self {
        self.content_len = len;
        self
    }

    #[must_use]
    pub fn skip_overlay(mut self, skip: bool) -> Self {
        self.skip_overlay = skip;
        self
    }
}

/// Why a geometry computation could not produce styles.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Viewport has a non-positive or non-finite dimension.
    InvalidViewport { width: f64, height: f64 },
    /// Target bounds contain NaN or infinities.
    NonFiniteBounds(Bounds),
    /// Margins leave no horizontal room for a tooltip.
    NoRoom { width: f64 },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::InvalidViewport { width, height } => {
                write!(f, "invalid viewport {width}x{height}")
            }
            GeometryError::NonFiniteBounds(b) => write!(f, "non-finite target bounds {b:?}"),
            GeometryError::NoRoom { width } => {
                write!(f, "no room for a tooltip in a {width}px wide viewport")
            }
        }
    }
}

impl std::error::Error for GeometryError {}

/// Estimate the tooltip height from its content length.
///
/// Fixed header, footer and button rows plus one line per
/// `chars_per_line` characters, clamped to the configured minimum and the
/// viewport-derived maximum.
#[must_use]
pub fn estimate_tooltip_height(
    content_len: usize,
    constraints: &ViewportConstraints,
    layout: &LayoutConfig,
) -> f64 {
    let lines = (content_len as f64 / layout.chars_per_line).ceil();
    let estimate = layout.header_height
        + layout.footer_height
        + layout.button_row_height
        + lines * layout.line_height;
    estimate
        .max(layout.min_tooltip_height)
        .min(constraints.max_tooltip_height)
}

/// Even-odd polygon covering the viewport except a padded hole around `target`.
///
/// The hole is clipped to the viewport.
#[must_use]
pub fn cutout_polygon(target: &Bounds, padding: f64, viewport: ViewportSize) -> ClipPath {
    let hole = target.padded(padding);
    let (vw, vh) = (viewport.width, viewport.height);
    let l = hole.left.clamp(0.0, vw);
    let r = hole.right.clamp(0.0, vw);
    let t = hole.top.clamp(0.0, vh);
    let b = hole.bottom.clamp(0.0, vh);

    ClipPath::Polygon(vec![
        (0.0, 0.0),
        (0.0, vh),
        (l, vh),
        (l, t),
        (r, t),
        (r, b),
        (l, b),
        (l, vh),
        (vw, vh),
        (vw, 0.0),
    ])
}

/// Keep `value..value + size` inside `[margin, extent - margin]`.
///
/// If the box is larger than the room available it is pinned to the margin.
fn clamp_axis(value: f64, size: f64, extent: f64, margin: f64) -> f64 {
    let max = (extent - size - margin).max(margin);
    value.max(margin).min(max)
}

/// Position of a `width x height` tooltip anchored on `side` of the padded target.
fn anchor(side: Placement, target: &Bounds, offset: f64, width: f64, height: f64) -> (f64, f64) {
    match side {
        Placement::Top => (target.center_x() - width / 2.0, target.top - offset - height),
        Placement::Bottom => (target.center_x() - width / 2.0, target.bottom + offset),
        Placement::Left => (target.left - offset - width, target.center_y() - height / 2.0),
        Placement::Right => (target.right + offset, target.center_y() - height / 2.0),
        Placement::Center => (0.0, 0.0),
    }
}

fn overflows(
    side: Placement,
    (x, y): (f64, f64),
    width: f64,
    height: f64,
    c: &ViewportConstraints,
) -> bool {
    match side {
        Placement::Top => y < c.margin,
        Placement::Bottom => y + height > c.height - c.margin,
        Placement::Left => x < c.margin,
        Placement::Right => x + width > c.width - c.margin,
        Placement::Center => false,
    }
}

/// Compute the tooltip's top-left corner and the side it ends up on.
///
/// Returns `(left, top, final_placement)`.
#[must_use]
pub fn place_tooltip(
    target: &Bounds,
    placement: Placement,
    width: f64,
    height: f64,
    constraints: &ViewportConstraints,
    layout: &LayoutConfig,
) -> (f64, f64, Placement) {
    let c = constraints;

    if placement == Placement::Center {
        let left = (c.width - width) / 2.0;
        let top = (c.height - height) / 2.0;
        return (
            clamp_axis(left, width, c.width, c.margin),
            clamp_axis(top, height, c.height, c.margin),
            Placement::Center,
        );
    }

    if c.is_mobile {
        // Pin to the half of the screen the target is not in.
        let (top, side) = if target.center_y() < c.height / 2.0 {
            (c.height - height - c.margin, Placement::Bottom)
        } else {
            (c.margin, Placement::Top)
        };
        return (c.margin, clamp_axis(top, height, c.height, c.margin), side);
    }

    let offset = layout.target_padding + layout.tooltip_gap;
    let mut side = placement;
    let mut pos = anchor(side, target, offset, width, height);
    if overflows(side, pos, width, height, c) {
        side = side.opposite();
        pos = anchor(side, target, offset, width, height);
    }

    (
        clamp_axis(pos.0, width, c.width, c.margin),
        clamp_axis(pos.1, height, c.height, c.margin),
        side,
    )
}

/// Compute overlay and tooltip styles for one target.
pub fn compute_positions(
    request: &PositionRequest,
    config: &TourConfig,
) -> Result<PositionStyles, GeometryError> {
    let layout = &config.layout;
    let theme = &config.theme;
    let viewport = request.viewport;

    if !(viewport.width > 0.0
        && viewport.height > 0.0
        && viewport.width.is_finite()
        && viewport.height.is_finite())
    {
        return Err(GeometryError::InvalidViewport {
            width: viewport.width,
            height: viewport.height,
        });
    }
    if !request.target.is_finite() {
        return Err(GeometryError::NonFiniteBounds(request.target));
    }

    let constraints = ViewportConstraints::from_viewport(viewport, layout);
    let width = constraints.max_tooltip_width;
    if width <= 0.0 {
        return Err(GeometryError::NoRoom {
            width: viewport.width,
        });
    }
    let height = estimate_tooltip_height(request.content_len, &constraints, layout);
    let (left, top, final_placement) = place_tooltip(
        &request.target,
        request.placement,
        width,
        height,
        &constraints,
        layout,
    );

    let overlay_style = if request.skip_overlay {
        OverlayStyle {
            background: theme.passthrough_overlay,
            clip_path: None,
            pointer_events: PointerEvents::None,
            z_index: theme.overlay_z_index,
            transition_ms: theme.transition_ms,
        }
    } else {
        let clip_path = (!request.target.is_empty()
            && request.target.intersects(&viewport.bounds()))
        .then(|| cutout_polygon(&request.target, layout.target_padding, viewport));
        OverlayStyle {
            background: theme.overlay,
            clip_path,
            pointer_events: PointerEvents::Auto,
            z_index: theme.overlay_z_index,
            transition_ms: theme.transition_ms,
        }
    };

    let chrome = layout.header_height + layout.footer_height + layout.button_row_height;

    Ok(PositionStyles {
        overlay_style,
        tooltip_style: TooltipStyle {
            top,
            left,
            width,
            height,
            z_index: theme.tooltip_z_index,
        },
        content_area_height: (height - chrome).max(0.0),
        final_placement,
        is_fallback: false,
    })
}

/// [`compute_positions`], degrading to [`PositionStyles::fallback`] on error.
#[must_use]
pub fn compute_positions_or_fallback(
    request: &PositionRequest,
    config: &TourConfig,
) -> PositionStyles {
    match compute_positions(request, config) {
        Ok(styles) => styles,
        Err(error) => {
            tracing::warn!(%error, "tour geometry failed; using centered fallback");
            PositionStyles::fallback(request.viewport, config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESKTOP: ViewportSize = ViewportSize::new(1440.0, 900.0);
    const MOBILE: ViewportSize = ViewportSize::new(375.0, 667.0);

    fn config() -> TourConfig {
        TourConfig::default()
    }

    fn compute(target: Bounds, placement: Placement, viewport: ViewportSize) -> PositionStyles {
        compute_positions(&PositionRequest::new(target, placement, viewport), &config()).unwrap()
    }

    // ── Constraints ──────────────────────────────────────────────────────

    #[test]
    fn constraints_switch_at_breakpoint() {
        let layout = LayoutConfig::default();
        let desk = ViewportConstraints::from_viewport(DESKTOP, &layout);
        let mobile = ViewportConstraints::from_viewport(MOBILE, &layout);
        assert!(!desk.is_mobile);
        assert_eq!(desk.max_tooltip_width, 400.0);
        assert!(mobile.is_mobile);
        assert_eq!(mobile.margin, 12.0);
        assert_eq!(mobile.max_tooltip_width, 375.0 - 24.0);
        let tablet = ViewportSize::new(768.0, 600.0);
        assert!(!ViewportConstraints::from_viewport(tablet, &layout).is_mobile);
    }

    #[test]
    fn height_grows_with_content_and_is_capped() {
        let layout = LayoutConfig::default();
        let c = ViewportConstraints::from_viewport(DESKTOP, &layout);
        let short = estimate_tooltip_height(10, &c, &layout);
        let long = estimate_tooltip_height(400, &c, &layout);
        let huge = estimate_tooltip_height(100_000, &c, &layout);
        assert_eq!(short, layout.min_tooltip_height);
        assert!(long > short);
        assert_eq!(huge, 900.0 * 0.7);
    }

    // ── Placement ────────────────────────────────────────────────────────

    #[test]
    fn bottom_placement_sits_below_target() {
        let target = Bounds::new(100.0, 40.0, 200.0, 36.0);
        let s = compute(target, Placement::Bottom, DESKTOP);
        assert_eq!(s.final_placement, Placement::Bottom);
        assert_eq!(s.tooltip_style.top, 76.0 + 8.0 + 12.0);
        // Centered horizontally would be -0, so it is clamped to the margin.
        assert_eq!(s.tooltip_style.left, 16.0);
    }

    #[test]
    fn top_flips_to_bottom_near_upper_edge() {
        let target = Bounds::new(600.0, 10.0, 120.0, 30.0);
        let s = compute(target, Placement::Top, DESKTOP);
        assert_eq!(s.final_placement, Placement::Bottom);
        assert!(s.tooltip_style.top >= target.bottom);
    }

    #[test]
    fn bottom_flips_to_top_near_lower_edge() {
        let target = Bounds::new(600.0, 820.0, 120.0, 40.0);
        let s = compute(target, Placement::Bottom, DESKTOP);
        assert_eq!(s.final_placement, Placement::Top);
        assert!(s.tooltip_style.bottom() <= target.top);
    }

    #[test]
    fn left_flips_to_right_and_right_flips_to_left() {
        let near_left = Bounds::new(20.0, 400.0, 100.0, 40.0);
        assert_eq!(compute(near_left, Placement::Left, DESKTOP).final_placement, Placement::Right);
        let near_right = Bounds::new(1300.0, 400.0, 100.0, 40.0);
        assert_eq!(compute(near_right, Placement::Right, DESKTOP).final_placement, Placement::Left);
    }

    #[test]
    fn center_ignores_target() {
        let s = compute(Bounds::new(0.0, 0.0, 10.0, 10.0), Placement::Center, DESKTOP);
        let t = &s.tooltip_style;
        assert_eq!(s.final_placement, Placement::Center);
        assert!((t.left + t.width / 2.0 - 720.0).abs() < 1e-9);
        assert!((t.top + t.height / 2.0 - 450.0).abs() < 1e-9);
    }

    #[test]
    fn mobile_pins_opposite_half() {
        let upper = compute(Bounds::new(10.0, 50.0, 100.0, 40.0), Placement::Right, MOBILE);
        assert_eq!(upper.final_placement, Placement::Bottom);
        assert_eq!(upper.tooltip_style.left, 12.0);
        assert_eq!(upper.tooltip_style.bottom(), 667.0 - 12.0);

        let lower = compute(Bounds::new(10.0, 500.0, 100.0, 40.0), Placement::Top, MOBILE);
        assert_eq!(lower.final_placement, Placement::Top);
        assert_eq!(lower.tooltip_style.top, 12.0);
    }

    // ── Overlay ──────────────────────────────────────────────────────────

    #[test]
    fn overlay_cuts_out_padded_target() {
        let target = Bounds::new(100.0, 100.0, 50.0, 20.0);
        let s = compute(target, Placement::Bottom, DESKTOP);
        let clip = s.overlay_style.clip_path.expect("cutout");
        let points = clip.points();
        assert_eq!(points.len(), 10);
        assert!(points.contains(&(92.0, 92.0)));
        assert!(points.contains(&(158.0, 128.0)));
        assert_eq!(s.overlay_style.pointer_events, PointerEvents::Auto);
    }

    #[test]
    fn skipped_overlay_lets_clicks_through() {
        let config = config();
        let target = Bounds::new(10.0, 10.0, 10.0, 10.0);
        let request =
            PositionRequest::new(target, Placement::Bottom, DESKTOP).skip_overlay(true);
        let s = compute_positions(&request, &config).unwrap();
        assert!(s.overlay_style.clip_path.is_none());
        assert_eq!(s.overlay_style.pointer_events, PointerEvents::None);
        assert_eq!(s.overlay_style.background, config.theme.passthrough_overlay);
    }

    #[test]
    fn offscreen_target_gets_full_dim() {
        let s = compute(Bounds::new(0.0, 2000.0, 100.0, 40.0), Placement::Bottom, DESKTOP);
        assert!(s.overlay_style.clip_path.is_none());
    }

    // ── Errors and fallback ──────────────────────────────────────────────

    #[test]
    fn invalid_inputs_error() {
        let config = config();
        let empty = ViewportSize::new(0.0, 100.0);
        let bad_viewport = PositionRequest::new(Bounds::default(), Placement::Top, empty);
        assert!(matches!(
            compute_positions(&bad_viewport, &config),
            Err(GeometryError::InvalidViewport { .. })
        ));
        let nan = Bounds::new(f64::NAN, 0.0, 1.0, 1.0);
        let bad_bounds = PositionRequest::new(nan, Placement::Top, DESKTOP);
        assert!(matches!(
            compute_positions(&bad_bounds, &config),
            Err(GeometryError::NonFiniteBounds(_))
        ));
    }

    #[test]
    fn fallback_on_error_is_renderable() {
        let nan = Bounds::new(f64::NAN, 0.0, 1.0, 1.0);
        let request = PositionRequest::new(nan, Placement::Left, DESKTOP);
        let s = compute_positions_or_fallback(&request, &config());
        assert!(s.is_fallback);
        assert!(s.tooltip_style.width > 0.0);
    }

    #[test]
    fn repeated_computation_is_identical() {
        let target = Bounds::new(300.0, 300.0, 80.0, 30.0);
        let request =
            PositionRequest::new(target, Placement::Left, DESKTOP).content_len(220);
        let config = config();
        assert_eq!(
            compute_positions(&request, &config),
            compute_positions(&request, &config)
        );
    }
}
