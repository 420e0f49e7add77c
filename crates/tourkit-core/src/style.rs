#![forbid(unsafe_code)]

//! CSS-like style descriptors produced by the positioning engine.
//!
//! The rendering layer owns painting; these types only describe *where* and
//! *how* the overlay and tooltip go. Each descriptor renders to a CSS
//! declaration block with `to_css()`.

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use crate::config::TourConfig;
use crate::geometry::ViewportSize;
use crate::placement::Placement;

/// An sRGB color with fractional alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity in `0.0..=1.0`.
    pub a: f32,
}

impl Rgba {
    /// Create a color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Fully transparent.
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0.0);
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// CSS `pointer-events`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerEvents {
    #[default]
    Auto,
    None,
}

impl PointerEvents {
    fn as_str(self) -> &'static str {
        match self {
            PointerEvents::Auto => "auto",
            PointerEvents::None => "none",
        }
    }
}

/// CSS `clip-path` value.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipPath {
    /// `polygon(x y, ...)` in pixels.
    Polygon(Vec<(f64, f64)>),
}

impl ClipPath {
    /// Polygon vertices.
    #[must_use]
    pub fn points(&self) -> &[(f64, f64)] {
        match self {
            ClipPath::Polygon(points) => points,
        }
    }
}

impl fmt::Display for ClipPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipPath::Polygon(points) => {
                f.write_str("polygon(")?;
                for (i, (x, y)) in points.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}px {}px", px(*x), px(*y))?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Round to a tenth of a pixel for stable CSS output.
fn px(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// The full-viewport dimming layer.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
    /// Tint painted over everything outside the cutout.
    pub background: Rgba,
    /// Cutout around the target; `None` dims (or tints) the whole viewport.
    pub clip_path: Option<ClipPath>,
    pub pointer_events: PointerEvents,
    pub z_index: i32,
    /// Transition duration for the clip-path animation, in milliseconds.
    pub transition_ms: u64,
}

impl OverlayStyle {
    /// Render as a CSS declaration block.
    #[must_use]
    pub fn to_css(&self) -> String {
        let mut css = String::from("position: fixed; inset: 0; ");
        let _ = write!(css, "background-color: {}; ", self.background);
        if let Some(clip) = &self.clip_path {
            let _ = write!(css, "clip-path: {clip}; ");
        }
        let _ = write!(
            css,
            "pointer-events: {}; z-index: {}; transition: clip-path {}ms ease;",
            self.pointer_events.as_str(),
            self.z_index,
            self.transition_ms
        );
        css
    }
}

/// Where and how large to draw the tooltip box.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipStyle {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    pub z_index: i32,
}

impl TooltipStyle {
    /// Render as a CSS declaration block.
    #[must_use]
    pub fn to_css(&self) -> String {
        format!(
            "position: fixed; top: {}px; left: {}px; width: {}px; max-height: {}px; z-index: {};",
            px(self.top),
            px(self.left),
            px(self.width),
            px(self.height),
            self.z_index
        )
    }

    /// Right edge of the tooltip box.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge of the tooltip box.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Everything the rendering layer needs for one tour step.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionStyles {
    pub overlay_style: OverlayStyle,
    pub tooltip_style: TooltipStyle,
    /// Height available to the tooltip's scrollable content region.
    pub content_area_height: f64,
    /// The side the tooltip ended up on after flipping / mobile pinning.
    pub final_placement: Placement,
    /// Set when these styles are the hardcoded fallback.
    pub is_fallback: bool,
}

impl PositionStyles {
    /// Generic dim overlay with a centered, fixed-size tooltip.
    ///
    /// Used whenever geometry cannot be computed, so the caller always has a
    /// renderable tooltip.
    #[must_use]
    pub fn fallback(viewport: ViewportSize, config: &TourConfig) -> Self {
        let layout = &config.layout;
        let theme = &config.theme;
        let vw = if viewport.width.is_finite() { viewport.width.max(0.0) } else { 0.0 };
        let vh = if viewport.height.is_finite() { viewport.height.max(0.0) } else { 0.0 };

        let width = layout.fallback_tooltip_width.min(vw).max(0.0);
        let height = layout.fallback_tooltip_height.min(vh).max(0.0);
        let chrome = layout.header_height + layout.footer_height + layout.button_row_height;

        Self {
            overlay_style: OverlayStyle {
                background: theme.overlay,
                clip_path: None,
                pointer_events: PointerEvents::Auto,
                z_index: theme.overlay_z_index,
                transition_ms: theme.transition_ms,
            },
            tooltip_style: TooltipStyle {
                top: ((vh - height) / 2.0).max(0.0),
                left: ((vw - width) / 2.0).max(0.0),
                width,
                height,
                z_index: theme.tooltip_z_index,
            },
            content_area_height: (height - chrome).max(0.0),
            final_placement: Placement::Center,
            is_fallback: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_renders_css() {
        assert_eq!(Rgba::new(0, 0, 0, 0.5).to_string(), "rgba(0, 0, 0, 0.5)");
        assert_eq!(Rgba::rgb(255, 10, 1).to_string(), "rgba(255, 10, 1, 1)");
    }

    #[test]
    fn polygon_renders_points() {
        let clip = ClipPath::Polygon(vec![(0.0, 0.0), (10.25, 3.0)]);
        assert_eq!(clip.to_string(), "polygon(0px 0px, 10.3px 3px)");
    }

    #[test]
    fn overlay_css_omits_missing_clip() {
        let style = OverlayStyle {
            background: Rgba::new(0, 0, 0, 0.6),
            clip_path: None,
            pointer_events: PointerEvents::None,
            z_index: 10,
            transition_ms: 0,
        };
        let css = style.to_css();
        assert!(!css.contains("clip-path:"));
        assert!(css.contains("pointer-events: none"));
    }

    #[test]
    fn fallback_is_centered() {
        let config = TourConfig::default();
        let styles = PositionStyles::fallback(ViewportSize::new(1000.0, 800.0), &config);
        let t = &styles.tooltip_style;
        assert!(styles.is_fallback);
        assert_eq!(styles.final_placement, Placement::Center);
        assert!((t.left + t.width / 2.0 - 500.0).abs() < 1e-9);
        assert!((t.top + t.height / 2.0 - 400.0).abs() < 1e-9);
    }

    #[test]
    fn fallback_survives_garbage_viewport() {
        let config = TourConfig::default();
        let styles = PositionStyles::fallback(ViewportSize::new(f64::NAN, -5.0), &config);
        assert_eq!(styles.tooltip_style.width, 0.0);
        assert_eq!(styles.tooltip_style.top, 0.0);
    }
}
