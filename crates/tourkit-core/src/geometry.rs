#![forbid(unsafe_code)]

//! Geometric primitives.

/// A snapshot of an element's viewport-relative box, in CSS pixels.
///
/// Bounds are transient: any scroll, resize or layout mutation invalidates
/// them, so they are recomputed for each positioning pass instead of cached.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    /// Top edge.
    pub top: f64,
    /// Left edge.
    pub left: f64,
    /// Right edge (`left + width`).
    pub right: f64,
    /// Bottom edge (`top + height`).
    pub bottom: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Bounds {
    /// Create bounds from an origin and a size.
    #[inline]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            right: left + width,
            bottom: top + height,
            width,
            height,
        }
    }

    /// Create bounds from edges.
    #[inline]
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    /// Horizontal centre.
    #[inline]
    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    /// Vertical centre.
    #[inline]
    pub fn center_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    /// Check if the box has zero (or negative) area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check that every edge is a finite number.
    pub fn is_finite(&self) -> bool {
        [
            self.top,
            self.left,
            self.right,
            self.bottom,
            self.width,
            self.height,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    /// Grow the box by `padding` on every side.
    pub fn padded(&self, padding: f64) -> Bounds {
        Bounds::from_edges(
            self.left - padding,
            self.top - padding,
            self.right + padding,
            self.bottom + padding,
        )
    }

    /// Translate the box.
    pub fn offset(&self, dx: f64, dy: f64) -> Bounds {
        Bounds::new(self.left + dx, self.top + dy, self.width, self.height)
    }

    /// Whether the two boxes overlap with positive area.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

/// Size of the visible viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportSize {
    /// Width in CSS pixels.
    pub width: f64,
    /// Height in CSS pixels.
    pub height: f64,
}

impl ViewportSize {
    /// Create a viewport size.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The whole viewport as bounds anchored at the origin.
    pub fn bounds(&self) -> Bounds {
        Bounds::new(0.0, 0.0, self.width, self.height)
    }
}
