#![forbid(unsafe_code)]

//! Core: geometry, placement, configuration and the positioning engine.
//!
//! # Role in TourKit
//! `tourkit-core` is the pure layer. Given a target's bounds, a requested
//! [`Placement`](placement::Placement) and the viewport, it produces the
//! overlay and tooltip descriptors a rendering layer paints. It never touches
//! a document, a clock or a timer.
//!
//! # Primary responsibilities
//! - **Geometry**: [`Bounds`](geometry::Bounds) snapshots and viewport sizes.
//! - **Layout**: tooltip sizing, flip-and-clamp placement, mobile pinning and
//!   the clip-path cutout ([`layout::compute_positions`]).
//! - **Configuration**: the immutable [`TourConfig`](config::TourConfig)
//!   carrying every timing, layout, locator and theme constant.
//!
//! # How it fits in the system
//! `tourkit-dom` models the host document, `tourkit-runtime` finds the target
//! and decides *when* to recompute, and this crate decides *where* things go.

pub mod config;
pub mod geometry;
pub mod layout;
pub mod placement;
pub mod style;

pub use config::{ConfigError, TourConfig};
pub use geometry::{Bounds, ViewportSize};
pub use layout::{GeometryError, PositionRequest, ViewportConstraints};
pub use placement::Placement;
pub use style::PositionStyles;
