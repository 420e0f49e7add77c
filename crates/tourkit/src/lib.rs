#![forbid(unsafe_code)]

//! TourKit public facade crate.
//!
//! Re-exports the types a host needs to drive a guided tour step (the
//! configuration, the document model, the locator and the positioner), the
//! unified [`Error`] with its degradation mapping, and a small prelude.
//!
//! ```no_run
//! use tourkit::prelude::*;
//! use web_time::Instant;
//!
//! let (mut doc, _) = tourkit::dom::fixture::dashboard(ViewportSize::new(1440.0, 900.0));
//! let mut expander = ClickExpander::new();
//! let mut positioner = TourPositioner::new(TourConfig::default());
//! let now = Instant::now();
//! positioner.set_target("[data-tour=\"kpi-cards\"]", Placement::Bottom, 120, now);
//! positioner.set_active(true, now);
//! while let Some(deadline) = positioner.next_deadline() {
//!     positioner.tick(deadline, &mut doc, &mut expander);
//! }
//! let output = positioner.output();
//! ```

use std::path::Path;

pub mod error;
#[cfg(feature = "logging")]
pub mod logging;

pub use tourkit_dom as dom;
pub use tourkit_runtime as runtime;

// --- Core re-exports -------------------------------------------------------

pub use tourkit_core::config::{
    ConfigError, DropdownRule, LayoutConfig, LocatorConfig, TimingConfig, TourConfig, TourTheme,
};
pub use tourkit_core::geometry::{Bounds, ViewportSize};
pub use tourkit_core::layout::{GeometryError, PositionRequest, compute_positions};
pub use tourkit_core::placement::Placement;
pub use tourkit_core::style::{ClipPath, OverlayStyle, PointerEvents, PositionStyles, TooltipStyle};

// --- Document re-exports ---------------------------------------------------

pub use tourkit_dom::{
    Document, DomError, MemoryDocument, MutationKind, MutationRecord, NodeId, NodeSpec, Selector,
    SelectorError,
};

// --- Runtime re-exports ----------------------------------------------------

pub use tourkit_runtime::{
    ClickExpander, Expander, LocateError, Located, Locator, NoopExpander, Phase, PositionerOutput,
    PositionerStats, StrategyTier, TourPositioner,
};

// --- Errors ----------------------------------------------------------------

pub use error::{DegradationAction, Error, Result};

/// Load a configuration file, degrading to the defaults when it is unusable.
///
/// `None` means no file was given and yields the defaults silently.
pub fn load_config_or_default(path: Option<&Path>) -> TourConfig {
    let Some(path) = path else {
        return TourConfig::default();
    };
    match TourConfig::from_file(path).map_err(Error::from) {
        Ok(config) => config,
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                error_type = error.error_type(),
                action = %error.degradation(),
                %error,
                "tour config rejected"
            );
            TourConfig::default()
        }
    }
}

/// Convenience re-exports for hosts.
pub mod prelude {
    pub use crate::{
        Bounds, ClickExpander, DegradationAction, Document, Error, Expander, MemoryDocument,
        NodeId, Phase, Placement, PositionStyles, PositionerOutput, TourConfig, TourPositioner,
        ViewportSize,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_yields_defaults() {
        assert_eq!(load_config_or_default(None), TourConfig::default());
    }

    #[test]
    fn unreadable_file_degrades_to_defaults() {
        let config = load_config_or_default(Some(Path::new("/nonexistent/tourkit.toml")));
        assert_eq!(config, TourConfig::default());
    }
}
