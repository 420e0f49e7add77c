#![forbid(unsafe_code)]

//! TourKit error model and graceful degradation.
//!
//! # Design Principles
//!
//! 1. **Typed errors per crate**: `tourkit-core`, `tourkit-dom` and
//!    `tourkit-runtime` each own their error type; this module only unifies
//!    them.
//! 2. **A tour never crashes the page**: every variant maps to a
//!    [`DegradationAction`] so the host keeps rendering something sensible.
//! 3. **Observability**: [`Error::error_type`] gives a stable label for log
//!    fields without the error types depending on `tracing`.

use std::fmt;

use tourkit_core::config::ConfigError;
use tourkit_core::layout::GeometryError;
use tourkit_dom::document::DomError;
use tourkit_dom::selector::SelectorError;
use tourkit_runtime::locator::LocateError;

// ── Unified Error ───────────────────────────────────────────────────────

/// Top-level error type for TourKit hosts.
///
/// Use [`Error::degradation`] to decide how the current step continues.
#[derive(Debug)]
pub enum Error {
    /// The configuration file could not be loaded or failed validation.
    Config(ConfigError),
    /// A step's target is not a valid selector.
    Selector(SelectorError),
    /// The locator gave up on a target.
    Locate(LocateError),
    /// Positions could not be computed from the target's bounds.
    Geometry(GeometryError),
    /// A document side effect failed.
    Dom(DomError),
}

/// Standard result type for TourKit APIs.
pub type Result<T> = std::result::Result<T, Error>;

// ── Graceful Degradation ────────────────────────────────────────────────

/// What the host should do with the current step when an error occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradationAction {
    /// The step cannot be shown at all; advance past it.
    SkipStep,
    /// Show the step with the centered fallback tooltip and no cutout.
    CenterTooltip,
    /// Log and carry on; the positioner recovers on its own.
    Ignore,
    /// Discard the offending configuration and use the built-in defaults.
    UseDefaults,
}

impl Error {
    /// Determine the degradation action for this error.
    pub fn degradation(&self) -> DegradationAction {
        match self {
            Self::Config(_) => DegradationAction::UseDefaults,

            Self::Selector(_) => DegradationAction::SkipStep,
            Self::Locate(LocateError::InvalidSelector(_)) => DegradationAction::SkipStep,

            Self::Locate(LocateError::NotFound { .. }) => DegradationAction::CenterTooltip,
            Self::Geometry(_) => DegradationAction::CenterTooltip,

            // Failed clicks and detached targets are retried by the positioner.
            Self::Dom(_) => DegradationAction::Ignore,
        }
    }

    /// Error type label for log fields.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Selector(_) => "selector",
            Self::Locate(_) => "locate",
            Self::Geometry(_) => "geometry",
            Self::Dom(_) => "dom",
        }
    }

    /// Whether the step can still be shown in some form.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.degradation(), DegradationAction::SkipStep)
    }
}

// ── Display ─────────────────────────────────────────────────────────────

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Selector(err) => write!(f, "{err}"),
            Self::Locate(err) => write!(f, "{err}"),
            Self::Geometry(err) => write!(f, "geometry: {err}"),
            Self::Dom(err) => write!(f, "document: {err}"),
        }
    }
}

impl fmt::Display for DegradationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkipStep => write!(f, "skip_step"),
            Self::CenterTooltip => write!(f, "center_tooltip"),
            Self::Ignore => write!(f, "ignore"),
            Self::UseDefaults => write!(f, "use_defaults"),
        }
    }
}

// ── std::error::Error ───────────────────────────────────────────────────

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Selector(err) => Some(err),
            Self::Locate(err) => Some(err),
            Self::Geometry(err) => Some(err),
            Self::Dom(err) => Some(err),
        }
    }
}

// ── From conversions ────────────────────────────────────────────────────

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<SelectorError> for Error {
    fn from(err: SelectorError) -> Self {
        Self::Selector(err)
    }
}

impl From<LocateError> for Error {
    fn from(err: LocateError) -> Self {
        Self::Locate(err)
    }
}

impl From<GeometryError> for Error {
    fn from(err: GeometryError) -> Self {
        Self::Geometry(err)
    }
}

impl From<DomError> for Error {
    fn from(err: DomError) -> Self {
        Self::Dom(err)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────
