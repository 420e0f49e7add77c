#![forbid(unsafe_code)]

//! Runtime: finding the target and keeping its tooltip in place.
//!
//! # Role in TourKit
//! `tourkit-runtime` drives one tour step against a live
//! [`Document`](tourkit_dom::Document). It owns the retrying, six-tier
//! [`Locator`], the debounced recompute scheduling and the
//! [`TourPositioner`] state machine the rendering layer reads from.
//!
//! # Primary responsibilities
//! - **Locate**: escalate from a direct query through heuristics, known
//!   locations, container scrolling, expanding collapsed sections and a full
//!   page scan, with capped backoff between attempts.
//! - **Expand**: the single click side effect, behind [`Expander`].
//! - **Observe**: filter mutation records to the ones that can move the
//!   target, and coalesce every trigger through one [`Debouncer`].
//! - **Position**: settle, compute through `tourkit-core`, degrade to the
//!   centered fallback instead of failing.
//!
//! # How it fits in the system
//! The host owns the clock and the event sources. It forwards resize,
//! visibility and mutation events and calls
//! [`TourPositioner::tick`] at [`TourPositioner::next_deadline`].

pub mod backoff;
pub mod debounce;
pub mod expander;
pub mod locator;
pub mod observer;
pub mod positioner;
pub mod target;

pub use backoff::Backoff;
pub use debounce::Debouncer;
pub use expander::{ClickExpander, Expander, NoopExpander};
pub use locator::{LocateError, LocateStep, Located, Locator, StrategyTier};
pub use observer::{ChangeObserver, WATCHED_ATTRIBUTES};
pub use positioner::{Phase, PositionerOutput, PositionerStats, SearchTicket, TourPositioner};
pub use target::{TargetRoute, TargetSelector};
