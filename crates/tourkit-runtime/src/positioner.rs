#![forbid(unsafe_code)]

//! The tour step positioner.
//!
//! [`TourPositioner`] owns one step's lifecycle: locate the target, bring it
//! into view, wait for transitions to settle, compute overlay and tooltip
//! styles, then keep them current as the page changes.
//!
//! ```text
//!          set_active(true) / set_target
//!   Idle ───────────────────────────────▶ Searching ──exhausted──▶ Error ⇄ (fallback refresh)
//!    ▲                                      │    ▲
//!    │ set_active(false)              found │    │ target detached
//!    │                                      ▼    │
//!    └──────────────────────────────── Settling ─┴─▶ Positioned ⇄ (debounced recompute)
//! ```
//!
//! # Host contract
//!
//! The positioner owns no timers. The host forwards events
//! ([`on_resize`](TourPositioner::on_resize),
//! [`on_visibility_change`](TourPositioner::on_visibility_change),
//! [`on_mutations`](TourPositioner::on_mutations)) and calls
//! [`tick`](TourPositioner::tick) at or after
//! [`next_deadline`](TourPositioner::next_deadline). Nothing here returns an
//! error: failures surface as [`PositionerOutput::error`] with fallback
//! styles.

use std::fmt;

use tourkit_core::config::TourConfig;
use tourkit_core::geometry::Bounds;
use tourkit_core::layout::{PositionRequest, compute_positions_or_fallback};
use tourkit_core::placement::Placement;
use tourkit_core::style::PositionStyles;
use tourkit_dom::document::{Document, NodeId};
use tourkit_dom::mutation::MutationRecord;
use tourkit_dom::selector::{Selector, SelectorError};
use web_time::Instant;

use crate::debounce::Debouncer;
use crate::expander::Expander;
use crate::locator::{LocateError, LocateStep, Locator};
use crate::observer::ChangeObserver;
use crate::target::TargetSelector;

/// Lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Inactive, or active without a target.
    Idle,
    /// Running locator attempts.
    Searching,
    /// Found; waiting for the settle delay before the first computation.
    Settling,
    /// Styles are current; recomputes are debounced.
    Positioned,
    /// The target could not be found (or parsed); the centered fallback
    /// follows the viewport.
    Error,
}

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Searching => "searching",
            Self::Settling => "settling",
            Self::Positioned => "positioned",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the rendering layer consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionerOutput {
    /// `None` until the first computation (or the first tick after an error).
    pub positions: Option<PositionStyles>,
    pub target_element: Option<NodeId>,
    pub is_positioning: bool,
    pub error: Option<String>,
}

/// Counters for tests and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionerStats {
    pub searches: u64,
    pub attempts: u64,
    pub recomputes: u64,
    pub discarded: u64,
}

/// Identifies the search a result belongs to.
///
/// Hosts that run the locator out of band hand the ticket back with the
/// result; results for a superseded search are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
}

#[derive(Debug, Clone)]
struct Step {
    raw: String,
    target: Result<TargetSelector, SelectorError>,
    placement: Placement,
    content_len: usize,
}

/// Locates, positions and repositions one tour step.
#[derive(Debug)]
pub struct TourPositioner {
    config: TourConfig,
    container: Option<Selector>,
    step: Option<Step>,
    active: bool,
    phase: Phase,
    generation: u64,
    locator: Option<Locator>,
    retry_at: Option<Instant>,
    settle_at: Option<Instant>,
    debouncer: Debouncer,
    observer: Option<ChangeObserver>,
    target_element: Option<NodeId>,
    positions: Option<PositionStyles>,
    error: Option<String>,
    last_now: Option<Instant>,
    stats: PositionerStats,
}

impl TourPositioner {
    pub fn new(config: TourConfig) -> Self {
        let container = match Selector::parse(&config.locator.observer_container_selector) {
            Ok(sel) => Some(sel),
            Err(error) => {
                tracing::warn!(%error, "invalid observer container selector; observing parents");
                None
            }
        };
        let debouncer = Debouncer::new(config.timing.debounce_delay());
        Self {
            config,
            container,
            step: None,
            active: false,
            phase: Phase::Idle,
            generation: 0,
            locator: None,
            retry_at: None,
            settle_at: None,
            debouncer,
            observer: None,
            target_element: None,
            positions: None,
            error: None,
            last_now: None,
            stats: PositionerStats::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &TourConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn stats(&self) -> PositionerStats {
        self.stats
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn observer(&self) -> Option<&ChangeObserver> {
        self.observer.as_ref()
    }

    /// Point the positioner at a new step.
    ///
    /// A different target restarts the search (when active). The same target
    /// with a new placement or content length only schedules a recompute.
    pub fn set_target(
        &mut self,
        raw: &str,
        placement: Placement,
        content_len: usize,
        now: Instant,
    ) {
        self.last_now = Some(now);
        let raw = raw.trim();
        if let Some(step) = self.step.as_mut()
            && step.raw == raw
        {
            step.placement = placement;
            step.content_len = content_len;
            if self.phase == Phase::Positioned {
                self.debouncer.trigger(now);
            }
            return;
        }
        self.step = Some(Step {
            raw: raw.to_string(),
            target: TargetSelector::parse(raw, &self.config.locator.tour_attribute),
            placement,
            content_len,
        });
        if self.active {
            self.start_search(now);
        }
    }

    /// Activate or deactivate.
    ///
    /// Deactivation clears every pending timer and disconnects the observer.
    pub fn set_active(&mut self, active: bool, now: Instant) {
        self.last_now = Some(now);
        if active == self.active {
            return;
        }
        self.active = active;
        if active {
            self.start_search(now);
        } else {
            self.teardown();
            self.target_element = None;
            self.positions = None;
            self.error = None;
            self.set_phase(Phase::Idle);
        }
    }

    /// Advance timers: run a due locator attempt, finish settling, or run a
    /// due debounced recompute.
    pub fn tick(&mut self, now: Instant, doc: &mut dyn Document, expander: &mut dyn Expander) {
        self.last_now = Some(now);
        if !self.active {
            return;
        }
        match self.phase {
            Phase::Searching => {
                if self.retry_at.is_none_or(|at| now >= at) {
                    self.run_attempt(now, doc, expander);
                }
            }
            Phase::Settling => {
                if self.settle_at.is_some_and(|at| now >= at) {
                    self.settle_at = None;
                    self.debouncer.cancel();
                    if self.recompute(doc) {
                        self.set_phase(Phase::Positioned);
                    } else {
                        self.start_search(now);
                    }
                }
            }
            Phase::Positioned => {
                if self.debouncer.poll(now) && !self.recompute(doc) {
                    self.start_search(now);
                }
            }
            Phase::Error => {
                if self.debouncer.poll(now) || self.positions.is_none() {
                    self.refresh_fallback(doc);
                }
            }
            Phase::Idle => {}
        }
    }

    /// Window resized. Schedules a recompute, or a fallback refresh after
    /// an error.
    pub fn on_resize(&mut self, now: Instant) {
        self.last_now = Some(now);
        self.schedule_recompute(now);
    }

    /// Page visibility changed; becoming visible schedules a recompute.
    pub fn on_visibility_change(&mut self, visible: bool, now: Instant) {
        self.last_now = Some(now);
        if visible {
            self.schedule_recompute(now);
        }
    }

    /// Mutation records from the host's observer.
    ///
    /// Irrelevant records are ignored. A relevant batch that detached the
    /// target restarts the search; otherwise a recompute is scheduled.
    pub fn on_mutations(&mut self, records: &[MutationRecord], doc: &dyn Document, now: Instant) {
        self.last_now = Some(now);
        if !self.active {
            return;
        }
        let Some(observer) = self.observer.as_ref() else {
            return;
        };
        if !observer.any_relevant(doc, records) {
            return;
        }
        if let Some(node) = self.target_element
            && !doc.is_connected(node)
        {
            tracing::info!(%node, "tour target detached; searching again");
            self.start_search(now);
            return;
        }
        self.schedule_recompute(now);
    }

    /// Recompute immediately.
    ///
    /// With no document change the output is identical to the previous one.
    pub fn recalculate_positions(&mut self, doc: &dyn Document) {
        if !self.active {
            return;
        }
        match self.phase {
            Phase::Positioned | Phase::Settling => {
                if !self.recompute(doc) {
                    let now = self.last_now.unwrap_or_else(Instant::now);
                    self.start_search(now);
                }
            }
            Phase::Error => self.refresh_fallback(doc),
            Phase::Idle | Phase::Searching => {}
        }
    }

    /// Earliest instant at which [`tick`](Self::tick) has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        if !self.active {
            return None;
        }
        match self.phase {
            Phase::Searching => self.retry_at,
            Phase::Settling => self.settle_at,
            Phase::Error if self.positions.is_none() => self.last_now,
            Phase::Positioned | Phase::Error => self.debouncer.deadline(),
            Phase::Idle => None,
        }
    }

    #[must_use]
    pub fn is_positioning(&self) -> bool {
        self.active && matches!(self.phase, Phase::Searching | Phase::Settling)
    }

    #[must_use]
    pub fn positions(&self) -> Option<&PositionStyles> {
        self.positions.as_ref()
    }

    #[must_use]
    pub fn target_element(&self) -> Option<NodeId> {
        self.target_element
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Snapshot for the rendering layer.
    #[must_use]
    pub fn output(&self) -> PositionerOutput {
        PositionerOutput {
            positions: self.positions.clone(),
            target_element: self.target_element,
            is_positioning: self.is_positioning(),
            error: self.error.clone(),
        }
    }

    /// Ticket for the current search.
    #[must_use]
    pub fn ticket(&self) -> SearchTicket {
        SearchTicket {
            generation: self.generation,
        }
    }

    /// Apply the result of an out-of-band search.
    ///
    /// Returns `false` (and drops the result) if the ticket's search has been
    /// superseded, the positioner was deactivated, or the search already
    /// finished.
    pub fn apply_located(
        &mut self,
        ticket: SearchTicket,
        result: Result<NodeId, LocateError>,
        doc: &mut dyn Document,
        now: Instant,
    ) -> bool {
        self.last_now = Some(now);
        if ticket.generation != self.generation || !self.active || self.phase != Phase::Searching {
            self.stats.discarded += 1;
            tracing::debug!(
                ticket = ticket.generation,
                generation = self.generation,
                "discarding stale search result"
            );
            return false;
        }
        match result {
            Ok(node) => self.found(node, now, doc),
            Err(error) => self.fail(&error, doc),
        }
        true
    }

    fn start_search(&mut self, now: Instant) {
        self.teardown();
        self.generation += 1;
        self.target_element = None;
        self.positions = None;
        self.error = None;

        let Some(target) = self.step.as_ref().map(|s| s.target.clone()) else {
            self.set_phase(Phase::Idle);
            return;
        };
        match target {
            Ok(target) => {
                tracing::info!(
                    target_selector = %target,
                    generation = self.generation,
                    "searching for tour target"
                );
                self.locator = Some(Locator::new(target, &self.config));
                self.retry_at = Some(now);
                self.stats.searches += 1;
                self.set_phase(Phase::Searching);
            }
            Err(error) => {
                let message = LocateError::InvalidSelector(error).to_string();
                tracing::warn!(%message, "tour target rejected");
                self.error = Some(message);
                self.set_phase(Phase::Error);
            }
        }
    }

    fn run_attempt(&mut self, now: Instant, doc: &mut dyn Document, expander: &mut dyn Expander) {
        let Some(locator) = self.locator.as_mut() else {
            return;
        };
        self.stats.attempts += 1;
        match locator.attempt(doc, expander) {
            LocateStep::Found(located) => self.found(located.node, now, doc),
            LocateStep::Retry { delay, .. } => self.retry_at = Some(now + delay),
            LocateStep::Exhausted(error) => self.fail(&error, doc),
        }
    }

    fn found(&mut self, node: NodeId, now: Instant, doc: &mut dyn Document) {
        self.retry_at = None;
        let locator = match self.locator.take() {
            Some(locator) => locator,
            None => match &self.step {
                Some(Step {
                    target: Ok(target), ..
                }) => Locator::new(target.clone(), &self.config),
                _ => return,
            },
        };
        if let Err(error) = locator.ensure_visible(doc, node) {
            tracing::warn!(%node, %error, "could not scroll tour target into view");
        }
        self.target_element = Some(node);
        self.observer = Some(ChangeObserver::observe(doc, node, self.container.as_ref()));
        self.settle_at = Some(now + self.config.timing.settle_delay());
        self.set_phase(Phase::Settling);
    }

    fn fail(&mut self, error: &LocateError, doc: &dyn Document) {
        self.retry_at = None;
        self.locator = None;
        self.target_element = None;
        self.error = Some(error.to_string());
        self.refresh_fallback(doc);
        self.set_phase(Phase::Error);
    }

    /// Centered fallback for the current viewport.
    fn refresh_fallback(&mut self, doc: &dyn Document) {
        self.positions = Some(PositionStyles::fallback(doc.viewport(), &self.config));
    }

    fn schedule_recompute(&mut self, now: Instant) {
        if self.active && matches!(self.phase, Phase::Positioned | Phase::Error) {
            self.debouncer.trigger(now);
        }
    }

    /// Recompute styles for the located target. Returns `false` if the target
    /// is gone.
    fn recompute(&mut self, doc: &dyn Document) -> bool {
        let Some(node) = self.target_element else {
            return false;
        };
        let Some(step) = self.step.as_ref() else {
            return false;
        };
        if !doc.is_connected(node) {
            return false;
        }
        let _span = tracing::trace_span!("tourkit.positioner.recompute", %node).entered();
        let Some((bounds, skip_overlay)) = self.target_bounds(doc, node) else {
            return false;
        };
        let request = PositionRequest::new(bounds, step.placement, doc.viewport())
            .content_len(step.content_len)
            .skip_overlay(skip_overlay);
        self.positions = Some(compute_positions_or_fallback(&request, &self.config));
        self.stats.recomputes += 1;
        tracing::trace!(skip_overlay, "positions recomputed");
        true
    }

    /// Target bounds, or the open dropdown panel's bounds for targets with a
    /// dropdown rule (in which case the overlay is skipped).
    fn target_bounds(&self, doc: &dyn Document, node: NodeId) -> Option<(Bounds, bool)> {
        let bounds = doc.bounding_rect(node)?;
        let rule = self
            .step
            .as_ref()
            .and_then(|s| s.target.as_ref().ok())
            .and_then(TargetSelector::tour_value)
            .and_then(|value| self.config.locator.dropdown_rule(value));
        let Some(rule) = rule else {
            return Some((bounds, false));
        };
        let open = doc.attribute(node, "aria-expanded") == Some("true")
            || doc.attribute(node, "data-state") == Some("open");
        if !open {
            return Some((bounds, false));
        }
        let panel = Selector::parse(&rule.panel_selector)
            .ok()
            .and_then(|sel| {
                doc.query_selector_all(&sel)
                    .into_iter()
                    .find(|&n| doc.is_visible(n))
            })
            .and_then(|panel| doc.bounding_rect(panel));
        Some((panel.unwrap_or(bounds), true))
    }

    fn teardown(&mut self) {
        self.locator = None;
        self.retry_at = None;
        self.settle_at = None;
        self.debouncer.cancel();
        if let Some(mut observer) = self.observer.take() {
            observer.disconnect();
        }
    }

    fn set_phase(&mut self, next: Phase) {
        if self.phase != next {
            tracing::debug!(
                from = self.phase.as_str(),
                to = next.as_str(),
                generation = self.generation,
                "positioner phase"
            );
            self.phase = next;
        }
    }
}
