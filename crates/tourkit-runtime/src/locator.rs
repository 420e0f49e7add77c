#![forbid(unsafe_code)]

//! Element locator.
//!
//! Finds a visible, attached element for a tour target, escalating through
//! six strategy tiers as the attempt counter advances:
//!
//! | attempts | tier | strategy |
//! |---|---|---|
//! | 0–2 | [`StrategyTier::Direct`] | query the selector |
//! | 3–5 | [`StrategyTier::Fallback`] | partial tour attribute, `data-testid`/`id`, text |
//! | 6–8 | [`StrategyTier::KnownLocation`] | configured alternative selectors |
//! | 9–12 | [`StrategyTier::ScrollContainers`] | scroll likely containers, then query |
//! | 13–15 | [`StrategyTier::ExpandCollapsed`] | open plausible collapsed sections, then query |
//! | 16+ | [`StrategyTier::PageScroll`] | walk the page a viewport at a time |
//!
//! Each call to [`Locator::attempt`] runs exactly one tier and either finds
//! the element, asks to be retried after a backoff delay, or reports
//! exhaustion after `max_retries + 1` attempts. The locator never sleeps; the
//! host owns the timer.

use std::fmt;

use tourkit_core::config::TourConfig;
use tourkit_dom::document::{Document, DomError, NodeId};
use tourkit_dom::selector::{Selector, SelectorError};
use web_time::Duration;

use crate::backoff::Backoff;
use crate::expander::Expander;
use crate::target::{TargetRoute, TargetSelector};

/// Upper bound on page-scroll steps in one attempt.
const MAX_PAGE_STEPS: usize = 256;

/// Search strategy for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StrategyTier {
    Direct,
    Fallback,
    KnownLocation,
    ScrollContainers,
    ExpandCollapsed,
    PageScroll,
}

impl StrategyTier {
    /// Tier for a 0-indexed attempt.
    #[must_use]
    pub const fn for_attempt(attempt: u32) -> Self {
        match attempt {
            0..=2 => Self::Direct,
            3..=5 => Self::Fallback,
            6..=8 => Self::KnownLocation,
            9..=12 => Self::ScrollContainers,
            13..=15 => Self::ExpandCollapsed,
            _ => Self::PageScroll,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Fallback => "fallback",
            Self::KnownLocation => "known_location",
            Self::ScrollContainers => "scroll_containers",
            Self::ExpandCollapsed => "expand_collapsed",
            Self::PageScroll => "page_scroll",
        }
    }
}

impl fmt::Display for StrategyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located {
    pub node: NodeId,
    /// 0-indexed attempt that found the element.
    pub attempt: u32,
    pub tier: StrategyTier,
}

/// Outcome of one [`Locator::attempt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateStep {
    Found(Located),
    /// Not found yet; call again after `delay`.
    Retry { attempt: u32, delay: Duration },
    Exhausted(LocateError),
}

/// Why a target could not be located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
    /// Every attempt failed.
    NotFound { target: String, attempts: u32 },
    /// The target string is not a valid selector.
    InvalidSelector(SelectorError),
}

impl fmt::Display for LocateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocateError::NotFound { target, attempts } => {
                write!(f, "tour target {target} not found after {attempts} attempts")
            }
            LocateError::InvalidSelector(e) => write!(f, "invalid tour target: {e}"),
        }
    }
}

impl std::error::Error for LocateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LocateError::InvalidSelector(e) => Some(e),
            LocateError::NotFound { .. } => None,
        }
    }
}

impl From<SelectorError> for LocateError {
    fn from(e: SelectorError) -> Self {
        LocateError::InvalidSelector(e)
    }
}

/// Multi-tier search for one target.
#[derive(Debug, Clone)]
pub struct Locator {
    target: TargetSelector,
    route: TargetRoute,
    tour_attribute: String,
    any_tour_attribute: Option<Selector>,
    known: Vec<Selector>,
    scroll_containers: Vec<Selector>,
    grid: Option<Selector>,
    main: Option<Selector>,
    collapsed: Vec<Selector>,
    min_word_len: usize,
    backoff: Backoff,
    max_retries: u32,
    attempt: u32,
    exhausted: bool,
}

impl Locator {
    /// Locator for an already parsed target.
    ///
    /// Invalid selectors in the locator config are skipped with a warning.
    pub fn new(target: TargetSelector, config: &TourConfig) -> Self {
        let locator = &config.locator;
        let known = target
            .tour_value()
            .and_then(|v| locator.known_locations.get(v))
            .map(|sources| parse_all(sources))
            .unwrap_or_default();
        Self {
            route: target.route(),
            tour_attribute: locator.tour_attribute.clone(),
            any_tour_attribute: parse_one(&format!("[{}]", locator.tour_attribute)),
            known,
            scroll_containers: parse_all(&locator.scroll_containers),
            grid: parse_one(&locator.grid_container_selector),
            main: parse_one(&locator.main_content_selector),
            collapsed: parse_all(&locator.collapsed_selectors),
            min_word_len: locator.min_match_word_len,
            backoff: Backoff::from_timing(&config.timing),
            max_retries: config.timing.max_retries,
            attempt: 0,
            exhausted: false,
            target,
        }
    }

    /// Parse `raw` and build a locator for it.
    pub fn parse(raw: &str, config: &TourConfig) -> Result<Self, LocateError> {
        let target = TargetSelector::parse(raw, &config.locator.tour_attribute)?;
        Ok(Self::new(target, config))
    }

    #[must_use]
    pub fn target(&self) -> &TargetSelector {
        &self.target
    }

    #[must_use]
    pub fn route(&self) -> TargetRoute {
        self.route
    }

    /// Attempts made so far.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Total attempts before exhaustion.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Run the next tier.
    pub fn attempt(&mut self, doc: &mut dyn Document, expander: &mut dyn Expander) -> LocateStep {
        if self.exhausted {
            return LocateStep::Exhausted(self.not_found());
        }
        let attempt = self.attempt;
        let tier = StrategyTier::for_attempt(attempt);
        let _span = tracing::debug_span!(
            "tourkit.locate.attempt",
            target_selector = %self.target,
            attempt,
            tier = tier.as_str()
        )
        .entered();

        let found = match tier {
            StrategyTier::Direct => self.direct(doc),
            StrategyTier::Fallback => self.fallback(doc),
            StrategyTier::KnownLocation => self.known_location(doc),
            StrategyTier::ScrollContainers => self.scroll_containers(doc),
            StrategyTier::ExpandCollapsed => self.expand_collapsed(doc, expander),
            StrategyTier::PageScroll => self.page_scroll(doc),
        };
        self.attempt += 1;

        if let Some(node) = found {
            tracing::info!(
                target_selector = %self.target,
                attempt,
                tier = tier.as_str(),
                %node,
                "tour target located"
            );
            return LocateStep::Found(Located {
                node,
                attempt,
                tier,
            });
        }
        if self.attempt >= self.max_attempts() {
            self.exhausted = true;
            let error = self.not_found();
            tracing::warn!(
                target_selector = %self.target,
                attempts = self.attempt,
                "tour target not found"
            );
            return LocateStep::Exhausted(error);
        }
        LocateStep::Retry {
            attempt,
            delay: self.backoff.delay(attempt),
        }
    }

    /// Drive every remaining attempt back to back, ignoring delays.
    ///
    /// Suitable when nothing else mutates the document between attempts.
    pub fn run(
        &mut self,
        doc: &mut dyn Document,
        expander: &mut dyn Expander,
    ) -> Result<Located, LocateError> {
        loop {
            match self.attempt(doc, expander) {
                LocateStep::Found(located) => return Ok(located),
                LocateStep::Retry { .. } => {}
                LocateStep::Exhausted(error) => return Err(error),
            }
        }
    }

    /// Bring a located element into view: header targets scroll the page to
    /// the top, everything else is scrolled to the center.
    pub fn ensure_visible(&self, doc: &mut dyn Document, node: NodeId) -> Result<(), DomError> {
        match self.route {
            TargetRoute::Header => {
                doc.scroll_to(0.0);
                Ok(())
            }
            _ => doc.scroll_into_view(node),
        }
    }

    fn not_found(&self) -> LocateError {
        LocateError::NotFound {
            target: self.target.as_str().to_string(),
            attempts: self.attempt,
        }
    }

    fn direct(&self, doc: &dyn Document) -> Option<NodeId> {
        first_visible(doc, self.target.selector())
    }

    fn fallback(&self, doc: &dyn Document) -> Option<NodeId> {
        let value = self.target.tour_value()?;
        let needle = value.to_lowercase();

        if let Some(any) = &self.any_tour_attribute {
            let partial = doc.query_selector_all(any).into_iter().find(|&n| {
                doc.is_visible(n)
                    && doc.attribute(n, &self.tour_attribute).is_some_and(|v| {
                        let v = v.to_lowercase();
                        !v.is_empty() && (v.contains(&needle) || needle.contains(&v))
                    })
            });
            if partial.is_some() {
                return partial;
            }
        }

        let root = doc.root();
        let elements = doc.descendants(root);
        let by_id = elements.iter().copied().find(|&n| {
            doc.is_visible(n)
                && (doc.attribute(n, "data-testid") == Some(value)
                    || doc.attribute(n, "id") == Some(value))
        });
        if by_id.is_some() {
            return by_id;
        }

        // Leaf-most element whose text mentions the de-slugged value.
        let phrase = value.replace(['-', '_'], " ").to_lowercase();
        elements
            .into_iter()
            .filter(|&n| doc.is_visible(n))
            .filter_map(|n| {
                let text = doc.text_content(n).to_lowercase();
                text.contains(&phrase).then_some((text.len(), n))
            })
            .min_by_key(|(len, _)| *len)
            .map(|(_, n)| n)
    }

    fn known_location(&self, doc: &dyn Document) -> Option<NodeId> {
        self.known.iter().find_map(|sel| first_visible(doc, sel))
    }

    fn scroll_containers(&self, doc: &mut dyn Document) -> Option<NodeId> {
        match self.route {
            TargetRoute::Header => doc.scroll_to(0.0),
            TargetRoute::Widget => scroll_first_into_view(doc, self.grid.as_ref()),
            TargetRoute::Content => scroll_first_into_view(doc, self.main.as_ref()),
            TargetRoute::Generic => {
                for container in &self.scroll_containers {
                    scroll_first_into_view(doc, Some(container));
                }
            }
        }
        self.direct(doc)
    }

    fn expand_collapsed(
        &self,
        doc: &mut dyn Document,
        expander: &mut dyn Expander,
    ) -> Option<NodeId> {
        let words: Vec<String> = self
            .target
            .tour_value()
            .map(|v| {
                v.split(|c: char| !c.is_alphanumeric())
                    .filter(|w| w.chars().count() >= self.min_word_len)
                    .map(str::to_lowercase)
                    .collect()
            })
            .unwrap_or_default();

        if !words.is_empty() {
            let mut candidates: Vec<NodeId> = Vec::new();
            for sel in &self.collapsed {
                for n in doc.query_selector_all(sel) {
                    if !candidates.contains(&n) {
                        candidates.push(n);
                    }
                }
            }
            for node in candidates {
                let text = doc.text_content(node).to_lowercase();
                if words.iter().any(|w| text.contains(w.as_str())) {
                    expander.try_expand(doc, node);
                }
            }
        }
        self.direct(doc)
    }

    fn page_scroll(&self, doc: &mut dyn Document) -> Option<NodeId> {
        let original = doc.scroll_y();
        let step = doc.viewport().height.max(1.0);
        let mut y = 0.0;
        for _ in 0..MAX_PAGE_STEPS {
            doc.scroll_to(y);
            if let Some(node) = self.direct(doc) {
                return Some(node);
            }
            let max_scroll = (doc.document_height() - doc.viewport().height).max(0.0);
            if y >= max_scroll {
                break;
            }
            y = (y + step).min(max_scroll);
        }
        doc.scroll_to(original);
        None
    }
}

fn first_visible(doc: &dyn Document, selector: &Selector) -> Option<NodeId> {
    doc.query_selector_all(selector)
        .into_iter()
        .find(|&n| doc.is_visible(n))
}

fn scroll_first_into_view(doc: &mut dyn Document, selector: Option<&Selector>) {
    let Some(node) = selector.and_then(|sel| doc.query_selector(sel)) else {
        return;
    };
    if let Err(error) = doc.scroll_into_view(node) {
        tracing::debug!(%node, %error, "container scroll failed");
    }
}

fn parse_one(source: &str) -> Option<Selector> {
    match Selector::parse(source) {
        Ok(sel) => Some(sel),
        Err(error) => {
            tracing::warn!(%error, "skipping invalid locator selector");
            None
        }
    }
}

fn parse_all(sources: &[String]) -> Vec<Selector> {
    sources.iter().filter_map(|s| parse_one(s)).collect()
}
