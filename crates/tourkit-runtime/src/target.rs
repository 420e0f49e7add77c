#![forbid(unsafe_code)]

//! Tour step targets.

use std::fmt;

use tourkit_dom::selector::{Selector, SelectorError};

/// A step's target: the raw selector string, parsed.
///
/// Targets follow the `[data-tour="identifier"]` convention; the
/// identifier (the *tour value*) drives the heuristic tiers of the locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSelector {
    raw: String,
    selector: Selector,
    value: Option<String>,
}

impl TargetSelector {
    /// Parse a target, reading its tour value from `tour_attribute` or, if
    /// that attribute is absent, from the first `=` attribute condition.
    pub fn parse(raw: &str, tour_attribute: &str) -> Result<Self, SelectorError> {
        let selector = Selector::parse(raw)?;
        let value = selector
            .attribute_value(Some(tour_attribute))
            .or_else(|| selector.attribute_value(None))
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Ok(Self {
            raw: raw.trim().to_string(),
            selector,
            value,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// The `x` of `[data-tour="x"]`.
    #[must_use]
    pub fn tour_value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Where the target most likely lives.
    #[must_use]
    pub fn route(&self) -> TargetRoute {
        let role_content = self
            .selector
            .attribute_value(Some("role"))
            .is_some_and(|role| role.eq_ignore_ascii_case("content"));
        if role_content {
            return TargetRoute::Content;
        }
        self.value
            .as_deref()
            .map_or(TargetRoute::Generic, TargetRoute::classify)
    }
}

impl fmt::Display for TargetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Coarse classification of a target by its tour value, used to pick the
/// container to scroll to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetRoute {
    /// Header controls such as the dashboard selector: scroll to the top.
    Header,
    /// Dashboard widgets: scroll the widget grid into view.
    Widget,
    /// Main content regions.
    Content,
    /// Anything else: try every configured scroll container.
    Generic,
}

impl TargetRoute {
    #[must_use]
    pub fn classify(value: &str) -> Self {
        let value = value.to_ascii_lowercase();
        if value.contains("header") || value.contains("selector") {
            Self::Header
        } else if value.contains("widget") {
            Self::Widget
        } else if value.contains("content") {
            Self::Content
        } else {
            Self::Generic
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Widget => "widget",
            Self::Content => "content",
            Self::Generic => "generic",
        }
    }
}
