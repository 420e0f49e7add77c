#![forbid(unsafe_code)]

//! Immutable tour configuration.
//!
//! Every tunable number the locator, the geometry engine and the recompute
//! scheduler use lives in one [`TourConfig`], which is passed into the engine
//! at construction. It can be loaded from TOML or JSON:
//!
//! ```toml
//! [timing]
//! max_retries = 12
//! debounce_ms = 100
//!
//! [layout]
//! mobile_breakpoint = 640.0
//! ```
//!
//! ```rust,ignore
//! let config = TourConfig::from_toml_file("tour.toml")?;
//! ```
//!
//! # Defaults
//!
//! `TourConfig::default()` reproduces the dashboard tour's built-in constants.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::style::Rgba;

// ---------------------------------------------------------------------------
// Top-level TourConfig
// ---------------------------------------------------------------------------

/// Top-level configuration for the tour engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TourConfig {
    /// Retry, settle and debounce timing.
    pub timing: TimingConfig,
    /// Tooltip sizing and viewport rules.
    pub layout: LayoutConfig,
    /// Element search heuristics.
    pub locator: LocatorConfig,
    /// Colors and stacking.
    pub theme: TourTheme,
}

impl TourConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.validated()
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Load from a file, picking the format from the extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::TomlSer)
    }

    fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let t = &self.timing;
        let l = &self.layout;

        if t.base_retry_delay_ms == 0 {
            errors.push("timing.base_retry_delay_ms must be > 0".into());
        }
        if !(t.backoff_factor >= 1.0 && t.backoff_factor.is_finite()) {
            errors.push(format!(
                "timing.backoff_factor must be >= 1, got {}",
                t.backoff_factor
            ));
        }
        if !(t.backoff_divisor > 0.0 && t.backoff_divisor.is_finite()) {
            errors.push(format!(
                "timing.backoff_divisor must be > 0, got {}",
                t.backoff_divisor
            ));
        }
        if t.max_retry_delay_ms < t.base_retry_delay_ms {
            errors.push("timing.max_retry_delay_ms must be >= base_retry_delay_ms".into());
        }
        if t.debounce_ms == 0 {
            errors.push("timing.debounce_ms must be > 0".into());
        }

        for (name, value) in [
            ("layout.mobile_breakpoint", l.mobile_breakpoint),
            ("layout.max_tooltip_width", l.max_tooltip_width),
            ("layout.min_tooltip_height", l.min_tooltip_height),
            ("layout.chars_per_line", l.chars_per_line),
            ("layout.line_height", l.line_height),
            ("layout.fallback_tooltip_width", l.fallback_tooltip_width),
            ("layout.fallback_tooltip_height", l.fallback_tooltip_height),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                errors.push(format!("{name} must be > 0, got {value}"));
            }
        }
        for (name, value) in [
            ("layout.margin", l.margin),
            ("layout.mobile_margin", l.mobile_margin),
            ("layout.target_padding", l.target_padding),
            ("layout.tooltip_gap", l.tooltip_gap),
            ("layout.header_height", l.header_height),
            ("layout.footer_height", l.footer_height),
            ("layout.button_row_height", l.button_row_height),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                errors.push(format!("{name} must be >= 0, got {value}"));
            }
        }
        if !(l.max_tooltip_height_fraction > 0.0 && l.max_tooltip_height_fraction <= 1.0) {
            errors.push(format!(
                "layout.max_tooltip_height_fraction must be in (0, 1], got {}",
                l.max_tooltip_height_fraction
            ));
        }

        if self.locator.tour_attribute.trim().is_empty() {
            errors.push("locator.tour_attribute must not be empty".into());
        }
        for rule in &self.locator.dropdown_rules {
            if rule.trigger.is_empty() || rule.panel_selector.is_empty() {
                errors.push(
                    "locator.dropdown_rules entries need a trigger and a panel_selector".into(),
                );
            }
        }

        for (name, color) in [
            ("theme.overlay", self.theme.overlay),
            ("theme.passthrough_overlay", self.theme.passthrough_overlay),
        ] {
            if !(0.0..=1.0).contains(&color.a) {
                errors.push(format!("{name} alpha must be in [0, 1], got {}", color.a));
            }
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Retry, settle and debounce timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay before the second search attempt.
    pub base_retry_delay_ms: u64,
    /// Growth factor of the retry delay.
    pub backoff_factor: f64,
    /// The exponent is `attempt / backoff_divisor`.
    pub backoff_divisor: f64,
    /// Upper bound on any single retry delay.
    pub max_retry_delay_ms: u64,
    /// Retries after the first attempt before the search gives up.
    pub max_retries: u32,
    /// Wait after scrolling the found target into view, for CSS transitions.
    pub settle_delay_ms: u64,
    /// Quiet period for coalescing resize / mutation / visibility triggers.
    pub debounce_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            base_retry_delay_ms: 100,
            backoff_factor: 1.5,
            backoff_divisor: 3.0,
            max_retry_delay_ms: 1000,
            max_retries: 18,
            settle_delay_ms: 300,
            debounce_ms: 150,
        }
    }
}

impl TimingConfig {
    pub fn base_retry_delay(&self) -> Duration {
        Duration::from_millis(self.base_retry_delay_ms)
    }

    pub fn max_retry_delay(&self) -> Duration {
        Duration::from_millis(self.max_retry_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Tooltip sizing and viewport rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Viewports narrower than this use the pinned mobile layout.
    pub mobile_breakpoint: f64,
    /// Minimum distance between the tooltip and the viewport edge.
    pub margin: f64,
    /// Margin used below the breakpoint.
    pub mobile_margin: f64,
    /// Breathing room cut out around the target.
    pub target_padding: f64,
    /// Distance between the padded target and the tooltip.
    pub tooltip_gap: f64,
    pub max_tooltip_width: f64,
    pub min_tooltip_height: f64,
    /// Tooltip height cap as a fraction of the viewport height.
    pub max_tooltip_height_fraction: f64,
    pub header_height: f64,
    pub footer_height: f64,
    pub button_row_height: f64,
    /// Characters per rendered content line, for height estimation.
    pub chars_per_line: f64,
    pub line_height: f64,
    pub fallback_tooltip_width: f64,
    pub fallback_tooltip_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint: 768.0,
            margin: 16.0,
            mobile_margin: 12.0,
            target_padding: 8.0,
            tooltip_gap: 12.0,
            max_tooltip_width: 400.0,
            min_tooltip_height: 180.0,
            max_tooltip_height_fraction: 0.7,
            header_height: 56.0,
            footer_height: 48.0,
            button_row_height: 44.0,
            chars_per_line: 48.0,
            line_height: 22.0,
            fallback_tooltip_width: 360.0,
            fallback_tooltip_height: 240.0,
        }
    }
}

/// A dropdown whose open panel must stay interactive while highlighted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownRule {
    /// Tour value of the trigger element.
    pub trigger: String,
    /// Selector of the panel shown while the dropdown is open.
    pub panel_selector: String,
}

/// Element search heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Attribute carrying the tour identifier.
    pub tour_attribute: String,
    /// Closest ancestor matching this is the mutation observer's scope.
    pub observer_container_selector: String,
    /// Containers scrolled into view for targets with no specific route.
    pub scroll_containers: Vec<String>,
    /// Container of dashboard widgets.
    pub grid_container_selector: String,
    /// Main content region.
    pub main_content_selector: String,
    /// Selectors matching collapsed sections that may hide the target.
    pub collapsed_selectors: Vec<String>,
    /// Words shorter than this are ignored when matching section text.
    pub min_match_word_len: usize,
    /// Known alternative locations for dashboard targets, by tour value.
    pub known_locations: BTreeMap<String, Vec<String>>,
    pub dropdown_rules: Vec<DropdownRule>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        let known_locations = [
            (
                "dashboard-selector",
                &[
                    "header [role=\"combobox\"]",
                    "header select",
                    "[aria-label*=\"dashboard\" i]",
                ][..],
            ),
            (
                "kpi-cards",
                &[".kpi-grid", "[data-section=\"kpis\"]"][..],
            ),
            (
                "financial-widget",
                &["[data-widget=\"financial\"]", ".financial-summary"][..],
            ),
            (
                "schedule-widget",
                &["[data-widget=\"schedule\"]", ".gantt-chart"][..],
            ),
            (
                "bim-widget",
                &["[data-widget=\"bim\"]", ".innovation-panel"][..],
            ),
            ("navigation", &["nav", "[role=\"navigation\"]"][..]),
            ("user-menu", &["header [aria-haspopup=\"menu\"]"][..]),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
        .collect();

        Self {
            tour_attribute: "data-tour".into(),
            observer_container_selector: "[data-tour-container]".into(),
            scroll_containers: vec![
                "main".into(),
                "[role=\"main\"]".into(),
                ".dashboard-container".into(),
                ".overflow-y-auto".into(),
            ],
            grid_container_selector: "[data-tour=\"dashboard-grid\"], .dashboard-grid, .grid"
                .into(),
            main_content_selector: "main, [role=\"main\"], [data-tour=\"main-content\"]".into(),
            collapsed_selectors: vec![
                "[aria-expanded=\"false\"]".into(),
                ".collapsed".into(),
                "[data-state=\"closed\"]".into(),
                "details:not([open])".into(),
                ".accordion:not(.open)".into(),
                ".dropdown:not(.open)".into(),
            ],
            min_match_word_len: 3,
            known_locations,
            dropdown_rules: vec![DropdownRule {
                trigger: "dashboard-selector".into(),
                panel_selector: "[data-tour=\"dashboard-selector-menu\"], [role=\"listbox\"]"
                    .into(),
            }],
        }
    }
}

impl LocatorConfig {
    /// Dropdown rule for a tour value, if any.
    #[must_use]
    pub fn dropdown_rule(&self, tour_value: &str) -> Option<&DropdownRule> {
        self.dropdown_rules.iter().find(|r| r.trigger == tour_value)
    }
}

/// Colors and stacking order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TourTheme {
    /// Dimming tint outside the cutout.
    pub overlay: Rgba,
    /// Lighter tint used when the overlay must let clicks through.
    pub passthrough_overlay: Rgba,
    pub tooltip_background: Rgba,
    pub tooltip_border: Rgba,
    pub tooltip_text: Rgba,
    pub border_radius: f64,
    pub overlay_z_index: i32,
    pub tooltip_z_index: i32,
    pub transition_ms: u64,
}

impl Default for TourTheme {
    fn default() -> Self {
        Self::light()
    }
}

impl TourTheme {
    /// Light dashboard theme.
    #[must_use]
    pub fn light() -> Self {
        Self {
            overlay: Rgba::new(15, 23, 42, 0.6),
            passthrough_overlay: Rgba::new(15, 23, 42, 0.15),
            tooltip_background: Rgba::rgb(255, 255, 255),
            tooltip_border: Rgba::rgb(226, 232, 240),
            tooltip_text: Rgba::rgb(15, 23, 42),
            border_radius: 12.0,
            overlay_z_index: 9998,
            tooltip_z_index: 10000,
            transition_ms: 200,
        }
    }

    /// Dark dashboard theme.
    #[must_use]
    pub fn dark() -> Self {
        Self {
            overlay: Rgba::new(0, 0, 0, 0.75),
            passthrough_overlay: Rgba::new(0, 0, 0, 0.2),
            tooltip_background: Rgba::rgb(30, 41, 59),
            tooltip_border: Rgba::rgb(51, 65, 85),
            tooltip_text: Rgba::rgb(241, 245, 249),
            ..Self::light()
        }
    }

    /// High-contrast theme.
    #[must_use]
    pub fn high_contrast() -> Self {
        Self {
            overlay: Rgba::new(0, 0, 0, 0.85),
            passthrough_overlay: Rgba::new(0, 0, 0, 0.3),
            tooltip_background: Rgba::rgb(0, 0, 0),
            tooltip_border: Rgba::rgb(255, 255, 0),
            tooltip_text: Rgba::rgb(255, 255, 255),
            border_radius: 4.0,
            transition_ms: 0,
            ..Self::light()
        }
    }

    /// Look a theme up by name.
    #[must_use]
    pub fn named(name: &str) -> Option<Self> {
        match name {
            "light" => Some(Self::light()),
            "dark" => Some(Self::dark()),
            "high-contrast" | "high_contrast" => Some(Self::high_contrast()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from loading a [`TourConfig`].
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    TomlSer(toml::ser::Error),
    Json(serde_json::Error),
    /// The file parsed but values are out of range.
    Invalid(Vec<String>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Toml(e) => write!(f, "config TOML parse error: {e}"),
            ConfigError::TomlSer(e) => write!(f, "config TOML serialize error: {e}"),
            ConfigError::Json(e) => write!(f, "config JSON parse error: {e}"),
            ConfigError::Invalid(errors) => {
                write!(f, "invalid config: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Toml(e) => Some(e),
            ConfigError::TomlSer(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}
