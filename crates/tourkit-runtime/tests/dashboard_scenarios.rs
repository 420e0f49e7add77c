//! End-to-end positioner scenarios against the dashboard fixture.
//!
//! Run:
//!   cargo test -p tourkit-runtime --test dashboard_scenarios

use tourkit_core::config::TourConfig;
use tourkit_core::geometry::ViewportSize;
use tourkit_core::placement::Placement;
use tourkit_dom::document::Document;
use tourkit_dom::fixture::{DashboardNodes, dashboard};
use tourkit_dom::memory::MemoryDocument;
use tourkit_runtime::{
    ClickExpander, Expander, Locator, NoopExpander, Phase, PositionerOutput, StrategyTier,
    TourPositioner,
};
use web_time::Instant;

const DESKTOP: ViewportSize = ViewportSize::new(1440.0, 900.0);
const MOBILE: ViewportSize = ViewportSize::new(390.0, 844.0);

/// Run one step until no deadline is pending, forwarding mutations.
fn run_step(
    config: TourConfig,
    doc: &mut MemoryDocument,
    expander: &mut dyn Expander,
    target: &str,
    placement: Placement,
) -> (PositionerOutput, TourPositioner) {
    let mut now = Instant::now();
    let mut positioner = TourPositioner::new(config);
    positioner.set_target(target, placement, 160, now);
    positioner.set_active(true, now);
    for _ in 0..500 {
        let records = doc.take_mutations();
        positioner.on_mutations(&records, &*doc, now);
        let Some(deadline) = positioner.next_deadline() else {
            break;
        };
        now = now.max(deadline);
        positioner.tick(now, doc, expander);
    }
    (positioner.output(), positioner)
}

fn targets(nodes: &DashboardNodes) -> Vec<(&'static str, tourkit_dom::NodeId)> {
    vec![
        ("[data-tour=\"dashboard-selector\"]", nodes.dashboard_selector),
        ("[data-tour=\"kpi-cards\"]", nodes.kpi_cards),
        ("[data-tour=\"financial-widget\"]", nodes.financial),
        ("[data-tour=\"schedule-widget\"]", nodes.schedule),
        ("[data-tour=\"bim-widget\"]", nodes.bim),
        ("[data-tour=\"user-menu\"]", nodes.user_menu),
        ("[data-tour=\"trade-partner-scorecard\"]", nodes.trade_scorecard),
        ("[data-tour=\"reports-panel\"]", nodes.reports),
    ]
}

#[test]
fn tooltip_stays_inside_viewport_for_every_placement() {
    for viewport in [DESKTOP, MOBILE] {
        let margin = if viewport.width < 768.0 { 12.0 } else { 16.0 };
        for placement in Placement::ALL {
            let (_, nodes) = dashboard(viewport);
            for (target, expected) in targets(&nodes) {
                let (mut doc, _) = dashboard(viewport);
                let mut expander = ClickExpander::new();
                let (out, positioner) =
                    run_step(TourConfig::default(), &mut doc, &mut expander, target, placement);

                assert_eq!(positioner.phase(), Phase::Positioned, "{target} {placement}");
                assert_eq!(out.target_element, Some(expected), "{target}");
                assert_eq!(out.error, None);
                let tooltip = out.positions.expect("positions").tooltip_style;
                let eps = 1e-6;
                assert!(tooltip.left >= margin - eps, "{target} {placement} {tooltip:?}");
                assert!(tooltip.top >= margin - eps, "{target} {placement} {tooltip:?}");
                assert!(
                    tooltip.right() <= viewport.width - margin + eps,
                    "{target} {placement} {tooltip:?}"
                );
                assert!(
                    tooltip.bottom() <= viewport.height - margin + eps,
                    "{target} {placement} {tooltip:?}"
                );
            }
        }
    }
}

#[test]
fn dashboard_selector_scenario() {
    let (mut doc, nodes) = dashboard(DESKTOP);
    doc.scroll_to(600.0);
    let mut expander = ClickExpander::new();
    let (out, positioner) = run_step(
        TourConfig::default(),
        &mut doc,
        &mut expander,
        "[data-tour=\"dashboard-selector\"]",
        Placement::Bottom,
    );
    assert_eq!(positioner.stats().attempts, 1);
    assert_eq!(doc.scroll_y(), 0.0);
    assert_eq!(out.error, None);
    assert_eq!(out.target_element, Some(nodes.dashboard_selector));
    let positions = out.positions.unwrap();
    assert_eq!(positions.final_placement, Placement::Bottom);
    let button = doc.bounding_rect(nodes.dashboard_selector).unwrap();
    assert!(positions.tooltip_style.top >= button.bottom);
}

#[test]
fn nonexistent_widget_scenario() {
    for placement in Placement::ALL {
        let (mut doc, _) = dashboard(DESKTOP);
        let mut expander = ClickExpander::new();
        let (out, positioner) = run_step(
            TourConfig::default(),
            &mut doc,
            &mut expander,
            "[data-tour=\"nonexistent-widget\"]",
            placement,
        );
        assert_eq!(positioner.phase(), Phase::Error);
        assert_eq!(positioner.stats().attempts, 19);
        assert!(!out.is_positioning);
        assert_eq!(out.target_element, None);
        let error = out.error.unwrap();
        assert!(!error.is_empty());
        assert!(error.contains("nonexistent-widget"));
        let fallback = out.positions.unwrap();
        assert!(fallback.is_fallback);
        assert_eq!(fallback.final_placement, Placement::Center);
    }
}

#[test]
fn attempt_count_follows_configured_retries() {
    let mut config = TourConfig::default();
    config.timing.max_retries = 4;
    let (mut doc, _) = dashboard(DESKTOP);
    let mut locator = Locator::parse("[data-tour=\"missing\"]", &config).unwrap();
    let result = locator.run(&mut doc, &mut NoopExpander::new());
    assert!(result.is_err());
    assert_eq!(locator.attempts(), 5);
}

#[test]
fn tiers_reached_on_dashboard() {
    let cases = [
        ("[data-tour=\"kpi-cards\"]", StrategyTier::Direct, 0),
        ("[data-tour=\"financial-widget\"]", StrategyTier::KnownLocation, 6),
        ("[data-tour=\"trade-partner-scorecard\"]", StrategyTier::ExpandCollapsed, 13),
        ("[data-tour=\"reports-panel\"]", StrategyTier::PageScroll, 16),
    ];
    for (target, tier, attempt) in cases {
        let (mut doc, _) = dashboard(DESKTOP);
        let config = TourConfig::default();
        let mut locator = Locator::parse(target, &config).unwrap();
        let located = locator.run(&mut doc, &mut ClickExpander::new()).unwrap();
        assert_eq!(located.tier, tier, "{target}");
        assert_eq!(located.attempt, attempt, "{target}");
    }
}

#[test]
fn configured_known_location_is_used() {
    let config = TourConfig::from_toml_str(
        r#"
[locator.known_locations]
"schedule-overview" = ["[data-tour=\"schedule-widget\"]"]
"#,
    )
    .unwrap();
    let (mut doc, nodes) = dashboard(DESKTOP);
    let mut locator = Locator::parse("[data-tour=\"schedule-overview\"]", &config).unwrap();
    let located = locator.run(&mut doc, &mut NoopExpander::new()).unwrap();
    assert_eq!(located.node, nodes.schedule);
    assert_eq!(located.tier, StrategyTier::KnownLocation);
}

#[test]
fn disabled_expander_never_clicks() {
    let (mut doc, nodes) = dashboard(DESKTOP);
    let mut expander = NoopExpander::new();
    let (out, _) = run_step(
        TourConfig::default(),
        &mut doc,
        &mut expander,
        "[data-tour=\"trade-partner-scorecard\"]",
        Placement::Top,
    );
    assert!(doc.clicks().is_empty());
    assert!(expander.attempts() > 0);
    assert!(out.error.is_some());
    assert!(!doc.is_visible(nodes.trade_scorecard));
}

#[test]
fn resized_viewport_switches_to_mobile_layout() {
    let (mut doc, nodes) = dashboard(DESKTOP);
    let mut expander = ClickExpander::new();
    let mut now = Instant::now();
    let mut positioner = TourPositioner::new(TourConfig::default());
    positioner.set_target("[data-tour=\"bim-widget\"]", Placement::Right, 100, now);
    positioner.set_active(true, now);
    while let Some(deadline) = positioner.next_deadline() {
        now = now.max(deadline);
        positioner.tick(now, &mut doc, &mut expander);
    }
    assert_eq!(positioner.target_element(), Some(nodes.bim));
    let desktop_width = positioner.positions().unwrap().tooltip_style.width;
    assert_eq!(desktop_width, 400.0);

    doc.resize(MOBILE);
    positioner.on_resize(now);
    while let Some(deadline) = positioner.next_deadline() {
        now = now.max(deadline);
        positioner.tick(now, &mut doc, &mut expander);
    }
    let mobile = positioner.positions().unwrap();
    assert_eq!(mobile.tooltip_style.width, 390.0 - 24.0);
    assert_eq!(mobile.tooltip_style.left, 12.0);
}

#[test]
fn tab_becoming_visible_recomputes() {
    let (mut doc, _) = dashboard(DESKTOP);
    let mut expander = ClickExpander::new();
    let mut now = Instant::now();
    let mut positioner = TourPositioner::new(TourConfig::default());
    positioner.set_target("[data-tour=\"kpi-cards\"]", Placement::Bottom, 100, now);
    positioner.set_active(true, now);
    while let Some(deadline) = positioner.next_deadline() {
        now = now.max(deadline);
        positioner.tick(now, &mut doc, &mut expander);
    }
    let before = positioner.stats().recomputes;
    positioner.on_visibility_change(false, now);
    assert_eq!(positioner.next_deadline(), None);
    positioner.on_visibility_change(true, now);
    let deadline = positioner.next_deadline().unwrap();
    positioner.tick(deadline, &mut doc, &mut expander);
    assert_eq!(positioner.stats().recomputes, before + 1);
}
