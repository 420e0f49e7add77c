#![forbid(unsafe_code)]

//! A representative construction dashboard document.
//!
//! The layout mirrors the real dashboard closely enough to exercise every
//! locator tier: a fixed header with the dashboard selector and its menu, a
//! KPI strip, a widget grid (one widget reachable only through a known
//! alternative location), a closed `<details>` section hiding the trade
//! partner scorecard, and a lazily rendered reports panel far down the page.

use tourkit_core::geometry::ViewportSize;

use crate::document::NodeId;
use crate::memory::{MemoryDocument, NodeSpec};

/// Handles to the interesting elements of [`dashboard`].
#[derive(Debug, Clone, Copy)]
pub struct DashboardNodes {
    pub header: NodeId,
    pub dashboard_selector: NodeId,
    pub dashboard_menu: NodeId,
    pub navigation: NodeId,
    pub user_menu: NodeId,
    pub main: NodeId,
    pub kpi_cards: NodeId,
    pub grid: NodeId,
    /// Has no tour attribute; found via `[data-widget="financial"]`.
    pub financial: NodeId,
    pub schedule: NodeId,
    pub bim: NodeId,
    pub trade_details: NodeId,
    pub trade_summary: NodeId,
    /// Hidden inside the closed `<details>`.
    pub trade_scorecard: NodeId,
    /// Rendered only once scrolled near the bottom of the page.
    pub reports: NodeId,
}

/// Build the dashboard at the given viewport size.
#[must_use]
pub fn dashboard(viewport: ViewportSize) -> (MemoryDocument, DashboardNodes) {
    let w = viewport.width;
    let inner = (w - 48.0).max(0.0);
    let half = ((w - 72.0) / 2.0).max(0.0);

    let mut doc = MemoryDocument::new(viewport);
    let body = doc.body();

    let header = doc.append(
        body,
        NodeSpec::new("header")
            .tour("app-header")
            .attr("data-tour-container", "")
            .rect(0.0, 0.0, w, 64.0)
            .fixed(),
    );
    let dashboard_selector = doc.append(
        header,
        NodeSpec::new("button")
            .tour("dashboard-selector")
            .attr("role", "combobox")
            .attr("aria-expanded", "false")
            .attr("aria-controls", "dashboard-menu")
            .attr("data-state", "closed")
            .text("Project Dashboard")
            .rect(24.0, 12.0, 240.0, 40.0)
            .fixed(),
    );
    let dashboard_menu = doc.append(
        header,
        NodeSpec::new("div")
            .id("dashboard-menu")
            .tour("dashboard-selector-menu")
            .attr("role", "listbox")
            .text("Executive Summary Field Operations Preconstruction")
            .rect(24.0, 56.0, 240.0, 220.0)
            .fixed(),
    );
    let navigation = doc.append(
        header,
        NodeSpec::new("nav")
            .tour("navigation")
            .attr("role", "navigation")
            .text("Overview Financials Schedule Reports")
            .rect(300.0, 12.0, 600.0_f64.min((w - 380.0).max(0.0)), 40.0)
            .fixed(),
    );
    let user_menu = doc.append(
        header,
        NodeSpec::new("button")
            .tour("user-menu")
            .attr("aria-haspopup", "menu")
            .text("PM")
            .rect((w - 64.0).max(0.0), 12.0, 40.0, 40.0)
            .fixed(),
    );

    let main = doc.append(
        body,
        NodeSpec::new("main")
            .attr("role", "main")
            .attr("data-tour-container", "")
            .rect(0.0, 64.0, w, 2400.0),
    );
    let kpi_cards = doc.append(
        main,
        NodeSpec::new("section")
            .tour("kpi-cards")
            .class("kpi-grid")
            .text("Budget Spent Schedule Variance Safety Incidents")
            .rect(24.0, 88.0, inner, 140.0),
    );
    let grid = doc.append(
        main,
        NodeSpec::new("div")
            .tour("dashboard-grid")
            .class("dashboard-grid")
            .rect(24.0, 260.0, inner, 1200.0),
    );
    let financial = doc.append(
        grid,
        NodeSpec::new("div")
            .class("card financial-summary")
            .attr("data-widget", "financial")
            .text("Financial Overview")
            .rect(24.0, 260.0, half, 360.0),
    );
    let schedule = doc.append(
        grid,
        NodeSpec::new("div")
            .class("card")
            .tour("schedule-widget")
            .text("Schedule Performance")
            .rect(48.0 + half, 260.0, half, 360.0),
    );
    let bim = doc.append(
        grid,
        NodeSpec::new("div")
            .class("card")
            .tour("bim-widget")
            .text("BIM Innovation")
            .rect(24.0, 660.0, inner, 380.0),
    );
    let trade_details = doc.append(
        main,
        NodeSpec::new("details")
            .class("trade-partners")
            .rect(24.0, 1500.0, inner, 300.0),
    );
    let trade_summary = doc.append(
        trade_details,
        NodeSpec::new("summary")
            .text("Trade Partners")
            .rect(24.0, 1500.0, inner, 40.0),
    );
    let trade_scorecard = doc.append(
        trade_details,
        NodeSpec::new("div")
            .tour("trade-partner-scorecard")
            .text("Subcontractor scorecard")
            .rect(24.0, 1540.0, inner, 240.0),
    );
    let reports = doc.append(
        main,
        NodeSpec::new("section")
            .tour("reports-panel")
            .text("Reports")
            .rect(24.0, 2200.0, inner, 240.0)
            .render_at(2200.0),
    );
    doc.append(
        body,
        NodeSpec::new("footer")
            .text("Site analytics")
            .rect(0.0, 2464.0, w, 80.0),
    );
    doc.take_mutations();

    (
        doc,
        DashboardNodes {
            header,
            dashboard_selector,
            dashboard_menu,
            navigation,
            user_menu,
            main,
            kpi_cards,
            grid,
            financial,
            schedule,
            bim,
            trade_details,
            trade_summary,
            trade_scorecard,
            reports,
        },
    )
}
