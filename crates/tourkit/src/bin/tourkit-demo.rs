#![forbid(unsafe_code)]

//! Walks a scripted tour over the in-memory construction dashboard and prints
//! what a renderer would receive for each step.
//!
//! ```text
//! tourkit-demo --width 390 --height 844
//! RUST_LOG=tourkit_runtime=debug tourkit-demo --config tour.toml
//! ```

use std::path::PathBuf;

use clap::Parser;
use tourkit::dom::fixture::dashboard;
use tourkit::prelude::*;
use web_time::{Duration, Instant};

/// Upper bound on host ticks per step; a step settles in far fewer.
const MAX_TICKS: usize = 512;

#[derive(Debug, Parser)]
#[command(
    name = "tourkit-demo",
    about = "Run a scripted dashboard tour through the TourKit positioner",
    version
)]
struct Args {
    /// TOML or JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Viewport width in CSS pixels.
    #[arg(long, default_value_t = 1440.0)]
    width: f64,

    /// Viewport height in CSS pixels.
    #[arg(long, default_value_t = 900.0)]
    height: f64,

    /// Log filter directive used when RUST_LOG is unset.
    #[arg(long)]
    log: Option<String>,

    /// Emit log events as JSON.
    #[cfg(feature = "logging-json")]
    #[arg(long)]
    json_logs: bool,
}

struct Step {
    target: &'static str,
    placement: Placement,
    content: &'static str,
}

const TOUR: [Step; 4] = [
    Step {
        target: "[data-tour=\"dashboard-selector\"]",
        placement: Placement::Bottom,
        content: "Switch between project dashboards here.",
    },
    Step {
        target: "[data-tour=\"financial-widget\"]",
        placement: Placement::Right,
        content: "Budget, committed cost and forecast at a glance.",
    },
    Step {
        target: "[data-tour=\"trade-partner-scorecard\"]",
        placement: Placement::Top,
        content: "How each trade partner is tracking on safety, quality and schedule.",
    },
    Step {
        target: "[data-tour=\"nonexistent-widget\"]",
        placement: Placement::Bottom,
        content: "This widget is not on the dashboard.",
    },
];

fn main() {
    let args = Args::parse();
    init_logging(&args);

    let config = tourkit::load_config_or_default(args.config.as_deref());
    let viewport = ViewportSize::new(args.width, args.height);
    let (mut doc, _) = dashboard(viewport);
    let mut expander = ClickExpander::new();

    println!("viewport {}x{}", viewport.width, viewport.height);
    for (index, step) in TOUR.iter().enumerate() {
        let started = Instant::now();
        let (positioner, elapsed) = run_step(&config, &mut doc, &mut expander, step);
        let output = positioner.output();
        let stats = positioner.stats();

        println!();
        println!("step {} {}", index + 1, step.target);
        println!(
            "  phase {}, {} attempt(s), {:?} simulated, {:?} wall",
            positioner.phase(),
            stats.attempts,
            elapsed,
            started.elapsed()
        );
        if let Some(node) = output.target_element {
            println!("  target {node}");
        }
        if let Some(error) = &output.error {
            println!("  error {error}");
        }
        match &output.positions {
            Some(positions) => {
                println!(
                    "  placement {}{}",
                    positions.final_placement,
                    if positions.is_fallback { " (fallback)" } else { "" }
                );
                println!("  overlay {}", positions.overlay_style.to_css());
                println!("  tooltip {}", positions.tooltip_style.to_css());
            }
            None => println!("  no positions"),
        }
    }
}

/// Drive one step on a simulated clock until nothing is scheduled.
fn run_step(
    config: &TourConfig,
    doc: &mut MemoryDocument,
    expander: &mut dyn Expander,
    step: &Step,
) -> (TourPositioner, Duration) {
    let start = Instant::now();
    let mut now = start;
    let mut positioner = TourPositioner::new(config.clone());
    positioner.set_target(step.target, step.placement, step.content.len(), now);
    positioner.set_active(true, now);
    for _ in 0..MAX_TICKS {
        let records = doc.take_mutations();
        positioner.on_mutations(&records, &*doc, now);
        let Some(deadline) = positioner.next_deadline() else {
            break;
        };
        now = now.max(deadline);
        positioner.tick(now, doc, expander);
    }
    (positioner, now.duration_since(start))
}

#[cfg(feature = "logging")]
fn init_logging(args: &Args) {
    #[cfg(feature = "logging-json")]
    let format = if args.json_logs {
        tourkit::logging::LogFormat::Json
    } else {
        tourkit::logging::LogFormat::Pretty
    };
    #[cfg(not(feature = "logging-json"))]
    let format = tourkit::logging::LogFormat::Pretty;
    let _ = tourkit::logging::init_logging_with(args.log.as_deref(), format);
}

#[cfg(not(feature = "logging"))]
fn init_logging(_args: &Args) {}
