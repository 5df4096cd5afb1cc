//! `layouts`: every arrangement reachable by cycling panel positions

use anyhow::Context;
use cadence_driver::PanelLayout;
use cadence_transport::Handedness;

use super::{simulated_panels, CommandResult};

pub fn layouts(hands: &[Handedness]) -> CommandResult {
    let mut layout = PanelLayout::new(simulated_panels(hands)).context("building layout")?;

    print_layout("initial", &layout);
    let count = layout.layout_options().len();
    for i in 0..count {
        layout.cycle_positions();
        print_layout(&format!("{}", i + 1), &layout);
    }
    Ok(())
}

fn print_layout(label: &str, layout: &PanelLayout) {
    let g = layout.geometry();
    let placements: Vec<String> = layout
        .panels()
        .iter()
        .map(|p| {
            let corners: Vec<&str> = p.corners().iter().map(|c| c.short_name()).collect();
            format!("{}={}", p.name, corners.join("+"))
        })
        .collect();
    println!(
        "{:>8}: {}x{} cells, offset ({}, {})  {}",
        label,
        g.num_cols,
        g.num_rows,
        g.offset_cols,
        g.offset_rows,
        placements.join(" ")
    );
}
