//! Command handlers for the CLI application.
//!
//! - `list`: attached panels
//! - `run`: live display session on real panels
//! - `render`: offline rendering for a simulated layout
//! - `layouts`: reachable panel arrangements
//! - `config`: effective configuration

pub mod config;
pub mod layouts;
pub mod list;
pub mod render;
pub mod run;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cadence_driver::{DriverConfig, Panel, Side};
use cadence_transport::Handedness;

/// Result type for command handlers
pub type CommandResult = anyhow::Result<()>;

/// Set up Ctrl-C handler and return the running flag
pub fn setup_interrupt_handler() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .ok();

    running
}

/// Resolve the config path and load it
pub fn load_config(path: Option<&Path>) -> anyhow::Result<(DriverConfig, PathBuf)> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(DriverConfig::default_path);
    let config = DriverConfig::load(&path)?;
    Ok((config, path))
}

/// Product name a simulated panel reports: `Cadence-L1`, `Cadence-R2`, ...
pub fn simulated_name(handedness: Handedness, index: usize) -> String {
    format!("Cadence-{}{}", handedness.letter(), index + 1)
}

/// Layout panels for a list of simulated single units
pub fn simulated_panels(hands: &[Handedness]) -> Vec<Panel> {
    hands
        .iter()
        .enumerate()
        .map(|(i, h)| Panel::new(simulated_name(*h, i), Side::from(*h), cadence_transport::DEFAULT_COLUMNS))
        .collect()
}
