//! `render`: offline rendering for a simulated panel layout

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use cadence_driver::raster::cells_to_text;
use cadence_driver::{
    ColorChannel, DisplayMode, DisplaySession, DriverConfig, ImageFileCapture, MemoryPanel,
    NavCommand, ScreenCapture, StaticHost,
};
use cadence_transport::{Handedness, PanelTransport};
use tracing::info;

use super::CommandResult;

pub struct RenderOptions<'a> {
    pub image: &'a Path,
    pub panels: &'a [Handedness],
    pub flipped: &'a [usize],
    pub threshold: Option<f64>,
    pub channel: ColorChannel,
    pub normal: bool,
}

pub fn render(config: &DriverConfig, opts: RenderOptions<'_>) -> CommandResult {
    let capture = Arc::new(ImageFileCapture::open(opts.image)?);
    let (width, height) = capture.screen_size().unwrap_or((0, 0));

    let mut config = config.clone();
    if let Some(threshold) = opts.threshold {
        config.threshold = threshold;
    }
    config.threshold_reversed = !opts.normal;
    config.validate()?;

    let panels: Vec<Arc<MemoryPanel>> = opts
        .panels
        .iter()
        .enumerate()
        .map(|(i, h)| Arc::new(MemoryPanel::new(*h, &(i + 1).to_string())))
        .collect();
    let transports: Vec<Arc<dyn PanelTransport>> = panels
        .iter()
        .map(|p| Arc::clone(p) as Arc<dyn PanelTransport>)
        .collect();

    let host = Arc::new(StaticHost::full_screen(width, height));
    let mut session =
        DisplaySession::new(transports, host, capture, &config).context("building session")?;

    for &index in opts.flipped {
        let Some(panel) = session.layout().panel(index) else {
            bail!("--flipped {index}: only {} panels", opts.panels.len());
        };
        for side in panel.sides() {
            session.apply(NavCommand::FlipPanel {
                source: (index, side),
                flipped: true,
            });
        }
    }
    session.set_channel(opts.channel);

    session.toggle_image();
    session.redraw_blocking();
    if session.mode() != DisplayMode::Image {
        bail!("could not render {}", opts.image.display());
    }

    let g = session.layout().geometry();
    info!(
        "Rendered {}x{} cells, threshold {:.1} {}",
        g.num_cols,
        g.num_rows,
        session.threshold(),
        session.channel()
    );

    for (panel, memory) in session.layout().panels().iter().zip(&panels) {
        let corners: Vec<&str> = panel.corners().iter().map(|c| c.short_name()).collect();
        println!("{} ({})", panel.name, corners.join("+"));
        if let Some(cells) = memory.last_frame() {
            println!("{}", cells_to_text(&cells, panel.columns as usize));
        }
    }
    Ok(())
}
