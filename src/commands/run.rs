//! `run`: drive the attached panels until interrupted

use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use cadence_driver::{
    attach_reports, spawn_session, DisplaySession, DriverConfig, ImageFileCapture, ScreenCapture,
    SessionOptions, StaticHost,
};
use cadence_transport::open_all_panels_sync;
use image::RgbImage;
use tracing::{info, warn};

use super::{setup_interrupt_handler, CommandResult};

pub async fn run(config: &DriverConfig, image: Option<&Path>, start_image: bool) -> CommandResult {
    let panels = open_all_panels_sync().context("opening panels")?;
    info!("Opened {} panel(s)", panels.len());

    let capture: Arc<dyn ScreenCapture> = match image {
        Some(path) => Arc::new(ImageFileCapture::open(path)?),
        None => {
            warn!("No --image given, image mode shows a blank screen");
            Arc::new(ImageFileCapture::new(RgbImage::new(
                config.screen_width,
                config.screen_height,
            )))
        }
    };
    let (width, height) = capture
        .screen_size()
        .unwrap_or((config.screen_width, config.screen_height));
    let host = Arc::new(StaticHost::full_screen(width, height));

    let session = DisplaySession::new(panels.clone(), host, capture, config)?;
    let (handle, task) = spawn_session(session, SessionOptions::from(config));
    let readers = attach_reports(&panels, &handle);

    if start_image {
        handle.toggle_image().await?;
    }

    let running = setup_interrupt_handler();
    info!("Running, press Ctrl-C to stop");
    while running.load(Ordering::SeqCst) && !handle.is_closed() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    info!("Shutting down");
    // The session may already be gone if every panel closed
    let _ = handle.shutdown().await;
    task.await.context("session task")?;
    for reader in readers {
        reader.abort();
    }
    Ok(())
}
