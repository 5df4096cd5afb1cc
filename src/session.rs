//! Display session
//!
//! One session drives every attached panel as a single logical display. It
//! owns the layout, the chord tracker and the view, turns input reports into
//! navigation commands and decides what each panel shows. The session is
//! plain synchronous state; [`crate::runtime`] serializes access to it.

use std::sync::Arc;

use cadence_transport::PanelTransport;
use image::RgbImage;
use tracing::{debug, error, info, warn};

use crate::canvas::{CaptureRegion, ViewState, Viewport};
use crate::chord::ChordTracker;
use crate::command::{match_gesture, NavCommand};
use crate::config::DriverConfig;
use crate::devices::panel_from_device;
use crate::error::{DriverError, NavigationError};
use crate::host::{AccessibilityHost, HostObject, ScreenCapture};
use crate::keys::{decode_report, MiniKey};
use crate::layout::PanelLayout;
use crate::raster::{bitmap_to_dots, image_to_cells, ColorChannel, RasterSettings, THRESHOLD_OUT_OF};
use crate::slider::{Curve, Slider};

/// What the panels currently show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Cells pushed by the host
    #[default]
    Text,
    /// Thresholded screen capture
    Image,
    /// Host table view
    Table,
}

impl DisplayMode {
    /// Modes redrawn by the refresh timer
    pub fn is_refreshing(self) -> bool {
        !matches!(self, DisplayMode::Text)
    }
}

/// Capture needed for the next image frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRequest {
    pub region: CaptureRegion,
    pub width: u32,
    pub height: u32,
}

/// Result of handling one input report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportOutcome {
    pub commands: Vec<NavCommand>,
    /// The refreshing mode has to draw a new frame
    pub redraw: bool,
    /// Keys handed to the host at the end of a text-mode gesture
    pub forwarded: Option<Vec<MiniKey>>,
}

pub struct DisplaySession {
    layout: PanelLayout,
    panels: Vec<Arc<dyn PanelTransport>>,
    tracker: ChordTracker,
    view: ViewState,
    threshold: Slider,
    reversed: bool,
    default_reversed: bool,
    channel: ColorChannel,
    mode: DisplayMode,
    last_text: Option<Vec<u8>>,
    reset_pending: bool,
    one_handed: Vec<bool>,
    host: Arc<dyn AccessibilityHost>,
    capture: Arc<dyn ScreenCapture>,
}

impl DisplaySession {
    /// Lay out `panels` and prepare an idle text-mode session.
    ///
    /// Fails with [`DriverError::NoPanels`] when `panels` is empty.
    pub fn new(
        panels: Vec<Arc<dyn PanelTransport>>,
        host: Arc<dyn AccessibilityHost>,
        capture: Arc<dyn ScreenCapture>,
        config: &DriverConfig,
    ) -> Result<Self, DriverError> {
        let layout = PanelLayout::new(
            panels
                .iter()
                .map(|t| panel_from_device(t.device_info(), config))
                .collect(),
        )?;

        let (screen_w, screen_h) = capture
            .screen_size()
            .unwrap_or((config.screen_width, config.screen_height));
        let view = ViewState::new(
            config.view_rates(),
            f64::from(screen_w),
            f64::from(screen_h),
            config.correct_aspect_ratio,
        );
        let threshold = Slider::new(
            config.threshold,
            config.threshold_rate,
            config.threshold_rate_multiplier,
            Curve::SCurve,
            0.0,
            THRESHOLD_OUT_OF,
            true,
        );
        // Firmware starts single panels one-handed
        let one_handed = layout.panels().iter().map(|p| !p.is_bridged()).collect();

        for panel in layout.panels() {
            info!(
                "Panel {}: {} at {:?}",
                panel.index,
                panel.name,
                panel.corners()
            );
        }

        let mut session = Self {
            layout,
            panels,
            tracker: ChordTracker::new(),
            view,
            threshold,
            reversed: config.threshold_reversed,
            default_reversed: config.threshold_reversed,
            channel: ColorChannel::default(),
            mode: DisplayMode::Text,
            last_text: None,
            reset_pending: false,
            one_handed,
            host,
            capture,
        };
        session.update_one_handed();
        Ok(session)
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn layout(&self) -> &PanelLayout {
        &self.layout
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn threshold(&self) -> f64 {
        self.threshold.get()
    }

    pub fn threshold_rate(&self) -> f64 {
        self.threshold.rate()
    }

    pub fn reversed(&self) -> bool {
        self.reversed
    }

    pub fn channel(&self) -> ColorChannel {
        self.channel
    }

    pub fn set_channel(&mut self, channel: ColorChannel) {
        self.channel = channel;
    }

    pub fn tracker(&self) -> &ChordTracker {
        &self.tracker
    }

    pub fn last_text(&self) -> Option<&[u8]> {
        self.last_text.as_deref()
    }

    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    /// Capture service, shared with the blocking pool
    pub fn capture(&self) -> Arc<dyn ScreenCapture> {
        Arc::clone(&self.capture)
    }

    pub fn raster_settings(&self) -> RasterSettings {
        RasterSettings {
            threshold: self.threshold.get(),
            reversed: self.reversed,
            channel: self.channel,
        }
    }

    /// Decode one report from panel `panel_index` and act on it.
    ///
    /// Reports of other lengths are not button reports and are ignored.
    pub fn handle_report(&mut self, panel_index: usize, data: &[u8]) -> ReportOutcome {
        let Some(panel) = self.layout.panel(panel_index) else {
            warn!("Report from unknown panel {}", panel_index);
            return ReportOutcome::default();
        };
        let Some(decoded) = decode_report(data, panel) else {
            debug!("Panel {}: ignoring {}-byte report", panel_index, data.len());
            return ReportOutcome::default();
        };

        let gesture = self.tracker.process(panel_index, &decoded.keys);
        let commands = match_gesture(&gesture, self.mode == DisplayMode::Image, &self.layout);
        if !commands.is_empty() {
            debug!("Keys {:?} -> {:?}", gesture.live_keys(), commands);
        }

        let mut redraw = false;
        for command in &commands {
            redraw |= self.apply(*command);
        }

        let forwarded = if gesture.ending && self.mode != DisplayMode::Image {
            let keys = gesture.composed_keys();
            self.host.forward_keys(&keys);
            Some(keys)
        } else {
            None
        };

        ReportOutcome {
            commands,
            redraw: redraw && self.mode.is_refreshing(),
            forwarded,
        }
    }

    /// Apply one command. Returns whether the current frame is stale.
    pub fn apply(&mut self, command: NavCommand) -> bool {
        let extent = self.layout.geometry().extent();
        match command {
            NavCommand::FlipPanel { source, flipped } => {
                if self.layout.corner_of(source).map(|c| c.is_top()) == Some(flipped) {
                    return false;
                }
                if let Err(e) = self.layout.flip_panel(source, flipped) {
                    warn!("Cannot flip panel {}: {}", source.0, e);
                    return false;
                }
                self.after_layout_changed()
            }
            NavCommand::Pan(direction) => {
                self.view.pan(direction, extent);
                true
            }
            NavCommand::Zoom { zoom_in } => {
                self.view.zoom_step(zoom_in);
                true
            }
            NavCommand::Threshold { increase } => {
                if increase {
                    self.threshold.increase();
                } else {
                    self.threshold.decrease();
                }
                debug!("Threshold {:.1}", self.threshold.get());
                true
            }
            NavCommand::ReverseThreshold => {
                self.reversed = !self.reversed;
                true
            }
            NavCommand::CycleChannel => {
                self.channel = self.channel.next();
                info!("Channel {}", self.channel);
                true
            }
            NavCommand::PanRate { increase } => {
                self.view.change_pan_rate(increase);
                false
            }
            NavCommand::ZoomRate { increase } => {
                self.view.change_zoom_rate(increase);
                false
            }
            NavCommand::ThresholdRate { increase } => {
                if increase {
                    self.threshold.increase_rate();
                } else {
                    self.threshold.decrease_rate();
                }
                false
            }
            NavCommand::PanToEdge(direction) => {
                self.view.pan_to_edge(direction);
                true
            }
            NavCommand::ToggleAspectRatio => {
                self.view.toggle_aspect_ratio(extent);
                info!("Aspect correction {}", self.view.correct_aspect_ratio());
                true
            }
            NavCommand::Reset => {
                self.threshold.reset();
                self.channel = ColorChannel::Luminance;
                self.reversed = self.default_reversed;
                self.view.unset_zoom();
                self.reset_pending = true;
                info!("View reset");
                true
            }
            NavCommand::ToggleImage => self.toggle_image(),
        }
    }

    /// Enter or leave image mode. Returns whether a frame is needed now.
    pub fn toggle_image(&mut self) -> bool {
        if self.mode == DisplayMode::Table {
            self.mode = DisplayMode::Text;
        }
        if self.mode == DisplayMode::Image {
            info!("Leaving image mode");
            self.mode = DisplayMode::Text;
            self.restore_text();
        } else {
            info!("Entering image mode");
            self.mode = DisplayMode::Image;
        }
        self.update_one_handed();
        self.mode == DisplayMode::Image
    }

    /// Enter or leave table mode. Returns whether a frame is needed now.
    pub fn toggle_table(&mut self) -> bool {
        if self.mode == DisplayMode::Image {
            self.mode = DisplayMode::Text;
        }
        if self.mode == DisplayMode::Table {
            info!("Leaving table mode");
            self.mode = DisplayMode::Text;
            self.restore_text();
        } else {
            info!("Entering table mode");
            self.mode = DisplayMode::Table;
        }
        self.update_one_handed();
        self.mode == DisplayMode::Table
    }

    /// Move to the next valid panel arrangement
    pub fn cycle_layout(&mut self) -> bool {
        self.layout.cycle_positions();
        self.after_layout_changed()
    }

    fn after_layout_changed(&mut self) -> bool {
        self.update_one_handed();
        match self.mode {
            DisplayMode::Image => {
                self.reset_pending = true;
                true
            }
            DisplayMode::Table => true,
            DisplayMode::Text => {
                self.restore_text();
                false
            }
        }
    }

    /// Remember host text and show it unless a refreshing mode is active
    pub fn show_text(&mut self, cells: &[u8]) {
        self.last_text = Some(cells.to_vec());
        if self.mode == DisplayMode::Text {
            self.write_logical(cells);
        }
    }

    fn restore_text(&self) {
        if let Some(cells) = &self.last_text {
            self.write_logical(cells);
        }
    }

    /// Split logical cells across the panels and write them
    pub fn write_logical(&self, cells: &[u8]) {
        let buffers = self.layout.compose(cells);
        for (index, (panel, buffer)) in self.panels.iter().zip(buffers).enumerate() {
            if let Err(e) = panel.write_cells(&buffer) {
                warn!("Panel {}: write failed: {}", index, e);
            }
        }
    }

    /// Tell every single panel whether to act one-handed
    pub fn update_one_handed(&mut self) {
        let want = self.layout.is_single_width() && self.mode != DisplayMode::Image;
        self.set_one_handed(want);
    }

    fn set_one_handed(&mut self, want: bool) {
        for (index, panel) in self.layout.panels().iter().enumerate() {
            if panel.is_bridged() || self.one_handed[index] == want {
                continue;
            }
            match self.panels[index].set_one_handed(want) {
                Ok(()) => {
                    debug!("Panel {}: one-handed {}", index, want);
                    self.one_handed[index] = want;
                }
                Err(e) => warn!("Panel {}: cannot set one-handed mode: {}", index, e),
            }
        }
    }

    /// Leave any refreshing mode and hand the panels back in one-handed mode
    pub fn shutdown(&mut self) {
        if self.mode.is_refreshing() {
            self.mode = DisplayMode::Text;
            self.restore_text();
        }
        self.tracker.clear();
        self.set_one_handed(true);
        info!("Display session stopped");
    }

    /// Object to show and its screen rectangle.
    ///
    /// Falls back from the navigator to the focus object, then up the
    /// ancestors to the first one with a location.
    pub fn resolve_location(&self) -> Result<(HostObject, Viewport), NavigationError> {
        let start = match self.host.navigator_object() {
            Some(obj) => obj,
            None => {
                debug!("No navigator object, using focus");
                self.host.focus_object().ok_or(NavigationError::NoObject)?
            }
        };

        let mut object = start.clone();
        let location = loop {
            if let Some(location) = object.location {
                break location;
            }
            debug!("Object {:?} has no location, trying parent", object.name);
            object = self
                .host
                .parent(&object)
                .ok_or_else(|| NavigationError::NoLocation(start.name.clone()))?;
        };

        if location.width <= 0.0 || location.height <= 0.0 {
            return Err(NavigationError::ZeroSizeRegion {
                name: object.name,
                left: location.left,
                top: location.top,
                width: location.width,
                height: location.height,
            });
        }
        Ok((object, location))
    }

    /// Fit the view if needed and work out what to capture.
    pub fn prepare_image_frame(&mut self) -> Result<FrameRequest, NavigationError> {
        let (object, location) = self.resolve_location()?;
        let extent = self.layout.geometry().extent();

        if self.reset_pending || self.view.needs_reset(&location) {
            self.view.reset(location, extent).map_err(|e| match e {
                NavigationError::ZeroSizeRegion {
                    left,
                    top,
                    width,
                    height,
                    ..
                } => NavigationError::ZeroSizeRegion {
                    name: object.name.clone(),
                    left,
                    top,
                    width,
                    height,
                },
                other => other,
            })?;
            self.reset_pending = false;
        }

        let region = self
            .view
            .capture_region(extent)
            .ok_or_else(|| NavigationError::Capture("view has no zoom".into()))?;
        Ok(FrameRequest {
            region,
            width: extent.width as u32,
            height: extent.height as u32,
        })
    }

    /// Threshold a captured frame and write it out.
    ///
    /// Frames that arrive after image mode ended, or that were captured for
    /// a different grid, are dropped.
    pub fn present_image(&mut self, frame: &RgbImage) {
        if self.mode != DisplayMode::Image {
            debug!("Dropping frame, no longer in image mode");
            return;
        }
        let extent = self.layout.geometry().extent();
        if f64::from(frame.width()) != extent.width || f64::from(frame.height()) != extent.height {
            debug!(
                "Dropping {}x{} frame, grid is now {}x{}",
                frame.width(),
                frame.height(),
                extent.width,
                extent.height
            );
            return;
        }
        let dots = bitmap_to_dots(frame, &self.raster_settings());
        let cells = image_to_cells(&dots);
        self.write_logical(&cells);
    }

    /// Show the host's table view, or every dot raised when there is none
    pub fn present_table(&mut self) {
        if self.mode != DisplayMode::Table {
            return;
        }
        let geometry = self.layout.geometry();
        let cells = self
            .host
            .table_cells(geometry.num_cols, geometry.num_rows)
            .unwrap_or_else(|| vec![0xFF; geometry.cell_count()]);
        self.write_logical(&cells);
    }

    /// Log a failed redraw and leave the refreshing mode unless only one
    /// frame was lost.
    pub fn handle_navigation_error(&mut self, err: NavigationError) {
        if !err.exits_mode() {
            warn!("{}; skipping frame", err);
            return;
        }
        error!("{}; leaving {:?} mode", err, self.mode);
        match self.mode {
            DisplayMode::Image => {
                self.toggle_image();
            }
            DisplayMode::Table => {
                self.toggle_table();
            }
            DisplayMode::Text => {}
        }
    }

    /// Draw one frame of the current mode on the calling thread
    pub fn redraw_blocking(&mut self) {
        if let Err(e) = self.try_redraw_blocking() {
            self.handle_navigation_error(e);
        }
    }

    fn try_redraw_blocking(&mut self) -> Result<(), NavigationError> {
        match self.mode {
            DisplayMode::Text => Ok(()),
            DisplayMode::Table => {
                self.present_table();
                Ok(())
            }
            DisplayMode::Image => {
                let request = self.prepare_image_frame()?;
                let frame = self
                    .capture
                    .capture(&request.region, request.width, request.height)?;
                self.present_image(&frame);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Direction;
    use crate::host::{ImageFileCapture, StaticHost};
    use crate::memory_panel::MemoryPanel;
    use cadence_transport::Handedness;
    use image::Rgb;

    const ROW3: [u8; 5] = [0, 0, 0, 0, 0b0100];
    const ROW4: [u8; 5] = [0, 0, 0, 0, 0b1000];
    const DOT1: [u8; 5] = [0, 1, 0, 0, 0];
    const DPAD_UP: [u8; 5] = [0, 0, 0, 0b0010, 0];
    const NONE: [u8; 5] = [0; 5];

    fn white_screen() -> Arc<ImageFileCapture> {
        Arc::new(ImageFileCapture::new(RgbImage::from_pixel(
            240,
            160,
            Rgb([255, 255, 255]),
        )))
    }

    /// A window well inside the 240x160 screen, so frames never sample
    /// past its edge
    fn window_host() -> Arc<StaticHost> {
        Arc::new(StaticHost::new(Some(HostObject::new(
            "1",
            "Window",
            Some(Viewport { left: 60.0, top: 40.0, width: 120.0, height: 80.0 }),
        ))))
    }

    fn session(panels: &[Arc<MemoryPanel>], host: Arc<StaticHost>) -> DisplaySession {
        let transports = panels
            .iter()
            .map(|p| Arc::clone(p) as Arc<dyn PanelTransport>)
            .collect();
        DisplaySession::new(transports, host, white_screen(), &DriverConfig::default()).unwrap()
    }

    fn tap(s: &mut DisplaySession, panel: usize, report: &[u8]) -> ReportOutcome {
        s.handle_report(panel, report);
        s.handle_report(panel, &NONE)
    }

    #[test]
    fn test_no_panels_is_fatal() {
        let result = DisplaySession::new(
            Vec::new(),
            Arc::new(StaticHost::new(None)),
            white_screen(),
            &DriverConfig::default(),
        );
        assert!(matches!(result, Err(DriverError::NoPanels)));
    }

    #[test]
    fn test_text_is_shown_and_keys_forwarded() {
        let panel = Arc::new(MemoryPanel::new(Handedness::Left, ""));
        let host = window_host();
        let mut s = session(&[panel.clone()], host.clone());

        s.show_text(&[0x01; 48]);
        assert_eq!(panel.last_frame(), Some(vec![0x01; 48]));

        let out = tap(&mut s, 0, &DOT1);
        assert_eq!(out.forwarded, Some(vec![MiniKey::Dot1]));
        assert_eq!(host.forwarded(), vec![vec![MiniKey::Dot1]]);
    }

    #[test]
    fn test_image_mode_round_trip_restores_text() {
        let panel = Arc::new(MemoryPanel::new(Handedness::Left, ""));
        let host = window_host();
        let mut s = session(&[panel.clone()], host.clone());
        s.show_text(&[0x02; 48]);

        let out = s.handle_report(0, &ROW3);
        assert_eq!(out.commands, vec![NavCommand::ToggleImage]);
        assert!(out.redraw);
        assert_eq!(s.mode(), DisplayMode::Image);

        // Releasing the toggle key in image mode forwards nothing
        let out = s.handle_report(0, &NONE);
        assert_eq!(out.forwarded, None);

        s.redraw_blocking();
        assert!(s.view().is_zoom_set());
        // White screen with reversed threshold raises no dots
        assert_eq!(panel.last_frame(), Some(vec![0; 48]));

        // Text pushed meanwhile is remembered, not shown
        s.show_text(&[0x03; 48]);
        assert_eq!(panel.last_frame(), Some(vec![0; 48]));

        s.handle_report(0, &ROW3);
        assert_eq!(s.mode(), DisplayMode::Text);
        assert_eq!(panel.last_frame(), Some(vec![0x03; 48]));
    }

    #[test]
    fn test_navigation_only_in_image_mode() {
        let panel = Arc::new(MemoryPanel::new(Handedness::Left, ""));
        let mut s = session(&[panel], window_host());

        let out = s.handle_report(0, &DPAD_UP);
        assert!(out.commands.is_empty());
        s.handle_report(0, &NONE);

        tap(&mut s, 0, &ROW3);
        s.redraw_blocking();
        let (_, y) = s.view().center();
        let out = s.handle_report(0, &DPAD_UP);
        assert_eq!(out.commands, vec![NavCommand::Pan(Direction::Up)]);
        assert!(out.redraw);
        assert!(s.view().center().1 > y);
    }

    #[test]
    fn test_missing_object_exits_image_mode() {
        let panel = Arc::new(MemoryPanel::new(Handedness::Left, ""));
        let mut s = session(&[panel.clone()], Arc::new(StaticHost::new(None)));
        s.show_text(&[0x05; 48]);
        s.toggle_image();
        s.redraw_blocking();
        assert_eq!(s.mode(), DisplayMode::Text);
        assert_eq!(panel.last_frame(), Some(vec![0x05; 48]));
    }

    #[test]
    fn test_zero_size_region_names_object() {
        let host = StaticHost::new(Some(HostObject::new(
            "7",
            "Empty pane",
            Some(Viewport { left: 10.0, top: 10.0, width: 0.0, height: 5.0 }),
        )));
        let panel = Arc::new(MemoryPanel::new(Handedness::Left, ""));
        let mut s = session(&[panel], Arc::new(host));
        s.toggle_image();
        match s.prepare_image_frame() {
            Err(NavigationError::ZeroSizeRegion { name, width, .. }) => {
                assert_eq!(name, "Empty pane");
                assert_eq!(width, 0.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_timeout_keeps_image_mode() {
        let panel = Arc::new(MemoryPanel::new(Handedness::Left, ""));
        let mut s = session(&[panel], window_host());
        s.toggle_image();
        s.handle_navigation_error(NavigationError::CaptureTimeout(2000));
        assert_eq!(s.mode(), DisplayMode::Image);
        s.handle_navigation_error(NavigationError::Capture("gone".into()));
        assert_eq!(s.mode(), DisplayMode::Text);
    }

    #[test]
    fn test_table_and_image_exclusive() {
        let panel = Arc::new(MemoryPanel::new(Handedness::Left, ""));
        let mut s = session(&[panel.clone()], window_host());

        assert!(s.toggle_table());
        s.redraw_blocking();
        assert_eq!(panel.last_frame(), Some(vec![0xFF; 48]));

        assert!(s.toggle_image());
        assert_eq!(s.mode(), DisplayMode::Image);
        assert!(s.toggle_table());
        assert_eq!(s.mode(), DisplayMode::Table);
        assert!(!s.toggle_table());
        assert_eq!(s.mode(), DisplayMode::Text);
    }

    #[test]
    fn test_one_handed_follows_layout_and_mode() {
        let left = Arc::new(MemoryPanel::new(Handedness::Left, ""));
        let mut s = session(&[left.clone()], window_host());
        // Already one-handed at start
        assert!(left.one_handed_history().is_empty());

        s.toggle_image();
        assert_eq!(left.one_handed_history(), vec![false]);
        s.toggle_image();
        assert_eq!(left.one_handed_history(), vec![false, true]);
        s.shutdown();
        assert_eq!(left.one_handed_history(), vec![false, true]);
    }

    #[test]
    fn test_two_panels_go_two_handed() {
        let left = Arc::new(MemoryPanel::new(Handedness::Left, ""));
        let right = Arc::new(MemoryPanel::new(Handedness::Right, ""));
        let mut s = session(
            &[left.clone(), right.clone()],
            window_host(),
        );
        assert_eq!(left.one_handed_history(), vec![false]);
        assert_eq!(right.one_handed_history(), vec![false]);
        s.shutdown();
        assert_eq!(left.one_handed_history(), vec![false, true]);
        assert_eq!(right.one_handed_history(), vec![false, true]);
    }

    #[test]
    fn test_bridged_panel_never_switched() {
        let bridged = Arc::new(MemoryPanel::with_columns(Handedness::Left, "", 24));
        let mut s = session(&[bridged.clone()], window_host());
        s.toggle_image();
        s.shutdown();
        assert!(bridged.one_handed_history().is_empty());
    }

    #[test]
    fn test_row4_tap_flips_panel_to_top() {
        let left = Arc::new(MemoryPanel::new(Handedness::Left, ""));
        let right = Arc::new(MemoryPanel::new(Handedness::Right, ""));
        let mut s = session(&[left, right], window_host());
        assert_eq!(s.layout().geometry().num_rows, 4);

        let out = tap(&mut s, 1, &ROW4);
        assert_eq!(
            out.commands,
            vec![NavCommand::FlipPanel {
                source: (1, crate::compositor::Side::Right),
                flipped: true
            }]
        );
        assert_eq!(s.layout().geometry().num_rows, 8);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let panel = Arc::new(MemoryPanel::new(Handedness::Left, ""));
        let mut s = session(&[panel], window_host());
        s.toggle_image();
        s.redraw_blocking();
        s.apply(NavCommand::Threshold { increase: true });
        s.apply(NavCommand::CycleChannel);
        s.apply(NavCommand::ReverseThreshold);
        s.apply(NavCommand::Zoom { zoom_in: true });
        assert_ne!(s.threshold(), 50.0);

        s.apply(NavCommand::Reset);
        assert_eq!(s.threshold(), 50.0);
        assert_eq!(s.channel(), ColorChannel::Luminance);
        assert!(s.reversed());
        assert!(!s.view().is_zoom_set());

        s.redraw_blocking();
        assert!(s.view().is_zoom_set());
    }

    #[test]
    fn test_reset_chord_released_one_key_at_a_time() {
        let panel = Arc::new(MemoryPanel::new(Handedness::Left, ""));
        let mut s = session(&[panel], window_host());
        s.toggle_image();
        s.redraw_blocking();

        // Dot 7, then 3, 2 and 1 join the chord
        let mut held = 0u8;
        for bit in [0x40, 0x04, 0x02, 0x01] {
            held |= bit;
            s.handle_report(0, &[0, held, 0, 0, 0]);
        }
        assert_eq!(s.threshold(), 50.0);

        // Dot 7 goes up last
        for bit in [0x01, 0x02, 0x04, 0x40] {
            held &= !bit;
            let out = s.handle_report(0, &[0, held, 0, 0, 0]);
            assert!(out.commands.is_empty(), "released {bit:#x}: {:?}", out.commands);
        }
        assert_eq!(s.threshold(), 50.0);
        assert_eq!(s.channel(), ColorChannel::Luminance);
        assert!(s.reversed());
    }

    #[test]
    fn test_odd_report_length_ignored() {
        let panel = Arc::new(MemoryPanel::new(Handedness::Left, ""));
        let mut s = session(&[panel], window_host());
        assert_eq!(s.handle_report(0, &[1, 2, 3]), ReportOutcome::default());
        assert_eq!(s.handle_report(5, &DOT1), ReportOutcome::default());
        assert!(s.tracker().keys_down().is_empty());
    }
}
