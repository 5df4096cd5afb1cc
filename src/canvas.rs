//! Virtual canvas: mapping between source (screen) space and the dot grid
//!
//! Virtual X grows to the right like screen X, virtual Y grows upward, so a
//! screen rectangle at `(left, top)` is centred at `(left + w/2, -(top + h/2))`.
//! Device coordinates are dots: `W = cols × 2` wide, `H = rows × 4` tall,
//! with device Y growing downward.

use tracing::{debug, warn};

use crate::error::NavigationError;
use crate::slider::{CompositeSlider, Curve, Slider};

/// Physical dot pitch is taller than it is wide (3.3mm vs 2.6mm)
pub const DOT_ASPECT_RATIO: f64 = 3.3 / 2.6;

/// Zoom value meaning "fit to the source region on next reset"
pub const ZOOM_UNSET: f64 = -1.0;

const ZOOM_MIN: f64 = 1e-11;
const ZOOM_MAX: f64 = 1e9;

/// Cardinal direction for pan and pan-to-edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Dot extent of the logical display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceExtent {
    pub width: f64,
    pub height: f64,
}

impl DeviceExtent {
    /// Extent for a grid of braille cells
    pub fn from_cells(cols: u32, rows: u32) -> Self {
        Self {
            width: f64::from(cols * 2),
            height: f64::from(rows * 4),
        }
    }

    fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// A rectangle in source (screen) coordinates, top-left origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Region of the source to capture for one frame
pub type CaptureRegion = Viewport;

/// Rates and multipliers the view is built from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRates {
    pub pan_rate: f64,
    pub pan_rate_multiplier: f64,
    pub zoom_rate: f64,
    pub zoom_rate_multiplier: f64,
}

/// Pan/zoom state of the image view
#[derive(Debug, Clone)]
pub struct ViewState {
    center_x: Slider,
    center_y: Slider,
    zoom_x: Slider,
    zoom_y: Slider,
    correct_aspect_ratio: bool,
    last_viewport: Option<Viewport>,
}

impl ViewState {
    /// Build a view panning over a `screen_width × screen_height` source.
    pub fn new(rates: ViewRates, screen_width: f64, screen_height: f64, correct_aspect_ratio: bool) -> Self {
        let pan = |min, max| {
            Slider::new(
                0.0,
                rates.pan_rate,
                rates.pan_rate_multiplier,
                Curve::Linear,
                min,
                max,
                true,
            )
        };
        let zoom = || {
            Slider::new(
                ZOOM_UNSET,
                rates.zoom_rate,
                rates.zoom_rate_multiplier,
                Curve::Exponential,
                ZOOM_MIN,
                ZOOM_MAX,
                true,
            )
        };

        Self {
            center_x: pan(0.0, screen_width),
            center_y: pan(-screen_height, 0.0),
            zoom_x: zoom(),
            zoom_y: zoom(),
            correct_aspect_ratio,
            last_viewport: None,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.center_x.get(), self.center_y.get())
    }

    pub fn zoom(&self) -> (f64, f64) {
        (self.zoom_x.get(), self.zoom_y.get())
    }

    pub fn pan_rate(&self) -> f64 {
        self.center_x.rate()
    }

    pub fn zoom_rate(&self) -> f64 {
        self.zoom_x.rate()
    }

    pub fn last_viewport(&self) -> Option<Viewport> {
        self.last_viewport
    }

    pub fn correct_aspect_ratio(&self) -> bool {
        self.correct_aspect_ratio
    }

    /// Zoom is positive and finite on both axes
    pub fn is_zoom_set(&self) -> bool {
        let valid = |z: f64| z.is_finite() && z > 0.0;
        valid(self.zoom_x.get()) && valid(self.zoom_y.get())
    }

    /// Mark zoom unset so the next frame re-fits the source region
    pub fn unset_zoom(&mut self) {
        self.zoom_x.set(ZOOM_UNSET);
        self.zoom_y.set(ZOOM_UNSET);
    }

    /// Whether a frame over `viewport` has to re-fit first
    pub fn needs_reset(&self, viewport: &Viewport) -> bool {
        !self.is_zoom_set() || self.last_viewport.as_ref() != Some(viewport)
    }

    /// Device aspect ratio, optionally corrected for dot pitch
    pub fn target_aspect_ratio(extent: DeviceExtent, correct: bool) -> f64 {
        let ratio = extent.width / extent.height;
        if correct {
            ratio * DOT_ASPECT_RATIO
        } else {
            ratio
        }
    }

    /// Centre on `viewport` and fit it to the device.
    ///
    /// The chosen zoom shows the whole region, or at least half of its
    /// shorter side when that is larger.
    pub fn reset(&mut self, viewport: Viewport, extent: DeviceExtent) -> Result<(), NavigationError> {
        if viewport.width <= 0.0 || viewport.height <= 0.0 || extent.is_empty() {
            return Err(NavigationError::ZeroSizeRegion {
                name: String::new(),
                left: viewport.left,
                top: viewport.top,
                width: viewport.width,
                height: viewport.height,
            });
        }

        self.center_x.set(viewport.left + viewport.width / 2.0);
        self.center_y.set(-(viewport.top + viewport.height / 2.0));

        let aspect = Self::target_aspect_ratio(extent, self.correct_aspect_ratio);
        let full = (2.0 / viewport.width).min(2.0 / viewport.height / aspect);
        let half = (1.0 / viewport.width).max(1.0 / viewport.height / aspect);
        let zoom = half.max(full);
        self.zoom_x.set(zoom);
        self.zoom_y.set(zoom * aspect);
        self.last_viewport = Some(viewport);

        debug!(
            "View reset to {:?}: center=({:.1}, {:.1}) zoom=({:.5}, {:.5})",
            viewport,
            self.center_x.get(),
            self.center_y.get(),
            self.zoom_x.get(),
            self.zoom_y.get()
        );
        Ok(())
    }

    pub fn virtual_x_to_screen(&self, vx: f64, width: f64) -> f64 {
        (vx - self.center_x.get()) * self.zoom_x.get() * (width / 2.0) + width / 2.0
    }

    pub fn virtual_y_to_screen(&self, vy: f64, height: f64) -> f64 {
        height - ((vy - self.center_y.get()) * self.zoom_y.get() * (height / 2.0) + height / 2.0)
    }

    pub fn screen_x_to_virtual(&self, sx: f64, width: f64) -> f64 {
        (sx - width / 2.0) / (width / 2.0) / self.zoom_x.get() + self.center_x.get()
    }

    pub fn screen_y_to_virtual(&self, sy: f64, height: f64) -> f64 {
        ((height - sy) - height / 2.0) / (height / 2.0) / self.zoom_y.get() + self.center_y.get()
    }

    /// Source rectangle covered by the device at the current view
    pub fn capture_region(&self, extent: DeviceExtent) -> Option<CaptureRegion> {
        if !self.is_zoom_set() || extent.is_empty() {
            return None;
        }
        let left = self.screen_x_to_virtual(0.0, extent.width);
        let top = -self.screen_y_to_virtual(0.0, extent.height);
        let right = self.screen_x_to_virtual(extent.width, extent.width);
        let bottom = -self.screen_y_to_virtual(extent.height, extent.height);
        Some(CaptureRegion {
            left,
            top,
            width: right - left,
            height: bottom - top,
        })
    }

    /// Move the centre by one pan step, scaled so a step covers the same
    /// share of the visible area at any zoom.
    pub fn pan(&mut self, direction: Direction, extent: DeviceExtent) {
        if !self.is_zoom_set() {
            warn!("Pan ignored, zoom not set");
            return;
        }
        let x_scale = self.zoom_x.get() * extent.width / 2.0;
        let y_scale = self.zoom_y.get() * extent.height / 2.0;
        match direction {
            Direction::Up => self.center_y.increase_scaled(y_scale),
            Direction::Down => self.center_y.decrease_scaled(y_scale),
            Direction::Left => self.center_x.decrease_scaled(x_scale),
            Direction::Right => self.center_x.increase_scaled(x_scale),
        }
    }

    /// Zoom both axes together
    pub fn zoom_step(&mut self, zoom_in: bool) {
        if !self.is_zoom_set() {
            warn!("Zoom ignored, zoom not set");
            return;
        }
        let mut zoom = CompositeSlider::new(vec![&mut self.zoom_x, &mut self.zoom_y]);
        if zoom_in {
            zoom.increase();
        } else {
            zoom.decrease();
        }
    }

    pub fn change_pan_rate(&mut self, increase: bool) {
        let mut pan = CompositeSlider::new(vec![&mut self.center_x, &mut self.center_y]);
        if increase {
            pan.increase_rate();
        } else {
            pan.decrease_rate();
        }
    }

    pub fn change_zoom_rate(&mut self, increase: bool) {
        let mut zoom = CompositeSlider::new(vec![&mut self.zoom_x, &mut self.zoom_y]);
        if increase {
            zoom.increase_rate();
        } else {
            zoom.decrease_rate();
        }
    }

    /// Align the visible area's edge with the same edge of the last viewport.
    pub fn pan_to_edge(&mut self, direction: Direction) {
        let Some(vp) = self.last_viewport else {
            warn!("Pan to edge ignored, no viewport yet");
            return;
        };
        if !self.is_zoom_set() {
            warn!("Pan to edge ignored, zoom not set");
            return;
        }
        let visible_width = 2.0 / self.zoom_x.get();
        let visible_height = 2.0 / self.zoom_y.get();
        match direction {
            Direction::Left => self.center_x.set(vp.left + visible_width / 2.0),
            Direction::Right => self.center_x.set(vp.left + vp.width - visible_width / 2.0),
            Direction::Up => self.center_y.set(-vp.top - visible_height / 2.0),
            Direction::Down => self.center_y.set(-(vp.top + vp.height) + visible_height / 2.0),
        }
    }

    /// Flip dot aspect correction and re-derive horizontal zoom from vertical.
    pub fn toggle_aspect_ratio(&mut self, extent: DeviceExtent) {
        self.correct_aspect_ratio = !self.correct_aspect_ratio;
        if !self.is_zoom_set() || extent.is_empty() {
            return;
        }
        let aspect = Self::target_aspect_ratio(extent, self.correct_aspect_ratio);
        self.zoom_x.set(self.zoom_y.get() / aspect);
    }
}
