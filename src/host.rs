//! Services the driver consumes from its host
//!
//! The screen reader owns the accessibility tree and decides what key input
//! means in text mode; the capture service turns a screen rectangle into
//! pixels. Both are traits so a session can run against the real desktop,
//! an image file, or a test double.

use std::path::Path;

use image::{Rgb, RgbImage};
use parking_lot::Mutex;
use tracing::info;

use crate::canvas::{CaptureRegion, Viewport};
use crate::error::NavigationError;
use crate::keys::MiniKey;

/// An accessibility object with its screen location
#[derive(Debug, Clone, PartialEq)]
pub struct HostObject {
    pub id: String,
    pub name: String,
    pub location: Option<Viewport>,
}

impl HostObject {
    pub fn new(id: impl Into<String>, name: impl Into<String>, location: Option<Viewport>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location,
        }
    }
}

/// Accessibility services of the screen reader
pub trait AccessibilityHost: Send + Sync {
    /// Object under the review cursor
    fn navigator_object(&self) -> Option<HostObject>;

    /// Object with keyboard focus
    fn focus_object(&self) -> Option<HostObject>;

    fn parent(&self, object: &HostObject) -> Option<HostObject>;

    /// Braille cells for the current table view, `cols × rows` long
    fn table_cells(&self, cols: u32, rows: u32) -> Option<Vec<u8>>;

    /// Keys of a finished gesture, for the host's own key bindings
    fn forward_keys(&self, keys: &[MiniKey]);
}

/// Screen capture service
pub trait ScreenCapture: Send + Sync {
    /// Sample `region` into a `width × height` frame.
    ///
    /// Source and destination sizes differ; each output pixel samples the
    /// source at its centre.
    fn capture(&self, region: &CaptureRegion, width: u32, height: u32) -> Result<RgbImage, NavigationError>;

    /// Full source size, used to bound panning
    fn screen_size(&self) -> Option<(u32, u32)>;
}

/// Capture backed by a still image standing in for the screen
pub struct ImageFileCapture {
    image: RgbImage,
}

impl ImageFileCapture {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Load any format the `image` crate decodes
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let image = image::open(path)?.to_rgb8();
        info!(
            "Loaded {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self::new(image))
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}

impl ScreenCapture for ImageFileCapture {
    fn capture(&self, region: &CaptureRegion, width: u32, height: u32) -> Result<RgbImage, NavigationError> {
        if width == 0 || height == 0 || !(region.width > 0.0 && region.height > 0.0) {
            return Err(NavigationError::Capture(format!(
                "empty capture {width}x{height} of {region:?}"
            )));
        }

        let scale_x = region.width / f64::from(width);
        let scale_y = region.height / f64::from(height);
        let (src_w, src_h) = self.image.dimensions();

        let mut frame = RgbImage::new(width, height);
        for (x, y, px) in frame.enumerate_pixels_mut() {
            let sx = (region.left + (f64::from(x) + 0.5) * scale_x).floor();
            let sy = (region.top + (f64::from(y) + 0.5) * scale_y).floor();
            *px = if sx >= 0.0 && sy >= 0.0 && sx < f64::from(src_w) && sy < f64::from(src_h) {
                *self.image.get_pixel(sx as u32, sy as u32)
            } else {
                Rgb([0, 0, 0])
            };
        }
        Ok(frame)
    }

    fn screen_size(&self) -> Option<(u32, u32)> {
        Some(self.image.dimensions())
    }
}

/// A host with one fixed object and no screen reader behind it
///
/// Used by the command-line runner: the object covers the whole capture
/// source, table mode shows the placeholder, and forwarded keys are logged.
pub struct StaticHost {
    object: Option<HostObject>,
    forwarded: Mutex<Vec<Vec<MiniKey>>>,
}

impl StaticHost {
    pub fn new(object: Option<HostObject>) -> Self {
        Self {
            object,
            forwarded: Mutex::new(Vec::new()),
        }
    }

    /// Host whose single object spans a `width × height` screen
    pub fn full_screen(width: u32, height: u32) -> Self {
        Self::new(Some(HostObject::new(
            "screen",
            "Screen",
            Some(Viewport {
                left: 0.0,
                top: 0.0,
                width: f64::from(width),
                height: f64::from(height),
            }),
        )))
    }

    /// Every key set forwarded so far
    pub fn forwarded(&self) -> Vec<Vec<MiniKey>> {
        self.forwarded.lock().clone()
    }
}

impl AccessibilityHost for StaticHost {
    fn navigator_object(&self) -> Option<HostObject> {
        self.object.clone()
    }

    fn focus_object(&self) -> Option<HostObject> {
        self.object.clone()
    }

    fn parent(&self, _object: &HostObject) -> Option<HostObject> {
        None
    }

    fn table_cells(&self, _cols: u32, _rows: u32) -> Option<Vec<u8>> {
        None
    }

    fn forward_keys(&self, keys: &[MiniKey]) {
        let names: Vec<&str> = keys.iter().map(|k| k.name()).collect();
        info!("Key gesture: {}", names.join("+"));
        self.forwarded.lock().push(keys.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> RgbImage {
        RgbImage::from_fn(4, 4, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    #[test]
    fn test_capture_one_to_one() {
        let cap = ImageFileCapture::new(checker());
        let region = CaptureRegion { left: 0.0, top: 0.0, width: 4.0, height: 4.0 };
        let frame = cap.capture(&region, 4, 4).unwrap();
        assert_eq!(&frame, cap.image());
    }

    #[test]
    fn test_capture_scales_and_pads() {
        let cap = ImageFileCapture::new(checker());
        // Right half of the output falls outside the source
        let region = CaptureRegion { left: 2.0, top: 0.0, width: 4.0, height: 4.0 };
        let frame = cap.capture(&region, 2, 2).unwrap();
        // Left column samples source x=3 at y=1 and y=3, both white
        assert_eq!(frame.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(frame.get_pixel(0, 1), &Rgb([255, 255, 255]));
        assert_eq!(frame.get_pixel(1, 0), &Rgb([0, 0, 0]));
        assert_eq!(frame.get_pixel(1, 1), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_capture_rejects_empty() {
        let cap = ImageFileCapture::new(checker());
        let region = CaptureRegion { left: 0.0, top: 0.0, width: 0.0, height: 4.0 };
        assert!(matches!(cap.capture(&region, 2, 2), Err(NavigationError::Capture(_))));
    }

    #[test]
    fn test_static_host_records_keys() {
        let host = StaticHost::full_screen(640, 480);
        host.forward_keys(&[MiniKey::Space, MiniKey::Dot1]);
        assert_eq!(host.forwarded(), vec![vec![MiniKey::Space, MiniKey::Dot1]]);
        let obj = host.navigator_object().unwrap();
        assert_eq!(obj.location.unwrap().width, 640.0);
        assert!(host.table_cells(12, 4).is_none());
    }
}
