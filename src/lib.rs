// Cadence tiled braille panel driver - shared library
// Layout, key chords, view navigation and rendering for one display session

pub mod canvas;
pub mod chord;
pub mod command;
pub mod compositor;
pub mod config;
pub mod devices;
pub mod error;
pub mod host;
pub mod keys;
pub mod layout;
pub mod memory_panel;
pub mod raster;
pub mod runtime;
pub mod session;
pub mod slider;

pub use canvas::{CaptureRegion, DeviceExtent, Direction, ViewState, Viewport};
pub use chord::{ChordTracker, Gesture};
pub use command::{match_gesture, NavCommand};
pub use compositor::{Corner, GridGeometry, Side};
pub use config::{DriverConfig, PanelOverride};
pub use error::{DriverError, NavigationError};
pub use host::{AccessibilityHost, HostObject, ImageFileCapture, ScreenCapture, StaticHost};
pub use keys::{decode_report, KeyEvent, MiniKey};
pub use layout::{Panel, PanelLayout};
pub use memory_panel::MemoryPanel;
pub use raster::{ColorChannel, DotMatrix, RasterSettings};
pub use runtime::{attach_reports, spawn_session, RefreshTimer, SessionHandle, SessionMessage, SessionOptions};
pub use session::{DisplayMode, DisplaySession, FrameRequest, ReportOutcome};
pub use slider::{CompositeSlider, Curve, Slider};
