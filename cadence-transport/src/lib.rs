//! Transport layer for Cadence tiled braille panels
//!
//! Each physical panel is a HID device that accepts rows of braille cells as
//! output reports and sends button state as input reports. This crate finds
//! panels, opens them and exposes a small synchronous [`PanelTransport`]
//! surface to the driver.

pub mod device_registry;
pub mod error;
pub mod report_reader;
pub mod types;

mod discovery;
mod hid_panel;
mod sync_adapter;

pub use device_registry::{is_cadence_panel, DEFAULT_COLUMNS, PRODUCT_ID, VENDOR_ID};
pub use error::TransportError;
pub use types::{DiscoveredPanel, Handedness, InputReport, PanelDeviceInfo, TransportType};

pub use discovery::{HidDiscovery, PanelDiscovery};
pub use hid_panel::HidPanelTransport;
pub use sync_adapter::{list_panels_sync, open_all_panels_sync};

use tokio::sync::broadcast;

/// The core panel trait - HID panels and test doubles implement this
pub trait PanelTransport: Send + Sync {
    /// Write a full frame of cells (one byte per cell, row-major)
    fn write_cells(&self, cells: &[u8]) -> Result<(), TransportError>;

    /// Switch the panel between one-handed and two-handed key reporting
    fn set_one_handed(&self, one_handed: bool) -> Result<(), TransportError>;

    /// Subscribe to raw input reports, if the panel has an input handle
    fn subscribe_reports(&self) -> Option<broadcast::Receiver<InputReport>>;

    /// Get device information
    fn device_info(&self) -> &PanelDeviceInfo;

    /// Check if the panel is still connected
    fn is_connected(&self) -> bool;
}
