//! Panel discovery over hidapi

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use hidapi::HidApi;
use tracing::{debug, info};

use crate::device_registry::{self, DEFAULT_COLUMNS, USAGE_PAGE_BRAILLE};
use crate::error::TransportError;
use crate::hid_panel::HidPanelTransport;
use crate::types::{DiscoveredPanel, Handedness, PanelDeviceInfo, TransportType};
use crate::PanelTransport;

/// Check if a device is connected via Bluetooth
fn is_bluetooth_bus(device_info: &hidapi::DeviceInfo) -> bool {
    matches!(device_info.bus_type(), hidapi::BusType::Bluetooth)
}

/// Panel discovery abstraction
#[async_trait]
pub trait PanelDiscovery: Send + Sync {
    /// List currently attached panels
    async fn list_panels(&self) -> Result<Vec<DiscoveredPanel>, TransportError>;

    /// Open a discovered panel
    async fn open_panel(
        &self,
        panel: &DiscoveredPanel,
    ) -> Result<Arc<dyn PanelTransport>, TransportError>;
}

/// hidapi-backed discovery of Cadence panels
#[derive(Default)]
pub struct HidDiscovery;

impl HidDiscovery {
    pub fn new() -> Self {
        Self
    }

    /// A panel exposes several collections; keep the braille one.
    ///
    /// Some platforms report a zero usage page, those are accepted as-is.
    fn is_braille_interface(device_info: &hidapi::DeviceInfo) -> bool {
        let page = device_info.usage_page();
        page == 0 || page == USAGE_PAGE_BRAILLE
    }

    fn panel_info(device_info: &hidapi::DeviceInfo) -> PanelDeviceInfo {
        let product_name = device_info.product_string().map(|s| s.to_string());
        let handedness = product_name
            .as_deref()
            .and_then(Handedness::from_product_name);
        let transport_type = if is_bluetooth_bus(device_info) {
            TransportType::Bluetooth
        } else {
            TransportType::Usb
        };

        PanelDeviceInfo {
            vid: device_info.vendor_id(),
            pid: device_info.product_id(),
            transport_type,
            device_path: device_info.path().to_string_lossy().to_string(),
            serial: device_info.serial_number().map(|s| s.to_string()),
            product_name,
            handedness,
            columns: DEFAULT_COLUMNS,
        }
    }
}

#[async_trait]
impl PanelDiscovery for HidDiscovery {
    async fn list_panels(&self) -> Result<Vec<DiscoveredPanel>, TransportError> {
        let api = HidApi::new()?;
        let mut seen = HashSet::new();
        let mut panels = Vec::new();

        for device_info in api.device_list() {
            if !device_registry::is_cadence_panel(device_info.vendor_id(), device_info.product_id())
            {
                continue;
            }
            if !Self::is_braille_interface(device_info) {
                continue;
            }

            let info = Self::panel_info(device_info);
            if !seen.insert(info.device_path.clone()) {
                continue;
            }

            debug!(
                "Found panel: VID={:04X} PID={:04X} type={:?} hand={:?} path={}",
                info.vid, info.pid, info.transport_type, info.handedness, info.device_path
            );
            panels.push(DiscoveredPanel { info });
        }

        Ok(panels)
    }

    async fn open_panel(
        &self,
        panel: &DiscoveredPanel,
    ) -> Result<Arc<dyn PanelTransport>, TransportError> {
        let api = HidApi::new()?;
        let path = std::ffi::CString::new(panel.info.device_path.clone())
            .map_err(|e| TransportError::Internal(format!("invalid device path: {e}")))?;

        let device = api
            .open_path(&path)
            .map_err(|e| match TransportError::from(e) {
                TransportError::HidError(msg) => {
                    TransportError::DeviceNotFound(format!("{}: {msg}", panel.info.device_path))
                }
                other => other,
            })?;
        // Second handle for the reader thread; output keeps working without it
        let input_device = api.open_path(&path).ok();

        info!(
            "Opened panel {} ({:?})",
            panel.info.display_name(),
            panel.info.transport_type
        );

        let transport = HidPanelTransport::new(device, input_device, panel.info.clone())?;
        Ok(Arc::new(transport))
    }
}
