//! In-memory panel
//!
//! Stands in for hardware when rendering offline and in tests: keeps every
//! frame and handedness switch it receives and can inject input reports.

use cadence_transport::{
    Handedness, InputReport, PanelDeviceInfo, PanelTransport, TransportError, TransportType,
    DEFAULT_COLUMNS, PRODUCT_ID, VENDOR_ID,
};
use parking_lot::Mutex;
use tokio::sync::broadcast;

pub struct MemoryPanel {
    info: PanelDeviceInfo,
    frames: Mutex<Vec<Vec<u8>>>,
    one_handed: Mutex<Vec<bool>>,
    reports: broadcast::Sender<InputReport>,
}

impl MemoryPanel {
    /// A panel named `Cadence-L<suffix>` or `Cadence-R<suffix>`
    pub fn new(handedness: Handedness, suffix: &str) -> Self {
        Self::with_columns(handedness, suffix, DEFAULT_COLUMNS)
    }

    /// A bridged pair reports twice the columns of a single unit
    pub fn with_columns(handedness: Handedness, suffix: &str, columns: u32) -> Self {
        let name = format!("Cadence-{}{}", handedness.letter(), suffix);
        let (reports, _) = broadcast::channel(64);
        Self {
            info: PanelDeviceInfo {
                vid: VENDOR_ID,
                pid: PRODUCT_ID,
                transport_type: TransportType::Usb,
                device_path: format!("memory:{name}"),
                serial: None,
                product_name: Some(name),
                handedness: Some(handedness),
                columns,
            },
            frames: Mutex::new(Vec::new()),
            one_handed: Mutex::new(Vec::new()),
            reports,
        }
    }

    /// Most recent frame written, if any
    pub fn last_frame(&self) -> Option<Vec<u8>> {
        self.frames.lock().last().cloned()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.lock().len()
    }

    /// Every one-handed switch, in order
    pub fn one_handed_history(&self) -> Vec<bool> {
        self.one_handed.lock().clone()
    }

    /// Deliver an input report to subscribers
    pub fn push_report(&self, data: &[u8]) {
        let _ = self.reports.send(InputReport::new(0.0, data.to_vec()));
    }
}

impl PanelTransport for MemoryPanel {
    fn write_cells(&self, cells: &[u8]) -> Result<(), TransportError> {
        self.frames.lock().push(cells.to_vec());
        Ok(())
    }

    fn set_one_handed(&self, one_handed: bool) -> Result<(), TransportError> {
        self.one_handed.lock().push(one_handed);
        Ok(())
    }

    fn subscribe_reports(&self) -> Option<broadcast::Receiver<InputReport>> {
        Some(self.reports.subscribe())
    }

    fn device_info(&self) -> &PanelDeviceInfo {
        &self.info
    }

    fn is_connected(&self) -> bool {
        true
    }
}
