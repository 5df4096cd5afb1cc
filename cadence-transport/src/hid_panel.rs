//! HID transport for a single braille panel unit

use std::sync::atomic::{AtomicBool, Ordering};

use hidapi::HidDevice;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::device_registry::{
    FEATURE_REPORT_ID, ONE_HANDED_KEY, OUTPUT_REPORT_ID, TWO_HANDED_KEY,
};
use crate::error::TransportError;
use crate::report_reader::{ReportReaderConfig, ReportSubsystem};
use crate::types::{InputReport, PanelDeviceInfo};
use crate::PanelTransport;

/// HID transport for one panel
///
/// Cell data goes out as output reports, the handedness key as a feature
/// report. Button reports are read on a separate handle by a reader thread.
pub struct HidPanelTransport {
    /// Handle used for output and feature reports
    device: Mutex<HidDevice>,
    /// Device information
    info: PanelDeviceInfo,
    /// Reader thread for button reports (if an input handle was opened)
    reports: Option<ReportSubsystem>,
    /// Cleared after the first failed write
    connected: AtomicBool,
}

impl HidPanelTransport {
    /// Create a panel transport from an output handle and an optional input handle
    pub fn new(
        device: HidDevice,
        input_device: Option<HidDevice>,
        info: PanelDeviceInfo,
    ) -> Result<Self, TransportError> {
        let reports = match input_device {
            Some(input) => {
                let name = info
                    .handedness
                    .map(|h| h.letter().to_string())
                    .unwrap_or_else(|| info.device_path.clone());
                let config = if info.transport_type.is_wireless() {
                    ReportReaderConfig::bluetooth(&name)
                } else {
                    ReportReaderConfig::usb(&name)
                };
                Some(ReportSubsystem::spawn(input, config)?)
            }
            None => None,
        };

        Ok(Self {
            device: Mutex::new(device),
            info,
            reports,
            connected: AtomicBool::new(true),
        })
    }

    fn mark_failed<T>(&self, result: Result<T, hidapi::HidError>) -> Result<T, TransportError> {
        result.map_err(|e| {
            warn!("{}: write failed: {}", self.info.display_name(), e);
            self.connected.store(false, Ordering::SeqCst);
            TransportError::from(e)
        })
    }
}

impl PanelTransport for HidPanelTransport {
    fn write_cells(&self, cells: &[u8]) -> Result<(), TransportError> {
        let mut buf = Vec::with_capacity(cells.len() + 1);
        buf.push(OUTPUT_REPORT_ID);
        buf.extend_from_slice(cells);
        debug!("{}: writing {} cells", self.info.display_name(), cells.len());
        let device = self.device.lock();
        self.mark_failed(device.write(&buf)).map(|_| ())
    }

    fn set_one_handed(&self, one_handed: bool) -> Result<(), TransportError> {
        let key = if one_handed {
            &ONE_HANDED_KEY
        } else {
            &TWO_HANDED_KEY
        };
        let mut buf = Vec::with_capacity(key.len() + 1);
        buf.push(FEATURE_REPORT_ID);
        buf.extend_from_slice(key);
        debug!(
            "{}: one-handed mode {}",
            self.info.display_name(),
            if one_handed { "on" } else { "off" }
        );
        let device = self.device.lock();
        self.mark_failed(device.send_feature_report(&buf))
    }

    fn subscribe_reports(&self) -> Option<broadcast::Receiver<InputReport>> {
        self.reports.as_ref().map(|r| r.subscribe())
    }

    fn device_info(&self) -> &PanelDeviceInfo {
        &self.info
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
            && self.reports.as_ref().map_or(true, |r| r.is_running())
    }
}
