//! Input report reader threads
//!
//! Each panel delivers button reports on its own HID input endpoint. A
//! dedicated thread per panel reads them and pushes timestamped copies into a
//! broadcast channel, so consumers never block on HID reads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use hidapi::HidDevice;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::types::InputReport;

/// Broadcast channel capacity for input reports
const REPORT_CHANNEL_CAPACITY: usize = 256;

/// Largest input report we expect from a panel
const MAX_REPORT_LEN: usize = 64;

/// Configuration for the report reader loop
#[derive(Clone)]
pub struct ReportReaderConfig {
    /// Read timeout in milliseconds (for checking shutdown flag when idle)
    pub read_timeout_ms: i32,
    /// Sleep duration on error before retrying
    pub error_sleep_ms: u64,
    /// Name prefix for debug logging and the thread name
    pub name: String,
}

impl ReportReaderConfig {
    /// Configuration for USB panels
    pub fn usb(panel_name: &str) -> Self {
        Self {
            read_timeout_ms: 5,
            error_sleep_ms: 100,
            name: format!("usb-{panel_name}"),
        }
    }

    /// Configuration for Bluetooth panels
    pub fn bluetooth(panel_name: &str) -> Self {
        Self {
            read_timeout_ms: 10,
            error_sleep_ms: 100,
            name: format!("bt-{panel_name}"),
        }
    }
}

/// Owns the reader thread and its broadcast channel.
///
/// Dropping the subsystem signals the thread to exit on its next timeout.
pub struct ReportSubsystem {
    report_tx: broadcast::Sender<InputReport>,
    shutdown: Arc<AtomicBool>,
}

impl ReportSubsystem {
    /// Spawn a reader thread for `input_device`.
    pub fn spawn(input_device: HidDevice, config: ReportReaderConfig) -> Result<Self, TransportError> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let (tx, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);
        let tx_clone = tx.clone();
        let shutdown_clone = shutdown.clone();

        std::thread::Builder::new()
            .name(format!("{}-reports", config.name))
            .spawn(move || run_report_reader_loop(input_device, tx_clone, shutdown_clone, config))
            .map_err(|e| TransportError::Internal(format!("spawn report reader: {e}")))?;

        Ok(Self {
            report_tx: tx,
            shutdown,
        })
    }

    /// Subscribe to the report broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<InputReport> {
        self.report_tx.subscribe()
    }

    /// Whether the reader thread is still running
    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::SeqCst)
    }
}

impl Drop for ReportSubsystem {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

/// Read input reports until the shutdown flag is set.
pub fn run_report_reader_loop(
    input_device: HidDevice,
    tx: broadcast::Sender<InputReport>,
    shutdown: Arc<AtomicBool>,
    config: ReportReaderConfig,
) {
    debug!("{} report reader thread started", config.name);
    let mut buf = [0u8; MAX_REPORT_LEN];
    let start_time = Instant::now();

    while !shutdown.load(Ordering::Relaxed) {
        match input_device.read_timeout(&mut buf, config.read_timeout_ms) {
            Ok(len) if len > 0 => {
                let timestamp = start_time.elapsed().as_secs_f64();
                debug!(
                    "{} report {} bytes at {:.3}s: {:02X?}",
                    config.name,
                    len,
                    timestamp,
                    &buf[..len]
                );
                // No receivers is fine; the session may not be listening yet
                let _ = tx.send(InputReport::new(timestamp, buf[..len].to_vec()));
            }
            Ok(_) => {}
            Err(e) => {
                warn!("{} report reader error: {}", config.name, e);
                std::thread::sleep(Duration::from_millis(config.error_sleep_ms));
            }
        }
    }

    debug!("{} report reader thread exiting", config.name);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_config_names() {
        assert_eq!(ReportReaderConfig::usb("0").name, "usb-0");
        assert_eq!(ReportReaderConfig::bluetooth("1").name, "bt-1");
        assert!(ReportReaderConfig::bluetooth("1").read_timeout_ms > 0);
    }
}
