//! Common types for the panel transport layer

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a panel is attached to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TransportType {
    /// Direct USB HID connection
    Usb,
    /// Bluetooth HID (kernel hid-over-gatt / hidp)
    Bluetooth,
}

impl TransportType {
    /// Check if this transport is wireless
    pub fn is_wireless(&self) -> bool {
        matches!(self, Self::Bluetooth)
    }
}

/// Which hand a physical panel unit is built for
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    /// Derive handedness from the product string the panel reports.
    ///
    /// Panels name themselves `Cadence-L…` or `Cadence-R…`.
    pub fn from_product_name(name: &str) -> Option<Self> {
        if name.starts_with("Cadence-L") {
            Some(Handedness::Left)
        } else if name.starts_with("Cadence-R") {
            Some(Handedness::Right)
        } else {
            None
        }
    }

    /// One-letter label used in CLI output and arguments
    pub fn letter(&self) -> char {
        match self {
            Handedness::Left => 'L',
            Handedness::Right => 'R',
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handedness::Left => f.write_str("left"),
            Handedness::Right => f.write_str("right"),
        }
    }
}

impl FromStr for Handedness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l" | "left" => Ok(Handedness::Left),
            "r" | "right" => Ok(Handedness::Right),
            other => Err(format!("unknown handedness: \"{other}\"")),
        }
    }
}

/// Device identification information
#[derive(Debug, Clone, Serialize)]
pub struct PanelDeviceInfo {
    /// USB Vendor ID
    pub vid: u16,
    /// USB Product ID
    pub pid: u16,
    /// Transport type
    pub transport_type: TransportType,
    /// hidraw path or platform identifier
    pub device_path: String,
    /// Serial number if available
    pub serial: Option<String>,
    /// Product name if available
    pub product_name: Option<String>,
    /// Handedness derived from the product name, if recognisable
    pub handedness: Option<Handedness>,
    /// Braille cell columns the panel reports (more than 12 for bridged pairs)
    pub columns: u32,
}

impl PanelDeviceInfo {
    /// Name used to order panels when resolving corner conflicts
    pub fn display_name(&self) -> &str {
        self.product_name
            .as_deref()
            .or(self.serial.as_deref())
            .unwrap_or(&self.device_path)
    }
}

/// Discovered panel that can be opened
#[derive(Debug, Clone)]
pub struct DiscoveredPanel {
    /// Device information
    pub info: PanelDeviceInfo,
}

/// Raw input report with the time it was read (seconds since the transport opened)
#[derive(Debug, Clone)]
pub struct InputReport {
    pub timestamp: f64,
    pub data: Vec<u8>,
}

impl InputReport {
    pub fn new(timestamp: f64, data: Vec<u8>) -> Self {
        Self { timestamp, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handedness_from_product_name() {
        assert_eq!(
            Handedness::from_product_name("Cadence-L 0042"),
            Some(Handedness::Left)
        );
        assert_eq!(
            Handedness::from_product_name("Cadence-R"),
            Some(Handedness::Right)
        );
        assert_eq!(Handedness::from_product_name("Focus 40"), None);
    }

    #[test]
    fn test_handedness_parse() {
        assert_eq!("L".parse::<Handedness>(), Ok(Handedness::Left));
        assert_eq!("right".parse::<Handedness>(), Ok(Handedness::Right));
        assert!("middle".parse::<Handedness>().is_err());
    }

    #[test]
    fn test_wireless() {
        assert!(TransportType::Bluetooth.is_wireless());
        assert!(!TransportType::Usb.is_wireless());
    }
}
