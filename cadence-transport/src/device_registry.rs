//! Device registry - panel identification constants
//!
//! Single source of truth for the vendor/product identity and the HID
//! report layout of Cadence panels.

/// Cadence vendor ID
pub const VENDOR_ID: u16 = 0x361F;

/// Cadence panel product ID (USB and Bluetooth)
pub const PRODUCT_ID: u16 = 0x52AE;

/// HID usage page for braille displays
pub const USAGE_PAGE_BRAILLE: u16 = 0x41;

/// Cell columns of a single panel unit
pub const DEFAULT_COLUMNS: u32 = 12;

/// Cell rows of a panel unit
pub const PANEL_ROWS: u32 = 4;

/// Report ID prefixed to output (cell) reports
pub const OUTPUT_REPORT_ID: u8 = 0x00;

/// Report ID of the feature report carrying the handedness key
pub const FEATURE_REPORT_ID: u8 = 0x00;

/// Feature payload that puts a panel into one-handed mode
pub const ONE_HANDED_KEY: [u8; 16] = [0; 16];

/// Feature payload that puts a panel into two-handed mode
pub const TWO_HANDED_KEY: [u8; 16] = [
    0xf4, 0x50, 0x4c, 0x74, 0xd1, 0x6e, 0xca, 0xa3, 0x8c, 0x4f, 0x5f, 0x0a, 0xd1, 0xa7, 0x5a, 0x29,
];

/// Check if a VID/PID pair is a Cadence panel
#[inline]
pub fn is_cadence_panel(vid: u16, pid: u16) -> bool {
    vid == VENDOR_ID && pid == PRODUCT_ID
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_panel() {
        assert!(is_cadence_panel(0x361F, 0x52AE));
    }

    #[test]
    fn test_other_devices_rejected() {
        assert!(!is_cadence_panel(0x3151, 0x5030));
        assert!(!is_cadence_panel(0x361F, 0x0000));
    }

    #[test]
    fn test_handedness_keys_differ() {
        assert_ne!(ONE_HANDED_KEY, TWO_HANDED_KEY);
    }
}
