//! Turning discovered HID panels into layout panels

use cadence_transport::{Handedness, PanelDeviceInfo};
use tracing::warn;

use crate::config::DriverConfig;
use crate::layout::Panel;

/// Build the layout view of a panel from its device info and any
/// configured override for its serial number.
///
/// A panel whose handedness cannot be told from its name is treated as a
/// left unit.
pub fn panel_from_device(info: &PanelDeviceInfo, config: &DriverConfig) -> Panel {
    let over = config.panel_override(info.serial.as_deref());

    let handedness = over
        .and_then(|o| o.handedness)
        .or(info.handedness)
        .unwrap_or_else(|| {
            warn!(
                "Cannot tell handedness of {}, assuming left",
                info.display_name()
            );
            Handedness::Left
        });
    let columns = over.and_then(|o| o.columns).unwrap_or(info.columns);

    Panel::new(info.display_name(), handedness.into(), columns)
}
