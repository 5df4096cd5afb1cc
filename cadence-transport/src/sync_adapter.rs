//! Blocking wrappers over discovery for CLI code that has no runtime at hand

use std::sync::Arc;

use futures::executor::block_on;

use crate::error::TransportError;
use crate::types::DiscoveredPanel;
use crate::{HidDiscovery, PanelDiscovery, PanelTransport};

/// List attached panels (blocking)
pub fn list_panels_sync() -> Result<Vec<DiscoveredPanel>, TransportError> {
    block_on(HidDiscovery::new().list_panels())
}

/// Open every attached panel (blocking)
///
/// Panels that fail to open are logged and skipped; an empty result is an
/// error so callers can report "no panels" uniformly.
pub fn open_all_panels_sync() -> Result<Vec<Arc<dyn PanelTransport>>, TransportError> {
    let discovery = HidDiscovery::new();
    let panels = block_on(discovery.list_panels())?;

    let mut opened = Vec::with_capacity(panels.len());
    for panel in &panels {
        match block_on(discovery.open_panel(panel)) {
            Ok(transport) => opened.push(transport),
            Err(e) => tracing::warn!("Failed to open {}: {}", panel.info.display_name(), e),
        }
    }

    if opened.is_empty() {
        return Err(TransportError::DeviceNotFound(
            "No Cadence panel found".into(),
        ));
    }
    Ok(opened)
}
