//! Driver error types

use cadence_transport::TransportError;
use thiserror::Error;

/// Errors that stop a display session from being built or driven
#[derive(Error, Debug)]
pub enum DriverError {
    /// A session needs at least one panel
    #[error("No Cadence panels available")]
    NoPanels,

    /// Transport layer error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Panel index out of range for the current layout
    #[error("Unknown panel index {0}")]
    UnknownPanel(usize),

    /// The session task has stopped
    #[error("Display session is not running")]
    SessionClosed,

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Why an image or table frame could not be produced
///
/// These never end the session; the refreshing mode is left and the last
/// text content is shown again.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavigationError {
    /// Neither a navigator nor a focus object exists
    #[error("No navigator or focus object")]
    NoObject,

    /// The object and all of its ancestors lack a screen location
    #[error("No location for object {0:?}")]
    NoLocation(String),

    /// The located region has no area
    #[error("Invalid region for {name:?}: {width}x{height} at ({left}, {top})")]
    ZeroSizeRegion {
        name: String,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    },

    /// The capture collaborator failed
    #[error("Capture failed: {0}")]
    Capture(String),

    /// The capture collaborator did not answer in time
    #[error("Capture timed out after {0} ms")]
    CaptureTimeout(u64),
}

impl NavigationError {
    /// Timeouts only cost one frame; every other error leaves the mode.
    pub fn exits_mode(&self) -> bool {
        !matches!(self, NavigationError::CaptureTimeout(_))
    }
}
