use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordered sequence of fiducial marker identifiers found in a single capture.
///
/// An empty set means "the detector ran and saw no markers" — it is published
/// like any other result so consumers never have to distinguish "no markers"
/// from "detector not yet run" once the pipeline is live.
pub type MarkerIdSet = Vec<u32>;

/// One outbound wire message, fusing the latest vision result with the latest
/// serial telemetry line.
///
/// Constructed fresh on every bridge-loop iteration and never mutated after
/// construction. `aruco_ids` reflects the most recent marker set visible at
/// construction time; it is *not* synchronized with the timestamp of
/// `serial_data` (bounded staleness, not joint consistency).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedMessage {
    /// Marker identifiers from the most recent detection result.
    pub aruco_ids: MarkerIdSet,
    /// The most recent complete serial line, trimmed; empty when none was
    /// pending this iteration.
    pub serial_data: String,
    /// Base64-encoded JPEG of the most recent camera frame. Only attached
    /// when frame transmission is enabled; omitted from the wire otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
}

impl FusedMessage {
    /// Build a frameless message from a marker set and a serial line.
    pub fn new(aruco_ids: MarkerIdSet, serial_data: impl Into<String>) -> Self {
        Self {
            aruco_ids,
            serial_data: serial_data.into(),
            frame: None,
        }
    }
}

/// Global error type spanning device faults, I/O failures, and serialization
/// boundary errors.
///
/// Transient absences (no serial line pending, empty hand-off slot, no client
/// command within the poll window) are **not** errors anywhere in this
/// workspace; they are represented as `None` / empty values.
#[derive(Error, Debug)]
pub enum ArgusError {
    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("I/O Error: {0}")]
    Io(String),

    #[error("Serialization Error: {0}")]
    Serialization(String),
}
