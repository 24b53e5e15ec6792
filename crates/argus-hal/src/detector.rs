//! [`MarkerDetector`] – the black-box fiducial-marker detection step.

use argus_types::{ArgusError, MarkerIdSet};

use crate::camera::CameraFrame;

/// Detects fiducial markers in a single frame against a fixed dictionary and
/// parameter configuration chosen at construction time.
///
/// The detection algorithm itself is an external collaborator; this trait
/// pins down only its input/output contract:
///
/// - A frame containing no markers yields `Ok` with an **empty** id set,
///   never an error — "no markers" and "detection failed" are distinct
///   outcomes.
/// - An `Err` means the frame could not be processed (malformed buffer,
///   unexpected geometry). The caller logs it and skips the iteration; the
///   pipeline keeps running.
pub trait MarkerDetector: Send {
    /// Name of the marker dictionary this detector was configured with,
    /// e.g. `"DICT_5X5_100"`.
    fn dictionary(&self) -> &str;

    /// Run detection over `frame` and return the ordered identifiers of every
    /// marker found.
    fn detect(&mut self, frame: &CameraFrame) -> Result<MarkerIdSet, ArgusError>;
}
