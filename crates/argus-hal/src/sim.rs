//! Simulated drivers for headless testing without physical hardware.
//!
//! These stubs let the full bridge stack run in CI: a camera that synthesises
//! frames, a detector that replays a programmed sequence of marker sets, and
//! a loopback serial link with scripted telemetry lines and captured writes.

use std::collections::VecDeque;
use std::sync::Arc;

use argus_types::{ArgusError, MarkerIdSet};
use parking_lot::Mutex;

use crate::camera::{Camera, CameraFrame};
use crate::detector::MarkerDetector;
use crate::serial::SerialLink;

// ────────────────────────────────────────────────────────────────────────────
// Simulated camera
// ────────────────────────────────────────────────────────────────────────────

/// A camera that synthesises RGB24 frames at a fixed resolution.
///
/// Every pixel of frame *n* carries the value `n mod 256`, so consecutive
/// frames are distinguishable in tests. Always succeeds.
pub struct SimCamera {
    id: String,
    width: u32,
    height: u32,
    counter: u8,
}

impl SimCamera {
    /// Create a simulated camera with the given identifier and resolution.
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            counter: 0,
        }
    }
}

impl Camera for SimCamera {
    fn id(&self) -> &str {
        &self.id
    }

    fn capture(&mut self) -> Result<CameraFrame, ArgusError> {
        let fill = self.counter;
        self.counter = self.counter.wrapping_add(1);
        Ok(CameraFrame {
            width: self.width,
            height: self.height,
            data: vec![fill; CameraFrame::expected_len(self.width, self.height)],
        })
    }
}

/// A camera whose every capture fails, for exercising the skip-and-continue
/// path of the detection loop.
pub struct FailingCamera {
    id: String,
}

impl FailingCamera {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Camera for FailingCamera {
    fn id(&self) -> &str {
        &self.id
    }

    fn capture(&mut self) -> Result<CameraFrame, ArgusError> {
        Err(ArgusError::HardwareFault {
            component: self.id.clone(),
            details: "simulated capture failure".to_string(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scripted detector
// ────────────────────────────────────────────────────────────────────────────

/// A [`MarkerDetector`] that replays a programmed sequence of marker sets.
///
/// Each call to [`detect`][MarkerDetector::detect] returns the next scripted
/// set; once the script is exhausted the last set repeats forever. An empty
/// script yields an empty set on every call, which is also what the CLI wires
/// in until a platform detection backend is integrated.
pub struct ScriptedDetector {
    dictionary: String,
    script: Vec<MarkerIdSet>,
    cursor: usize,
}

impl ScriptedDetector {
    /// Create a detector that replays `script` in order.
    pub fn new(script: Vec<MarkerIdSet>) -> Self {
        Self {
            dictionary: "DICT_5X5_100".to_string(),
            script,
            cursor: 0,
        }
    }

    /// A detector that reports no markers in any frame.
    pub fn silent() -> Self {
        Self::new(Vec::new())
    }
}

impl MarkerDetector for ScriptedDetector {
    fn dictionary(&self) -> &str {
        &self.dictionary
    }

    fn detect(&mut self, _frame: &CameraFrame) -> Result<MarkerIdSet, ArgusError> {
        let Some(ids) = self.script.get(self.cursor).cloned() else {
            return Ok(MarkerIdSet::new());
        };
        if self.cursor + 1 < self.script.len() {
            self.cursor += 1;
        }
        Ok(ids)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Loopback serial
// ────────────────────────────────────────────────────────────────────────────

/// In-memory [`SerialLink`] with scripted inbound lines and captured writes.
///
/// Clones share the same buffers: hand one clone to the bridge and keep one
/// in the test to feed telemetry lines and inspect forwarded commands.
#[derive(Clone)]
pub struct LoopbackSerial {
    inner: Arc<Mutex<LoopbackInner>>,
}

#[derive(Default)]
struct LoopbackInner {
    incoming: VecDeque<String>,
    written: Vec<Vec<u8>>,
}

impl Default for LoopbackSerial {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackSerial {
    /// Create a loopback link with no pending lines.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(LoopbackInner::default())),
        }
    }

    /// Queue a complete telemetry line (without terminator) for the next
    /// read.
    pub fn feed_line(&self, line: impl Into<String>) {
        self.inner.lock().incoming.push_back(line.into());
    }

    /// Every write made so far, oldest first.
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.inner.lock().written.clone()
    }
}

impl SerialLink for LoopbackSerial {
    fn id(&self) -> &str {
        "loopback"
    }

    fn try_read_line(&mut self) -> Result<Option<String>, ArgusError> {
        Ok(self.inner.lock().incoming.pop_front())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), ArgusError> {
        self.inner.lock().written.push(bytes.to_vec());
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_camera_frames_are_distinguishable() {
        let mut cam = SimCamera::new("front_rgb", 4, 4);
        let first = cam.capture().unwrap();
        let second = cam.capture().unwrap();
        assert_eq!(first.data.len(), CameraFrame::expected_len(4, 4));
        assert_ne!(first.data[0], second.data[0]);
    }

    #[test]
    fn failing_camera_always_errors() {
        let mut cam = FailingCamera::new("broken");
        assert!(cam.capture().is_err());
        assert!(cam.capture().is_err());
    }

    #[test]
    fn scripted_detector_replays_then_repeats_last() {
        let mut det = ScriptedDetector::new(vec![vec![3, 7], vec![], vec![42]]);
        let frame = CameraFrame {
            width: 1,
            height: 1,
            data: vec![0; 3],
        };
        assert_eq!(det.detect(&frame).unwrap(), vec![3, 7]);
        assert_eq!(det.detect(&frame).unwrap(), Vec::<u32>::new());
        assert_eq!(det.detect(&frame).unwrap(), vec![42]);
        // Exhausted: the last entry repeats.
        assert_eq!(det.detect(&frame).unwrap(), vec![42]);
    }

    #[test]
    fn silent_detector_reports_no_markers() {
        let mut det = ScriptedDetector::silent();
        let frame = CameraFrame {
            width: 1,
            height: 1,
            data: vec![0; 3],
        };
        assert!(det.detect(&frame).unwrap().is_empty());
        assert_eq!(det.dictionary(), "DICT_5X5_100");
    }

    #[test]
    fn loopback_serial_scripted_reads() {
        let handle = LoopbackSerial::new();
        let mut link = handle.clone();
        assert!(link.try_read_line().unwrap().is_none());

        handle.feed_line("OK");
        assert_eq!(link.try_read_line().unwrap().as_deref(), Some("OK"));
        assert!(link.try_read_line().unwrap().is_none());
    }

    #[test]
    fn loopback_serial_captures_writes_in_order() {
        let handle = LoopbackSerial::new();
        let mut link = handle.clone();
        link.write_bytes(b"MOVE 10 0").unwrap();
        link.write_bytes(b"STOP").unwrap();
        assert_eq!(handle.written(), vec![b"MOVE 10 0".to_vec(), b"STOP".to_vec()]);
    }
}
