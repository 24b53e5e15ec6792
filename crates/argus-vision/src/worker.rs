//! [`DetectorWorker`] – the isolated capture→detect→publish loop.
//!
//! The worker owns the camera device for its entire lifetime. Each iteration
//! captures one frame, runs the black-box detection step, and publishes both
//! the frame and the resulting id set to the hand-off slots. Publishing is
//! latest-wins and never blocks, so a slow consumer can never throttle the
//! detection cadence.
//!
//! Shutdown is cooperative: the token is checked between iterations, a
//! capture in progress is always allowed to finish, and the camera is
//! released (dropped) before the thread terminates. The coordinator joins
//! [`DetectorHandle`] to guarantee the device is free before process exit.

use std::thread;

use argus_hal::camera::{Camera, CameraFrame};
use argus_hal::detector::MarkerDetector;
use argus_middleware::{HandoffSlot, Shutdown};
use argus_types::{ArgusError, MarkerIdSet};
use tracing::{info, warn};

/// The marker-detection producer.
///
/// Construct with the camera, the detector, the two publish-side slot
/// handles, and the shutdown token; then call [`spawn`][Self::spawn] to move
/// the whole worker onto a dedicated thread.
pub struct DetectorWorker {
    camera: Box<dyn Camera>,
    detector: Box<dyn MarkerDetector>,
    frames: HandoffSlot<CameraFrame>,
    ids: HandoffSlot<MarkerIdSet>,
    shutdown: Shutdown,
}

impl DetectorWorker {
    pub fn new(
        camera: Box<dyn Camera>,
        detector: Box<dyn MarkerDetector>,
        frames: HandoffSlot<CameraFrame>,
        ids: HandoffSlot<MarkerIdSet>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            camera,
            detector,
            frames,
            ids,
            shutdown,
        }
    }

    /// Move the worker onto a dedicated OS thread and return a join handle.
    ///
    /// # Errors
    ///
    /// Returns [`ArgusError::Io`] if the thread cannot be spawned; the caller
    /// treats this as fatal at startup.
    pub fn spawn(self) -> Result<DetectorHandle, ArgusError> {
        let handle = thread::Builder::new()
            .name("argus-detector".to_string())
            .spawn(move || self.run())
            .map_err(|e| ArgusError::Io(format!("spawn detector thread: {e}")))?;
        Ok(DetectorHandle { handle })
    }

    fn run(mut self) {
        info!(
            camera = %self.camera.id(),
            dictionary = %self.detector.dictionary(),
            "marker detector started"
        );

        while !self.shutdown.is_cancelled() {
            let frame = match self.camera.capture() {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(error = %e, "frame capture failed; skipping iteration");
                    continue;
                }
            };

            match self.detector.detect(&frame) {
                Ok(ids) => {
                    // An empty set is published like any other result, so
                    // consumers see "no markers" rather than a stale value.
                    self.ids.publish(ids);
                    self.frames.publish(frame);
                }
                Err(e) => {
                    warn!(error = %e, "marker detection failed; skipping frame");
                }
            }
        }

        // `self.camera` drops here, releasing the device before the thread
        // terminates; joining the handle therefore guarantees release.
        info!("marker detector stopped");
    }
}

/// Join handle for the detector's execution context.
pub struct DetectorHandle {
    handle: thread::JoinHandle<()>,
}

impl DetectorHandle {
    /// Block until the detector thread has exited and the camera device has
    /// been released. The worker never panics, so a join error is only
    /// possible if the thread was killed externally; it is absorbed.
    pub fn join(self) {
        if self.handle.join().is_err() {
            warn!("detector thread terminated abnormally");
        }
    }
}
