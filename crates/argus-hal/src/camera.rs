//! Generic `Camera` trait and the raw frame type it produces.

use argus_types::ArgusError;

/// A raw RGB24 image frame captured from a camera device.
///
/// The buffer is owned exclusively by the detector while capturing; ownership
/// moves into the frame hand-off slot on publish and to the bridge loop on
/// consume. Pixel data is tightly packed, row-major, 3 bytes per pixel.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Raw RGB24 pixel data; `len == width * height * 3`.
    pub data: Vec<u8>,
}

impl CameraFrame {
    /// Expected buffer length in bytes for an RGB24 frame of the given size.
    pub fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 3
    }
}

/// A camera or image-capture device.
///
/// The concrete driver (platform camera stack, V4L2, …) lives outside this
/// workspace; the marker-detection worker owns exactly one `Camera` for its
/// entire lifetime and releases the device by dropping it.
pub trait Camera: Send {
    /// Stable identifier for this camera, e.g. `"front_rgb"`.
    fn id(&self) -> &str;

    /// Capture and return the next available frame at the device's fixed
    /// resolution and pixel format.
    ///
    /// # Errors
    ///
    /// Returns [`ArgusError::HardwareFault`] if the frame cannot be captured
    /// (e.g. the device is disconnected or the buffer is unavailable). A
    /// capture failure is non-fatal to the pipeline: the caller skips the
    /// iteration and tries again.
    fn capture(&mut self) -> Result<CameraFrame, ArgusError>;
}
