//! JPEG/base64 encoding for the optional outbound `frame` field.
//!
//! Runs under `spawn_blocking` from the bridge loop; this module itself is
//! synchronous CPU-bound code.

use argus_hal::camera::CameraFrame;
use argus_types::ArgusError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

/// Encode an RGB24 frame as a base64 JPEG string at the given quality.
///
/// # Errors
///
/// Returns [`ArgusError::Serialization`] when the buffer does not match the
/// declared geometry or the encoder fails.
pub fn encode_frame(frame: &CameraFrame, quality: u8) -> Result<String, ArgusError> {
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality)
        .write_image(
            &frame.data,
            frame.width,
            frame.height,
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| ArgusError::Serialization(format!("jpeg encode: {e}")))?;
    Ok(STANDARD.encode(jpeg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_valid_frame_to_base64_jpeg() {
        let frame = CameraFrame {
            width: 8,
            height: 8,
            data: vec![0x40; CameraFrame::expected_len(8, 8)],
        };
        let encoded = encode_frame(&frame, 80).unwrap();
        assert!(!encoded.is_empty());

        // Round through base64 and check the JPEG SOI marker.
        let jpeg = STANDARD.decode(encoded).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn rejects_buffer_that_does_not_match_geometry() {
        let frame = CameraFrame {
            width: 8,
            height: 8,
            data: vec![0u8; 5],
        };
        assert!(encode_frame(&frame, 80).is_err());
    }
}
