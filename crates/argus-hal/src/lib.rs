//! `argus-hal` – Hardware Abstraction Layer
//!
//! Boundary traits for the three devices the bridge touches, plus stub
//! drivers so the full stack runs in headless tests and CI pipelines without
//! physical hardware.
//!
//! # Modules
//!
//! - [`camera`] – [`Camera`][camera::Camera] trait and the raw
//!   [`CameraFrame`][camera::CameraFrame] buffer it produces.
//! - [`detector`] – [`MarkerDetector`][detector::MarkerDetector]: the
//!   black-box fiducial-marker detection step.
//! - [`serial`] – [`SerialLink`][serial::SerialLink] trait and
//!   [`UartLink`][serial::UartLink], the non-blocking UART driver.
//! - [`sim`] – simulated drivers: scripted detection results, synthetic
//!   frames, loopback serial.

pub mod camera;
pub mod detector;
pub mod serial;
pub mod sim;

pub use camera::{Camera, CameraFrame};
pub use detector::MarkerDetector;
pub use serial::{SerialLink, UartLink};
