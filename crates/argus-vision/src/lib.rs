//! `argus-vision` – Marker-detection producer.
//!
//! Runs the capture→detect→publish loop on its own OS thread so the
//! CPU-bound detection step can never preempt or starve network I/O
//! scheduling.
//!
//! # Modules
//!
//! - [`worker`] – [`DetectorWorker`][worker::DetectorWorker]: owns the camera
//!   and detector for its lifetime, publishes into the hand-off slots, and
//!   exits cooperatively on shutdown.

pub mod worker;

pub use worker::{DetectorHandle, DetectorWorker};
