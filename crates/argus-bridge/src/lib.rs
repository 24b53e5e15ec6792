//! `argus-bridge` – The WebSocket fusion server
//!
//! Accepts one operator/dashboard connection at a time and runs a
//! [`BridgeSession`] per connection that:
//!
//! 1. **Fuses** the latest marker-detection result and the latest serial
//!    telemetry line into one JSON message per loop iteration and streams it
//!    to the client.
//! 2. **Relays** free-form text commands from the client verbatim to the
//!    serial peer, polled within a bounded per-iteration window.
//! 3. **Attaches** a base64 JPEG of the most recent camera frame when frame
//!    transmission is enabled, encoded off the loop.
//!
//! # Modules
//!
//! - [`server`] – [`BridgeServer`][server::BridgeServer]: bind + accept loop.
//! - [`session`] – [`BridgeSession`][session::BridgeSession]: the
//!   per-connection bridge loop.
//! - [`encode`] – JPEG/base64 frame encoding for the optional `frame` field.

pub mod encode;
pub mod server;
pub mod session;

pub use server::BridgeServer;
pub use session::{BridgeSession, SessionSettings};
