//! [`BridgeSession`] – the per-connection bridge loop.
//!
//! One session runs per accepted WebSocket connection. Each iteration walks a
//! fixed sequence, terminal on shutdown or connection loss:
//!
//! 1. Shutdown checkpoint.
//! 2. Non-blocking serial read (at most one complete line, else empty).
//! 3. Non-blocking consume of the latest marker set (sticky across
//!    iterations when nothing new arrived).
//! 4. Construct the fused message; optionally attach an off-loop-encoded
//!    frame.
//! 5. Send it; a failed send means the client is gone and ends the session.
//! 6. Poll for one inbound command within a bounded window and forward it
//!    verbatim to the serial peer.
//!
//! The serial peer and the vision pipeline tick on independent cadences, so
//! steps 2–3 must never block; the WebSocket send, the bounded command poll,
//! and the frame encode are the loop's only suspension points, and the first
//! two are raced against the shutdown token so a shutdown in progress
//! resolves them promptly.

use std::time::{Duration, Instant};

use argus_hal::camera::CameraFrame;
use argus_hal::serial::SerialLink;
use argus_middleware::{HandoffSlot, Shutdown};
use argus_types::{ArgusError, FusedMessage, MarkerIdSet};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{WebSocketStream, tungstenite::Message};
use tracing::{debug, warn};

use crate::encode;

/// Tunables for one bridge session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// How long step 6 waits for an inbound command before moving on. This
    /// is a polling deadline, not a cancellation primitive; it also bounds
    /// the fixed latency added to every iteration.
    pub command_poll: Duration,
    /// Attach base64 JPEG frames to outbound messages.
    pub send_frames: bool,
    /// Minimum spacing between two attached frames.
    pub frame_interval: Duration,
    /// JPEG quality for attached frames (0–100).
    pub jpeg_quality: u8,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            command_poll: Duration::from_millis(1),
            send_frames: false,
            frame_interval: Duration::from_millis(100),
            jpeg_quality: 80,
        }
    }
}

/// Per-connection orchestrator fusing serial and vision data into one
/// outbound stream and relaying inbound commands to the serial peer.
///
/// Borrows the serial link mutably for the lifetime of the connection: the
/// link is owned exclusively by the single live session.
pub struct BridgeSession<'a> {
    serial: &'a mut dyn SerialLink,
    ids: HandoffSlot<MarkerIdSet>,
    frames: HandoffSlot<CameraFrame>,
    shutdown: Shutdown,
    settings: SessionSettings,
    last_ids: MarkerIdSet,
    last_frame_at: Option<Instant>,
}

impl<'a> BridgeSession<'a> {
    pub fn new(
        serial: &'a mut dyn SerialLink,
        ids: HandoffSlot<MarkerIdSet>,
        frames: HandoffSlot<CameraFrame>,
        shutdown: Shutdown,
        settings: SessionSettings,
    ) -> Self {
        Self {
            serial,
            ids,
            frames,
            shutdown,
            settings,
            last_ids: MarkerIdSet::new(),
            last_frame_at: None,
        }
    }

    /// Run the loop to completion over an accepted WebSocket stream.
    ///
    /// Returns `Ok` on client disconnect and on shutdown — both are normal
    /// terminations, not errors.
    ///
    /// # Errors
    ///
    /// Returns [`ArgusError::Serialization`] only if the fused message cannot
    /// be encoded, which indicates a bug rather than a runtime condition.
    pub async fn run(mut self, ws: WebSocketStream<TcpStream>) -> Result<(), ArgusError> {
        let (mut ws_tx, mut ws_rx) = ws.split();

        loop {
            // 1. Shutdown checkpoint.
            if self.shutdown.is_cancelled() {
                return Ok(());
            }

            // 2. At most one pending serial line; absence is not an error.
            let serial_data = match self.serial.try_read_line() {
                Ok(Some(line)) => line,
                Ok(None) => String::new(),
                Err(e) => {
                    warn!(error = %e, "serial read failed; sending empty telemetry");
                    String::new()
                }
            };

            // 3. Latest detection result, sticky when nothing new arrived.
            if let Some(ids) = self.ids.try_consume() {
                self.last_ids = ids;
            }

            // 4. Fresh message every iteration; never mutated after this.
            let mut message = FusedMessage::new(self.last_ids.clone(), serial_data);
            if self.settings.send_frames && self.frame_due() {
                message.frame = self.encode_latest_frame().await;
            }
            let payload = serde_json::to_string(&message)
                .map_err(|e| ArgusError::Serialization(format!("encode fused message: {e}")))?;

            // 5. Send; a failed send means the client is gone.
            tokio::select! {
                _ = self.shutdown.cancelled() => return Ok(()),
                sent = ws_tx.send(Message::Text(payload.into())) => {
                    if sent.is_err() {
                        debug!("client disconnected during send");
                        return Ok(());
                    }
                }
            }

            // 6. Bounded poll for one inbound command.
            tokio::select! {
                _ = self.shutdown.cancelled() => return Ok(()),
                polled = tokio::time::timeout(self.settings.command_poll, ws_rx.next()) => {
                    match polled {
                        // Window elapsed with nothing pending.
                        Err(_) => {}
                        Ok(Some(Ok(Message::Text(text)))) => {
                            debug!(command = %text.as_str(), "forwarding client command to serial");
                            if let Err(e) = self.serial.write_bytes(text.as_bytes()) {
                                warn!(error = %e, "serial write failed; command dropped");
                            }
                        }
                        Ok(Some(Ok(Message::Close(_)))) | Ok(None) => {
                            debug!("client closed connection");
                            return Ok(());
                        }
                        Ok(Some(Err(e))) => {
                            debug!(error = %e, "client receive error");
                            return Ok(());
                        }
                        // Ping/pong are answered by the protocol layer;
                        // binary frames carry no command semantics.
                        Ok(Some(Ok(_))) => {}
                    }
                }
            }
        }
    }

    fn frame_due(&self) -> bool {
        match self.last_frame_at {
            Some(at) => at.elapsed() >= self.settings.frame_interval,
            None => true,
        }
    }

    /// Consume the latest frame, if any, and encode it off the loop.
    /// Encode failures are absorbed: the message simply goes out frameless.
    async fn encode_latest_frame(&mut self) -> Option<String> {
        let frame = self.frames.try_consume()?;
        let quality = self.settings.jpeg_quality;
        match tokio::task::spawn_blocking(move || encode::encode_frame(&frame, quality)).await {
            Ok(Ok(encoded)) => {
                self.last_frame_at = Some(Instant::now());
                Some(encoded)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "frame encode failed; skipping frame");
                None
            }
            Err(e) => {
                warn!(error = %e, "frame encode task aborted; skipping frame");
                None
            }
        }
    }
}
