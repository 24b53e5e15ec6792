//! [`BridgeServer`] – TCP listener + WebSocket accept loop.
//!
//! Serves exactly one live connection at a time: each accepted socket is
//! upgraded and its [`BridgeSession`] runs to completion before the next
//! accept. A client disconnect ends only that session; the server silently
//! returns to accepting. On shutdown the pending accept is cancelled and the
//! loop exits.

use std::net::SocketAddr;

use argus_hal::camera::CameraFrame;
use argus_hal::serial::SerialLink;
use argus_middleware::{HandoffSlot, Shutdown};
use argus_types::{ArgusError, MarkerIdSet};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tracing::{info, warn};

use crate::session::{BridgeSession, SessionSettings};

/// One-connection-at-a-time WebSocket server for the operator dashboard.
///
/// Owns the serial link for the process lifetime and lends it mutably to the
/// active session, so exclusive ownership during a connection is enforced by
/// the borrow rather than by a lock.
pub struct BridgeServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    serial: Box<dyn SerialLink>,
    ids: HandoffSlot<MarkerIdSet>,
    frames: HandoffSlot<CameraFrame>,
    shutdown: Shutdown,
    settings: SessionSettings,
}

impl BridgeServer {
    /// Bind the listener.
    ///
    /// # Errors
    ///
    /// Returns [`ArgusError::Io`] when the address cannot be bound; the
    /// caller treats this as fatal at startup.
    pub async fn bind(
        address: &str,
        port: u16,
        serial: Box<dyn SerialLink>,
        ids: HandoffSlot<MarkerIdSet>,
        frames: HandoffSlot<CameraFrame>,
        shutdown: Shutdown,
        settings: SessionSettings,
    ) -> Result<Self, ArgusError> {
        let listener = TcpListener::bind((address, port))
            .await
            .map_err(|e| ArgusError::Io(format!("bind {address}:{port}: {e}")))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ArgusError::Io(format!("local addr: {e}")))?;
        Ok(Self {
            listener,
            local_addr,
            serial,
            ids,
            frames,
            shutdown,
            settings,
        })
    }

    /// The bound address (useful when binding port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until shutdown.
    ///
    /// Handshake failures and session errors are logged and absorbed; the
    /// loop always returns to accepting until the token is cancelled.
    pub async fn run(mut self) {
        info!(addr = %self.local_addr, serial = %self.serial.id(), "bridge server listening");

        loop {
            let accepted = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                accepted = self.listener.accept() => accepted,
            };

            let (stream, peer) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            };

            let ws = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                handshake = accept_async(stream) => match handshake {
                    Ok(ws) => ws,
                    Err(e) => {
                        warn!(peer = %peer, error = %e, "websocket handshake failed");
                        continue;
                    }
                },
            };

            info!(peer = %peer, "client connected");
            let session = BridgeSession::new(
                self.serial.as_mut(),
                self.ids.clone(),
                self.frames.clone(),
                self.shutdown.clone(),
                self.settings.clone(),
            );
            match session.run(ws).await {
                Ok(()) => info!(peer = %peer, "session ended"),
                Err(e) => warn!(peer = %peer, error = %e, "session failed"),
            }
        }

        info!("bridge server stopped");
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use argus_hal::sim::LoopbackSerial;
    use argus_types::FusedMessage;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use futures_util::{SinkExt, StreamExt};
    use std::time::Duration;
    use tokio::net::TcpStream;
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

    type ClientStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

    struct Fixture {
        addr: SocketAddr,
        serial: LoopbackSerial,
        ids: HandoffSlot<MarkerIdSet>,
        frames: HandoffSlot<CameraFrame>,
        shutdown: Shutdown,
        task: tokio::task::JoinHandle<()>,
    }

    async fn start(settings: SessionSettings) -> Fixture {
        let serial = LoopbackSerial::new();
        let ids = HandoffSlot::new();
        let frames = HandoffSlot::new();
        let shutdown = Shutdown::new();
        let server = BridgeServer::bind(
            "127.0.0.1",
            0,
            Box::new(serial.clone()),
            ids.clone(),
            frames.clone(),
            shutdown.clone(),
            settings,
        )
        .await
        .unwrap();
        let addr = server.local_addr();
        let task = tokio::spawn(server.run());
        Fixture {
            addr,
            serial,
            ids,
            frames,
            shutdown,
            task,
        }
    }

    async fn connect(addr: SocketAddr) -> ClientStream {
        let (ws, _) = connect_async(format!("ws://{addr}")).await.unwrap();
        ws
    }

    async fn next_text(ws: &mut ClientStream) -> String {
        loop {
            match timeout(Duration::from_secs(2), ws.next())
                .await
                .expect("message within deadline")
                .expect("stream open")
                .expect("no transport error")
            {
                Message::Text(text) => return text.as_str().to_string(),
                _ => continue,
            }
        }
    }

    /// Read until a message satisfies `pred`, with an iteration cap.
    async fn next_matching(ws: &mut ClientStream, pred: impl Fn(&FusedMessage) -> bool) -> FusedMessage {
        for _ in 0..500 {
            let text = next_text(ws).await;
            let msg: FusedMessage = serde_json::from_str(&text).unwrap();
            if pred(&msg) {
                return msg;
            }
        }
        panic!("no matching message within 500 reads");
    }

    async fn stop(fixture: Fixture) {
        fixture.shutdown.cancel();
        timeout(Duration::from_secs(2), fixture.task)
            .await
            .expect("server stops after shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn idle_pipeline_streams_empty_messages() {
        let fixture = start(SessionSettings::default()).await;
        let mut client = connect(fixture.addr).await;

        // No markers, no serial data: the stream still flows at the loop's
        // cadence with an empty payload.
        for _ in 0..3 {
            let text = next_text(&mut client).await;
            assert_eq!(text, r#"{"aruco_ids":[],"serial_data":""}"#);
        }

        stop(fixture).await;
    }

    #[tokio::test]
    async fn fuses_marker_ids_with_serial_line() {
        let fixture = start(SessionSettings::default()).await;
        fixture.ids.publish(vec![3, 7]);
        fixture.serial.feed_line("OK");

        let mut client = connect(fixture.addr).await;
        let msg = next_matching(&mut client, |m| !m.serial_data.is_empty()).await;
        assert_eq!(msg.aruco_ids, vec![3, 7]);
        assert_eq!(msg.serial_data, "OK");

        // The marker set is sticky across iterations; the consumed serial
        // line is not.
        let follow_up = next_matching(&mut client, |m| m.serial_data.is_empty()).await;
        assert_eq!(follow_up.aruco_ids, vec![3, 7]);

        stop(fixture).await;
    }

    #[tokio::test]
    async fn forwards_client_command_verbatim_to_serial() {
        let fixture = start(SessionSettings::default()).await;
        let mut client = connect(fixture.addr).await;

        let _ = next_text(&mut client).await;
        client
            .send(Message::Text("MOVE 10 0".into()))
            .await
            .unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        loop {
            if fixture.serial.written().contains(&b"MOVE 10 0".to_vec()) {
                break;
            }
            assert!(
                std::time::Instant::now() < deadline,
                "command not forwarded in time"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        stop(fixture).await;
    }

    #[tokio::test]
    async fn accepts_a_new_client_after_disconnect() {
        let fixture = start(SessionSettings::default()).await;

        let mut first = connect(fixture.addr).await;
        let _ = next_text(&mut first).await;
        drop(first);

        // The dropped client ends its session without error and the server
        // returns to accepting; the vision side is unaffected.
        let mut second = connect(fixture.addr).await;
        let _ = next_text(&mut second).await;

        fixture.ids.publish(vec![42]);
        let msg = next_matching(&mut second, |m| !m.aruco_ids.is_empty()).await;
        assert_eq!(msg.aruco_ids, vec![42]);

        stop(fixture).await;
    }

    #[tokio::test]
    async fn shutdown_ends_live_session_and_accept_loop() {
        let fixture = start(SessionSettings::default()).await;
        let mut client = connect(fixture.addr).await;
        let _ = next_text(&mut client).await;

        fixture.shutdown.cancel();
        timeout(Duration::from_secs(2), fixture.task)
            .await
            .expect("server stops promptly with a client connected")
            .unwrap();
    }

    #[tokio::test]
    async fn attaches_base64_jpeg_frame_when_enabled() {
        let settings = SessionSettings {
            send_frames: true,
            ..SessionSettings::default()
        };
        let fixture = start(settings).await;
        fixture.frames.publish(CameraFrame {
            width: 8,
            height: 8,
            data: vec![0x20; CameraFrame::expected_len(8, 8)],
        });

        let mut client = connect(fixture.addr).await;
        let msg = next_matching(&mut client, |m| m.frame.is_some()).await;
        let jpeg = STANDARD.decode(msg.frame.unwrap()).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        stop(fixture).await;
    }

    #[tokio::test]
    async fn frames_are_omitted_by_default() {
        let fixture = start(SessionSettings::default()).await;
        fixture.frames.publish(CameraFrame {
            width: 4,
            height: 4,
            data: vec![0u8; CameraFrame::expected_len(4, 4)],
        });

        let mut client = connect(fixture.addr).await;
        for _ in 0..5 {
            let text = next_text(&mut client).await;
            assert!(!text.contains("frame"));
        }

        stop(fixture).await;
    }
}
