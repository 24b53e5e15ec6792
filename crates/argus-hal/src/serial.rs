//! [`SerialLink`] – non-blocking duplex byte stream to the microcontroller,
//! and [`UartLink`], its UART implementation.
//!
//! Reads are line-oriented and never block: a call returns at most one
//! complete line and `None` when no full line has arrived yet. Writes are
//! best-effort; nothing at this layer waits for an acknowledgement.

use std::io::{Read, Write};
use std::time::Duration;

use argus_types::ArgusError;
use tracing::debug;

/// Duplex serial channel owned exclusively by the active bridge session.
pub trait SerialLink: Send {
    /// Stable identifier for this link, e.g. the device path.
    fn id(&self) -> &str;

    /// Return at most one complete line, with surrounding whitespace and the
    /// line terminator trimmed.
    ///
    /// Never blocks: `Ok(None)` means no complete line is pending, which is a
    /// normal condition, not an error.
    fn try_read_line(&mut self) -> Result<Option<String>, ArgusError>;

    /// Write `bytes` verbatim to the peer. Best-effort: the peer never
    /// acknowledges at this layer.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), ArgusError>;
}

// ────────────────────────────────────────────────────────────────────────────
// UART implementation
// ────────────────────────────────────────────────────────────────────────────

/// UART-backed [`SerialLink`] over a fixed device path and baud rate.
///
/// The port is opened with a zero read timeout; incoming bytes accumulate in
/// an internal buffer until a `\n` completes a line.
pub struct UartLink {
    path: String,
    port: Box<dyn serialport::SerialPort>,
    pending: Vec<u8>,
}

impl UartLink {
    /// Open `path` at `baud` in non-blocking read mode.
    ///
    /// # Errors
    ///
    /// Returns [`ArgusError::HardwareFault`] when the device cannot be
    /// opened. The caller treats this as fatal at startup.
    pub fn open(path: &str, baud: u32) -> Result<Self, ArgusError> {
        let port = serialport::new(path, baud)
            .timeout(Duration::ZERO)
            .open()
            .map_err(|e| ArgusError::HardwareFault {
                component: path.to_string(),
                details: e.to_string(),
            })?;
        debug!(path, baud, "serial port opened");
        Ok(Self {
            path: path.to_string(),
            port,
            pending: Vec::new(),
        })
    }
}

impl SerialLink for UartLink {
    fn id(&self) -> &str {
        &self.path
    }

    fn try_read_line(&mut self) -> Result<Option<String>, ArgusError> {
        let available = self
            .port
            .bytes_to_read()
            .map_err(|e| ArgusError::Io(format!("poll {}: {e}", self.path)))?
            as usize;

        if available > 0 {
            let mut chunk = vec![0u8; available];
            match self.port.read(&mut chunk) {
                Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                // Zero-timeout port: nothing arrived between poll and read.
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                Err(e) => return Err(ArgusError::Io(format!("read {}: {e}", self.path))),
            }
        }

        Ok(take_line(&mut self.pending))
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), ArgusError> {
        self.port
            .write_all(bytes)
            .map_err(|e| ArgusError::Io(format!("write {}: {e}", self.path)))
    }
}

/// Extract the oldest complete line from `pending`, leaving any trailing
/// partial line in place.
fn take_line(pending: &mut Vec<u8>) -> Option<String> {
    let pos = pending.iter().position(|&b| b == b'\n')?;
    let line: Vec<u8> = pending.drain(..=pos).collect();
    Some(String::from_utf8_lossy(&line).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_line_stays_buffered() {
        let mut buf = b"V=7.".to_vec();
        assert!(take_line(&mut buf).is_none());
        assert_eq!(buf, b"V=7.");
    }

    #[test]
    fn complete_line_is_extracted_and_trimmed() {
        let mut buf = b"OK\n".to_vec();
        assert_eq!(take_line(&mut buf).as_deref(), Some("OK"));
        assert!(buf.is_empty());
    }

    #[test]
    fn crlf_terminator_is_trimmed() {
        let mut buf = b"T=21.5\r\n".to_vec();
        assert_eq!(take_line(&mut buf).as_deref(), Some("T=21.5"));
    }

    #[test]
    fn oldest_of_two_buffered_lines_comes_first() {
        let mut buf = b"first\nsecond\n".to_vec();
        assert_eq!(take_line(&mut buf).as_deref(), Some("first"));
        assert_eq!(take_line(&mut buf).as_deref(), Some("second"));
        assert!(take_line(&mut buf).is_none());
    }

    #[test]
    fn line_leaves_trailing_partial_intact() {
        let mut buf = b"done\npart".to_vec();
        assert_eq!(take_line(&mut buf).as_deref(), Some("done"));
        assert_eq!(buf, b"part");
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let mut buf = vec![0xff, 0xfe, b'\n'];
        let line = take_line(&mut buf).unwrap();
        assert!(!line.is_empty());
    }
}
