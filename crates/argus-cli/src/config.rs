//! Configuration – reads `~/.argus/config.toml` with `ARGUS_*` overrides.

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Persisted controller configuration. Every field has a default, so a
/// missing file or a partial file both yield a runnable setup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Address the WebSocket listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port the WebSocket listener binds to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Serial device path to the microcontroller.
    #[serde(default = "default_serial_path")]
    pub serial_path: String,

    /// Serial baud rate.
    #[serde(default = "default_serial_baud")]
    pub serial_baud: u32,

    /// Camera capture width in pixels.
    #[serde(default = "default_camera_width")]
    pub camera_width: u32,

    /// Camera capture height in pixels.
    #[serde(default = "default_camera_height")]
    pub camera_height: u32,

    /// Per-iteration window (ms) the bridge loop waits for a client command.
    #[serde(default = "default_command_poll_ms")]
    pub command_poll_ms: u64,

    /// Attach base64 JPEG frames to outbound messages.
    #[serde(default)]
    pub send_frames: bool,

    /// Minimum spacing (ms) between two attached frames.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// JPEG quality for attached frames.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8765
}
fn default_serial_path() -> String {
    "/dev/ttyS0".to_string()
}
fn default_serial_baud() -> u32 {
    1_000_000
}
fn default_camera_width() -> u32 {
    640
}
fn default_camera_height() -> u32 {
    480
}
fn default_command_poll_ms() -> u64 {
    1
}
fn default_frame_interval_ms() -> u64 {
    100
}
fn default_jpeg_quality() -> u8 {
    80
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            serial_path: default_serial_path(),
            serial_baud: default_serial_baud(),
            camera_width: default_camera_width(),
            camera_height: default_camera_height(),
            command_poll_ms: default_command_poll_ms(),
            send_frames: false,
            frame_interval_ms: default_frame_interval_ms(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// Return the path to `~/.argus/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
/// Extracted for testability without mutating environment variables.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".argus").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `ARGUS_*` environment variable overrides to `cfg`.
///
/// Supported variables:
///
/// | Variable | Config field |
/// |---|---|
/// | `ARGUS_BIND_ADDRESS` | `bind_address` |
/// | `ARGUS_PORT` | `port` |
/// | `ARGUS_SERIAL_PATH` | `serial_path` |
/// | `ARGUS_SERIAL_BAUD` | `serial_baud` |
/// | `ARGUS_SEND_FRAMES` | `send_frames` (`1`/`true`) |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("ARGUS_BIND_ADDRESS") {
        cfg.bind_address = v;
    }
    if let Ok(v) = std::env::var("ARGUS_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.port = port;
    }
    if let Ok(v) = std::env::var("ARGUS_SERIAL_PATH") {
        cfg.serial_path = v;
    }
    if let Ok(v) = std::env::var("ARGUS_SERIAL_BAUD")
        && let Ok(baud) = v.parse::<u32>()
    {
        cfg.serial_baud = baud;
    }
    if let Ok(v) = std::env::var("ARGUS_SEND_FRAMES") {
        cfg.send_frames = v == "1" || v.eq_ignore_ascii_case("true");
    }
}
