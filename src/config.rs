use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::pixel_format::PixelFormat;
use crate::protocol;

/// Largest strip the serial controller headers can address (16-bit count - 1)
const MAX_PIXELS: usize = 65536;
const MAX_RESET_US: u64 = 10_000;
const MAX_WRITE_TIMEOUT_MS: u64 = 10_000;
/// Upper bound on how long a flush may wait for the strip
pub const MAX_FRAME_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    pub strip: StripConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        ListenConfig {
            host: "127.0.0.1".to_string(),
            port: 7891,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripConfig {
    /// Device node, e.g. `/dev/spidev0.0` or `/dev/ttyACM0`
    pub device_path: String,
    pub pixel_count: usize,
    /// SPI clock or UART baud rate, depending on the transport
    pub clock_hz: u32,
    #[serde(default)]
    pub transport: TransportKind,
    #[serde(default)]
    pub protocol: ProtocolKind,
    #[serde(default = "default_pixel_format")]
    pub pixel_format: PixelFormat,
    /// Length of the WS2812 reset (latch) pulse
    #[serde(default = "default_reset_us")]
    pub reset_us: u64,
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
    #[serde(default)]
    pub pacing: Pacing,
    /// Overrides the interval derived from the codec and clock
    #[serde(default)]
    pub min_frame_interval_us: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Spi,
    Serial,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolKind {
    #[default]
    Ws2812,
    Adalight,
    Awa,
}

/// What to do with a frame that arrives before the strip can show it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pacing {
    /// Wait out the rest of the interval, then write
    #[default]
    Block,
    /// Keep only the latest frame and write it once the interval has passed
    Coalesce,
}

fn default_pixel_format() -> PixelFormat {
    PixelFormat::Grb
}

fn default_reset_us() -> u64 {
    80
}

fn default_write_timeout_ms() -> u64 {
    1000
}

impl Config {
    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .context(format!("Failed to read config {}", path.display()))?;
        Self::from_json(&data).context(format!("Invalid config {}", path.display()))
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(data)?;
        config.strip.validate()?;
        Ok(config)
    }
}

impl StripConfig {
    pub fn validate(&self) -> Result<()> {
        if self.pixel_count == 0 {
            anyhow::bail!("pixel_count must be at least 1");
        }
        if self.clock_hz == 0 {
            anyhow::bail!("clock_hz must be at least 1");
        }
        if self.pixel_count > MAX_PIXELS {
            anyhow::bail!(
                "pixel_count supports at most {} pixels, got {}",
                MAX_PIXELS,
                self.pixel_count
            );
        }
        if self.reset_us > MAX_RESET_US {
            anyhow::bail!("reset_us must be at most {}, got {}", MAX_RESET_US, self.reset_us);
        }
        if self.write_timeout_ms > MAX_WRITE_TIMEOUT_MS {
            anyhow::bail!(
                "write_timeout_ms must be at most {}, got {}",
                MAX_WRITE_TIMEOUT_MS,
                self.write_timeout_ms
            );
        }

        let interval = self.frame_interval();
        if interval > MAX_FRAME_INTERVAL {
            anyhow::bail!(
                "Minimum frame interval {:?} exceeds {:?}; lower pixel_count or min_frame_interval_us, or raise clock_hz",
                interval,
                MAX_FRAME_INTERVAL
            );
        }
        Ok(())
    }

    /// Interval between frames: the override if set, else derived from codec and clock
    pub fn frame_interval(&self) -> Duration {
        self.min_frame_interval_override().unwrap_or_else(|| {
            let codec = protocol::from_config(self);
            protocol::min_frame_interval(codec.as_ref(), self.pixel_count, self.clock_hz)
        })
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn min_frame_interval_override(&self) -> Option<Duration> {
        self.min_frame_interval_us.map(Duration::from_micros)
    }
}
