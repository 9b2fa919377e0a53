use log::{debug, error, info, log_enabled, trace, warn, Level};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::{Pacing, StripConfig, MAX_FRAME_INTERVAL};
use crate::frame_buffer::{FrameBuffer, Pixel};
use crate::protocol::{self, FrameCodec};
use crate::transport::{Transport, TransportError};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Invalid {channel} value {value} (expected 0-255)")]
    InvalidColor { channel: &'static str, value: i32 },

    #[error("Invalid alpha {0} (expected a number in 0.0-1.0)")]
    InvalidAlpha(f32),

    #[error("Strip is not ready: transport handshake has not succeeded")]
    NotReady,

    #[error("Strip driver is closed")]
    DriverClosed,

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Uninitialized,
    Ready,
    Closed,
}

/// Result of a successful flush request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// The frame went out on the transport
    Written,
    /// Too soon after the previous frame; held back for [`StripDriver::service`]
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverOptions {
    pub min_frame_interval: Duration,
    pub pacing: Pacing,
}

/// Drives one addressable LED strip through a [`Transport`].
///
/// `T` may be an owned transport or a `&mut` borrow of one; in the latter
/// case the caller keeps the transport's lifecycle. Dropping the driver
/// blanks the strip.
pub struct StripDriver<T: Transport> {
    transport: T,
    codec: Box<dyn FrameCodec>,
    buffer: FrameBuffer,
    state: DriverState,
    options: DriverOptions,
    last_write: Option<Instant>,
    pending: bool,
    frames_written: u64,
}

impl<T: Transport> StripDriver<T> {
    pub fn new(
        transport: T,
        codec: Box<dyn FrameCodec>,
        pixel_count: usize,
        options: DriverOptions,
    ) -> Self {
        StripDriver {
            transport,
            codec,
            buffer: FrameBuffer::new(pixel_count),
            state: DriverState::Uninitialized,
            options,
            last_write: None,
            pending: false,
            frames_written: 0,
        }
    }

    /// Build a driver with the codec and frame interval described by `config`
    pub fn from_config(transport: T, config: &StripConfig) -> Self {
        let codec = protocol::from_config(config);
        let options = DriverOptions {
            min_frame_interval: config.frame_interval().min(MAX_FRAME_INTERVAL),
            pacing: config.pacing,
        };
        Self::new(transport, codec, config.pixel_count, options)
    }

    /// Handshake with the transport and blank the strip.
    ///
    /// On failure the driver stays `Uninitialized`; callers log and keep
    /// running without LED output.
    pub fn initialize(&mut self) -> Result<(), DriverError> {
        match self.state {
            DriverState::Closed => return Err(DriverError::DriverClosed),
            DriverState::Ready => return Ok(()),
            DriverState::Uninitialized => {}
        }

        if let Err(e) = self.transport.handshake() {
            error!(
                "Failed to initialize strip on {}: {}. LED output disabled.",
                self.transport.describe(),
                e
            );
            return Err(e.into());
        }

        self.state = DriverState::Ready;
        info!(
            "Strip ready on {} ({} pixels, {} codec, min frame interval {:?})",
            self.transport.describe(),
            self.buffer.len(),
            self.codec.name(),
            self.options.min_frame_interval
        );

        // Hardware may still show whatever the last process left on it
        if let Err(e) = self.clear() {
            warn!("Failed to clear strip after initialization: {}", e);
        }

        Ok(())
    }

    /// Fill the strip with one color given as wire-width channel values
    pub fn set_color(&mut self, r: i32, g: i32, b: i32) -> Result<FlushOutcome, DriverError> {
        self.ensure_ready()?;
        let pixel = Pixel::new(
            channel_value("red", r)?,
            channel_value("green", g)?,
            channel_value("blue", b)?,
        );
        self.set_pixel(pixel)
    }

    pub fn set_pixel(&mut self, pixel: Pixel) -> Result<FlushOutcome, DriverError> {
        self.ensure_ready()?;
        self.buffer.set_all(pixel);
        self.flush()
    }

    pub fn clear(&mut self) -> Result<FlushOutcome, DriverError> {
        self.set_color(0, 0, 0)
    }

    /// Encode the buffer and send it, respecting the minimum frame interval.
    ///
    /// A failed write leaves the buffer untouched so the next flush sends the
    /// latest requested frame.
    pub fn flush(&mut self) -> Result<FlushOutcome, DriverError> {
        self.ensure_ready()?;

        let wait = self.remaining_interval();
        if !wait.is_zero() {
            match self.options.pacing {
                Pacing::Block => thread::sleep(wait),
                Pacing::Coalesce => {
                    trace!("Frame deferred, strip busy for another {:?}", wait);
                    self.pending = true;
                    return Ok(FlushOutcome::Deferred);
                }
            }
        }

        self.write_frame()?;
        Ok(FlushOutcome::Written)
    }

    /// Send a deferred frame once the strip can take it.
    ///
    /// Returns `Ok(None)` when there is nothing to do yet.
    pub fn service(&mut self) -> Result<Option<FlushOutcome>, DriverError> {
        if self.state != DriverState::Ready || !self.pending {
            return Ok(None);
        }
        if !self.remaining_interval().is_zero() {
            return Ok(None);
        }

        self.write_frame()?;
        Ok(Some(FlushOutcome::Written))
    }

    /// Blank the strip and stop accepting requests.
    ///
    /// The blank frame is best effort: a failure is logged, never retried.
    pub fn close(&mut self) {
        if self.state == DriverState::Closed {
            return;
        }

        self.buffer.clear();
        thread::sleep(self.remaining_interval());

        match self.write_frame() {
            Ok(()) => debug!("Strip on {} blanked", self.transport.describe()),
            Err(e) => warn!("Could not blank strip on shutdown: {}", e),
        }

        self.state = DriverState::Closed;
        info!("Strip driver on {} closed", self.transport.describe());
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn pixel_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn min_frame_interval(&self) -> Duration {
        self.options.min_frame_interval
    }

    /// True while a coalesced frame is waiting to be written
    pub fn has_pending_frame(&self) -> bool {
        self.pending
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn ensure_ready(&self) -> Result<(), DriverError> {
        match self.state {
            DriverState::Ready => Ok(()),
            DriverState::Uninitialized => Err(DriverError::NotReady),
            DriverState::Closed => Err(DriverError::DriverClosed),
        }
    }

    fn remaining_interval(&self) -> Duration {
        match self.last_write {
            Some(at) => self.options.min_frame_interval.saturating_sub(at.elapsed()),
            None => Duration::ZERO,
        }
    }

    fn write_frame(&mut self) -> Result<(), TransportError> {
        let frame = self.buffer.encode(self.codec.as_ref());

        if log_enabled!(Level::Trace) {
            let hex: String = frame
                .iter()
                .take(30)
                .map(|b| format!("{:02x}", b))
                .collect::<Vec<_>>()
                .join(" ");
            trace!(
                "Sending {} bytes to {}: {}",
                frame.len(),
                self.transport.describe(),
                hex
            );
        }

        let result = self.transport.write(&frame);
        self.last_write = Some(Instant::now());
        self.pending = false;

        match result {
            Ok(()) => {
                self.frames_written += 1;
                Ok(())
            }
            Err(e) => {
                error!("Failed to write frame to {}: {}", self.transport.describe(), e);
                Err(e)
            }
        }
    }
}

impl<T: Transport> Drop for StripDriver<T> {
    fn drop(&mut self) {
        self.close();
    }
}

fn channel_value(channel: &'static str, value: i32) -> Result<u8, DriverError> {
    u8::try_from(value).map_err(|_| DriverError::InvalidColor { channel, value })
}
