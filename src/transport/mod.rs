//! Byte sinks that carry an encoded frame to the strip.

use thiserror::Error;

use crate::config::{StripConfig, TransportKind};

mod serial;
mod spi;

pub use serial::SerialTransport;
pub use spi::SpiTransport;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[cfg(feature = "pi")]
    #[error("SPI error: {0}")]
    Spi(#[from] rppal::spi::Error),

    #[error("Transport is not open")]
    NotOpen,

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// The physical channel to the strip.
///
/// `handshake` acquires and configures the device; it is released when the
/// transport is dropped.
pub trait Transport {
    fn handshake(&mut self) -> Result<(), TransportError>;

    /// Blocking write of a whole frame, bounded by the transport's timeout
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Human readable device name for logs
    fn describe(&self) -> String;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn handshake(&mut self) -> Result<(), TransportError> {
        (**self).handshake()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(bytes)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn handshake(&mut self) -> Result<(), TransportError> {
        (**self).handshake()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(bytes)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Build the (not yet opened) transport named by the strip configuration
pub fn from_config(config: &StripConfig) -> Box<dyn Transport> {
    match config.transport {
        TransportKind::Spi => Box::new(SpiTransport::new(&config.device_path, config.clock_hz)),
        TransportKind::Serial => Box::new(SerialTransport::new(
            &config.device_path,
            config.clock_hz,
            config.write_timeout(),
        )),
    }
}
