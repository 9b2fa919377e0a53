use log::debug;

#[cfg(feature = "pi")]
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

use super::{Transport, TransportError};

/// Linux spidev on a Raspberry Pi, MOSI wired to the strip's data input
pub struct SpiTransport {
    device_path: String,
    clock_hz: u32,
    #[cfg(feature = "pi")]
    spi: Option<Spi>,
}

impl SpiTransport {
    pub fn new(device_path: &str, clock_hz: u32) -> Self {
        SpiTransport {
            device_path: device_path.to_string(),
            clock_hz,
            #[cfg(feature = "pi")]
            spi: None,
        }
    }
}

/// Split `/dev/spidevB.S` into bus and chip-select numbers
fn parse_device_path(path: &str) -> Option<(u8, u8)> {
    let name = path.rsplit('/').next()?;
    let (bus, slave) = name.strip_prefix("spidev")?.split_once('.')?;
    Some((bus.parse().ok()?, slave.parse().ok()?))
}

#[cfg(feature = "pi")]
fn open_spi(bus: u8, slave: u8, clock_hz: u32) -> Result<Spi, TransportError> {
    let bus = match bus {
        0 => Bus::Spi0,
        1 => Bus::Spi1,
        2 => Bus::Spi2,
        3 => Bus::Spi3,
        4 => Bus::Spi4,
        5 => Bus::Spi5,
        6 => Bus::Spi6,
        other => {
            return Err(TransportError::Unsupported(format!("SPI bus {}", other)));
        }
    };
    let slave = match slave {
        0 => SlaveSelect::Ss0,
        1 => SlaveSelect::Ss1,
        2 => SlaveSelect::Ss2,
        other => {
            return Err(TransportError::Unsupported(format!("SPI chip select {}", other)));
        }
    };
    Ok(Spi::new(bus, slave, clock_hz, Mode::Mode0)?)
}

impl Transport for SpiTransport {
    fn handshake(&mut self) -> Result<(), TransportError> {
        let (bus, slave) = parse_device_path(&self.device_path).ok_or_else(|| {
            TransportError::Unsupported(format!("not a spidev path: {}", self.device_path))
        })?;

        #[cfg(feature = "pi")]
        {
            self.spi = Some(open_spi(bus, slave, self.clock_hz)?);
            debug!("Opened {} (bus {}, cs {}) at {} Hz", self.device_path, bus, slave, self.clock_hz);
            Ok(())
        }

        #[cfg(not(feature = "pi"))]
        {
            debug!("Cannot open bus {} cs {}: no SPI support", bus, slave);
            Err(TransportError::Unsupported(
                "built without the `pi` feature".to_string(),
            ))
        }
    }

    fn write(&mut self, #[allow(unused_variables)] bytes: &[u8]) -> Result<(), TransportError> {
        #[cfg(feature = "pi")]
        {
            let spi = self.spi.as_mut().ok_or(TransportError::NotOpen)?;
            let written = spi.write(bytes)?;
            if written != bytes.len() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    format!("short SPI write: {} of {} bytes", written, bytes.len()),
                )
                .into());
            }
            Ok(())
        }

        #[cfg(not(feature = "pi"))]
        {
            Err(TransportError::NotOpen)
        }
    }

    fn describe(&self) -> String {
        format!("{} @ {} Hz", self.device_path, self.clock_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device_path() {
        assert_eq!(parse_device_path("/dev/spidev0.0"), Some((0, 0)));
        assert_eq!(parse_device_path("/dev/spidev1.2"), Some((1, 2)));
        assert_eq!(parse_device_path("spidev3.1"), Some((3, 1)));
    }

    #[test]
    fn test_parse_rejects_other_devices() {
        assert_eq!(parse_device_path("/dev/ttyUSB0"), None);
        assert_eq!(parse_device_path("/dev/spidev0"), None);
        assert_eq!(parse_device_path("/dev/spidevA.0"), None);
    }

    #[test]
    fn test_handshake_rejects_non_spidev_path() {
        let mut transport = SpiTransport::new("/dev/ttyUSB0", 6_400_000);
        assert!(matches!(
            transport.handshake(),
            Err(TransportError::Unsupported(_))
        ));
    }

    #[cfg(not(feature = "pi"))]
    #[test]
    fn test_handshake_without_pi_feature_names_the_feature() {
        let mut transport = SpiTransport::new("/dev/spidev0.0", 6_400_000);
        match transport.handshake() {
            Err(TransportError::Unsupported(reason)) => assert!(reason.contains("`pi` feature")),
            other => panic!("expected Unsupported, got {:?}", other),
        }
    }

    #[test]
    fn test_write_before_handshake_fails() {
        let mut transport = SpiTransport::new("/dev/spidev0.0", 6_400_000);
        assert!(matches!(transport.write(&[0; 4]), Err(TransportError::NotOpen)));
    }
}
