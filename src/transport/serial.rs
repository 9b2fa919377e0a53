use log::{debug, warn};
use serialport::SerialPort;
use std::io::Write;
use std::thread;
use std::time::Duration;

use super::{Transport, TransportError};

/// USB/UART attached LED controller (Adalight or AWA firmware)
pub struct SerialTransport {
    path: String,
    baud_rate: u32,
    timeout: Duration,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    pub fn new(path: &str, baud_rate: u32, timeout: Duration) -> Self {
        SerialTransport {
            path: path.to_string(),
            baud_rate,
            timeout,
            port: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }
}

impl Transport for SerialTransport {
    fn handshake(&mut self) -> Result<(), TransportError> {
        let mut port = serialport::new(&self.path, self.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(self.timeout)
            .open()?;

        // Controllers based on pyserial expect DTR asserted
        if let Err(e) = port.write_data_terminal_ready(true) {
            warn!("Failed to set DTR on {}: {}", self.path, e);
        }

        // Allow device to initialize
        thread::sleep(Duration::from_millis(100));

        debug!("Opened {} at {} baud", self.path, self.baud_rate);
        self.port = Some(port);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::NotOpen)?;
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} @ {} baud", self.path, self.baud_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_before_handshake_fails() {
        let mut transport = SerialTransport::new("/dev/null-serial", 115200, Duration::from_millis(10));
        assert!(!transport.is_open());
        assert!(matches!(transport.write(&[1, 2, 3]), Err(TransportError::NotOpen)));
    }

    #[test]
    fn test_handshake_on_missing_device_fails() {
        let mut transport =
            SerialTransport::new("/dev/does-not-exist-ledstrip", 115200, Duration::from_millis(10));
        assert!(transport.handshake().is_err());
        assert!(!transport.is_open());
    }
}
