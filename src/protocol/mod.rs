//! Wire encodings for a full frame.
//!
//! Each codec owns the channel order and any preamble, postamble or
//! checksum its hardware needs.

use std::time::Duration;

use crate::config::{ProtocolKind, StripConfig};
use crate::frame_buffer::Pixel;

mod adalight;
mod awa;
mod ws2812;

pub use adalight::Adalight;
pub use awa::Awa;
pub use ws2812::Ws2812;

pub trait FrameCodec: Send {
    fn name(&self) -> &'static str;

    fn encode(&self, pixels: &[Pixel]) -> Vec<u8>;

    /// Encoded size of a frame with `pixel_count` pixels
    fn encoded_len(&self, pixel_count: usize) -> usize;

    /// Line bits spent per payload byte (8 on SPI, 10 on an 8N1 UART)
    fn wire_bits_per_byte(&self) -> u32 {
        8
    }

    /// Extra settle time after the last byte before the next frame may start
    fn latch_time(&self) -> Duration {
        Duration::ZERO
    }
}

/// Build the codec named by the strip configuration
pub fn from_config(config: &StripConfig) -> Box<dyn FrameCodec> {
    match config.protocol {
        ProtocolKind::Ws2812 => Box::new(Ws2812::new(
            config.pixel_format,
            config.reset_us,
            config.clock_hz,
        )),
        ProtocolKind::Adalight => Box::new(Adalight::new(config.pixel_format)),
        ProtocolKind::Awa => Box::new(Awa::new(config.pixel_format)),
    }
}

/// Shortest time the strip needs to take in one frame at `clock_hz`
pub fn min_frame_interval(codec: &dyn FrameCodec, pixel_count: usize, clock_hz: u32) -> Duration {
    let bits = codec.encoded_len(pixel_count) as u128 * u128::from(codec.wire_bits_per_byte());
    let nanos = bits * 1_000_000_000 / u128::from(clock_hz.max(1));
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)).saturating_add(codec.latch_time())
}

/// Serial controller header: magic, LED count - 1 (big-endian), checksum
fn controller_header(magic: &[u8; 3], led_count: usize) -> [u8; 6] {
    let last = led_count.saturating_sub(1);
    let count_hi = (last >> 8) as u8;
    let count_lo = last as u8;
    let checksum = count_hi ^ count_lo ^ 0x55;
    [magic[0], magic[1], magic[2], count_hi, count_lo, checksum]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_format::PixelFormat;

    #[test]
    fn test_ws2812_interval_is_thirty_us_per_pixel_plus_reset() {
        let codec = Ws2812::new(PixelFormat::Grb, 80, 6_400_000);
        let interval = min_frame_interval(&codec, 10, 6_400_000);
        // 10 * 30us of data, 80us reset before and after
        assert_eq!(interval, Duration::from_micros(300 + 160));
    }

    #[test]
    fn test_serial_interval_counts_start_and_stop_bits() {
        let codec = Adalight::new(PixelFormat::Rgb);
        // 6 header + 3 data bytes, 10 bits each, at 90 baud
        let interval = min_frame_interval(&codec, 1, 90);
        assert_eq!(interval, Duration::from_secs(1));
    }

    #[test]
    fn test_controller_header() {
        assert_eq!(controller_header(b"Ada", 1), [b'A', b'd', b'a', 0, 0, 0x55]);
        assert_eq!(controller_header(b"Awa", 300), [b'A', b'w', b'a', 0x01, 0x2B, 0x01 ^ 0x2B ^ 0x55]);
    }
}
