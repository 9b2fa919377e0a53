use crate::frame_buffer::Pixel;
use crate::pixel_format::PixelFormat;

use super::FrameCodec;

/// SPI pattern for a `1` bit: ~0.78us high at 6.4 MHz
const ONE_PATTERN: u8 = 0b1111_1000;
/// SPI pattern for a `0` bit: ~0.31us high at 6.4 MHz
const ZERO_PATTERN: u8 = 0b1100_0000;

/// WS2812 timing generated on the SPI MOSI line.
///
/// Every data bit becomes one SPI byte, so the SPI clock has to run at
/// eight times the 800 kHz LED bit rate. The frame is wrapped in runs of
/// zero bytes long enough to hold the line low for the reset pulse.
pub struct Ws2812 {
    format: PixelFormat,
    reset_bytes: usize,
}

impl Ws2812 {
    pub fn new(format: PixelFormat, reset_us: u64, clock_hz: u32) -> Self {
        // bytes = reset_us * clock_hz / 8 bits / 1e6
        let reset_bytes = reset_us.saturating_mul(u64::from(clock_hz)).div_ceil(8_000_000) as usize;
        Ws2812 {
            format,
            reset_bytes,
        }
    }
}

impl FrameCodec for Ws2812 {
    fn name(&self) -> &'static str {
        "ws2812"
    }

    fn encode(&self, pixels: &[Pixel]) -> Vec<u8> {
        let data = self.format.apply(pixels);
        let mut frame = Vec::with_capacity(data.len() * 8 + 2 * self.reset_bytes);

        frame.resize(self.reset_bytes, 0);
        for byte in data {
            for bit in (0..8).rev() {
                frame.push(if byte & (1 << bit) != 0 {
                    ONE_PATTERN
                } else {
                    ZERO_PATTERN
                });
            }
        }
        frame.resize(frame.len() + self.reset_bytes, 0);

        frame
    }

    fn encoded_len(&self, pixel_count: usize) -> usize {
        pixel_count
            .saturating_mul(self.format.stride() * 8)
            .saturating_add(self.reset_bytes.saturating_mul(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_run_length() {
        // 80us at 6.4 MHz is 512 bits
        let codec = Ws2812::new(PixelFormat::Grb, 80, 6_400_000);
        assert_eq!(codec.reset_bytes, 64);
    }

    #[test]
    fn test_huge_reset_does_not_overflow() {
        let codec = Ws2812::new(PixelFormat::Grb, 10_000_000_000_000, u32::MAX);
        assert_eq!(codec.reset_bytes, (u64::MAX.div_ceil(8_000_000)) as usize);
    }

    #[test]
    fn test_encodes_msb_first_in_grb_order() {
        let codec = Ws2812::new(PixelFormat::Grb, 0, 6_400_000);
        let frame = codec.encode(&[Pixel::new(0, 0x80, 0x01)]);

        assert_eq!(frame.len(), 24);
        // green first, top bit set
        assert_eq!(frame[0], ONE_PATTERN);
        assert!(frame[1..8].iter().all(|b| *b == ZERO_PATTERN));
        // red all zero
        assert!(frame[8..16].iter().all(|b| *b == ZERO_PATTERN));
        // blue, only the lowest bit set
        assert!(frame[16..23].iter().all(|b| *b == ZERO_PATTERN));
        assert_eq!(frame[23], ONE_PATTERN);
    }

    #[test]
    fn test_frame_is_wrapped_in_reset_runs() {
        let codec = Ws2812::new(PixelFormat::Grb, 80, 6_400_000);
        let frame = codec.encode(&[Pixel::new(255, 255, 255); 2]);

        assert_eq!(frame.len(), codec.encoded_len(2));
        assert!(frame[..64].iter().all(|b| *b == 0));
        assert!(frame[64..64 + 48].iter().all(|b| *b == ONE_PATTERN));
        assert!(frame[64 + 48..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_rgbw_strip_uses_32_bits_per_pixel() {
        let codec = Ws2812::new(PixelFormat::Grbw, 0, 6_400_000);
        assert_eq!(codec.encode(&[Pixel::new(1, 2, 3)]).len(), 32);
        assert_eq!(codec.encoded_len(1), 32);
    }
}
