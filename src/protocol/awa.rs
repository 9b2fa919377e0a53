use crate::frame_buffer::Pixel;
use crate::pixel_format::PixelFormat;

use super::{controller_header, FrameCodec};

/// AWA framing (HyperSerialPico / HyperSerialESP32)
pub struct Awa {
    format: PixelFormat,
}

impl Awa {
    pub fn new(format: PixelFormat) -> Self {
        Awa { format }
    }
}

/// Fletcher checksums as computed by the HyperSerial firmware
fn fletcher(data: &[u8]) -> [u8; 3] {
    let mut fletcher1: u16 = 0;
    let mut fletcher2: u16 = 0;
    let mut fletcher_ext: u16 = 0;

    for (position, &byte) in data.iter().enumerate() {
        fletcher1 = (fletcher1 + u16::from(byte)) % 255;
        fletcher2 = (fletcher2 + fletcher1) % 255;
        fletcher_ext = (fletcher_ext + (u16::from(byte) ^ (position as u16))) % 255;
    }

    // 0x41 would look like the start of a new 'Awa' header
    if fletcher_ext == 0x41 {
        fletcher_ext = 0xaa;
    }

    [fletcher1 as u8, fletcher2 as u8, fletcher_ext as u8]
}

impl FrameCodec for Awa {
    fn name(&self) -> &'static str {
        "awa"
    }

    fn encode(&self, pixels: &[Pixel]) -> Vec<u8> {
        let data = self.format.apply(pixels);
        let mut frame = Vec::with_capacity(6 + data.len() + 3);

        frame.extend_from_slice(&controller_header(b"Awa", pixels.len()));
        frame.extend_from_slice(&data);
        frame.extend_from_slice(&fletcher(&data));

        frame
    }

    fn encoded_len(&self, pixel_count: usize) -> usize {
        6 + pixel_count * self.format.stride() + 3
    }

    fn wire_bits_per_byte(&self) -> u32 {
        10
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_awa_frame_layout() {
        let codec = Awa::new(PixelFormat::Rgb);
        let frame = codec.encode(&[Pixel::new(1, 2, 3)]);

        assert_eq!(&frame[..6], &[b'A', b'w', b'a', 0, 0, 0x55]);
        assert_eq!(&frame[6..9], &[1, 2, 3]);
        // f1: 1, 3, 6  f2: 1, 4, 10  ext: 1^0 + 2^1 + 3^2 = 1 + 3 + 1
        assert_eq!(&frame[9..], &[6, 10, 5]);
        assert_eq!(frame.len(), codec.encoded_len(1));
    }

    #[test]
    fn test_fletcher_ext_never_emits_header_byte() {
        // ext sum of a single 0x41 byte at position 0 is 0x41
        assert_eq!(fletcher(&[0x41])[2], 0xaa);
    }

    #[test]
    fn test_black_frame_checksums_are_zero() {
        let codec = Awa::new(PixelFormat::Grb);
        let frame = codec.encode(&[Pixel::new(0, 0, 0); 4]);
        // ext reduces to the sum of positions 0..12
        assert_eq!(&frame[frame.len() - 3..], &[0, 0, 66]);
    }
}
