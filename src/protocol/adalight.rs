use crate::frame_buffer::Pixel;
use crate::pixel_format::PixelFormat;

use super::{controller_header, FrameCodec};

/// Adalight serial framing: 'Ada' + LED count high + LED count low + checksum
pub struct Adalight {
    format: PixelFormat,
}

impl Adalight {
    pub fn new(format: PixelFormat) -> Self {
        Adalight { format }
    }
}

impl FrameCodec for Adalight {
    fn name(&self) -> &'static str {
        "adalight"
    }

    fn encode(&self, pixels: &[Pixel]) -> Vec<u8> {
        let data = self.format.apply(pixels);
        let mut frame = Vec::with_capacity(6 + data.len());

        frame.extend_from_slice(&controller_header(b"Ada", pixels.len()));
        frame.extend_from_slice(&data);

        frame
    }

    fn encoded_len(&self, pixel_count: usize) -> usize {
        6 + pixel_count * self.format.stride()
    }

    fn wire_bits_per_byte(&self) -> u32 {
        10
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adalight_frame() {
        let codec = Adalight::new(PixelFormat::Rgb);
        let frame = codec.encode(&[Pixel::new(255, 0, 0), Pixel::new(0, 0, 255)]);

        assert_eq!(&frame[..3], b"Ada");
        assert_eq!(frame[3], 0);
        assert_eq!(frame[4], 1);
        assert_eq!(frame[5], 1 ^ 0x55);
        assert_eq!(&frame[6..], &[255, 0, 0, 0, 0, 255]);
        assert_eq!(frame.len(), codec.encoded_len(2));
    }
}
