use rgb::RGB8;

use crate::protocol::FrameCodec;

/// One addressable LED
pub type Pixel = RGB8;

pub const BLACK: Pixel = Pixel { r: 0, g: 0, b: 0 };

/// In-memory frame, one entry per pixel on the strip.
///
/// The length is fixed at construction. Wire encoding is left to a
/// [`FrameCodec`] so the buffer knows nothing about the hardware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: Vec<Pixel>,
}

impl FrameBuffer {
    pub fn new(pixel_count: usize) -> Self {
        FrameBuffer {
            pixels: vec![BLACK; pixel_count],
        }
    }

    pub fn set_all(&mut self, pixel: Pixel) {
        self.pixels.fill(pixel);
    }

    pub fn clear(&mut self) {
        self.set_all(BLACK);
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// True when every pixel is off
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|p| *p == BLACK)
    }

    /// Produce the transport-ready bytes for this frame
    pub fn encode(&self, codec: &dyn FrameCodec) -> Vec<u8> {
        codec.encode(&self.pixels)
    }
}
