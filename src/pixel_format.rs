use serde::{Deserialize, Serialize};

use crate::frame_buffer::Pixel;

/// Channel order the strip expects on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum PixelFormat {
    #[serde(rename = "RGB")]
    Rgb,
    #[serde(rename = "GRB")]
    Grb,
    #[serde(rename = "BGR")]
    Bgr,
    #[serde(rename = "RGBW")]
    Rgbw,
    #[serde(rename = "GRBW")]
    Grbw,
}

impl PixelFormat {
    /// Bytes per pixel after transformation
    pub fn stride(self) -> usize {
        match self {
            PixelFormat::Rgbw | PixelFormat::Grbw => 4,
            _ => 3,
        }
    }

    /// Flatten pixels into wire channel order
    pub fn apply(self, pixels: &[Pixel]) -> Vec<u8> {
        let mut data = Vec::with_capacity(pixels.len() * 3);
        for p in pixels {
            data.extend_from_slice(&[p.r, p.g, p.b]);
        }

        match self {
            PixelFormat::Rgb => data,
            PixelFormat::Grb => transform_grb(data),
            PixelFormat::Bgr => transform_bgr(data),
            PixelFormat::Rgbw => transform_rgbw(data),
            PixelFormat::Grbw => transform_grbw(data),
        }
    }
}

/// Swap R and G channels in-place
fn transform_grb(mut data: Vec<u8>) -> Vec<u8> {
    for px in data.chunks_exact_mut(3) {
        px.swap(0, 1);
    }
    data
}

/// Swap R and B channels in-place
fn transform_bgr(mut data: Vec<u8>) -> Vec<u8> {
    for px in data.chunks_exact_mut(3) {
        px.swap(0, 2);
    }
    data
}

/// Extract white as the minimum of RGB and subtract it from the color channels
fn split_white(px: &[u8]) -> (u8, u8, u8, u8) {
    let (r, g, b) = (px[0], px[1], px[2]);
    let w = r.min(g).min(b);
    (r - w, g - w, b - w, w)
}

fn transform_rgbw(data: Vec<u8>) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len() / 3 * 4);
    for px in data.chunks_exact(3) {
        let (r, g, b, w) = split_white(px);
        result.extend_from_slice(&[r, g, b, w]);
    }
    result
}

fn transform_grbw(data: Vec<u8>) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len() / 3 * 4);
    for px in data.chunks_exact(3) {
        let (r, g, b, w) = split_white(px);
        result.extend_from_slice(&[g, r, b, w]);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Pixel = Pixel { r: 255, g: 0, b: 0 };

    #[test]
    fn test_rgb_passthrough() {
        let pixels = [RED, Pixel { r: 0, g: 255, b: 0 }, Pixel { r: 0, g: 0, b: 255 }];
        let result = PixelFormat::Rgb.apply(&pixels);
        assert_eq!(result, vec![255, 0, 0, 0, 255, 0, 0, 0, 255]);
    }

    #[test]
    fn test_grb_transform() {
        let result = PixelFormat::Grb.apply(&[RED]);
        assert_eq!(&result[..], &[0, 255, 0]);
    }

    #[test]
    fn test_bgr_transform() {
        let result = PixelFormat::Bgr.apply(&[RED]);
        assert_eq!(&result[..], &[0, 0, 255]);
    }

    #[test]
    fn test_rgbw_transform() {
        let result = PixelFormat::Rgbw.apply(&[Pixel { r: 255, g: 255, b: 255 }]);
        assert_eq!(&result[..], &[0, 0, 0, 255]);

        let result = PixelFormat::Rgbw.apply(&[Pixel { r: 255, g: 128, b: 128 }]);
        assert_eq!(&result[..], &[127, 0, 0, 128]);
    }

    #[test]
    fn test_grbw_transform() {
        let result = PixelFormat::Grbw.apply(&[Pixel { r: 255, g: 255, b: 255 }]);
        assert_eq!(&result[..], &[0, 0, 0, 255]);

        let result = PixelFormat::Grbw.apply(&[RED]);
        assert_eq!(&result[..], &[0, 255, 0, 0]);
    }

    #[test]
    fn test_stride() {
        assert_eq!(PixelFormat::Grb.stride(), 3);
        assert_eq!(PixelFormat::Grbw.stride(), 4);
    }
}
