use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::driver::{DriverError, StripDriver};
use crate::frame_buffer::Pixel;
use crate::transport::Transport;

/// One inbound color update
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ColorRequest {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    /// Brightness factor, 0.0 (off) to 1.0 (full)
    pub alpha: f32,
}

/// Scale a color by `alpha`, rounding each channel to the nearest step.
///
/// Alpha outside 0.0-1.0 is clamped; NaN and infinities are rejected.
pub fn scale_color(red: u8, green: u8, blue: u8, alpha: f32) -> Result<Pixel, DriverError> {
    if !alpha.is_finite() {
        return Err(DriverError::InvalidAlpha(alpha));
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let scale = |value: u8| (f32::from(value) * alpha).round().clamp(0.0, 255.0) as u8;
    Ok(Pixel::new(scale(red), scale(green), scale(blue)))
}

/// Adapts color events from the application into strip driver calls.
///
/// Every failure is logged and handed back as a value; a bad event never
/// takes the listener down.
pub struct ColorChannel<T: Transport> {
    driver: StripDriver<T>,
    received: u64,
    rejected: u64,
}

impl<T: Transport> ColorChannel<T> {
    pub fn new(driver: StripDriver<T>) -> Self {
        ColorChannel {
            driver,
            received: 0,
            rejected: 0,
        }
    }

    pub fn on_update(&mut self, red: u8, green: u8, blue: u8, alpha: f32) -> Result<Pixel, DriverError> {
        self.received += 1;
        debug!("Received color: R={}, G={}, B={}, A={}", red, green, blue, alpha);

        let result = scale_color(red, green, blue, alpha).and_then(|pixel| {
            self.driver
                .set_color(pixel.r.into(), pixel.g.into(), pixel.b.into())
                .map(|_| pixel)
        });

        if let Err(e) = &result {
            self.rejected += 1;
            warn!("Dropped color update ({}, {}, {}, {}): {}", red, green, blue, alpha, e);
        }

        result
    }

    pub fn receive(&mut self, request: ColorRequest) -> Result<Pixel, DriverError> {
        self.on_update(request.red, request.green, request.blue, request.alpha)
    }

    pub fn updates_received(&self) -> u64 {
        self.received
    }

    pub fn updates_rejected(&self) -> u64 {
        self.rejected
    }

    pub fn driver(&self) -> &StripDriver<T> {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut StripDriver<T> {
        &mut self.driver
    }

    pub fn into_driver(self) -> StripDriver<T> {
        self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_rounds_half_up() {
        assert_eq!(scale_color(255, 128, 0, 0.5).unwrap(), Pixel::new(128, 64, 0));
        assert_eq!(scale_color(3, 1, 0, 0.5).unwrap(), Pixel::new(2, 1, 0));
    }

    #[test]
    fn test_scale_extremes() {
        assert_eq!(scale_color(255, 255, 255, 1.0).unwrap(), Pixel::new(255, 255, 255));
        assert_eq!(scale_color(255, 255, 255, 0.0).unwrap(), Pixel::new(0, 0, 0));
    }

    #[test]
    fn test_scale_clamps_alpha() {
        assert_eq!(scale_color(100, 50, 25, 2.0).unwrap(), Pixel::new(100, 50, 25));
        assert_eq!(scale_color(100, 50, 25, -1.0).unwrap(), Pixel::new(0, 0, 0));
    }

    #[test]
    fn test_scale_rejects_nan() {
        assert!(matches!(scale_color(1, 2, 3, f32::NAN), Err(DriverError::InvalidAlpha(_))));
        assert!(matches!(
            scale_color(1, 2, 3, f32::INFINITY),
            Err(DriverError::InvalidAlpha(_))
        ));
    }

    #[test]
    fn test_request_from_json() {
        let request: ColorRequest =
            serde_json::from_str(r#"{"red": 255, "green": 128, "blue": 0, "alpha": 0.5}"#).unwrap();
        assert_eq!(
            request,
            ColorRequest {
                red: 255,
                green: 128,
                blue: 0,
                alpha: 0.5
            }
        );

        assert!(serde_json::from_str::<ColorRequest>(r#"{"red": 300, "green": 0, "blue": 0, "alpha": 1}"#).is_err());
        assert!(serde_json::from_str::<ColorRequest>(r#"{"red": 1, "green": 0, "blue": 0}"#).is_err());
    }
}
