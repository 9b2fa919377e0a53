//! Drive an addressable LED strip from color update messages.
//!
//! [`channel::ColorChannel`] scales incoming colors and hands them to
//! [`driver::StripDriver`], which keeps the frame, paces writes and
//! talks to the hardware through a [`transport::Transport`].

pub mod channel;
pub mod config;
pub mod driver;
pub mod frame_buffer;
pub mod pixel_format;
pub mod protocol;
pub mod server;
pub mod transport;

pub use channel::{ColorChannel, ColorRequest};
pub use config::Config;
pub use driver::{DriverError, DriverState, FlushOutcome, StripDriver};
pub use frame_buffer::{FrameBuffer, Pixel};
pub use transport::{Transport, TransportError};
