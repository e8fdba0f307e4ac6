//! Frame capture and extraction.
//!
//! Two ways of producing a directory of still frames:
//!
//! - [`sampler::capture_animation`] screenshots a live page on an interval and
//!   keeps a frame only when its perceptual hash differs from the last kept one.
//! - [`gif::extract_frames`] writes out every frame of a GIF.
//!
//! Neither knows anything about HTTP; they report failures through [`Error`].

pub mod browser;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod gif;
pub mod sampler;

pub use browser::{BrowserEngine, BrowserLauncher, BrowserSession, WebDriverLauncher};
pub use error::{CaptureError, ConfigurationError, DecodeError, Error, TransferError};
pub use fetch::GifFetcher;
pub use sampler::{capture_animation, CaptureReport, SamplerOptions};
