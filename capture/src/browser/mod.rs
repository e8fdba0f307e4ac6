//! Browser automation boundary.
//!
//! The sampler only needs four things from a browser: start a session, load a
//! page, take a screenshot, and shut down. [`BrowserLauncher`] and
//! [`BrowserSession`] capture exactly that so the sampling loop can be driven
//! by a real WebDriver backend or by a scripted fake in tests.

mod guard;
mod webdriver;

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use crate::error::{BrowserError, ConfigurationError};

pub use guard::SessionGuard;
pub use webdriver::{WebDriverLauncher, WebDriverSession};

/// The two supported engines. Anything else is a configuration error; there
/// is no fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserEngine {
    Chrome,
    Firefox,
}

impl BrowserEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserEngine::Chrome => "chrome",
            BrowserEngine::Firefox => "firefox",
        }
    }
}

impl fmt::Display for BrowserEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserEngine {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chrome" => Ok(BrowserEngine::Chrome),
            "firefox" => Ok(BrowserEngine::Firefox),
            other => Err(ConfigurationError::UnsupportedEngine(other.to_string())),
        }
    }
}

/// A live browser session. `close` consumes the session so it can only be
/// released once. Sessions are owned values so a dropped run can hand them
/// to the runtime for release.
pub trait BrowserSession: Send + 'static {
    fn navigate(&mut self, url: &str) -> impl Future<Output = Result<(), BrowserError>> + Send;

    /// Encoded (PNG) screenshot of the current viewport.
    fn screenshot(&mut self) -> impl Future<Output = Result<Vec<u8>, BrowserError>> + Send;

    fn close(self) -> impl Future<Output = Result<(), BrowserError>> + Send;
}

pub trait BrowserLauncher: Send + Sync {
    type Session: BrowserSession;

    fn launch(
        &self,
        engine: BrowserEngine,
    ) -> impl Future<Output = Result<Self::Session, BrowserError>> + Send;
}
