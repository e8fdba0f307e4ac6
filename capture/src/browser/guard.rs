use tracing::{debug, warn};

use super::{BrowserEngine, BrowserSession};
use crate::error::BrowserError;

/// Owns a launched session and releases it exactly once.
///
/// [`SessionGuard::release`] closes in place. If the guard is dropped first
/// (the owning future was cancelled, or a caller bailed out) the close is
/// spawned onto the current tokio runtime instead.
pub struct SessionGuard<S: BrowserSession> {
    engine: BrowserEngine,
    session: Option<S>,
}

impl<S: BrowserSession> SessionGuard<S> {
    pub fn new(engine: BrowserEngine, session: S) -> Self {
        Self {
            engine,
            session: Some(session),
        }
    }

    /// Close now. A close failure is logged, not returned.
    pub async fn release(mut self) {
        if let Some(session) = self.session.take() {
            match session.close().await {
                Ok(()) => debug!(engine = %self.engine, "browser session closed"),
                Err(e) => warn!(engine = %self.engine, error = %e, "failed to close browser session"),
            }
        }
    }

    fn live(&mut self) -> Result<&mut S, BrowserError> {
        self.session
            .as_mut()
            .ok_or_else(|| BrowserError("browser session already released".into()))
    }
}

impl<S: BrowserSession> BrowserSession for SessionGuard<S> {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.live()?.navigate(url).await
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, BrowserError> {
        self.live()?.screenshot().await
    }

    async fn close(mut self) -> Result<(), BrowserError> {
        match self.session.take() {
            Some(session) => session.close().await,
            None => Ok(()),
        }
    }
}

impl<S: BrowserSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let engine = self.engine;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(%engine, "run abandoned, closing browser session in background");
                handle.spawn(async move {
                    if let Err(e) = session.close().await {
                        warn!(%engine, error = %e, "failed to close abandoned browser session");
                    }
                });
            }
            Err(_) => {
                warn!(%engine, "no runtime to close browser session on, dropping it");
            }
        }
    }
}
