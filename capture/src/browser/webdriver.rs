use fantoccini::{Client, ClientBuilder};
use frame_sieve_common::config::BrowserConfig;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::{BrowserEngine, BrowserLauncher, BrowserSession};
use crate::error::BrowserError;

/// Starts sessions against an already-running WebDriver server
/// (chromedriver for Chrome, geckodriver for Firefox).
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    config: BrowserConfig,
}

impl WebDriverLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    fn endpoint(&self, engine: BrowserEngine) -> &str {
        match engine {
            BrowserEngine::Chrome => &self.config.chrome_webdriver_url,
            BrowserEngine::Firefox => &self.config.firefox_webdriver_url,
        }
    }

    fn capabilities(&self, engine: BrowserEngine) -> Map<String, Value> {
        let mut args: Vec<String> = Vec::new();
        let mut caps = Map::new();
        match engine {
            BrowserEngine::Chrome => {
                if self.config.headless {
                    args.push("--headless=new".into());
                }
                args.push("--hide-scrollbars".into());
                caps.insert("browserName".into(), json!("chrome"));
                caps.insert("goog:chromeOptions".into(), json!({ "args": args }));
            }
            BrowserEngine::Firefox => {
                if self.config.headless {
                    args.push("-headless".into());
                }
                caps.insert("browserName".into(), json!("firefox"));
                caps.insert("moz:firefoxOptions".into(), json!({ "args": args }));
            }
        }
        caps
    }
}

impl BrowserLauncher for WebDriverLauncher {
    type Session = WebDriverSession;

    async fn launch(&self, engine: BrowserEngine) -> Result<WebDriverSession, BrowserError> {
        let endpoint = self.endpoint(engine);
        info!(%engine, endpoint, headless = self.config.headless, "starting webdriver session");

        let mut builder = ClientBuilder::native();
        builder.capabilities(self.capabilities(engine));
        let client = builder
            .connect(endpoint)
            .await
            .map_err(|e| BrowserError(e.to_string()))?;

        if let (Some(width), Some(height)) = (self.config.window_width, self.config.window_height) {
            if let Err(e) = client.set_window_size(width, height).await {
                // The session is ours already; hand it back before failing.
                let _ = client.close().await;
                return Err(BrowserError(format!("failed to set window size: {e}")));
            }
            debug!(width, height, "window resized");
        }

        Ok(WebDriverSession { client })
    }
}

pub struct WebDriverSession {
    client: Client,
}

impl BrowserSession for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.client
            .goto(url)
            .await
            .map_err(|e| BrowserError(e.to_string()))
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, BrowserError> {
        self.client
            .screenshot()
            .await
            .map_err(|e| BrowserError(e.to_string()))
    }

    async fn close(self) -> Result<(), BrowserError> {
        self.client
            .close()
            .await
            .map_err(|e| BrowserError(e.to_string()))
    }
}
