use std::path::PathBuf;

/// Everything the capture and extraction operations can fail with.
///
/// None of these are retried inside the crate; the caller decides what to
/// tell the user.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("unsupported browser {0:?}, use 'chrome' or 'firefox'")]
    UnsupportedEngine(String),
    #[error("sample count must be at least 1")]
    ZeroFrames,
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to launch {engine} session: {source}")]
    Launch {
        engine: String,
        #[source]
        source: BrowserError,
    },
    #[error("failed to navigate to {url}: {source}")]
    Navigate {
        url: String,
        #[source]
        source: BrowserError,
    },
    #[error("screenshot of sample {sample} failed: {source}")]
    Screenshot {
        sample: u32,
        #[source]
        source: BrowserError,
    },
    #[error("could not hash sample {sample}: {source}")]
    Hash {
        sample: u32,
        #[source]
        source: HashError,
    },
    #[error("failed to write {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure reported by a browser backend, as text.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct BrowserError(pub String);

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has no pixels")]
    Empty,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read gif {path}: {source}")]
    Container {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write frame {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid url {0}")]
    InvalidUrl(String),
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("response exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("failed to store download: {0}")]
    Store(std::io::Error),
}
