use std::path::{Path, PathBuf};
use std::time::Duration;

use frame_sieve_common::config::SamplerConfig;
use frame_sieve_common::frame::frame_file_name;
use tracing::{debug, info};

use crate::browser::{BrowserEngine, BrowserLauncher, BrowserSession, SessionGuard};
use crate::error::{CaptureError, ConfigurationError, Error};
use crate::filter::{ConsecutiveDedup, FrameFilter, Hasher};

/// Knobs for one sampling run.
#[derive(Debug, Clone)]
pub struct SamplerOptions {
    /// Number of screenshots to take (N).
    pub frames: u32,
    /// Pause after every sample, kept or not (D).
    pub interval: Duration,
    /// Pause after navigation before the first sample.
    pub settle: Duration,
    pub hasher: Hasher,
    /// Hamming distance still treated as "same frame"; 0 is exact equality.
    pub distance_threshold: u32,
}

impl SamplerOptions {
    pub fn from_config(config: &SamplerConfig) -> Self {
        Self {
            frames: config.frames,
            interval: Duration::from_millis(config.interval_ms),
            settle: Duration::from_millis(config.settle_ms),
            hasher: Hasher::new(config.hash_algorithm, config.hash_size),
            distance_threshold: config.distance_threshold,
        }
    }
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self::from_config(&SamplerConfig::default())
    }
}

/// What a finished run wrote. Sample numbers are 1-based.
#[derive(Debug, Default, Clone)]
pub struct CaptureReport {
    pub kept: Vec<u32>,
    pub skipped: Vec<u32>,
    pub files: Vec<PathBuf>,
}

/// Screenshot `url` N times and keep only frames that differ from the last
/// kept one.
///
/// The engine selector is validated before anything is launched. Once a
/// session exists it is closed on every path out of this function, and in the
/// background if the returned future is dropped before completing; a failed
/// close after an otherwise successful run is logged, not returned. Files
/// already written stay on disk when the run fails part-way.
pub async fn capture_animation<L: BrowserLauncher>(
    launcher: &L,
    engine: &str,
    url: &str,
    options: &SamplerOptions,
    output_dir: &Path,
) -> Result<CaptureReport, Error> {
    let engine: BrowserEngine = engine.parse()?;
    if options.frames == 0 {
        return Err(ConfigurationError::ZeroFrames.into());
    }

    let session = launcher
        .launch(engine)
        .await
        .map_err(|source| CaptureError::Launch {
            engine: engine.to_string(),
            source,
        })?;
    // From here the session is released however this future ends, including
    // being dropped mid-run.
    let mut session = SessionGuard::new(engine, session);

    let outcome = sample_session(&mut session, url, options, output_dir).await;
    session.release().await;

    Ok(outcome?)
}

async fn sample_session<S: BrowserSession>(
    session: &mut S,
    url: &str,
    options: &SamplerOptions,
    output_dir: &Path,
) -> Result<CaptureReport, CaptureError> {
    info!(url, frames = options.frames, interval_ms = options.interval.as_millis() as u64, "sampling page");

    session
        .navigate(url)
        .await
        .map_err(|source| CaptureError::Navigate {
            url: url.to_string(),
            source,
        })?;
    // Let initial rendering and animation start.
    tokio::time::sleep(options.settle).await;

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|source| CaptureError::Persist {
            path: output_dir.to_path_buf(),
            source,
        })?;

    let mut filter = ConsecutiveDedup::new(options.distance_threshold);
    let mut report = CaptureReport::default();

    for sample in 1..=options.frames {
        let png = session
            .screenshot()
            .await
            .map_err(|source| CaptureError::Screenshot { sample, source })?;
        let hash = options
            .hasher
            .hash_bytes(&png)
            .map_err(|source| CaptureError::Hash { sample, source })?;

        if filter.should_store(&hash) {
            let path = output_dir.join(frame_file_name(u64::from(sample)));
            tokio::fs::write(&path, &png)
                .await
                .map_err(|source| CaptureError::Persist {
                    path: path.clone(),
                    source,
                })?;
            info!(sample, %hash, path = %path.display(), "saved frame");
            report.kept.push(sample);
            report.files.push(path);
        } else {
            debug!(sample, %hash, filter = filter.name(), "skipped duplicate frame");
            report.skipped.push(sample);
        }

        tokio::time::sleep(options.interval).await;
    }

    info!(kept = report.kept.len(), skipped = report.skipped.len(), "sampling finished");
    Ok(report)
}
