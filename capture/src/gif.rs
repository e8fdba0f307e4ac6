use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use frame_sieve_common::frame::frame_file_name;
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, ImageFormat};
use reqwest::Url;
use tracing::{debug, info};

use crate::error::DecodeError;

/// Turn user input into a filesystem path. `file://` URLs are converted;
/// anything else is taken as a path verbatim.
pub fn resolve_gif_path(input: &str) -> PathBuf {
    let trimmed = input.trim();
    if trimmed
        .get(..7)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("file://"))
    {
        if let Some(path) = Url::parse(trimmed).ok().and_then(|u| u.to_file_path().ok()) {
            return path;
        }
        // Malformed file URL: drop the scheme and use the rest as-is.
        return PathBuf::from(&trimmed[7..]);
    }
    PathBuf::from(trimmed)
}

/// Write every frame of the GIF at `gif_path` into `output_dir` as
/// `frame_<index>.png`, indices from 0.
///
/// Every frame is written, including ones identical to their neighbours.
/// Frames are the fully composited canvas at that step. If decoding fails
/// part-way the frames already written are left in place.
pub fn extract_frames(gif_path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, DecodeError> {
    std::fs::create_dir_all(output_dir).map_err(|source| DecodeError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let file = File::open(gif_path).map_err(|source| DecodeError::Open {
        path: gif_path.to_path_buf(),
        source,
    })?;
    let container = |source: image::ImageError| DecodeError::Container {
        path: gif_path.to_path_buf(),
        source,
    };
    let decoder = GifDecoder::new(BufReader::new(file)).map_err(container)?;

    let mut written = Vec::new();
    for (index, frame) in decoder.into_frames().enumerate() {
        let frame = frame.map_err(container)?;
        let path = output_dir.join(frame_file_name(index as u64));
        frame
            .into_buffer()
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| DecodeError::Write {
                path: path.clone(),
                source,
            })?;
        debug!(index, path = %path.display(), "wrote gif frame");
        written.push(path);
    }

    info!(gif = %gif_path.display(), frames = written.len(), "extracted gif frames");
    Ok(written)
}
