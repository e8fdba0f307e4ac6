use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::StorageConfig;
use crate::frame::listing_order;

/// The two on-disk areas the front end works with: extracted/captured frames,
/// and raw GIFs that were uploaded or fetched.
///
/// Plain directories only. The directory listing is the index; there is no
/// manifest or sidecar.
#[derive(Debug, Clone)]
pub struct FrameStore {
    frames_dir: PathBuf,
    gifs_dir: PathBuf,
}

impl FrameStore {
    pub fn new(frames_dir: impl Into<PathBuf>, gifs_dir: impl Into<PathBuf>) -> Self {
        Self {
            frames_dir: frames_dir.into(),
            gifs_dir: gifs_dir.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.frames_dir, &config.gifs_dir)
    }

    pub fn frames_dir(&self) -> &Path {
        &self.frames_dir
    }

    pub fn gifs_dir(&self) -> &Path {
        &self.gifs_dir
    }

    /// Create both directories if absent.
    pub fn ensure(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.frames_dir)?;
        std::fs::create_dir_all(&self.gifs_dir)?;
        Ok(())
    }

    /// Regular files in the frames directory, in display order.
    pub fn list_frames(&self) -> io::Result<Vec<String>> {
        list_files(&self.frames_dir)
    }

    /// Remove every regular file from both areas. Subdirectories are left alone.
    /// Returns the number of files removed.
    pub fn clear(&self) -> io::Result<usize> {
        let mut removed = 0;
        for dir in [&self.frames_dir, &self.gifs_dir] {
            removed += clear_files(dir)?;
        }
        info!(removed, "cleared frame and gif storage");
        Ok(removed)
    }

    /// Resolve a frame name for serving. `None` for anything that is not a bare
    /// file name (separators, `..`, empty).
    pub fn frame_path(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\'])
            || name.contains("..")
        {
            return None;
        }
        Some(self.frames_dir.join(name))
    }

    /// Write raw GIF bytes into the gif area under an already-sanitized name.
    pub fn save_gif(&self, file_name: &str, data: &[u8]) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.gifs_dir)?;
        let path = self.gifs_dir.join(file_name);
        std::fs::write(&path, data)?;
        debug!(path = %path.display(), bytes = data.len(), "stored gif");
        Ok(path)
    }
}

fn list_files(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(names),
        Err(e) => return Err(e),
    };
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort_by(|a, b| listing_order(a, b));
    Ok(names)
}

fn clear_files(dir: &Path) -> io::Result<usize> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Reduce an arbitrary client-supplied name to a safe single path component.
///
/// Keeps ASCII alphanumerics, `.`, `-` and `_`; spaces become `_`; everything
/// else is dropped. Leading dots are stripped so the result is never hidden
/// or a parent reference.
pub fn secure_filename(name: &str) -> Option<String> {
    // Browsers on some platforms send the full client path.
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Case-insensitive extension check against the configured allow-list.
pub fn has_allowed_extension(name: &str, allowed: &[String]) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            allowed.iter().any(|a| a.eq_ignore_ascii_case(ext))
        }
        _ => false,
    }
}
