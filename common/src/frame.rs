use std::cmp::Ordering;

const FRAME_PREFIX: &str = "frame_";
const FRAME_EXT: &str = ".png";

/// File name for a persisted frame.
///
/// The sampler passes 1-based sample numbers, the GIF decoder 0-based frame
/// indices. Skipped samples leave visible gaps; names are never renumbered.
pub fn frame_file_name(index: u64) -> String {
    format!("{FRAME_PREFIX}{index}{FRAME_EXT}")
}

/// Recover the index from a name produced by [`frame_file_name`].
pub fn parse_frame_index(name: &str) -> Option<u64> {
    name.strip_prefix(FRAME_PREFIX)?
        .strip_suffix(FRAME_EXT)?
        .parse()
        .ok()
}

/// Display order for a directory listing: indexed frames by number, then
/// anything else by name.
pub fn listing_order(a: &str, b: &str) -> Ordering {
    match (parse_frame_index(a), parse_frame_index(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}
