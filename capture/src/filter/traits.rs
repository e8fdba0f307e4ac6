use super::phash::PerceptualHash;

/// Keep/skip decision for a stream of sampled frames.
///
/// Implementations receive each frame's fingerprint in sampling order and
/// decide whether it represents a change worth persisting.
pub trait FrameFilter: Send + Sync {
    /// Returns `true` if this frame should be stored (scene changed).
    /// Returns `false` to skip (same as the last stored frame).
    fn should_store(&mut self, hash: &PerceptualHash) -> bool;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}
