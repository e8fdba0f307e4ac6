use tracing::debug;

use super::phash::PerceptualHash;
use super::traits::FrameFilter;

/// What the filter remembers between samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupState {
    /// Nothing stored yet in this run; the next frame is always kept.
    NoPriorFrame,
    /// Hash of the most recently stored frame.
    HavePriorFrame(PerceptualHash),
}

/// Drops a frame only when it matches the immediately preceding *stored*
/// frame. A state that comes back after something else was stored is kept
/// again.
///
/// With `threshold == 0` "matches" means bit-for-bit equal hashes. A larger
/// threshold treats hashes within that Hamming distance as the same frame.
#[derive(Debug)]
pub struct ConsecutiveDedup {
    state: DedupState,
    threshold: u32,
}

impl ConsecutiveDedup {
    pub fn new(threshold: u32) -> Self {
        Self {
            state: DedupState::NoPriorFrame,
            threshold,
        }
    }

    /// Exact-equality dedup.
    pub fn exact() -> Self {
        Self::new(0)
    }

    pub fn state(&self) -> &DedupState {
        &self.state
    }
}

impl FrameFilter for ConsecutiveDedup {
    fn should_store(&mut self, hash: &PerceptualHash) -> bool {
        let accepted = match &self.state {
            DedupState::NoPriorFrame => {
                debug!("first frame, accepting unconditionally");
                true
            }
            DedupState::HavePriorFrame(prev) if self.threshold == 0 => prev != hash,
            DedupState::HavePriorFrame(prev) => {
                let distance = prev.distance(hash);
                debug!(distance, threshold = self.threshold, "hash comparison");
                distance > self.threshold
            }
        };
        if accepted {
            self.state = DedupState::HavePriorFrame(hash.clone());
        }
        accepted
    }

    fn name(&self) -> &str {
        "consecutive-dedup"
    }
}
