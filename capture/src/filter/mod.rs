pub mod dedup;
pub mod phash;
pub mod traits;

pub use dedup::{ConsecutiveDedup, DedupState};
pub use phash::{Hasher, PerceptualHash};
pub use traits::FrameFilter;
