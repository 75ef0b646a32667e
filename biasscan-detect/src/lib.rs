pub mod predicate;
pub mod segment;

pub use predicate::{BALANCE_THRESHOLD, WindowTally, is_biased_window};
pub use segment::{ExtensionRule, Scan, Segmentation, SegmentationResult, biased_count, segment};
