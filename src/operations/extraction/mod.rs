pub mod max_likelihood;
pub mod split_merge;

pub use max_likelihood::{ExtractionReport, MaxLikelihoodExtraction, MaxLikelihoodOptions};
pub use split_merge::{SplitAndMerge, SplitMergeOptions};
