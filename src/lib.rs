pub mod config;
pub mod error;
pub mod geometry;
pub mod math;
pub mod operations;
pub mod scan;

pub use config::ExtractionConfig;
pub use error::{Result, ScanpolyError};
pub use geometry::{Element, LineMap, Segment};
pub use scan::{Pose2, RangeInterval, Scan};
